//! Onshape REST connector.
//!
//! The connector resolves credentials through an explicit [`CredentialResolver`], signs a `GET`
//! for the assembly definition of an element, and turns its occurrences into an
//! [`Assembly`](crate::core::models::assembly::Assembly). The [`writeback`] half signs `POST`
//! requests that create assembly tabs, insert instances and move occurrences. HTTP is behind the
//! [`Transport`] trait so both directions can be exercised without a network.

pub mod credentials;
pub mod error;
pub mod models;
pub mod onshape;
pub mod signing;
pub mod transport;
pub mod url;
pub mod writeback;

pub use credentials::{
    ChainResolver, CredentialResolver, Credentials, DotenvSearch, EnvCredentials,
    StaticCredentials,
};
pub use error::ConnectorError;
pub use onshape::{ConnectorConfig, OnshapeConnector};
pub use signing::AuthScheme;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use url::{DocumentRef, WvmKind, parse_onshape_url};
pub use writeback::{InsertedInstance, TransformMode};
