use crate::core::models::error::ModelError;
use crate::core::transforms::error::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Onshape API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid Onshape URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("Invalid occurrence transform: {0}")]
    Transform(#[from] TransformError),

    #[error("Failed to build assembly: {0}")]
    Model(#[from] ModelError),
}
