//! # Workflows Module
//!
//! High-level entry points that tie the Onshape connector, the assembly model and the SysML
//! writer together. Front ends such as the command-line tool only call into this module.
//!
//! - **Export Workflow** ([`export`]) - Fetch an Onshape assembly element and render it as SysML
//!   v2 text.
//! - **Convert Workflow** ([`convert`]) - Re-read a SysML file and render it again with different
//!   export settings.
//! - **Push Workflow** ([`push`]) - Recreate an assembly inside an Onshape workspace element by
//!   inserting one instance per typed component and moving it to its world pose.
//!
//! All of them report coarse phases through a [`progress::ProgressReporter`].

pub mod convert;
pub mod error;
pub mod export;
pub mod progress;
pub mod push;

pub use error::WorkflowError;
pub use progress::{Progress, ProgressReporter};
