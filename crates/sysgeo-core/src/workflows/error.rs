use crate::connector::error::ConnectorError;
use crate::core::io::sysml::error::{ExportError, SysmlError};
use crate::core::models::error::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Onshape connector failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("SysML export failed: {0}")]
    Export(#[from] ExportError),

    #[error("SysML input could not be read: {0}")]
    Sysml(#[from] SysmlError),

    #[error("Assembly is inconsistent: {0}")]
    Model(#[from] ModelError),
}
