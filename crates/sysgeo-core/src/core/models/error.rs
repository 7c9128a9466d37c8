use super::ids::ComponentId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid pose: {0}")]
    InvalidPose(String),

    #[error("A component named '{name}' already exists under the same parent")]
    DuplicateName { name: String },

    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        parent: ComponentId,
        child: ComponentId,
    },

    #[error("Component '{name}' is already owned and cannot be attached again")]
    AlreadyOwned { name: String },

    #[error("Component not found: {0:?}")]
    ComponentNotFound(ComponentId),

    #[error("Component '{name}' has no parent to detach from")]
    NotAttached { name: String },

    #[error("The root component cannot be removed")]
    RootRemoval,
}
