use crate::core::models::error::ModelError;
use crate::core::models::ids::ComponentId;
use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Component '{parent}' refers to child {child:?}, which does not belong to it")]
    DanglingReference { parent: String, child: ComponentId },

    #[error("Component {0:?} is not reachable from the assembly root")]
    Unreachable(ComponentId),

    #[error("Component '{component}' has a non-finite pose value")]
    NonFinite { component: String },

    #[error("Formatting error: {0}")]
    Format(#[from] fmt::Error),
}

#[derive(Debug, Error)]
pub enum SysmlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Invalid model on line {line}: {source}")]
    Model { line: usize, source: ModelError },
    #[error("No root part usage found (expected one in part def '{context}' or at top level)")]
    MissingRoot { context: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("Unterminated string or quoted name")]
    UnterminatedString,
    #[error("Unterminated block comment")]
    UnterminatedComment,
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("Expected {expected}, found end of input")]
    UnexpectedEof { expected: &'static str },
    #[error("Attribute '{name}' {reason}")]
    InvalidAttribute { name: String, reason: String },
}
