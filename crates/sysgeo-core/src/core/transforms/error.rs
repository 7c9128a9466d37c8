use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("Unknown Euler axis convention '{0}' (expected e.g. 'sxyz' or 'rzyx')")]
    UnknownConvention(String),

    #[error("Matrix has a perspective component (bottom row {row:?}), only affine transforms are supported")]
    Perspective { row: [f64; 4] },

    #[error("Matrix is singular and cannot be decomposed")]
    Singular,

    #[error("Matrix contains non-finite values")]
    NonFinite,
}
