//! Error types for the core crate.

use thiserror::Error;

/// Failure to parse one of the string-keyed enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown pointer type: {0}")]
    PointerType(String),
    #[error("Unknown origin: {0}")]
    Origin(String),
    #[error("Unknown object type: {0}")]
    ObjectType(String),
    #[error("Unknown image kind: {0}")]
    ImageKind(String),
}
