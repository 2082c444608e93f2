//! Executor error types

use thiserror::Error;

use crate::register::RegisterTag;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Executor errors
///
/// All errors are fatal to the operator tree that raised them: the caller
/// should stop driving the tree and close it. `close` remains safe to call
/// after an error.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Registers of different variants were compared or combined
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: RegisterTag,
        found: RegisterTag,
    },

    /// Attribute index out of range for a row
    #[error("attribute index {index} out of bounds (row has {width} columns)")]
    AttributeOutOfBounds { index: usize, width: usize },

    /// IO error from the print sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// Build a TypeMismatch from the two offending tags
    pub(crate) fn mismatch(expected: RegisterTag, found: RegisterTag) -> Self {
        ExecutorError::TypeMismatch { expected, found }
    }
}
