//! Errors raised while executing planned tasks.

use thiserror::Error;

use crate::ports::{PortError, WriteTargetError};

/// Why a task attempt failed.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The planned target is blank; the task is rejected without retry.
    #[error("task has no target file")]
    BlankTarget,
    /// The resolved path is not a writable file path.
    #[error(transparent)]
    InvalidPath(#[from] WriteTargetError),
    /// A create or update produced no code.
    #[error("no code generated for {0}")]
    MissingCode(String),
    /// The file-store rejected the operation.
    #[error("file-store failed on {path}: {source}")]
    FileStore {
        /// Path being written or deleted.
        path: String,
        /// Underlying port error.
        source: PortError,
    },
}
