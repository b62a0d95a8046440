//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the assistant core and an
//! external system (time, generator, file-store). Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod llm;

pub use clock::{Clock, SleepFuture};
pub use filesystem::{FileSystem, IgnorePolicy, WriteTargetError};
pub use llm::{CompletionRequest, CompletionResponse, FormatHint, LlmClient, LlmFuture};

/// Error type returned across port boundaries.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
