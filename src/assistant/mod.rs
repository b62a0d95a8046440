//! Request handling on top of the decoding pipeline.
//!
//! [`RetryController`] turns a prompt into a decoded shape.
//! [`TaskExecutionController`] applies a planned task list to the
//! file-store, and [`Assistant`] ties classification, planning and
//! execution together for one user request.

pub mod code;
pub mod paths;
pub mod prompts;
pub mod retry;
pub mod session;
pub mod tasks;

pub use paths::{normalize_target, ExtensionPolicy, KeywordExtensionPolicy};
pub use retry::RetryController;
pub use session::{Assistant, Outcome};
pub use tasks::{TaskExecutionController, TaskReport, TaskStatus};
