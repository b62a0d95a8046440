//! Recording adapters that capture interactions to cassettes.

pub mod llm;

pub use llm::RecordingLlmClient;
