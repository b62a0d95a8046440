//! Cassette data structures for recording and replaying interactions.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CassetteError;

/// Port name under which generator completions are recorded.
pub const LLM_PORT: &str = "llm";
/// Method name of a recorded completion.
pub const COMPLETE_METHOD: &str = "complete";

/// A single recorded interaction with a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (e.g. "llm").
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Free-form label for what produced the recording (e.g. the model).
    pub source: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Loads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CassetteError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|source| CassetteError::Read { path: display.clone(), source })?;
        serde_yaml::from_str(&content).map_err(|source| CassetteError::Parse { path: display, source })
    }

    /// Writes this cassette to `path` as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be encoded or written.
    pub fn save(&self, path: &Path) -> Result<(), CassetteError> {
        let display = path.display().to_string();
        let yaml = serde_yaml::to_string(self)
            .map_err(|source| CassetteError::Encode { path: display.clone(), source })?;
        std::fs::write(path, yaml).map_err(|source| CassetteError::Write { path: display, source })
    }
}
