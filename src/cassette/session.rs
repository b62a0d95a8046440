//! Recording session owning the generator cassette recorder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// File name of the generator cassette inside a session directory.
pub const LLM_CASSETTE: &str = "llm.cassette.yaml";

/// Manages the `CassetteRecorder` for a recording session.
///
/// Cassettes are stored in a timestamped directory under the requested
/// base directory.
pub struct RecordingSession {
    /// Recorder for generator interactions.
    pub llm: Arc<Mutex<CassetteRecorder>>,
    /// Output directory containing the cassette files.
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session in `<base>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cassette directory already exists
    /// - The directory cannot be created
    pub fn new(base: &Path, source: &str) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let recorder = CassetteRecorder::new(
            output_dir.join(LLM_CASSETTE),
            format!("{timestamp}-llm"),
            source,
        );

        Ok(Self { llm: Arc::new(Mutex::new(recorder)), output_dir })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish recording and write the cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds the recorder or the
    /// cassette cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.llm)
            .map_err(|_| "Recording adapter for llm still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock for llm poisoned: {e}"))?;
        recorder.finish().map_err(|e| e.to_string())?;
        Ok(self.output_dir)
    }
}
