//! Service context bundling the port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::adapters::live::{LiveClock, LiveFileSystem, LiveLlmClient};
use crate::adapters::memory::{ManualClock, MemoryFileSystem};
use crate::adapters::recording::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::AssistantConfig;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, recording, replaying).
pub struct ServiceContext {
    /// Generator for completions.
    pub llm: Box<dyn LlmClient>,
    /// Workspace file-store.
    pub fs: Box<dyn FileSystem>,
    /// Clock for time and backoff delays.
    pub clock: Box<dyn Clock>,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(llm: Box<dyn LlmClient>, fs: Box<dyn FileSystem>, clock: Box<dyn Clock>) -> Self {
        Self { llm, fs, clock }
    }

    /// Creates a live context: Anthropic generator, disk file-store rooted
    /// at `workspace`, system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &AssistantConfig, workspace: &Path) -> Result<Self, String> {
        let llm = LiveLlmClient::new(config).map_err(|e| format!("Failed to build client: {e}"))?;
        Ok(Self::new(
            Box::new(llm),
            Box::new(LiveFileSystem::new(workspace, config.ignore.clone())),
            Box::new(LiveClock),
        ))
    }

    /// Creates a live context whose generator interactions are recorded.
    ///
    /// The cassette is written when the returned session is finished,
    /// after this context has been dropped. This is the developer-only
    /// mechanism for capturing cassettes via `PATCHWRIGHT_RECORD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory or client cannot be created.
    pub fn recording_at(
        base: &Path,
        config: &AssistantConfig,
        workspace: &Path,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base, &config.model)?;
        let mut ctx = Self::live(config, workspace)?;
        ctx.llm = Box::new(RecordingLlmClient::new(ctx.llm, Arc::clone(&session.llm)));
        Ok((ctx, session))
    }

    /// Creates a context that replays generator output from a cassette.
    ///
    /// Uses a [`ManualClock`] so backoff does not wait in real time.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path, fs: Box<dyn FileSystem>) -> Result<Self, String> {
        let cassette = Cassette::load(path).map_err(|e| e.to_string())?;
        let replayer = CassetteReplayer::new(&cassette);
        debug!(cassette = %cassette.name, interactions = replayer.remaining(), "replaying");
        let replayer = Arc::new(Mutex::new(replayer));
        Ok(Self::new(
            Box::new(ReplayingLlmClient::new(replayer)),
            fs,
            Box::new(ManualClock::default()),
        ))
    }

    /// Swaps the file-store for an in-memory snapshot of it, so mutations
    /// never reach the workspace. Returns a handle to inspect them.
    ///
    /// # Errors
    ///
    /// Returns an error if the current file-store cannot be listed.
    pub fn into_dry_run(self) -> Result<(Self, MemoryFileSystem), String> {
        let snapshot = MemoryFileSystem::snapshot(self.fs.as_ref())
            .map_err(|e| format!("Failed to snapshot workspace: {e}"))?;
        let ctx = Self { fs: Box::new(snapshot.clone()), ..self };
        Ok((ctx, snapshot))
    }
}
