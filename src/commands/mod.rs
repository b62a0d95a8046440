//! Command dispatch and handlers.

pub mod ask;
pub mod decode;
pub mod execute;

use std::env;
use std::path::Path;

use tokio::runtime::{Builder, Runtime};

use crate::adapters::live::LiveFileSystem;
use crate::adapters::memory::{FsOp, MemoryFileSystem};
use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::{self, AssistantConfig};
use crate::context::ServiceContext;

/// Directory to record generator interactions into.
pub const RECORD_ENV: &str = "PATCHWRIGHT_RECORD";
/// Cassette to replay generator interactions from.
pub const REPLAY_ENV: &str = "PATCHWRIGHT_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// When `PATCHWRIGHT_RECORD` is set to a directory path, generator
/// interactions are recorded to a cassette in a timestamped directory
/// under it. When `PATCHWRIGHT_REPLAY` names a cassette file, generator
/// output is served from it instead of the network.
///
/// # Errors
///
/// Returns an error string if configuration, context setup or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Command::Decode { shape, input } => decode::run(*shape, input.as_deref()),
        Command::Ask { request, dry_run } => with_context(cli, *dry_run, |ctx, config| {
            runtime()?.block_on(ask::run(ctx, config, request))
        }),
        Command::Execute { plan, dry_run } => with_context(cli, *dry_run, |ctx, config| {
            runtime()?.block_on(execute::run(ctx, config, plan))
        }),
    }
}

fn runtime() -> Result<Runtime, String> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))
}

/// Loads configuration, builds the context and runs `handler` against it.
fn with_context<F>(cli: &Cli, dry_run: bool, handler: F) -> Result<(), String>
where
    F: FnOnce(&ServiceContext, &AssistantConfig) -> Result<(), String>,
{
    let config = config::load(&cli.workspace, cli.config.as_deref()).map_err(|e| e.to_string())?;
    let (ctx, session) = build_context(&config, &cli.workspace)?;
    let (ctx, preview) = if dry_run {
        let (ctx, handle) = ctx.into_dry_run()?;
        (ctx, Some(handle))
    } else {
        (ctx, None)
    };

    let result = handler(&ctx, &config);

    if let Some(handle) = preview {
        print_dry_run(&handle);
    }

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

fn build_context(
    config: &AssistantConfig,
    workspace: &Path,
) -> Result<(ServiceContext, Option<RecordingSession>), String> {
    match (env::var_os(RECORD_ENV), env::var_os(REPLAY_ENV)) {
        (Some(_), Some(_)) => Err(format!("{RECORD_ENV} and {REPLAY_ENV} cannot both be set")),
        (Some(dir), None) => {
            let (ctx, session) = ServiceContext::recording_at(Path::new(&dir), config, workspace)?;
            Ok((ctx, Some(session)))
        }
        (None, Some(cassette)) => {
            let fs = LiveFileSystem::new(workspace, config.ignore.clone());
            Ok((ServiceContext::replaying(Path::new(&cassette), Box::new(fs))?, None))
        }
        (None, None) => Ok((ServiceContext::live(config, workspace)?, None)),
    }
}

/// Print the mutations a dry run would have applied.
fn print_dry_run(handle: &MemoryFileSystem) {
    let ops = handle.ops();
    println!("dry run: {} change(s) not applied", ops.len());
    for op in ops {
        match op {
            FsOp::Write { path, contents } => {
                println!("--- write {path} ({} bytes)", contents.len());
                println!("{contents}");
            }
            FsOp::Delete { path } => println!("--- delete {path}"),
        }
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
