//! Core library entry for the `patchwright` CLI.
//!
//! Generator output is untrusted text. [`decode`] turns it into one of the
//! closed set of [`shapes`], repairing or salvaging what it can and falling
//! back to a safe default otherwise. [`assistant`] builds the retry and
//! task-execution controllers on top, talking to the outside world only
//! through the [`ports`] bundled in a [`context::ServiceContext`].

pub mod adapters;
pub mod assistant;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod logging;
pub mod ports;
pub mod shapes;

#[cfg(test)]
mod test_support;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
/// `--help` and `--version` print to stdout and succeed.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print().map_err(|e| format!("Failed to print help: {e}"))?;
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init();
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_decodes_input_file() {
        let path = std::env::temp_dir().join("patchwright_run_decode.txt");
        std::fs::write(&path, r#"{"type": "General", "reasoning": "q"}"#).unwrap();
        let result = run([
            "patchwright",
            "decode",
            "--shape",
            "classification",
            "--input",
            path.to_str().unwrap(),
        ]);
        assert!(result.is_ok());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn help_and_version_succeed() {
        assert!(run(["patchwright", "--help"]).is_ok());
        assert!(run(["patchwright", "decode", "--help"]).is_ok());
        assert!(run(["patchwright", "--version"]).is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["patchwright", "unknown"]);
        assert!(result.is_err());
    }
}
