//! Binary entrypoint for the `patchwright` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Recording and replay are handled in commands::dispatch via
    // PATCHWRIGHT_RECORD=<dir> and PATCHWRIGHT_REPLAY=<cassette>.
    match patchwright::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
