//! `patchwright decode` command.

use std::io::Read;
use std::path::Path;

use crate::decode::{decode, Decoded};
use crate::shapes::ShapeKind;

/// Decode raw generator output from `input` (or stdin) and print it as JSON.
///
/// # Errors
///
/// Returns an error string if the input cannot be read. Malformed output is
/// never an error; it decodes to a recovered or default value.
pub fn run(shape: ShapeKind, input: Option<&Path>) -> Result<(), String> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;
            raw
        }
    };
    println!("{}", render(&decode(&raw, shape))?);
    Ok(())
}

fn render(decoded: &Decoded) -> Result<String, String> {
    serde_json::to_string_pretty(decoded).map_err(|e| format!("Failed to encode result: {e}"))
}
