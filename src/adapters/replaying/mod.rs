//! Replaying adapters that serve recorded interactions.

pub mod llm;

pub use llm::ReplayingLlmClient;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::PortError;

/// Take the output of the next recorded `port::method` interaction.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<Value, PortError> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    let interaction = guard.next_interaction(port, method)?;
    Ok(interaction.output.clone())
}

/// Decode a recorded `Result` using the ok/err JSON convention.
///
/// Reads back what `CassetteRecorder::record_completion` writes.
pub(crate) fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, PortError> {
    if let Some(ok) = output.get("ok") {
        return Ok(serde_json::from_value(ok.clone())?);
    }
    if let Some(err) = output.get("err") {
        let message = err.as_str().map_or_else(|| err.to_string(), str::to_string);
        return Err(message.into());
    }
    Err(format!("recorded output is neither ok nor err: {output}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replays_ok_and_err() {
        let ok: u32 = replay_result(json!({"ok": 7})).unwrap();
        assert_eq!(ok, 7);
        let err = replay_result::<u32>(json!({"err": "timeout"})).unwrap_err();
        assert_eq!(err.to_string(), "timeout");
        assert!(replay_result::<u32>(json!({"other": 1})).is_err());
        assert!(replay_result::<u32>(json!({"ok": "seven"})).is_err());
    }
}
