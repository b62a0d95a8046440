//! Structural validation with a bounded repair loop.

use serde_json::Value;
use tracing::debug;

use super::repair::repair_round;

/// Repair rounds attempted after the strict parse fails.
pub const MAX_REPAIR_ROUNDS: usize = 1;

/// Outcome of structural validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The candidate parsed as-is.
    Valid(Value),
    /// The candidate parsed after a repair round.
    Repaired(Value),
    /// No bounded repair made the candidate parse.
    Unrecoverable,
}

/// Parses `candidate` strictly, repairing at most [`MAX_REPAIR_ROUNDS`] times.
#[must_use]
pub fn validate(candidate: &str) -> Validation {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Validation::Valid(value),
        Err(err) => debug!(%err, "strict parse failed"),
    }

    let mut text = candidate.to_string();
    for round in 1..=MAX_REPAIR_ROUNDS {
        text = repair_round(&text);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                debug!(round, "parse succeeded after repair");
                return Validation::Repaired(value);
            }
            Err(err) => debug!(round, %err, "parse failed after repair"),
        }
    }

    Validation::Unrecoverable
}
