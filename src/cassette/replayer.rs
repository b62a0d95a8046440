//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};
use super::CassetteError;

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette, serving them sequentially
/// per port/method pair.
pub struct CassetteReplayer {
    /// Per port+method queue of interactions (in order).
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    /// Per port+method cursor tracking position.
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Interactions not yet served, across all pairs.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues
            .iter()
            .map(|(key, queue)| queue.len() - self.cursors.get(key).copied().unwrap_or(0))
            .sum()
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette has no (more) interactions for the
    /// given port/method combination, naming what was requested versus what
    /// interactions remain.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
    ) -> Result<&Interaction, CassetteError> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(CassetteError::Unrecorded {
                port: port.to_string(),
                method: method.to_string(),
                available: available.join(", "),
            });
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let Some(interaction) = queue.get(*cursor) else {
            return Err(CassetteError::Exhausted {
                port: port.to_string(),
                method: method.to_string(),
                count: queue.len(),
            });
        };
        *cursor += 1;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            source: "test".into(),
            interactions,
        }
    }

    fn complete(seq: u64, text: &str) -> Interaction {
        Interaction {
            seq,
            port: "llm".into(),
            method: "complete".into(),
            input: json!({"prompt": seq}),
            output: json!({"ok": {"text": text, "prompt_tokens": 0, "completion_tokens": 0}}),
        }
    }

    #[test]
    fn replay_interactions_in_order() {
        let cassette = make_cassette(vec![complete(0, "1"), complete(1, "2")]);

        let mut replayer = CassetteReplayer::new(&cassette);
        assert_eq!(replayer.remaining(), 2);

        let first = replayer.next_interaction("llm", "complete").unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(first.output["ok"]["text"], "1");

        let second = replayer.next_interaction("llm", "complete").unwrap();
        assert_eq!(second.seq, 1);
        assert_eq!(replayer.remaining(), 0);
    }

    #[test]
    fn exhausted_replayer_reports_count() {
        let cassette = make_cassette(vec![complete(0, "only")]);

        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("llm", "complete").unwrap();
        let err = replayer.next_interaction("llm", "complete").unwrap_err();
        assert!(matches!(err, CassetteError::Exhausted { count: 1, .. }));
        assert!(err.to_string().contains("cassette exhausted"));
    }

    #[test]
    fn unknown_port_lists_available_pairs() {
        let cassette = make_cassette(vec![complete(0, "x")]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let err = replayer.next_interaction("fs", "read").unwrap_err();
        assert!(err.to_string().contains("no interactions recorded"));
        assert!(err.to_string().contains("llm::complete"));
    }
}
