//! Experiment records served by the agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A targeting, sampling, and effect record returned by the agent.
///
/// Every field is optional on the wire and defaults when absent, so a
/// partial record still parses and a single malformed experiment can be
/// dropped without discarding the rest of the batch. Effect keys the
/// client does not recognize are carried along and ignored by the
/// handlers.
///
/// Experiments are ephemeral: produced per fetch, consumed within one
/// invocation, never cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experiment {
    /// Opaque experiment identifier, not interpreted by the client.
    pub guid: String,

    /// Name of the failure flag this experiment targets.
    pub failure_flag_name: String,

    /// Sampling probability. Kept as raw JSON: anything that is not a
    /// number in [0, 1] excludes the experiment from sampling.
    pub rate: Value,

    /// Agent-side targeting selector; matching is the agent's job.
    pub selector: Map<String, Value>,

    /// Effect clauses keyed by effect name (`latency`, `exception`, ...).
    pub effect: Map<String, Value>,
}

impl Experiment {
    /// The validated sampling rate, or `None` when the rate field is
    /// missing, non-numeric, or outside [0, 1].
    pub fn sampling_rate(&self) -> Option<f64> {
        let rate = self.rate.as_f64()?;
        (0.0..=1.0).contains(&rate).then_some(rate)
    }

    /// Look up an effect clause by key.
    pub fn effect_clause(&self, key: &str) -> Option<&Value> {
        self.effect.get(key)
    }
}
