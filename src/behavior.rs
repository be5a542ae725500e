//! Effect behaviors applied to sampled experiments.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::error::{BoxError, InjectedError};
use crate::experiment::Experiment;
use crate::flag::FailureFlag;
use crate::registry;

/// Message used when a structured exception clause provides none.
const DEFAULT_FAULT_MESSAGE: &str = "error injected by failure flag (no message provided)";

/// Strategy invoked with the sampled experiments targeting a flag.
///
/// The default implementation is [`DelayedDataOrError`]; hosts substitute
/// their own chain with
/// [`FailureFlag::with_behavior`](crate::FailureFlag::with_behavior).
/// Returns whether the behavior changed observable behavior. Returning
/// `Err` unwinds the invocation like any error the surrounding code could
/// raise itself, which is how error injection reaches the host.
#[async_trait]
pub trait Behavior: Send + Sync {
    /// Apply effects for the given experiments.
    async fn apply(
        &self,
        flag: &mut FailureFlag,
        experiments: &[Experiment],
    ) -> Result<bool, BoxError>;
}

/// The default behavior chain: latency, then error injection, then data.
///
/// All three handlers run and their impact flags are ORed; there is no
/// short-circuit on impact. An exception effect that raises unwinds
/// before the data handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelayedDataOrError;

#[async_trait]
impl Behavior for DelayedDataOrError {
    async fn apply(
        &self,
        flag: &mut FailureFlag,
        experiments: &[Experiment],
    ) -> Result<bool, BoxError> {
        let delayed = latency(flag, experiments).await;
        let raised = exception(flag, experiments)?;
        let mutated = data(flag, experiments);
        Ok(delayed || raised || mutated)
    }
}

/// Apply latency effects.
///
/// A numeric clause sleeps that many milliseconds. A string clause is
/// parsed as a number first; an unparseable string skips the experiment
/// without impact. An object clause sleeps `ms` plus a uniformly random
/// extra delay in `[0, jitter)` milliseconds and always counts as impact,
/// even when both fields resolve to zero. Delays across experiments
/// accumulate rather than taking a maximum.
pub async fn latency(flag: &FailureFlag, experiments: &[Experiment]) -> bool {
    let mut impacted = false;
    for experiment in experiments {
        let Some(clause) = experiment.effect_clause("latency") else {
            continue;
        };
        match clause {
            Value::Number(_) => match as_millis(clause) {
                Some(ms) => {
                    sleep_ms(ms).await;
                    impacted = true;
                }
                None => {
                    if flag.is_debug() {
                        debug!(flag = flag.name(), "latency clause is out of range");
                    }
                }
            },
            Value::String(text) => match text.trim().parse::<f64>() {
                Ok(ms) if ms.is_finite() && ms >= 0.0 => {
                    sleep_ms(ms).await;
                    impacted = true;
                }
                _ => {
                    if flag.is_debug() {
                        debug!(flag = flag.name(), "latency clause is not a number");
                    }
                }
            },
            Value::Object(fields) => {
                let ms = fields.get("ms").and_then(Value::as_u64).unwrap_or(0);
                let jitter = fields.get("jitter").and_then(Value::as_u64).unwrap_or(0);
                let extra = if jitter > 0 {
                    rand::rng().random::<f64>() * jitter as f64
                } else {
                    0.0
                };
                sleep_ms(ms as f64 + extra).await;
                impacted = true;
            }
            _ => {
                if flag.is_debug() {
                    debug!(flag = flag.name(), "unrecognized latency clause, skipping");
                }
            }
        }
    }
    impacted
}

/// Apply the first qualifying exception effect.
///
/// A plain string clause raises [`InjectedError`] with that message. A
/// structured clause resolves `module`/`className` through the fault-kind
/// registry and raises the constructed error with the clause's message.
/// Raising is terminal: once an experiment raises, later experiments are
/// never examined. A clause naming a kind the registry cannot resolve is
/// a failure of the injection mechanism, not of the host; the handler
/// logs it and reports no impact instead of raising a fallback.
pub fn exception(flag: &FailureFlag, experiments: &[Experiment]) -> Result<bool, BoxError> {
    for experiment in experiments {
        let Some(clause) = experiment.effect_clause("exception") else {
            continue;
        };
        match clause {
            Value::String(message) => return Err(Box::new(InjectedError::new(message.clone()))),
            Value::Object(fields) => {
                let module = fields.get("module").and_then(Value::as_str);
                let class_name = fields.get("className").and_then(Value::as_str);
                let message = fields.get("message").and_then(Value::as_str);
                if module.is_none() && class_name.is_none() && message.is_none() {
                    if flag.is_debug() {
                        debug!(flag = flag.name(), "exception clause was not populated");
                    }
                    continue;
                }
                let class_name = class_name.unwrap_or("InjectedError");
                if class_name.is_empty() {
                    // An explicitly empty className is a no-op sentinel.
                    continue;
                }
                match registry::resolve(module, class_name) {
                    Some(factory) => {
                        return Err(factory(message.unwrap_or(DEFAULT_FAULT_MESSAGE)));
                    }
                    None => {
                        debug!(
                            module = module.unwrap_or_default(),
                            class_name, "unable to resolve the named error kind"
                        );
                        return Ok(false);
                    }
                }
            }
            _ => {
                if flag.is_debug() {
                    debug!(flag = flag.name(), "unrecognized exception clause, skipping");
                }
            }
        }
    }
    Ok(false)
}

/// Data mutation extension point.
///
/// Reserved for `effect.data` clauses that rewrite the flag's data bag.
/// The current contract never mutates state and always reports no impact;
/// the default chain composes over it all the same.
pub fn data(_flag: &mut FailureFlag, _experiments: &[Experiment]) -> bool {
    false
}

fn as_millis(value: &Value) -> Option<f64> {
    let ms = value.as_f64()?;
    (ms.is_finite() && ms >= 0.0).then_some(ms)
}

async fn sleep_ms(ms: f64) {
    tokio::time::sleep(Duration::from_secs_f64(ms / 1000.0)).await;
}
