//! Probabilistic sampling of fetched experiments.

use crate::experiment::Experiment;

/// Filter `experiments` down to those that pass a probability check for
/// the shared draw `dice`.
///
/// One draw is taken per invocation and compared against every
/// experiment's rate; experiments do not get independent draws. An
/// experiment passes iff its rate is a JSON number in [0, 1] and
/// `dice < rate`; experiments with a malformed rate are dropped silently.
pub fn sample(experiments: &[Experiment], dice: f64) -> Vec<Experiment> {
    experiments
        .iter()
        .filter(|experiment| {
            experiment
                .sampling_rate()
                .is_some_and(|rate| dice < rate)
        })
        .cloned()
        .collect()
}
