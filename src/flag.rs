//! Failure flag declaration and invocation.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};
use tracing::debug;

use crate::agent::AgentClient;
use crate::behavior::{Behavior, DelayedDataOrError};
use crate::config::AgentConfig;
use crate::error::{BoxError, FetchError};
use crate::experiment::Experiment;
use crate::sample::sample;

/// Environment variable gating the SDK. Presence, not value, enables it.
pub const ENABLED_ENV: &str = "FAILURE_FLAGS_ENABLED";

/// Label merged into every fetch identifying this SDK build.
pub const SDK_VERSION_LABEL: &str = "failure-flags-sdk-version";

const SDK_VERSION_VALUE: &str = concat!("rust-v", env!("CARGO_PKG_VERSION"));

/// Outcome of one flag invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// At least one experiment targets the flag, regardless of sampling.
    pub active: bool,
    /// Some effect handler changed observable behavior.
    pub impacted: bool,
    /// The raw, pre-sampling experiment list returned by the fetch.
    pub experiments: Vec<Experiment>,
}

impl Invocation {
    fn inert() -> Self {
        Self::default()
    }
}

/// A named point in host code where failures can be injected dynamically.
///
/// The flag can be created anywhere and only has an effect at the line
/// where [`invoke`](FailureFlag::invoke) is called. Callers that want the
/// raw experiment list without the built-in behavior chain can call
/// [`fetch`](FailureFlag::fetch) instead.
///
/// Enablement is captured once, at construction, from the presence of the
/// `FAILURE_FLAGS_ENABLED` environment variable; without it the flag is
/// permanently inert and `invoke` performs no network access at all.
///
/// Labels are mutated in place before every fetch, so sharing one
/// instance across concurrent call sites is not safe; construct one flag
/// per call site (or per call) instead. Independent instances are freely
/// usable from concurrent tasks.
pub struct FailureFlag {
    name: String,
    labels: HashMap<String, String>,
    data: Map<String, Value>,
    enabled: bool,
    debug: bool,
    behavior: Arc<dyn Behavior>,
    agent: AgentClient,
}

impl FailureFlag {
    /// Create a flag named `name`.
    ///
    /// Enablement and the agent endpoint are read from the environment
    /// here; a fresh flag picks up the current values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
            data: Map::new(),
            enabled: env::var_os(ENABLED_ENV).is_some(),
            debug: false,
            behavior: Arc::new(DelayedDataOrError),
            agent: AgentClient::new(AgentConfig::from_env()),
        }
    }

    /// Add a label sent to the agent with every fetch.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Merge a set of labels.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = (String, String)>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Seed the data bag passed to effect handlers.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Enable debug diagnostics for this flag. Diagnostics only; no
    /// behavioral effect.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replace the default behavior chain.
    pub fn with_behavior(mut self, behavior: Arc<dyn Behavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Use a specific agent configuration instead of the environment's.
    pub fn with_agent(mut self, config: AgentConfig) -> Self {
        self.agent = AgentClient::new(config);
        self
    }

    /// The flag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The labels sent to the agent.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    /// The data bag passed to effect handlers.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Mutable access to the data bag.
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Whether the SDK was enabled when this flag was constructed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether debug diagnostics are enabled for this flag.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Evaluate the flag: fetch targeting experiments, sample them, and
    /// run the behavior chain.
    ///
    /// Disabled flags, unnamed flags, fetch failures of any kind, and
    /// empty fetch results all produce the inert outcome; no transport or
    /// parsing failure is ever observable here. The one error this
    /// returns is a fault injected on purpose by an exception effect,
    /// which unwinds exactly like an error raised by the surrounding
    /// host code.
    ///
    /// Sampling takes a single probability draw per invocation and
    /// compares it against every experiment's rate.
    pub async fn invoke(&mut self) -> Result<Invocation, BoxError> {
        if !self.enabled {
            if self.debug {
                debug!("SDK not enabled");
            }
            return Ok(Invocation::inert());
        }
        if self.name.is_empty() {
            if self.debug {
                debug!("no failure flag name specified");
            }
            return Ok(Invocation::inert());
        }

        let experiments = match self.fetch().await {
            Ok(experiments) => experiments,
            Err(error) => {
                if self.debug {
                    debug!(%error, "error while fetching experiments");
                }
                return Ok(Invocation::inert());
            }
        };
        if experiments.is_empty() {
            if self.debug {
                debug!(flag = %self.name, "no experiments retrieved");
            }
            return Ok(Invocation::inert());
        }

        let dice = rand::rng().random::<f64>();
        let sampled = sample(&experiments, dice);
        let behavior = Arc::clone(&self.behavior);
        let impacted = behavior.apply(self, &sampled).await?;

        Ok(Invocation {
            active: true,
            impacted,
            experiments,
        })
    }

    /// Fetch the experiments currently targeting this flag without
    /// applying any behavior.
    ///
    /// Merges the SDK version label into the flag's labels before
    /// building the payload. Disabled flags skip the network call
    /// entirely. Unlike [`invoke`](FailureFlag::invoke), transport and
    /// parse failures propagate here.
    pub async fn fetch(&mut self) -> Result<Vec<Experiment>, FetchError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        self.labels
            .insert(SDK_VERSION_LABEL.to_string(), SDK_VERSION_VALUE.to_string());
        self.agent.fetch(&self.name, &self.labels).await
    }
}

impl fmt::Debug for FailureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureFlag")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("enabled", &self.enabled)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Construction reads the process environment; serialize the tests
    // that flip it.
    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn flag_with_env(name: &str, enabled: bool) -> FailureFlag {
        let _guard = ENV_GUARD.lock().unwrap();
        unsafe {
            if enabled {
                env::set_var(ENABLED_ENV, "TRUE");
            } else {
                env::remove_var(ENABLED_ENV);
            }
        }
        let flag = FailureFlag::new(name).with_debug(true);
        unsafe {
            env::remove_var(ENABLED_ENV);
        }
        flag
    }

    #[tokio::test]
    async fn test_disabled_flag_is_inert() {
        let mut flag = flag_with_env("works", false);
        assert!(!flag.is_enabled());

        let outcome = flag.invoke().await.expect("inert invoke never errors");
        assert!(!outcome.active);
        assert!(!outcome.impacted);
        assert!(outcome.experiments.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_flag_skips_fetch() {
        let mut flag = flag_with_env("works", false);
        let experiments = flag.fetch().await.expect("inert fetch never errors");
        assert!(experiments.is_empty());
        // No fetch happened, so no SDK version label was merged.
        assert!(flag.labels().is_empty());
    }

    #[tokio::test]
    async fn test_unnamed_flag_is_inert() {
        let mut flag = flag_with_env("", true);
        assert!(flag.is_enabled());

        let outcome = flag.invoke().await.expect("inert invoke never errors");
        assert!(!outcome.active);
        assert!(!outcome.impacted);
        assert!(outcome.experiments.is_empty());
    }

    #[test]
    fn test_builder_fields() {
        let flag = flag_with_env("checkout", false)
            .with_label("service", "checkout")
            .with_labels([("zone".to_string(), "us-east-1".to_string())]);

        assert_eq!(flag.name(), "checkout");
        assert_eq!(flag.labels().get("service").map(String::as_str), Some("checkout"));
        assert_eq!(flag.labels().get("zone").map(String::as_str), Some("us-east-1"));
        assert!(flag.is_debug());
    }

    #[test]
    fn test_data_bag_is_per_instance() {
        let mut first = flag_with_env("first", false);
        let second = flag_with_env("second", false);

        first
            .data_mut()
            .insert("k".to_string(), Value::String("v".to_string()));

        assert_eq!(first.data().len(), 1);
        assert!(second.data().is_empty());
    }
}
