//! Agent endpoint configuration.

use std::env;
use std::time::Duration;

/// Environment variable overriding the agent endpoint.
pub const ENDPOINT_ENV: &str = "FAILURE_FLAGS_ENDPOINT";

/// Default experiment endpoint on the co-located agent.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5032/experiment";

/// Configuration for the agent client.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Full URL of the agent's experiment endpoint.
    pub endpoint: String,
    /// Request timeout. The default is aggressively short: the agent is
    /// co-located, and an unreachable agent must not add perceptible
    /// latency to the host application.
    pub timeout: Duration,
    /// User agent string sent with every request.
    pub user_agent: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(1),
            user_agent: format!("failure-flags/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AgentConfig {
    /// Create a configuration from the process environment.
    ///
    /// Honors [`ENDPOINT_ENV`] as an endpoint override and falls back to
    /// defaults for everything else.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = env::var(ENDPOINT_ENV)
            && !endpoint.is_empty()
        {
            config.endpoint = endpoint;
        }
        config
    }

    /// Create a new configuration builder.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }
}

/// Builder for agent client configuration.
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Set the experiment endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AgentConfig {
        self.config
    }
}
