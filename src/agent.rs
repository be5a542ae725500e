//! HTTP client for the co-located failure flags agent.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::FetchError;
use crate::experiment::Experiment;

/// Client for the agent's experiment endpoint.
///
/// Issues at most one request per call, bounded by the configured
/// timeout. There is no retry and no caching; an unreachable agent is
/// indistinguishable from an agent with no active experiments.
#[derive(Debug, Clone)]
pub struct AgentClient {
    config: AgentConfig,
    inner: reqwest::Client,
}

/// Request payload for the experiment endpoint.
#[derive(Serialize)]
struct ExperimentRequest<'a> {
    name: &'a str,
    labels: &'a HashMap<String, String>,
}

impl AgentClient {
    /// Create a new agent client with the given configuration.
    pub fn new(config: AgentConfig) -> Self {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, inner }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Fetch the experiments currently targeting `name`.
    ///
    /// Posts `{name, labels}` as JSON and normalizes the response: a
    /// non-2xx status or a non-JSON content type yields an empty list
    /// without consuming the body, an experiment array decodes
    /// element-wise with malformed entries skipped, a bare experiment
    /// object becomes a one-element list, and any other body shape is
    /// empty. Transport failures and JSON syntax errors are returned as
    /// [`FetchError`].
    pub async fn fetch(
        &self,
        name: &str,
        labels: &HashMap<String, String>,
    ) -> Result<Vec<Experiment>, FetchError> {
        let response = self
            .inner
            .post(&self.config.endpoint)
            .json(&ExperimentRequest { name, labels })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "agent returned non-success status");
            return Ok(Vec::new());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("application/json") {
            debug!(content_type = %content_type, "agent response is not JSON");
            return Ok(Vec::new());
        }

        let body = response.bytes().await?;
        let parsed: Value = serde_json::from_slice(&body)?;
        Ok(normalize(parsed))
    }
}

/// Normalize a response body into a list of experiments.
fn normalize(value: Value) -> Vec<Experiment> {
    match value {
        Value::Array(entries) => entries.into_iter().filter_map(decode).collect(),
        Value::Object(_) => decode(value).map_or_else(Vec::new, |experiment| vec![experiment]),
        _ => Vec::new(),
    }
}

fn decode(entry: Value) -> Option<Experiment> {
    match serde_json::from_value(entry) {
        Ok(experiment) => Some(experiment),
        Err(error) => {
            debug!(%error, "skipping malformed experiment");
            None
        }
    }
}
