//! Error types for the failure flags client.

use thiserror::Error;

/// Boxed error returned by an invocation that raised an injected fault.
///
/// Injected error kinds are chosen dynamically by the experiment, so the
/// raise channel carries a trait object rather than a closed enum.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures encountered while fetching experiments from the agent.
///
/// [`FailureFlag::invoke`](crate::FailureFlag::invoke) swallows these and
/// reports the inert outcome; they are only observable through
/// [`FailureFlag::fetch`](crate::FailureFlag::fetch).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request to the agent failed at the transport layer
    /// (unreachable, timeout, connection reset).
    #[error("agent transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The agent response body was not valid JSON.
    #[error("malformed agent response: {0}")]
    Json(#[from] serde_json::Error),
}

/// The generic built-in error kind raised by exception effects.
///
/// A plain-string exception clause raises this type carrying the clause as
/// its message. Structured clauses may name other kinds through the
/// fault-kind registry.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InjectedError {
    message: String,
}

impl InjectedError {
    /// Create an injected error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message carried by the experiment's exception clause.
    pub fn message(&self) -> &str {
        &self.message
    }
}
