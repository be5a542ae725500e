//! # Failure Flags
//!
//! Fault injection client SDK. Host code declares a named failure flag at
//! a point in its control flow; at runtime the flag asks a co-located
//! agent whether any active experiment targets it and, if so, applies the
//! experiment's prescribed effect before returning control to the caller.
//!
//! ## Features
//!
//! - **Failure Flags**: Named injection points evaluated at runtime, no redeploy
//! - **Latency Effects**: Inject fixed or jittered delays into the calling task
//! - **Error Injection**: Raise built-in or host-registered error kinds on demand
//! - **Probabilistic Sampling**: Per-experiment rates with one shared draw per invocation
//! - **Fail Transparent**: An unreachable agent or malformed payload is never observable
//!
//! The SDK is inert unless the `FAILURE_FLAGS_ENABLED` environment
//! variable is set when a flag is constructed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use failure_flags::FailureFlag;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut flag = FailureFlag::new("checkout-payment")
//!         .with_label("service", "checkout");
//!
//!     // Sleeps, raises, or does nothing, depending on the active
//!     // experiments targeting this flag.
//!     let outcome = flag.invoke().await?;
//!
//!     if outcome.active {
//!         println!("{} experiment(s) targeted this call", outcome.experiments.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Error Kinds
//!
//! Experiments name injected error types by `module`/`className`; the
//! fault-kind registry maps those names to constructors.
//!
//! ```rust
//! use failure_flags::{BoxError, register_fault_kind};
//! use std::sync::Arc;
//!
//! register_fault_kind(
//!     "PaymentDeclined",
//!     Arc::new(|message| -> BoxError {
//!         Box::new(std::io::Error::other(message.to_string()))
//!     }),
//! );
//! ```

mod agent;
mod behavior;
mod config;
mod error;
mod experiment;
mod flag;
mod registry;
mod sample;

pub use agent::AgentClient;
pub use behavior::{Behavior, DelayedDataOrError, data, exception, latency};
pub use config::{AgentConfig, AgentConfigBuilder, DEFAULT_ENDPOINT, ENDPOINT_ENV};
pub use error::{BoxError, FetchError, InjectedError};
pub use experiment::Experiment;
pub use flag::{ENABLED_ENV, FailureFlag, Invocation, SDK_VERSION_LABEL};
pub use registry::{FaultFactory, register_fault_kind};
pub use sample::sample;

/// Prelude for common imports.
///
/// ```
/// use failure_flags::prelude::*;
/// ```
pub mod prelude {
    pub use crate::behavior::{Behavior, DelayedDataOrError};
    pub use crate::config::AgentConfig;
    pub use crate::error::{BoxError, FetchError, InjectedError};
    pub use crate::experiment::Experiment;
    pub use crate::flag::{FailureFlag, Invocation};
    pub use crate::registry::register_fault_kind;
}
