//! Registry of constructible error kinds for exception effects.
//!
//! An exception clause names an error type by `module`/`className`. This
//! registry maps those names to factories so the client can construct and
//! raise a matching error without reflection. A small built-in set is
//! seeded at first use; hosts register their own kinds with
//! [`register_fault_kind`]. Unresolvable keys are reported to the caller,
//! which swallows the clause instead of raising a fallback.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{BoxError, InjectedError};

/// Constructs a raisable error from an experiment-provided message.
pub type FaultFactory = Arc<dyn Fn(&str) -> BoxError + Send + Sync>;

static REGISTRY: OnceLock<RwLock<HashMap<String, FaultFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, FaultFactory>> {
    REGISTRY.get_or_init(|| RwLock::new(built_ins()))
}

fn built_ins() -> HashMap<String, FaultFactory> {
    let mut kinds: HashMap<String, FaultFactory> = HashMap::new();

    let injected: FaultFactory = Arc::new(|message| Box::new(InjectedError::new(message)));
    kinds.insert("InjectedError".to_string(), Arc::clone(&injected));
    kinds.insert("failure_flags::InjectedError".to_string(), injected);

    kinds.insert(
        "TimeoutError".to_string(),
        Arc::new(|message| {
            Box::new(io::Error::new(io::ErrorKind::TimedOut, message.to_string()))
        }),
    );
    kinds.insert(
        "ConnectionError".to_string(),
        Arc::new(|message| {
            Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                message.to_string(),
            ))
        }),
    );

    let io_error: FaultFactory = Arc::new(|message| Box::new(io::Error::other(message.to_string())));
    kinds.insert("IoError".to_string(), Arc::clone(&io_error));
    kinds.insert("std::io::Error".to_string(), io_error);

    kinds
}

/// Register a custom error kind under `key`.
///
/// Experiments naming the key through their exception clause (`className`,
/// optionally prefixed by `module` as `module::className`) raise the error
/// the factory constructs. Registering an existing key replaces it.
pub fn register_fault_kind(key: impl Into<String>, factory: FaultFactory) {
    registry().write().insert(key.into(), factory);
}

/// Resolve an error kind by optional module and class name.
pub(crate) fn resolve(module: Option<&str>, class_name: &str) -> Option<FaultFactory> {
    let key = match module {
        Some(module) => format!("{module}::{class_name}"),
        None => class_name.to_string(),
    };
    registry().read().get(&key).cloned()
}
