// crates/agent-conformance/src/test_support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared helpers for library unit tests.
// Purpose: Serialize env mutation and host an in-process agent stub.
// Dependencies: axum, tokio
// ============================================================================

//! ## Overview
//! Unit tests share one process, so env mutation is serialized through
//! [`env_lock`] and undone by [`EnvGuard`]. [`agent_stub`] hosts a small
//! stand-in for the master agent on an ephemeral port.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only helpers favor direct unwrap/expect for clarity."
)]

pub mod agent_stub;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

pub mod env_mut {
    //! Process env mutation for tests.
    #![allow(unsafe_code, reason = "Tests mutate process env vars in a controlled scope.")]

    /// Sets an environment variable for the current process.
    pub fn set_var(key: &str, value: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Removes an environment variable from the current process.
    pub fn remove_var(key: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::remove_var(key);
        }
    }
}

/// Acquires the process-wide env lock, recovering from poisoning.
pub fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Restores captured env values on drop.
pub struct EnvGuard {
    /// Captured names and their prior values.
    entries: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    /// Captures the current values of `names`.
    pub fn new(names: &[&'static str]) -> Self {
        let entries = names.iter().map(|name| (*name, std::env::var(*name).ok())).collect();
        Self {
            entries,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.entries.drain(..) {
            match value {
                Some(value) => env_mut::set_var(name, &value),
                None => env_mut::remove_var(name),
            }
        }
    }
}
