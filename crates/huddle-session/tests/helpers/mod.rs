//! Test helpers para huddle-session.

#![allow(dead_code, unused_imports)]

pub mod authority;
pub mod remote;

pub use authority::InMemoryAuthority;
pub use remote::{ClientHost, LocalContainer, RemoteDirectory, ScriptedDirectory};

use tracing_subscriber::EnvFilter;

/// Instala un subscriber de tracing para los tests (idempotente).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
