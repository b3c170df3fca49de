//! Session coordination settings.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then
//! environment variables prefixed with `HUDDLE__` (nested keys separated by
//! `__`, e.g. `HUDDLE__COORDINATOR__MAX_CONTAINER_LOOKUP_TRIES=5`).
//!
//! ```toml
//! [roles]
//! registration_schedule_ms = [100, 200, 200, 400, 600]
//! lookup_schedule_ms = [100, 200, 200, 400, 600]
//! cache_ttl_secs = 3600
//!
//! [coordinator]
//! max_container_lookup_tries = 3
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use huddle_core::{Result, SessionError};
use serde::Deserialize;

use crate::poll::BackoffSchedule;
use crate::roles::ROLE_CACHE_TTL;

/// Default number of container lookups per join.
pub const DEFAULT_MAX_CONTAINER_LOOKUP_TRIES: u32 = 3;

/// All tunables for a session client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub roles: RoleSettings,
    pub coordinator: CoordinatorSettings,
}

/// Role verification tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    /// Waits between registration polls, in milliseconds.
    #[serde(rename = "registration_schedule_ms")]
    pub registration_schedule: BackoffSchedule,
    /// Waits between role lookup polls, in milliseconds.
    #[serde(rename = "lookup_schedule_ms")]
    pub lookup_schedule: BackoffSchedule,
    /// Lifetime of cached registration and role answers, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            registration_schedule: BackoffSchedule::registration(),
            lookup_schedule: BackoffSchedule::registration(),
            cache_ttl_secs: ROLE_CACHE_TTL.as_secs(),
        }
    }
}

impl RoleSettings {
    /// Returns the registration poll schedule.
    pub fn registration_schedule(&self) -> &BackoffSchedule {
        &self.registration_schedule
    }

    /// Returns the role lookup poll schedule.
    pub fn lookup_schedule(&self) -> &BackoffSchedule {
        &self.lookup_schedule
    }

    /// Returns the cache lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Join coordinator tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Upper bound on container lookups per join.
    pub max_container_lookup_tries: u32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            max_container_lookup_tries: DEFAULT_MAX_CONTAINER_LOOKUP_TRIES,
        }
    }
}

impl SessionSettings {
    /// Loads settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    /// Loads settings using an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(env)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| SessionError::configuration(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.coordinator.max_container_lookup_tries == 0 {
            return Err(SessionError::configuration(
                "coordinator.max_container_lookup_tries must be at least 1",
            ));
        }
        if self.roles.cache_ttl_secs == 0 {
            return Err(SessionError::configuration(
                "roles.cache_ttl_secs must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Environment source for `HUDDLE__` variables.
pub fn environment() -> Environment {
    Environment::with_prefix("HUDDLE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
