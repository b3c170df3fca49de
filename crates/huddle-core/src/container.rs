//! Container directory types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Whether the directory already knows a container for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupState {
    NotFound,
    AlreadyExists,
}

/// Answer of the container directory for one lookup.
///
/// A fresh value is requested on every coordination attempt; it is never
/// mutated after it has been received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLookup {
    state: LookupState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    container_id: Option<String>,

    #[serde(default)]
    should_create: bool,

    /// Wait before the next lookup, in milliseconds on the wire.
    #[serde(default, with = "millis")]
    retry_after: Duration,
}

impl ContainerLookup {
    /// No container exists and the caller should create one.
    pub fn create() -> Self {
        Self {
            state: LookupState::NotFound,
            container_id: None,
            should_create: true,
            retry_after: Duration::ZERO,
        }
    }

    /// A container with `container_id` is registered for the session.
    pub fn existing(container_id: impl Into<String>) -> Self {
        Self {
            state: LookupState::AlreadyExists,
            container_id: Some(container_id.into()),
            should_create: false,
            retry_after: Duration::ZERO,
        }
    }

    /// Nothing to attach to yet; another client is probably creating it.
    pub fn retry_after(delay: Duration) -> Self {
        Self {
            state: LookupState::NotFound,
            container_id: None,
            should_create: false,
            retry_after: delay,
        }
    }

    /// Returns the lookup state.
    pub fn state(&self) -> LookupState {
        self.state
    }

    /// Returns the registered container id, if any.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Returns true if the caller was told to create the container.
    pub fn should_create(&self) -> bool {
        self.should_create
    }

    /// Returns how long to wait before looking up again.
    pub fn retry_delay(&self) -> Duration {
        self.retry_after
    }

    /// Returns true if the lookup offers neither a container nor a retry.
    pub fn is_terminal(&self) -> bool {
        !self.should_create && self.container_id.is_none() && self.retry_after.is_zero()
    }

    /// Rejects lookups that ask for creation while naming a container.
    ///
    /// ```
    /// use huddle_core::ContainerLookup;
    ///
    /// assert!(ContainerLookup::existing("c-1").validate().is_ok());
    /// assert!(ContainerLookup::create().validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.should_create && self.container_id.is_some() {
            return Err(SessionError::upstream(
                "container lookup",
                "directory asked to create a container while reporting an existing id",
            ));
        }
        Ok(())
    }
}

/// Identifies the session whose container is being joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    session_id: String,
}

impl SessionContext {
    /// Creates a context for `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// Returns the session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.session_id)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
