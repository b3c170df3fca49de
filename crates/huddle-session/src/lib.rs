//! # Huddle Session
//!
//! Coordination logic for clients joining one shared collaborative session.
//!
//! This crate sits in front of the remote service and keeps many clients
//! from duplicating work:
//!
//! - [`cache::SingleFlightCache`] deduplicates concurrent requests per key
//!   and memoizes successful results for a fixed lifetime
//! - [`poll::poll_until`] retries eventually-consistent reads on a fixed
//!   backoff schedule
//! - [`roles::RoleVerifier`] registers clients and checks their roles
//! - [`coordinator::SessionJoiner`] races clients to create the session's
//!   container and leaves every one of them attached to the same one
//!
//! The remote service is reached only through the collaborator traits
//! ([`roles::RoleAuthority`], [`coordinator::ContainerDirectory`],
//! [`coordinator::ContainerHost`]).
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use huddle_session::{RoleVerifier, SessionJoiner, SessionSettings};
//!
//! let settings = SessionSettings::load(None)?;
//! let verifier = Arc::new(RoleVerifier::from_settings(authority, &settings.roles));
//! let joiner = SessionJoiner::from_settings(directory, host, &settings.coordinator)
//!     .with_role_verifier(Arc::clone(&verifier));
//!
//! let joined = joiner.join(&SessionContext::new("meeting-1"), &schema, None).await?;
//! if joined.created {
//!     // first client in the session
//! }
//! ```

pub mod cache;
pub mod coordinator;
pub mod metrics;
pub mod poll;
pub mod roles;
pub mod settings;

// Re-exports
pub use cache::SingleFlightCache;
pub use coordinator::{ContainerDirectory, ContainerHost, FirstCreated, JoinResult, SessionJoiner};
pub use poll::{BackoffSchedule, poll_until};
pub use roles::{ClientRegistrar, RoleAuthority, RoleVerifier};
pub use settings::{CoordinatorSettings, RoleSettings, SessionSettings};

// Re-export huddle_core for consumers
pub use huddle_core;
