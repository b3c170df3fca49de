//! Huddle Core - Domain types and errors
//!
//! This crate provides the foundational types shared by the session
//! coordination crates: roles, container directory answers and the
//! [`SessionError`] taxonomy.

pub mod container;
pub mod error;
pub mod role;

pub use container::{ContainerLookup, LookupState, SessionContext};
pub use error::{Result, SessionError};
pub use role::{Role, RoleSet};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
