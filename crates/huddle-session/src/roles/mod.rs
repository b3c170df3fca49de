//! Client registration and role verification.
//!
//! [`RoleVerifier`] fronts a [`RoleAuthority`] with two single-flight caches
//! so repeated permission checks for the same client cost one remote round
//! trip per cache lifetime.

mod authority;
mod verifier;

pub use authority::{ClientRegistrar, RoleAuthority};
pub use verifier::{ROLE_CACHE_TTL, RoleVerifier};
