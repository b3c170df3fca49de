//! Cached, polled role verification.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use huddle_core::{Result, Role, RoleSet, SessionError};
use tracing::{debug, info};

use super::{ClientRegistrar, RoleAuthority};
use crate::cache::SingleFlightCache;
use crate::poll::{BackoffSchedule, poll_until};
use crate::settings::RoleSettings;

/// How long registration and role answers are trusted.
///
/// Bounds how stale a permission decision can be after an upstream role
/// change.
pub const ROLE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const REGISTER_OPERATION: &str = "register client";
const LOOKUP_OPERATION: &str = "get client roles";

/// Registers clients and checks their roles against a [`RoleAuthority`].
///
/// Registration and role lookups go through separate caches keyed by client
/// id, so concurrent checks for one client share a single polled request.
pub struct RoleVerifier<R> {
    authority: Arc<R>,
    registrations: SingleFlightCache<RoleSet>,
    roles: SingleFlightCache<RoleSet>,
    registration_schedule: BackoffSchedule,
    lookup_schedule: BackoffSchedule,
}

impl<R> RoleVerifier<R>
where
    R: RoleAuthority + 'static,
{
    /// Creates a verifier with the default schedules and a one hour cache.
    pub fn new(authority: Arc<R>) -> Self {
        Self::from_settings(authority, &RoleSettings::default())
    }

    /// Creates a verifier from loaded settings.
    pub fn from_settings(authority: Arc<R>, settings: &RoleSettings) -> Self {
        let ttl = settings.cache_ttl();
        Self {
            authority,
            registrations: SingleFlightCache::new("role_registrations", ttl),
            roles: SingleFlightCache::new("client_roles", ttl),
            registration_schedule: settings.registration_schedule().clone(),
            lookup_schedule: settings.lookup_schedule().clone(),
        }
    }

    /// Registers `client_id` with the authority and returns its roles.
    ///
    /// Deduplicated and cached: registering an already registered id does
    /// not reach the authority until the cached answer expires.
    pub async fn register_client(&self, client_id: &str) -> Result<RoleSet> {
        require_client_id(client_id)?;

        let authority = Arc::clone(&self.authority);
        let schedule = self.registration_schedule.clone();
        let id = client_id.to_owned();

        self.registrations
            .resolve(client_id, move || async move {
                debug!(client_id = %id, authority = authority.name(), "registering client");
                let roles =
                    poll_roles(&schedule, REGISTER_OPERATION, || authority.register(&id)).await?;
                info!(client_id = %id, roles = roles.len(), "client registered");
                Ok(roles)
            })
            .await
    }

    /// Returns the roles held by `client_id`.
    ///
    /// A client the authority does not know yet is polled for until the
    /// lookup schedule runs out.
    pub async fn get_client_roles(&self, client_id: &str) -> Result<RoleSet> {
        require_client_id(client_id)?;

        let authority = Arc::clone(&self.authority);
        let schedule = self.lookup_schedule.clone();
        let id = client_id.to_owned();

        self.roles
            .resolve(client_id, move || async move {
                debug!(client_id = %id, authority = authority.name(), "looking up client roles");
                poll_roles(&schedule, LOOKUP_OPERATION, || authority.lookup_roles(&id)).await
            })
            .await
    }

    /// Returns true if `client_id` holds at least one of `allowed`.
    ///
    /// An empty `allowed` list means the action is unrestricted; the
    /// authority is not consulted in that case.
    pub async fn verify_roles_allowed(&self, client_id: &str, allowed: &[Role]) -> Result<bool> {
        require_client_id(client_id)?;

        if allowed.is_empty() {
            return Ok(true);
        }

        let roles = self.get_client_roles(client_id).await?;
        let granted = roles.intersects(allowed);
        debug!(client_id, granted, "verified client roles");
        Ok(granted)
    }

    /// Forgets cached answers for `client_id`.
    pub fn invalidate_client(&self, client_id: &str) {
        self.registrations.invalidate(client_id);
        self.roles.invalidate(client_id);
    }

    /// Returns the registration cache.
    pub fn registrations(&self) -> &SingleFlightCache<RoleSet> {
        &self.registrations
    }

    /// Returns the role lookup cache.
    pub fn role_cache(&self) -> &SingleFlightCache<RoleSet> {
        &self.roles
    }
}

#[async_trait]
impl<R> ClientRegistrar for RoleVerifier<R>
where
    R: RoleAuthority + 'static,
{
    async fn register_connection(&self, client_id: &str) -> Result<()> {
        self.register_client(client_id).await.map(|_| ())
    }
}

impl<R> std::fmt::Debug for RoleVerifier<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleVerifier")
            .field("registrations", &self.registrations)
            .field("roles", &self.roles)
            .field("registration_schedule", &self.registration_schedule)
            .field("lookup_schedule", &self.lookup_schedule)
            .finish()
    }
}

fn require_client_id(client_id: &str) -> Result<()> {
    if client_id.is_empty() {
        return Err(SessionError::invalid_argument(
            "clientId",
            "must be a non-empty string",
        ));
    }
    Ok(())
}

/// Polls `operation` until it yields a role set.
async fn poll_roles<Op, Fut>(
    schedule: &BackoffSchedule,
    operation_name: &'static str,
    operation: Op,
) -> Result<RoleSet>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<RoleSet>>>,
{
    let attempts = schedule.max_attempts();
    let timeout = || SessionError::timeout(operation_name, attempts);

    poll_until(operation, Option::is_some, timeout, schedule)
        .await?
        .ok_or_else(timeout)
}
