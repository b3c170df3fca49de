//! Role authority collaborator traits.

use async_trait::async_trait;
use huddle_core::{Result, RoleSet};

/// The remote service that knows which roles each client holds.
///
/// Both operations may report "not ready yet" by returning `Ok(None)`; the
/// caller keeps polling in that case. `Err` means the call itself failed and
/// is never retried by the verifier.
///
/// # Example
///
/// ```ignore
/// use huddle_session::roles::RoleAuthority;
///
/// struct MeetingService;
///
/// #[async_trait]
/// impl RoleAuthority for MeetingService {
///     async fn register(&self, client_id: &str) -> Result<Option<RoleSet>> {
///         // POST the client id, `None` while the meeting roster catches up
///     }
///
///     async fn lookup_roles(&self, client_id: &str) -> Result<Option<RoleSet>> {
///         // GET the roles, `None` if the client is not registered yet
///     }
/// }
/// ```
#[async_trait]
pub trait RoleAuthority: Send + Sync {
    /// Registers a connection id for the calling user.
    ///
    /// Returns the roles granted to the client once registration is visible,
    /// `None` while it is still pending. An empty set is a valid answer.
    async fn register(&self, client_id: &str) -> Result<Option<RoleSet>>;

    /// Returns the roles of a registered client.
    ///
    /// Returns `None` if the client is not registered (yet).
    async fn lookup_roles(&self, client_id: &str) -> Result<Option<RoleSet>>;

    /// Returns the name of this authority for logging.
    fn name(&self) -> &str {
        "role-authority"
    }
}

/// Something that must learn about every local connection id.
///
/// The session joiner holds this as an optional dependency so it does not
/// need to know which authority backs it.
#[async_trait]
pub trait ClientRegistrar: Send + Sync {
    /// Registers `client_id`; repeated calls for the same id are cheap.
    async fn register_connection(&self, client_id: &str) -> Result<()>;
}
