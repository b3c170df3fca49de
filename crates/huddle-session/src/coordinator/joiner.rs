//! Get-or-create join loop.

use std::sync::Arc;

use huddle_core::{Result, SessionContext, SessionError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ContainerDirectory, ContainerHost, FirstCreated, JoinResult};
use crate::roles::{ClientRegistrar, RoleAuthority, RoleVerifier};
use crate::settings::{CoordinatorSettings, DEFAULT_MAX_CONTAINER_LOOKUP_TRIES};

const JOIN_OPERATION: &str = "create or get container";

type HostJoinResult<H> =
    JoinResult<<H as ContainerHost>::Container, <H as ContainerHost>::Services>;

/// Result of one creation attempt.
enum CreateOutcome<H: ContainerHost> {
    Won(HostJoinResult<H>),
    /// Another client registered its container first; ours was disposed.
    RaceLost,
}

/// Joins the shared container of a session, creating it if needed.
///
/// Each call runs a sequential loop of container lookups:
///
/// 1. Look up the session in the directory.
/// 2. If the directory names a container, open it.
/// 3. If told to create and tries remain, build a local container, run the
///    first-creation hook, publish it and try to register its id. Losing
///    that race disposes the local container and goes back to 1.
/// 4. If asked to retry later and tries remain, wait and go back to 1.
/// 5. Otherwise fail with a timeout.
///
/// The try budget only gates creating and waiting. The lookup that follows
/// a lost race always runs, so a loser can still open the winner's
/// container on its last try.
pub struct SessionJoiner<D, H> {
    directory: Arc<D>,
    host: Arc<H>,
    registrar: Option<Arc<dyn ClientRegistrar>>,
    max_tries: u32,
}

impl<D, H> SessionJoiner<D, H>
where
    D: ContainerDirectory,
    H: ContainerHost + 'static,
{
    /// Creates a joiner with the default try budget and no role verifier.
    pub fn new(directory: Arc<D>, host: Arc<H>) -> Self {
        Self {
            directory,
            host,
            registrar: None,
            max_tries: DEFAULT_MAX_CONTAINER_LOOKUP_TRIES,
        }
    }

    /// Creates a joiner from loaded settings.
    pub fn from_settings(directory: Arc<D>, host: Arc<H>, settings: &CoordinatorSettings) -> Self {
        Self::new(directory, host).with_max_container_lookup_tries(settings.max_container_lookup_tries)
    }

    /// Sets the maximum number of container lookups per join (at least 1).
    pub fn with_max_container_lookup_tries(mut self, tries: u32) -> Self {
        self.max_tries = tries.max(1);
        self
    }

    /// Registers local connection ids with `verifier` after each join.
    pub fn with_role_verifier<R>(self, verifier: Arc<RoleVerifier<R>>) -> Self
    where
        R: RoleAuthority + 'static,
    {
        self.with_registrar(verifier)
    }

    /// Registers local connection ids with `registrar` after each join.
    pub fn with_registrar(mut self, registrar: Arc<dyn ClientRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Returns the maximum number of container lookups per join.
    pub fn max_container_lookup_tries(&self) -> u32 {
        self.max_tries
    }

    /// Attaches to the session's container, creating it if none exists.
    ///
    /// `on_first_created` runs exactly once on every container this call
    /// creates, before the container is published. `created` in the result
    /// is true only if this call won the creation race.
    ///
    /// Returns as soon as the container is open. With a registrar
    /// configured, its connection ids are registered by a spawned task
    /// exposed as [`JoinResult::registration`], so this must run inside a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// - `SessionError::Timeout` once the try budget is exhausted
    /// - `SessionError::Upstream` as reported by the directory or host
    pub async fn join(
        &self,
        context: &SessionContext,
        schema: &H::Schema,
        on_first_created: Option<&dyn FirstCreated<H::Container>>,
    ) -> Result<HostJoinResult<H>> {
        let mut tries: u32 = 0;

        loop {
            tries += 1;
            debug!(session = %context, tries, "looking up session container");
            let lookup = self.directory.lookup(context).await?;
            lookup.validate()?;

            if let Some(container_id) = lookup.container_id() {
                info!(session = %context, container_id, "opening existing container");
                let (container, services) = self.host.open(container_id, schema).await?;
                let result = JoinResult {
                    container,
                    services,
                    container_id: container_id.to_owned(),
                    created: false,
                    registration: None,
                };
                return Ok(self.finish(result));
            }

            // Past the budget only after a lost race; that lookup may attach
            // but never creates again.
            if lookup.should_create() && tries <= self.max_tries {
                match self.create(context, schema, on_first_created).await? {
                    CreateOutcome::Won(result) => return Ok(self.finish(result)),
                    CreateOutcome::RaceLost => continue,
                }
            }

            let delay = lookup.retry_delay();
            if !lookup.should_create() && tries < self.max_tries && !delay.is_zero() {
                debug!(session = %context, tries, delay = ?delay, "container not ready, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            break;
        }

        warn!(session = %context, tries, "gave up joining session container");
        Err(SessionError::timeout(
            JOIN_OPERATION,
            tries.min(self.max_tries),
        ))
    }

    /// Registers a connection id that appeared after the join, e.g. on
    /// reconnect. A no-op without a role verifier.
    pub async fn register_connection(&self, client_id: &str) -> Result<()> {
        match &self.registrar {
            Some(registrar) => registrar.register_connection(client_id).await,
            None => Ok(()),
        }
    }

    async fn create(
        &self,
        context: &SessionContext,
        schema: &H::Schema,
        on_first_created: Option<&dyn FirstCreated<H::Container>>,
    ) -> Result<CreateOutcome<H>> {
        debug!(session = %context, "creating new container");
        let (container, services) = self.host.create(schema).await?;

        if let Some(hook) = on_first_created {
            let initialized = hook.initialize(&container).await;
            if let Err(error) = initialized {
                self.host.dispose(container);
                return Err(error);
            }
        }

        let attached = self.host.attach(&container).await;
        let container_id = match attached {
            Ok(id) => id,
            Err(error) => {
                self.host.dispose(container);
                return Err(error);
            },
        };

        let registered = self
            .directory
            .try_set_container_id(context, &container_id)
            .await;

        match registered {
            Ok(true) => {
                info!(session = %context, container_id = %container_id, "created session container");
                Ok(CreateOutcome::Won(JoinResult {
                    container,
                    services,
                    container_id,
                    created: true,
                    registration: None,
                }))
            },
            Ok(false) => {
                warn!(
                    session = %context,
                    container_id = %container_id,
                    "lost container creation race, disposing local container"
                );
                self.host.dispose(container);
                Ok(CreateOutcome::RaceLost)
            },
            Err(error) => {
                self.host.dispose(container);
                Err(error)
            },
        }
    }

    /// Starts registering the container's connection ids in the background.
    fn finish(&self, mut result: HostJoinResult<H>) -> HostJoinResult<H> {
        result.registration = self.spawn_registration(&result);
        result
    }

    /// Waits for the container to connect, then registers each of its
    /// connection ids. Problems are logged; the join already succeeded.
    fn spawn_registration(&self, result: &HostJoinResult<H>) -> Option<JoinHandle<()>> {
        let registrar = Arc::clone(self.registrar.as_ref()?);
        let host = Arc::clone(&self.host);
        let container = result.container.clone();
        let container_id = result.container_id.clone();

        Some(tokio::spawn(async move {
            match host.wait_for_connection(&container).await {
                Ok(connection_ids) => {
                    debug!(%container_id, connections = connection_ids.len(), "registering connections");
                    for connection_id in connection_ids {
                        if let Err(error) = registrar.register_connection(&connection_id).await {
                            warn!(%connection_id, %error, "failed to register connection");
                        }
                    }
                },
                Err(error) => {
                    warn!(%container_id, %error, "container never connected");
                },
            }
        }))
    }
}

impl<D, H> std::fmt::Debug for SessionJoiner<D, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionJoiner")
            .field("max_tries", &self.max_tries)
            .field("role_verification", &self.registrar.is_some())
            .finish()
    }
}
