//! In-memory container directory and per-client container host.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use huddle_core::{ContainerLookup, Result, SessionContext};
use huddle_session::{ContainerDirectory, ContainerHost};
use parking_lot::Mutex;
use tokio::sync::Barrier;

/// Shared session-to-container mapping with set-if-absent semantics.
pub struct RemoteDirectory {
    mapping: Mutex<Option<String>>,
    /// Holds the first `racers` lookups until all of them have answered.
    race: Option<(u32, Barrier)>,
    always_retry: Option<Duration>,
    lookup_calls: AtomicU32,
    set_calls: AtomicU32,
}

impl RemoteDirectory {
    pub fn new() -> Self {
        Self {
            mapping: Mutex::new(None),
            race: None,
            always_retry: None,
            lookup_calls: AtomicU32::new(0),
            set_calls: AtomicU32::new(0),
        }
    }

    /// Directory that already maps the session to `container_id`.
    pub fn with_container(container_id: &str) -> Self {
        Self {
            mapping: Mutex::new(Some(container_id.to_owned())),
            ..Self::new()
        }
    }

    /// The first `racers` lookups all see an empty mapping.
    pub fn racing(racers: u32) -> Self {
        Self {
            race: Some((racers, Barrier::new(racers as usize))),
            ..Self::new()
        }
    }

    /// Every lookup answers "retry after `delay`".
    pub fn always_retry(delay: Duration) -> Self {
        Self {
            always_retry: Some(delay),
            ..Self::new()
        }
    }

    pub fn mapping(&self) -> Option<String> {
        self.mapping.lock().clone()
    }

    pub fn lookup_calls(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> u32 {
        self.set_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerDirectory for RemoteDirectory {
    async fn lookup(&self, _context: &SessionContext) -> Result<ContainerLookup> {
        let call = self.lookup_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.always_retry {
            return Ok(ContainerLookup::retry_after(delay));
        }

        let answer = match self.mapping.lock().clone() {
            Some(id) => ContainerLookup::existing(id),
            None => ContainerLookup::create(),
        };

        if let Some((racers, barrier)) = &self.race
            && call <= *racers
        {
            barrier.wait().await;
        }

        Ok(answer)
    }

    async fn try_set_container_id(
        &self,
        _context: &SessionContext,
        container_id: &str,
    ) -> Result<bool> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let mut mapping = self.mapping.lock();
        if mapping.is_some() {
            return Ok(false);
        }
        *mapping = Some(container_id.to_owned());
        Ok(true)
    }
}

/// Replays a fixed list of lookups, repeating the last one, and rejects
/// every attempt to set the container id.
pub struct ScriptedDirectory {
    lookups: Mutex<VecDeque<ContainerLookup>>,
    lookup_calls: AtomicU32,
}

impl ScriptedDirectory {
    pub fn rejecting(lookups: Vec<ContainerLookup>) -> Self {
        assert!(!lookups.is_empty(), "script needs at least one lookup");
        Self {
            lookups: Mutex::new(lookups.into()),
            lookup_calls: AtomicU32::new(0),
        }
    }

    pub fn lookup_calls(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerDirectory for ScriptedDirectory {
    async fn lookup(&self, _context: &SessionContext) -> Result<ContainerLookup> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let mut lookups = self.lookups.lock();
        let next = if lookups.len() > 1 {
            lookups.pop_front()
        } else {
            lookups.front().cloned()
        };
        Ok(next.unwrap_or_else(ContainerLookup::create))
    }

    async fn try_set_container_id(
        &self,
        _context: &SessionContext,
        _container_id: &str,
    ) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContainer {
    pub local_id: u32,
    pub canonical_id: Option<String>,
}

/// Container host of one client process.
pub struct ClientHost {
    client: String,
    connection_id: String,
    next_local_id: AtomicU32,
    initialized_schema: Mutex<Vec<String>>,
    disposed: Mutex<Vec<u32>>,
    opened: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ClientHost {
    pub fn new(client: &str) -> Self {
        Self {
            client: client.to_owned(),
            connection_id: format!("{client}-connection"),
            next_local_id: AtomicU32::new(1),
            initialized_schema: Mutex::new(Vec::new()),
            disposed: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// The container transport of this host never reports connectivity.
    pub fn offline(self) -> Self {
        self.offline.store(true, Ordering::SeqCst);
        self
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn created(&self) -> u32 {
        self.next_local_id.load(Ordering::SeqCst) - 1
    }

    pub fn disposed(&self) -> Vec<u32> {
        self.disposed.lock().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl ContainerHost for ClientHost {
    type Schema = String;
    type Container = LocalContainer;
    type Services = String;

    async fn create(&self, schema: &String) -> Result<(LocalContainer, String)> {
        tokio::task::yield_now().await;
        self.initialized_schema.lock().push(schema.clone());
        let local_id = self.next_local_id.fetch_add(1, Ordering::SeqCst);
        Ok((
            LocalContainer {
                local_id,
                canonical_id: None,
            },
            format!("{}-audience", self.client),
        ))
    }

    async fn attach(&self, container: &LocalContainer) -> Result<String> {
        tokio::task::yield_now().await;
        Ok(format!("{}-container-{}", self.client, container.local_id))
    }

    fn dispose(&self, container: LocalContainer) {
        self.disposed.lock().push(container.local_id);
    }

    async fn open(&self, container_id: &str, _schema: &String) -> Result<(LocalContainer, String)> {
        tokio::task::yield_now().await;
        self.opened.lock().push(container_id.to_owned());
        Ok((
            LocalContainer {
                local_id: 0,
                canonical_id: Some(container_id.to_owned()),
            },
            format!("{}-audience", self.client),
        ))
    }

    async fn wait_for_connection(&self, _container: &LocalContainer) -> Result<Vec<String>> {
        if self.offline.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(vec![self.connection_id.clone()])
    }
}
