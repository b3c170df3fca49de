//! In-memory role authority.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use huddle_core::{Result, RoleSet, SessionError};
use huddle_session::RoleAuthority;
use parking_lot::Mutex;

/// Role authority that grants the same roles to every registered client.
pub struct InMemoryAuthority {
    granted: RoleSet,
    registered: Mutex<HashMap<String, RoleSet>>,
    pending_registrations: AtomicU32,
    fail_lookups: AtomicBool,
    register_calls: AtomicU32,
    lookup_calls: AtomicU32,
}

impl InMemoryAuthority {
    pub fn granting(roles: &[&str]) -> Self {
        Self {
            granted: roles.iter().copied().collect(),
            registered: Mutex::new(HashMap::new()),
            pending_registrations: AtomicU32::new(0),
            fail_lookups: AtomicBool::new(false),
            register_calls: AtomicU32::new(0),
            lookup_calls: AtomicU32::new(0),
        }
    }

    /// The next `count` registration calls answer "still pending".
    pub fn with_pending_registrations(self, count: u32) -> Self {
        self.pending_registrations.store(count, Ordering::SeqCst);
        self
    }

    /// Registers `client_id` with `roles` directly.
    pub fn with_client(self, client_id: &str, roles: &[&str]) -> Self {
        self.registered
            .lock()
            .insert(client_id.to_owned(), roles.iter().copied().collect());
        self
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn register_calls(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.registered.lock().contains_key(client_id)
    }
}

#[async_trait]
impl RoleAuthority for InMemoryAuthority {
    async fn register(&self, client_id: &str) -> Result<Option<RoleSet>> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let pending = self
            .pending_registrations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending {
            return Ok(None);
        }

        let roles = self.granted.clone();
        self.registered
            .lock()
            .insert(client_id.to_owned(), roles.clone());
        Ok(Some(roles))
    }

    async fn lookup_roles(&self, client_id: &str) -> Result<Option<RoleSet>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(SessionError::upstream("lookup roles", "503 service unavailable"));
        }
        Ok(self.registered.lock().get(client_id).cloned())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
