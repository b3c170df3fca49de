//! Join result types.

use tokio::task::JoinHandle;
use tracing::warn;

/// Outcome of a successful join.
#[derive(Debug)]
pub struct JoinResult<C, S> {
    /// The attached container.
    pub container: C,
    /// Services handed out by the host alongside the container.
    pub services: S,
    /// Canonical id of the container, identical for every client of the
    /// session.
    pub container_id: String,
    /// True only for the client that created the container and won the
    /// race to register it.
    pub created: bool,
    /// Background registration of the container's connection ids, present
    /// only when the joiner has a registrar.
    pub registration: Option<JoinHandle<()>>,
}

impl<C, S> JoinResult<C, S> {
    /// Returns true if this join created the container.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Returns the canonical container id.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Waits until the connection ids of this join have been registered.
    ///
    /// Returns immediately if no registration was started or it was already
    /// awaited.
    pub async fn wait_for_registration(&mut self) {
        if let Some(handle) = self.registration.take()
            && let Err(error) = handle.await
        {
            warn!(container_id = %self.container_id, %error, "connection registration task failed");
        }
    }

    /// Splits the result into container and services.
    pub fn into_parts(self) -> (C, S) {
        (self.container, self.services)
    }
}
