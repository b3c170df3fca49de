//! Collaborator traits for container coordination.

use async_trait::async_trait;
use huddle_core::{ContainerLookup, Result, SessionContext};

/// Remote mapping from a session to its container id.
#[async_trait]
pub trait ContainerDirectory: Send + Sync {
    /// Asks whether the session already has a container.
    async fn lookup(&self, context: &SessionContext) -> Result<ContainerLookup>;

    /// Records `container_id` for the session unless one is already set.
    ///
    /// Returns true if this call's id became the session's container.
    async fn try_set_container_id(
        &self,
        context: &SessionContext,
        container_id: &str,
    ) -> Result<bool>;
}

/// Creates, publishes and opens containers.
///
/// A created container stays local until [`attach`](Self::attach) publishes
/// it and returns its canonical id.
#[async_trait]
pub trait ContainerHost: Send + Sync {
    /// Describes the initial contents of a container.
    type Schema: Send + Sync;
    /// A handle to a local or attached container.
    ///
    /// Cloned into the background task that waits for the container's
    /// connection, so it should be a cheap handle.
    type Container: Clone + Send + Sync + 'static;
    /// Services delivered with a container, e.g. its audience.
    type Services: Send;

    /// Creates a new, unpublished container.
    async fn create(&self, schema: &Self::Schema) -> Result<(Self::Container, Self::Services)>;

    /// Publishes a local container and returns its canonical id.
    async fn attach(&self, container: &Self::Container) -> Result<String>;

    /// Releases a container that will not be used.
    fn dispose(&self, container: Self::Container);

    /// Opens an existing container by canonical id.
    async fn open(
        &self,
        container_id: &str,
        schema: &Self::Schema,
    ) -> Result<(Self::Container, Self::Services)>;

    /// Waits until the container's transport is connected and returns the
    /// local connection ids associated with it.
    async fn wait_for_connection(&self, container: &Self::Container) -> Result<Vec<String>>;
}

/// Hook run once on a freshly created container before it is published.
#[async_trait]
pub trait FirstCreated<C: Send + Sync>: Send + Sync {
    async fn initialize(&self, container: &C) -> Result<()>;
}
