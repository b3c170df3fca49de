//! Container join coordination.
//!
//! Many clients joining the same session race to create its backing
//! container. [`SessionJoiner`] lets each of them either attach to the
//! container the directory already knows or create one, and unwinds a lost
//! creation race by disposing the local container and attaching to the
//! winner's.

mod joiner;
mod result;
mod traits;

pub use joiner::SessionJoiner;
pub use result::JoinResult;
pub use traits::{ContainerDirectory, ContainerHost, FirstCreated};
