//! Bounded polling against eventually-consistent collaborators.

mod backoff;
mod schedule;

pub use backoff::poll_until;
pub use schedule::BackoffSchedule;
