//! Fixed retry schedules.

use std::time::Duration;

use serde::Deserialize;

/// Ordered, finite list of waits between poll attempts.
///
/// The first attempt runs immediately, then one retry follows each entry,
/// so a schedule of `n` entries allows at most `n + 1` attempts.
///
/// Deserializes from a list of milliseconds, e.g. `[100, 200, 200]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<u64>")]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    /// Waits used when registering a client with the role authority.
    pub const REGISTRATION_MILLIS: [u64; 5] = [100, 200, 200, 400, 600];

    /// Creates a schedule from explicit durations.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Creates a schedule from millisecond values.
    ///
    /// ```
    /// use std::time::Duration;
    /// use huddle_session::poll::BackoffSchedule;
    ///
    /// let schedule = BackoffSchedule::from_millis(&[100, 200]);
    /// assert_eq!(schedule.max_attempts(), 3);
    /// assert_eq!(schedule.total_wait(), Duration::from_millis(300));
    /// ```
    pub fn from_millis(millis: &[u64]) -> Self {
        Self::new(millis.iter().copied().map(Duration::from_millis).collect())
    }

    /// Default registration schedule (100/200/200/400/600 ms).
    pub fn registration() -> Self {
        Self::from_millis(&Self::REGISTRATION_MILLIS)
    }

    /// Schedule that never retries.
    pub fn immediate() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the waits in order.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Returns the number of retries.
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Returns true if the schedule has no retries.
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Returns the upper bound on attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.delays.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Returns the sum of all waits.
    pub fn total_wait(&self) -> Duration {
        self.delays.iter().sum()
    }
}

impl From<Vec<u64>> for BackoffSchedule {
    fn from(millis: Vec<u64>) -> Self {
        Self::from_millis(&millis)
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::registration()
    }
}
