//! Single-flight cache with a fixed time-to-live.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use huddle_core::{Result, SessionError};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::metrics::CacheMetrics;

type PendingFuture<T> = Shared<BoxFuture<'static, Result<T>>>;

/// State of one key.
enum Slot<T> {
    /// A producer is running; every caller awaits the same future.
    Pending {
        future: PendingFuture<T>,
        generation: u64,
    },
    /// The producer succeeded; served verbatim until `expires_at`.
    Ready { value: T, expires_at: Instant },
}

struct Slots<T> {
    entries: HashMap<String, Slot<T>>,
    next_generation: u64,
}

/// What a caller has to do after consulting the slot map.
enum Claim<T> {
    Hit(T),
    Wait {
        future: PendingFuture<T>,
        generation: u64,
        started: bool,
    },
}

/// Deduplicates concurrent requests per key and memoizes successes.
///
/// Failures are never stored: the slot is cleared and the next call runs a
/// fresh producer. A producer that panics counts as an `Upstream` failure. Expired values are evicted lazily when their key is next
/// looked up.
///
/// Time is read from [`tokio::time::Instant`], so tests can drive expiry with
/// a paused runtime clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use huddle_session::cache::SingleFlightCache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> huddle_core::Result<()> {
/// let cache = SingleFlightCache::new("example", Duration::from_secs(60));
///
/// let value = cache.resolve("answer", || async { Ok(42u32) }).await?;
/// assert_eq!(value, 42);
///
/// // Served from cache, the producer is not invoked again.
/// let value = cache.resolve("answer", || async { Ok(0u32) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
pub struct SingleFlightCache<T> {
    name: String,
    ttl: Duration,
    slots: Mutex<Slots<T>>,
    metrics: CacheMetrics,
}

impl<T> SingleFlightCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache whose values live for `ttl` after they resolve.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        let name = name.into();
        Self {
            metrics: CacheMetrics::new(name.clone()),
            name,
            ttl,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Returns the value for `key`, running `producer` only when no live
    /// value and no in-flight resolution exist.
    ///
    /// Callers arriving while a resolution is pending receive its outcome,
    /// whether success or failure.
    pub async fn resolve<F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let start = std::time::Instant::now();

        let (future, generation, started) = match self.claim(key, producer) {
            Claim::Hit(value) => {
                self.metrics
                    .record_resolve_duration("hit", start.elapsed());
                return Ok(value);
            },
            Claim::Wait {
                future,
                generation,
                started,
            } => (future, generation, started),
        };

        let outcome = future.await;
        self.settle(key, generation, &outcome);

        let label = if started { "miss" } else { "join" };
        self.metrics.record_resolve_duration(label, start.elapsed());

        outcome
    }

    /// Returns the live value for `key` without producing one.
    pub fn peek(&self, key: &str) -> Option<T> {
        let slots = self.slots.lock();
        match slots.entries.get(key) {
            Some(Slot::Ready { value, expires_at }) if Instant::now() < *expires_at => {
                Some(value.clone())
            },
            _ => None,
        }
    }

    /// Drops the entry for `key`.
    ///
    /// Callers already awaiting a pending resolution still receive its
    /// outcome; it is just not stored.
    pub fn invalidate(&self, key: &str) {
        if self.slots.lock().entries.remove(key).is_some() {
            self.metrics.record_eviction("manual");
            debug!(cache = %self.name, key, "cache entry invalidated");
        }
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        let mut slots = self.slots.lock();
        for _ in slots.entries.drain() {
            self.metrics.record_eviction("manual");
        }
    }

    /// Returns the number of slots, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    /// Returns true if no slots are held.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().entries.is_empty()
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cache name used in logs and metric labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metrics recorder.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Consults the slot map and registers a new pending resolution on miss.
    ///
    /// The producer is wrapped unpolled, so nothing it does runs under the
    /// lock.
    fn claim<F, Fut>(&self, key: &str, producer: F) -> Claim<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slots = self.slots.lock();

        match slots.entries.get(key) {
            Some(Slot::Ready { value, expires_at }) if Instant::now() < *expires_at => {
                self.metrics.record_hit();
                trace!(cache = %self.name, key, "cache hit");
                return Claim::Hit(value.clone());
            },
            Some(Slot::Pending { future, generation }) => {
                self.metrics.record_join();
                trace!(cache = %self.name, key, "joining in-flight resolution");
                return Claim::Wait {
                    future: future.clone(),
                    generation: *generation,
                    started: false,
                };
            },
            Some(Slot::Ready { .. }) => {
                self.metrics.record_eviction("ttl");
                debug!(cache = %self.name, key, "cache entry expired");
            },
            None => {},
        }

        self.metrics.record_miss();
        let generation = slots.next_generation;
        slots.next_generation += 1;

        // A panicking producer would poison the shared future; turn it into
        // an ordinary failure so the slot is cleared.
        let cache = self.name.clone();
        let future = AssertUnwindSafe(async move { producer().await })
            .catch_unwind()
            .map(move |outcome| {
                outcome.unwrap_or_else(|_| {
                    Err(SessionError::upstream(
                        format!("resolve {cache}"),
                        "producer panicked",
                    ))
                })
            })
            .boxed()
            .shared();
        slots.entries.insert(
            key.to_owned(),
            Slot::Pending {
                future: future.clone(),
                generation,
            },
        );

        Claim::Wait {
            future,
            generation,
            started: true,
        }
    }

    /// Stores or clears the outcome of the resolution `generation`.
    ///
    /// Only the first waiter to finish changes the slot; later waiters find
    /// it no longer pending under their generation.
    fn settle(&self, key: &str, generation: u64, outcome: &Result<T>) {
        let mut slots = self.slots.lock();

        let owns_slot = matches!(
            slots.entries.get(key),
            Some(Slot::Pending { generation: current, .. }) if *current == generation
        );
        if !owns_slot {
            return;
        }

        match outcome {
            Ok(value) => {
                slots.entries.insert(
                    key.to_owned(),
                    Slot::Ready {
                        value: value.clone(),
                        expires_at: Instant::now() + self.ttl,
                    },
                );
                debug!(cache = %self.name, key, ttl = ?self.ttl, "cached resolved value");
            },
            Err(error) => {
                slots.entries.remove(key);
                debug!(cache = %self.name, key, %error, "resolution failed, not caching");
            },
        }
    }
}

impl<T> fmt::Debug for SingleFlightCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &self.slots.lock().entries.len())
            .finish()
    }
}
