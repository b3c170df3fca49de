//! Request deduplication cache.
//!
//! Turns repeated, concurrent lookups for the same key into a single
//! in-flight request whose successful result is memoized for a fixed
//! lifetime.

mod single_flight;

pub use single_flight::SingleFlightCache;
