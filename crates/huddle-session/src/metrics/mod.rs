//! Metrics for Huddle session coordination.

pub mod cache;

pub use cache::{CacheMetrics, describe_cache_metrics};
