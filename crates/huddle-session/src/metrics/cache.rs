//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static DESCRIBE: Once = Once::new();

/// Registra las descripciones de las metricas de cache.
/// Idempotente: solo la primera llamada tiene efecto.
pub fn describe_cache_metrics() {
    DESCRIBE.call_once(|| {
        metrics::describe_counter!("huddle_cache_hits_total", "Total number of cache hits");
        metrics::describe_counter!("huddle_cache_misses_total", "Total number of cache misses");
        metrics::describe_counter!(
            "huddle_cache_inflight_joins_total",
            "Requests that attached to an in-flight resolution"
        );
        metrics::describe_counter!(
            "huddle_cache_evictions_total",
            "Total number of cache evictions"
        );
        metrics::describe_histogram!(
            "huddle_cache_resolve_seconds",
            "Time spent resolving a cache key"
        );
    });
}

/// Recorder de metricas para una instancia de cache.
/// Los contadores atomicos locales permiten calcular el hit rate sin exporter.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    cache: String,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    joins: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new(cache: impl Into<String>) -> Self {
        describe_cache_metrics();
        Self {
            cache: cache.into(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            joins: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("huddle_cache_hits_total", "cache" => self.cache.clone()).increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("huddle_cache_misses_total", "cache" => self.cache.clone()).increment(1);
    }

    /// Registra una request que se unio a una resolucion en curso
    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
        counter!("huddle_cache_inflight_joins_total", "cache" => self.cache.clone())
            .increment(1);
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str) {
        counter!(
            "huddle_cache_evictions_total",
            "cache" => self.cache.clone(),
            "reason" => reason
        )
        .increment(1);
    }

    /// Registra la duracion de una resolucion
    pub fn record_resolve_duration(&self, outcome: &'static str, duration: Duration) {
        histogram!(
            "huddle_cache_resolve_seconds",
            "cache" => self.cache.clone(),
            "outcome" => outcome
        )
        .record(duration.as_secs_f64());
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Retorna el numero de hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Retorna el numero de joins a resoluciones en curso
    pub fn joins(&self) -> u64 {
        self.joins.load(Ordering::Relaxed)
    }
}
