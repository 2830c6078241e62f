use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rule_replies_total: AtomicU64,
    default_replies_total: AtomicU64,
    fallback_total: AtomicU64,
    entities_found_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rule_replies_total: u64,
    pub default_replies_total: u64,
    pub fallback_total: u64,
    pub entities_found_total: u64,
    pub avg_latency_micros: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rule_reply(&self) {
        self.rule_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_default_reply(&self) {
        self.default_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Global `_fallback` or the built-in unresolved message.
    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_entities_found(&self, found: usize) {
        self.entities_found_total
            .fetch_add(found as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            rule_replies_total: self.rule_replies_total.load(Ordering::Relaxed),
            default_replies_total: self.default_replies_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            entities_found_total: self.entities_found_total.load(Ordering::Relaxed),
            avg_latency_micros: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,coco_responder=info,coco_training=info,coco_ml=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency() {
        let metrics = AppMetrics::shared();
        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_rule_reply();
        metrics.inc_fallback();
        metrics.add_entities_found(3);
        metrics.observe_latency(Duration::from_micros(300));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.rule_replies_total, 1);
        assert_eq!(snapshot.fallback_total, 1);
        assert_eq!(snapshot.entities_found_total, 3);
        assert_eq!(snapshot.avg_latency_micros, 150.0);
    }

    #[test]
    fn empty_snapshot_has_zero_latency() {
        assert_eq!(AppMetrics::default().snapshot().avg_latency_micros, 0.0);
    }
}
