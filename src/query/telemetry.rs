use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-database query counters. Owned by a [`crate::Database`]; nothing here is global.
#[derive(Debug, Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub client_errors_total: AtomicU64,
    pub full_scans_total: AtomicU64,
    pub slow_queries_total: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub client_errors_total: u64,
    pub full_scans_total: u64,
    pub slow_queries_total: u64,
}

impl Metrics {
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            client_errors_total: self.client_errors_total.load(Ordering::Relaxed),
            full_scans_total: self.full_scans_total.load(Ordering::Relaxed),
            slow_queries_total: self.slow_queries_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_client_error(&self, collection: &str, err: &crate::errors::DbError) {
        self.client_errors_total.fetch_add(1, Ordering::Relaxed);
        log::info!(target: "mangolite::query", "rejected find on {collection}: {err}");
    }

    /// Counts one executed find and logs it; slow ones also go to `mangolite::metrics`.
    pub fn record_query(&self, q: &QueryLog<'_>, slow_query_ms: u64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        if q.full_scan {
            self.full_scans_total.fetch_add(1, Ordering::Relaxed);
        }
        let line = serde_json::json!({
            "collection": q.collection,
            "index": q.index,
            "full_scan": q.full_scan,
            "duration_ms": q.duration_ms,
            "docs_examined": q.docs_examined,
            "results": q.results,
        });
        log::info!(target: "mangolite::query", "{line}");
        if q.duration_ms >= slow_query_ms {
            self.slow_queries_total.fetch_add(1, Ordering::Relaxed);
            log::warn!(target: "mangolite::metrics", "slow query: {line}");
        }
    }

    /// OpenMetrics text exposition.
    #[must_use]
    pub fn metrics_text(&self) -> String {
        let m = self.snapshot();
        format!(
            "mangolite_queries_total {}\n\
             mangolite_client_errors_total {}\n\
             mangolite_full_scans_total {}\n\
             mangolite_slow_queries_total {}\n",
            m.queries_total, m.client_errors_total, m.full_scans_total, m.slow_queries_total,
        )
    }
}

/// One executed find, as recorded by [`Metrics::record_query`].
#[derive(Debug, Clone, Copy)]
pub struct QueryLog<'a> {
    pub collection: &'a str,
    pub index: &'a str,
    pub full_scan: bool,
    pub duration_ms: u64,
    pub docs_examined: u64,
    pub results: u64,
}
