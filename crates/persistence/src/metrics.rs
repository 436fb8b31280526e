//! Complaint store metrics.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Gauges for the connection pool: active, idle, open and configured maximum.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_max").set(pool.options().get_max_connections() as f64);
}

/// Times one repository operation into
/// `database_query_duration_seconds{query}`.
///
/// Dropping the timer without calling [`record`](Self::record) records
/// nothing, so failed queries that return early stay out of the histogram.
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("database_query_duration_seconds", "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}
