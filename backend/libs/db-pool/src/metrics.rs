//! Prometheus gauges for the connection pool

use prometheus::{register_int_gauge_vec, IntGaugeVec};
use sqlx::PgPool;

lazy_static::lazy_static! {
    /// Connection count by state (idle/active/max)
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connection count by state",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: u32,
    pub max: u32,
}

pub fn pool_status(pool: &PgPool) -> PoolStatus {
    PoolStatus {
        size: pool.size(),
        idle: pool.num_idle() as u32,
        max: pool.options().get_max_connections(),
    }
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let status = pool_status(pool);

    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "idle"])
        .set(status.idle as i64);
    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "active"])
        .set(status.size.saturating_sub(status.idle) as i64);
    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "max"])
        .set(status.max as i64);
}
