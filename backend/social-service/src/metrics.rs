use actix_web::{HttpResponse, Responder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    IntCounterVec::new(Opts::new(name, help), labels)
        .and_then(|c| {
            prometheus::default_registry().register(Box::new(c.clone()))?;
            Ok(c)
        })
        .unwrap_or_else(|e| {
            tracing::error!("failed to create {} counter: {}", name, e);
            IntCounterVec::new(Opts::new(format!("dummy_{}", name), "dummy"), labels)
                .expect("dummy counter")
        })
}

/// Notifications written, by type
static NOTIFICATIONS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "social_notifications_created_total",
        "Notifications created as a side effect of a write",
        &["type"],
    )
});

/// Toggle writes (like, bookmark, follow) by kind and direction
static TOGGLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "social_toggles_total",
        "Toggle mutations applied",
        &["kind", "action"],
    )
});

static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "social_logins_total",
        "Successful sign-ins by method",
        &["method"],
    )
});

static ORPHAN_UPLOADS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "social_orphan_uploads_deleted_total",
        "Unattached uploads removed by the cleanup job",
    )
    .and_then(|c| {
        prometheus::default_registry().register(Box::new(c.clone()))?;
        Ok(c)
    })
    .unwrap_or_else(|e| {
        tracing::error!("failed to create orphan uploads counter: {}", e);
        IntCounter::new("dummy_orphan_uploads", "dummy").expect("dummy counter")
    })
});

pub fn record_notification(notification_type: &str) {
    NOTIFICATIONS_CREATED_TOTAL
        .with_label_values(&[notification_type])
        .inc();
}

pub fn record_toggle(kind: &str, action: &str) {
    TOGGLES_TOTAL.with_label_values(&[kind, action]).inc();
}

pub fn record_login(method: &str) {
    LOGINS_TOTAL.with_label_values(&[method]).inc();
}

pub fn record_orphans_deleted(count: u64) {
    ORPHAN_UPLOADS_DELETED_TOTAL.inc_by(count);
}
