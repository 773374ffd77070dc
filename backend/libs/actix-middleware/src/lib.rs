//! # Actix Middleware Library
//!
//! Shared middleware for the social backend
//!
//! ## Modules
//! - `session_auth`: cookie session authentication and the `SessionUser` extractor
//! - `request_trace`: request id propagation and access logging
//! - `metrics`: Prometheus request counters and latency histograms

pub mod metrics;
pub mod request_trace;
pub mod session_auth;

pub use metrics::HttpMetrics;
pub use request_trace::{RequestId, RequestTrace, REQUEST_ID_HEADER};
pub use session_auth::{
    SessionAuth, SessionCookieConfig, SessionLookupError, SessionUser, SessionValidator,
    ValidatedSession, SESSION_COOKIE_NAME,
};
