//! Webhook receiver for provider recording callbacks.
//!
//! This module provides an always-on HTTP endpoint that:
//! - Authenticates deliveries by HMAC signature over the raw body
//! - Classifies them into recording started/ready/error or unknown events
//! - Enriches ready events with download and access links
//! - Appends one line per event to the append-only event log
//! - Acknowledges with 200 unless the request is unauthenticated or undecodable

pub mod enrich;
pub mod event;
pub mod event_log;
pub mod handlers;
pub mod signature;

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::error::WebhookError;

pub use enrich::{enrich_ready, EnrichedLogRecord};
pub use event::{classify, EventKind, WebhookEvent};
pub use event_log::EventLog;
pub use handlers::{
    health, receive_webhook, record_event, test_probe, verification_probe, AppState,
    HealthResponse, WebhookResponse,
};
pub use signature::{
    compute_signature, is_signature_verification_enabled, verify_signature, Verification,
};

/// Build the receiver router.
///
/// Unsupported methods on any route get 405 from the method router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(verification_probe).post(receive_webhook))
        .route("/webhook", get(verification_probe).post(receive_webhook))
        .route("/health", get(health))
        .route("/test", get(test_probe))
        .layer(CatchPanicLayer::custom(internal_fault))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outermost fault boundary: a panicking handler becomes a logged 500.
fn internal_fault(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "webhook_internal_fault");
    eprintln!("webhook handler panicked: {detail}");

    WebhookError::InternalFault(detail).into_response()
}
