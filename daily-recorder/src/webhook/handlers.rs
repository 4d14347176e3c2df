//! Webhook endpoint handlers.
//!
//! Every delivery moves through
//! `Received → Authenticated → Classified → Dispatched → Acknowledged`.
//! Anything short of an internal fault ends in a 200 so the provider never
//! retries or suspends the subscription. Ready events are enriched in a
//! spawned task after the acknowledgement is produced.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::enrich::enrich_ready;
use super::event::{classify, WebhookEvent};
use super::event_log::EventLog;
use super::signature::{signature_from_headers, verify_signature, Verification};
use crate::api::RecordingLookup;
use crate::error::WebhookError;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lookup: Arc<dyn RecordingLookup>,
    pub event_log: EventLog,
}

impl AppState {
    pub fn new(config: Config, lookup: Arc<dyn RecordingLookup>, event_log: EventLog) -> Self {
        Self {
            config: Arc::new(config),
            lookup,
            event_log,
        }
    }
}

// =============================================================================
// Probes
// =============================================================================

#[derive(Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Verification probe hit by the provider's subscription setup. Unauthenticated.
pub async fn verification_probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "ok",
        message: "Webhook endpoint is ready",
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub log_file: String,
    pub signature_verification: bool,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        log_file: state.event_log.path().display().to_string(),
        signature_verification: state.config.verification_enabled(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Diagnostic probe: writes a marker line to the event log.
pub async fn test_probe(State(state): State<AppState>) -> Json<ProbeResponse> {
    state
        .event_log
        .append("TEST EVENT | Diagnostic probe received")
        .await;

    Json(ProbeResponse {
        status: "ok",
        message: "Test event logged",
    })
}

// =============================================================================
// Event delivery
// =============================================================================

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// Event delivery endpoint, mounted at both `/` and `/webhook`.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let signature = signature_from_headers(&headers);

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "webhook_received"
    );

    let verification = authenticate(&state, &body, signature).await?;

    let event = match classify(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, body_length = body.len(), "webhook_payload_malformed");
            state
                .event_log
                .append(&format!(
                    "MALFORMED PAYLOAD | {} | Signature: {}",
                    e,
                    verification.as_str()
                ))
                .await;
            return Err(e);
        }
    };

    info!(
        event_type = %event.kind().as_str(),
        room_name = ?event.room_name(),
        recording_id = ?event.recording_id(),
        verification = verification.as_str(),
        "webhook_classified"
    );

    dispatch(&state, event, verification).await;

    Ok(Json(WebhookResponse { status: "received" }))
}

/// Check the signature when a secret is configured.
async fn authenticate(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Verification, WebhookError> {
    let secret = match state.config.webhook_secret.as_deref() {
        Some(secret) if state.config.verification_enabled() => secret,
        _ => {
            warn!("webhook_signature_verification_disabled");
            return Ok(Verification::Unverified);
        }
    };

    if verify_signature(body, signature.unwrap_or(""), secret.as_bytes()) {
        return Ok(Verification::Verified);
    }

    warn!(has_signature = signature.is_some(), "webhook_signature_invalid");
    state
        .event_log
        .append(&format!(
            "AUTH FAILURE | Invalid signature | Signature header present: {}",
            signature.is_some()
        ))
        .await;

    Err(WebhookError::AuthenticationFailure)
}

/// Route a classified event to its handler.
///
/// Ready events are enriched in the background so the acknowledgement
/// never waits on the provider API.
async fn dispatch(state: &AppState, event: WebhookEvent, verification: Verification) {
    match event {
        WebhookEvent::RecordingReady(_) => {
            let state = state.clone();
            tokio::spawn(async move {
                record_event(&state, event, verification).await;
            });
        }
        other => record_event(state, other, verification).await,
    }
}

/// Produce and append the log line for an event, enriching ready events first.
pub async fn record_event(state: &AppState, event: WebhookEvent, verification: Verification) {
    let line = match event {
        WebhookEvent::RecordingReady(payload) => {
            let record = enrich_ready(
                state.lookup.as_ref(),
                payload,
                state.config.access_link_valid_secs,
            )
            .await;
            record.log_line(verification)
        }
        other => other.log_line(verification),
    };

    state.event_log.append(&line).await;
}
