//! Webhook event types and classification.
//!
//! The raw body is decoded exactly once, after authentication, into a closed
//! set of variants with an `Unknown` fallback so new provider event types
//! never break delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::signature::Verification;
use crate::error::WebhookError;

pub const RECORDING_STARTED: &str = "recording.started";
pub const RECORDING_READY: &str = "recording.ready-to-download";
pub const RECORDING_ERROR: &str = "recording.error";

/// Placeholder written for fields that could not be resolved.
pub const UNAVAILABLE: &str = "unavailable";

/// Event type, decoded by a total mapping from the wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    RecordingStarted,
    RecordingReady,
    RecordingError,
    Unknown(String),
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            RECORDING_STARTED => EventKind::RecordingStarted,
            RECORDING_READY => EventKind::RecordingReady,
            RECORDING_ERROR => EventKind::RecordingError,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::RecordingStarted => RECORDING_STARTED,
            EventKind::RecordingReady => RECORDING_READY,
            EventKind::RecordingError => RECORDING_ERROR,
            EventKind::Unknown(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingStartedPayload {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub recording_id: String,
    #[serde(default)]
    pub started_by: Option<String>,
    /// Seconds since epoch; the provider may send fractional seconds
    #[serde(default)]
    pub start_ts: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingReadyPayload {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub recording_id: String,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub start_ts: Option<f64>,
    #[serde(default, alias = "s3key")]
    pub s3_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingErrorPayload {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub recording_id: String,
    #[serde(default, alias = "error")]
    pub error_msg: Option<String>,
}

/// A classified webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    RecordingStarted(RecordingStartedPayload),
    RecordingReady(RecordingReadyPayload),
    RecordingError(RecordingErrorPayload),
    Unknown { event_type: String, payload: Value },
}

/// Decode a raw body into a `WebhookEvent`.
///
/// Fails with `MalformedPayload` when the body is not a JSON object, has no
/// string `type`, or carries a payload of the wrong shape for a known type.
pub fn classify(raw_body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let body: Value = serde_json::from_slice(raw_body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    let Value::Object(mut envelope) = body else {
        return Err(WebhookError::MalformedPayload(
            "body is not a JSON object".to_string(),
        ));
    };

    let event_type = match envelope.remove("type") {
        Some(Value::String(event_type)) => event_type,
        Some(_) => {
            return Err(WebhookError::MalformedPayload(
                "`type` field is not a string".to_string(),
            ))
        }
        None => {
            return Err(WebhookError::MalformedPayload(
                "missing `type` field".to_string(),
            ))
        }
    };

    let payload = match envelope.remove("payload") {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(other) => other,
    };

    let event = match EventKind::from_type(&event_type) {
        EventKind::RecordingStarted => WebhookEvent::RecordingStarted(decode_payload(payload)?),
        EventKind::RecordingReady => WebhookEvent::RecordingReady(decode_payload(payload)?),
        EventKind::RecordingError => WebhookEvent::RecordingError(decode_payload(payload)?),
        EventKind::Unknown(event_type) => WebhookEvent::Unknown {
            event_type,
            payload,
        },
    };

    Ok(event)
}

fn decode_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, WebhookError> {
    serde_json::from_value(payload).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebhookEvent::RecordingStarted(_) => EventKind::RecordingStarted,
            WebhookEvent::RecordingReady(_) => EventKind::RecordingReady,
            WebhookEvent::RecordingError(_) => EventKind::RecordingError,
            WebhookEvent::Unknown { event_type, .. } => EventKind::Unknown(event_type.clone()),
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        match self {
            WebhookEvent::RecordingStarted(p) => Some(&p.room_name),
            WebhookEvent::RecordingReady(p) => Some(&p.room_name),
            WebhookEvent::RecordingError(p) => Some(&p.room_name),
            WebhookEvent::Unknown { .. } => None,
        }
    }

    pub fn recording_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::RecordingStarted(p) => Some(&p.recording_id),
            WebhookEvent::RecordingReady(p) => Some(&p.recording_id),
            WebhookEvent::RecordingError(p) => Some(&p.recording_id),
            WebhookEvent::Unknown { .. } => None,
        }
    }

    /// Render the log line for events that need no enrichment.
    ///
    /// Ready events render with both URLs unavailable; the receiver logs
    /// them through `EnrichedLogRecord` instead.
    pub fn log_line(&self, verification: Verification) -> String {
        match self {
            WebhookEvent::RecordingStarted(p) => format!(
                "RECORDING STARTED | Room: {} | Recording ID: {} | Started by: {} | Started at: {} | Signature: {}",
                p.room_name,
                p.recording_id,
                p.started_by.as_deref().unwrap_or("unknown"),
                format_timestamp(p.start_ts),
                verification.as_str(),
            ),
            WebhookEvent::RecordingReady(p) => {
                ready_log_line(p, None, None, verification)
            }
            WebhookEvent::RecordingError(p) => format!(
                "RECORDING ERROR | Room: {} | Recording ID: {} | Error: {} | Signature: {}",
                p.room_name,
                p.recording_id,
                p.error_msg.as_deref().unwrap_or("unknown error"),
                verification.as_str(),
            ),
            WebhookEvent::Unknown {
                event_type,
                payload,
            } => format!(
                "UNKNOWN EVENT | Type: {} | Payload: {} | Signature: {}",
                event_type,
                payload,
                verification.as_str(),
            ),
        }
    }
}

pub(crate) fn ready_log_line(
    payload: &RecordingReadyPayload,
    download_url: Option<&str>,
    access_url: Option<&str>,
    verification: Verification,
) -> String {
    format!(
        "RECORDING READY | Room: {} | Recording ID: {} | Duration: {} | Started at: {} | Storage key: {} | Download URL: {} | Access link: {} | Signature: {}",
        payload.room_name,
        payload.recording_id,
        payload
            .duration
            .map(|d| format!("{}s", d.round() as i64))
            .unwrap_or_else(|| "unknown".to_string()),
        format_timestamp(payload.start_ts),
        payload.s3_key.as_deref().unwrap_or("none"),
        download_url.unwrap_or(UNAVAILABLE),
        access_url.unwrap_or(UNAVAILABLE),
        verification.as_str(),
    )
}

/// Format epoch seconds as RFC 3339, or `unknown` when absent or out of range.
pub fn format_timestamp(ts: Option<f64>) -> String {
    ts.and_then(|secs| DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_total_mapping() {
        assert_eq!(EventKind::from_type("recording.started"), EventKind::RecordingStarted);
        assert_eq!(
            EventKind::from_type("recording.ready-to-download"),
            EventKind::RecordingReady
        );
        assert_eq!(EventKind::from_type("recording.error"), EventKind::RecordingError);
        assert_eq!(
            EventKind::from_type("meeting.ended"),
            EventKind::Unknown("meeting.ended".to_string())
        );
        assert_eq!(EventKind::from_type("").as_str(), "");
    }

    #[test]
    fn test_classify_started() {
        let body = br#"{"type":"recording.started","payload":{"room_name":"demo","recording_id":"r1","started_by":"alice","start_ts":1700000000}}"#;

        let event = classify(body).unwrap();
        assert_eq!(
            event,
            WebhookEvent::RecordingStarted(RecordingStartedPayload {
                room_name: "demo".to_string(),
                recording_id: "r1".to_string(),
                started_by: Some("alice".to_string()),
                start_ts: Some(1700000000.0),
            })
        );
        assert_eq!(event.kind(), EventKind::RecordingStarted);
    }

    #[test]
    fn test_classify_ready_with_float_duration_and_s3key_alias() {
        let body = br#"{"type":"recording.ready-to-download","payload":{"room_name":"demo","recording_id":"r1","duration":61.7,"start_ts":1700000000.5,"s3key":"bucket/demo/r1.mp4"}}"#;

        match classify(body).unwrap() {
            WebhookEvent::RecordingReady(p) => {
                assert_eq!(p.duration, Some(61.7));
                assert_eq!(p.s3_key.as_deref(), Some("bucket/demo/r1.mp4"));
            }
            other => panic!("Expected RecordingReady, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_error_alias() {
        let body = br#"{"type":"recording.error","payload":{"room_name":"demo","recording_id":"r1","error":"encoder crashed"}}"#;

        match classify(body).unwrap() {
            WebhookEvent::RecordingError(p) => {
                assert_eq!(p.error_msg.as_deref(), Some("encoder crashed"));
            }
            other => panic!("Expected RecordingError, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_unknown_keeps_payload() {
        let body = br#"{"type":"participant.joined","payload":{"user":"bob"}}"#;

        match classify(body).unwrap() {
            WebhookEvent::Unknown {
                event_type,
                payload,
            } => {
                assert_eq!(event_type, "participant.joined");
                assert_eq!(payload["user"], "bob");
            }
            other => panic!("Expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_missing_payload_is_lenient() {
        let event = classify(br#"{"type":"recording.started"}"#).unwrap();
        assert_eq!(event.room_name(), Some(""));
    }

    #[test]
    fn test_classify_malformed() {
        assert!(matches!(classify(b""), Err(WebhookError::MalformedPayload(_))));
        assert!(matches!(classify(b"not json"), Err(WebhookError::MalformedPayload(_))));
        assert!(matches!(
            classify(br#"{"payload":{}}"#),
            Err(WebhookError::MalformedPayload(_))
        ));
        assert!(matches!(
            classify(br#"{"type":42}"#),
            Err(WebhookError::MalformedPayload(_))
        ));
        assert!(matches!(
            classify(br#"{"type":"recording.started","payload":"oops"}"#),
            Err(WebhookError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_classify_rejects_non_object_bodies() {
        for body in [
            &br#"["recording.started",{"room_name":"demo"}]"#[..],
            br#""recording.started""#,
            b"42",
            b"null",
        ] {
            assert!(
                matches!(classify(body), Err(WebhookError::MalformedPayload(_))),
                "accepted {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_started_log_line() {
        let event = classify(
            br#"{"type":"recording.started","payload":{"room_name":"demo","recording_id":"r1","started_by":"alice","start_ts":1700000000}}"#,
        )
        .unwrap();

        let line = event.log_line(Verification::Verified);
        assert!(line.contains("RECORDING STARTED"));
        assert!(line.contains("Room: demo"));
        assert!(line.contains("Recording ID: r1"));
        assert!(line.contains("Started by: alice"));
        assert!(line.contains("2023-11-14T22:13:20+00:00"));
        assert!(line.ends_with("Signature: verified"));
    }

    #[test]
    fn test_unknown_log_line_marks_unverified() {
        let event = classify(br#"{"type":"x.y","payload":{"a":1}}"#).unwrap();
        let line = event.log_line(Verification::Unverified);
        assert!(line.starts_with("UNKNOWN EVENT | Type: x.y"));
        assert!(line.contains(r#"{"a":1}"#));
        assert!(line.ends_with("Signature: unverified"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(None), "unknown");
        assert_eq!(format_timestamp(Some(0.0)), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_timestamp(Some(f64::MAX)), "unknown");
    }
}
