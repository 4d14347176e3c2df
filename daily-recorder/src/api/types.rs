//! Provider REST resource types.
//!
//! Only the fields the tools read are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Listing envelope used by `GET /rooms` and `GET /recordings`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub total_count: Option<u64>,
    pub data: Vec<T>,
}

/// A meeting room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Properties sent when creating a room.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRoomRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub privacy: RoomPrivacy,
    pub properties: RoomProperties,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomPrivacy {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RoomProperties {
    /// Expiry as seconds since epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_recording: Option<String>,
}

/// Recording metadata returned by `GET /recordings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub start_ts: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub s3key: Option<String>,
    #[serde(default)]
    pub download_link: Option<String>,
}

/// Time-limited access link returned by `GET /recordings/{id}/access-link`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLink {
    pub download_link: String,
    #[serde(default)]
    pub expires: Option<i64>,
}

/// Acknowledgement of a recording start/stop request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingControl {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
}

/// Provider-side webhook subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    pub uuid: String,
    pub url: String,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub failed_count: Option<u64>,
    #[serde(default)]
    pub hmac: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for creating or updating a webhook subscription.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,
}

/// Response to a delete call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_list_envelope() {
        let json = r#"{
            "total_count": 2,
            "data": [
                {"id": "r1", "room_name": "demo", "start_ts": 1700000000, "duration": 42, "status": "finished"},
                {"id": "r2", "room_name": "demo", "extra_field": true}
            ]
        }"#;

        let list: ListResponse<Recording> = serde_json::from_str(json).unwrap();
        assert_eq!(list.total_count, Some(2));
        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].duration, Some(42.0));
        assert!(list.data[1].status.is_none());
    }

    #[test]
    fn test_webhook_subscription_camel_case() {
        let json = r#"{
            "uuid": "w-1",
            "url": "https://example.com/webhook",
            "eventTypes": ["recording.started", "recording.ready-to-download"],
            "state": "ACTIVE",
            "failedCount": 0
        }"#;

        let sub: WebhookSubscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.event_types.len(), 2);
        assert_eq!(sub.state.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn test_create_room_request_skips_empty_fields() {
        let request = CreateRoomRequest {
            privacy: RoomPrivacy::Private,
            ..Default::default()
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["privacy"], "private");
        assert!(json.get("name").is_none());
        assert!(json["properties"].get("exp").is_none());
    }
}
