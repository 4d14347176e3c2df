//! Bearer-authenticated client for the provider REST API.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{
    AccessLink, CreateRoomRequest, Deleted, ListResponse, Recording, RecordingControl, Room,
    WebhookRequest, WebhookSubscription,
};
use crate::error::ApiError;
use crate::Config;

/// Read-only recording lookups the webhook receiver enriches events with.
///
/// Object-safe so the receiver can hold an `Arc<dyn RecordingLookup>` and
/// tests can substitute a stub.
pub trait RecordingLookup: Send + Sync {
    /// Fetch recording metadata by id.
    fn get_recording<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Recording, ApiError>>;

    /// Fetch a time-limited access link for a recording.
    fn get_access_link<'a>(
        &'a self,
        id: &'a str,
        valid_for_secs: u64,
    ) -> BoxFuture<'a, Result<AccessLink, ApiError>>;
}

/// Provider API client.
#[derive(Clone)]
pub struct DailyClient {
    http: Client,
    /// Recording transfers: bounded per connect and per read, never in total.
    download_http: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for DailyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl DailyClient {
    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;

        let download_http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            download_http,
            base_url,
            api_key,
        })
    }

    /// Build an absolute endpoint URL from path segments.
    ///
    /// Segments are percent-encoded individually so room names and ids
    /// cannot escape their position in the path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(segments))
            .bearer_auth(&self.api_key)
    }

    /// Send a request and decode a JSON body, mapping non-2xx to `ApiError::Status`.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status_code = status.as_u16(),
                body_length = body.len(),
                "daily_api_error_status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status_code = status.as_u16(), body_length = body.len(), "daily_api_response");
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(method, segments).json(body)).await
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<Room, ApiError> {
        let room: Room = self.send_with_body(Method::POST, &["rooms"], request).await?;
        info!(room_name = %room.name, room_url = %room.url, "daily_room_created");
        Ok(room)
    }

    pub async fn get_room(&self, name: &str) -> Result<Room, ApiError> {
        self.send_json(self.request(Method::GET, &["rooms", name])).await
    }

    pub async fn list_rooms(&self, limit: u32) -> Result<ListResponse<Room>, ApiError> {
        let request = self
            .request(Method::GET, &["rooms"])
            .query(&[("limit", limit.to_string())]);
        self.send_json(request).await
    }

    pub async fn delete_room(&self, name: &str) -> Result<Deleted, ApiError> {
        let deleted: Deleted = self.send_json(self.request(Method::DELETE, &["rooms", name])).await?;
        info!(room_name = %name, deleted = deleted.deleted, "daily_room_deleted");
        Ok(deleted)
    }

    // =========================================================================
    // Recordings
    // =========================================================================

    pub async fn start_recording(&self, room: &str) -> Result<RecordingControl, ApiError> {
        let control = self
            .send_with_body(
                Method::POST,
                &["rooms", room, "recordings", "start"],
                &serde_json::json!({ "type": "cloud" }),
            )
            .await?;
        info!(room_name = %room, "daily_recording_start_requested");
        Ok(control)
    }

    pub async fn stop_recording(&self, room: &str) -> Result<RecordingControl, ApiError> {
        let control = self
            .send_with_body(
                Method::POST,
                &["rooms", room, "recordings", "stop"],
                &serde_json::json!({}),
            )
            .await?;
        info!(room_name = %room, "daily_recording_stop_requested");
        Ok(control)
    }

    /// Fetch one page of recordings, newest first.
    pub async fn list_recordings(
        &self,
        room: Option<&str>,
        limit: u32,
        starting_after: Option<&str>,
    ) -> Result<ListResponse<Recording>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(room) = room {
            query.push(("room_name", room.to_string()));
        }
        if let Some(cursor) = starting_after {
            query.push(("starting_after", cursor.to_string()));
        }

        let request = self.request(Method::GET, &["recordings"]).query(&query);
        self.send_json(request).await
    }

    /// Walk every page of recordings using the last id as the cursor.
    pub async fn list_all_recordings(&self, room: Option<&str>) -> Result<Vec<Recording>, ApiError> {
        const PAGE_SIZE: u32 = 100;

        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .list_recordings(room, PAGE_SIZE, cursor.as_deref())
                .await?;
            let fetched = page.data.len();
            cursor = page.data.last().map(|r| r.id.clone());
            all.extend(page.data);

            debug!(page_size = fetched, total = all.len(), "daily_recordings_page");

            if fetched < PAGE_SIZE as usize || cursor.is_none() {
                break;
            }
        }

        Ok(all)
    }

    pub async fn fetch_recording(&self, id: &str) -> Result<Recording, ApiError> {
        self.send_json(self.request(Method::GET, &["recordings", id])).await
    }

    pub async fn fetch_access_link(&self, id: &str, valid_for_secs: u64) -> Result<AccessLink, ApiError> {
        let request = self
            .request(Method::GET, &["recordings", id, "access-link"])
            .query(&[("valid_for_secs", valid_for_secs.to_string())]);
        self.send_json(request).await
    }

    pub async fn delete_recording(&self, id: &str) -> Result<Deleted, ApiError> {
        let deleted: Deleted = self
            .send_json(self.request(Method::DELETE, &["recordings", id]))
            .await?;
        info!(recording_id = %id, "daily_recording_deleted");
        Ok(deleted)
    }

    /// Raw GET against an absolute URL, without provider auth.
    ///
    /// Access links are pre-signed and must not carry the API key. The
    /// request timeout only bounds connecting and each read, so a large
    /// recording may take as long as it needs while bytes keep arriving.
    pub(crate) async fn get_unauthenticated(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = self.download_http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    // =========================================================================
    // Webhook subscriptions
    // =========================================================================

    pub async fn create_webhook(&self, request: &WebhookRequest) -> Result<WebhookSubscription, ApiError> {
        let sub: WebhookSubscription = self
            .send_with_body(Method::POST, &["webhooks"], request)
            .await?;
        info!(uuid = %sub.uuid, url = %sub.url, "daily_webhook_created");
        Ok(sub)
    }

    /// `GET /webhooks` returns a bare array, unlike the room and recording listings.
    pub async fn list_webhooks(&self) -> Result<Vec<WebhookSubscription>, ApiError> {
        self.send_json(self.request(Method::GET, &["webhooks"])).await
    }

    pub async fn get_webhook(&self, uuid: &str) -> Result<WebhookSubscription, ApiError> {
        self.send_json(self.request(Method::GET, &["webhooks", uuid])).await
    }

    /// Update a subscription. Posting to a FAILED subscription also reactivates it.
    pub async fn update_webhook(
        &self,
        uuid: &str,
        request: &WebhookRequest,
    ) -> Result<WebhookSubscription, ApiError> {
        let sub: WebhookSubscription = self
            .send_with_body(Method::POST, &["webhooks", uuid], request)
            .await?;
        info!(uuid = %sub.uuid, state = ?sub.state, "daily_webhook_updated");
        Ok(sub)
    }

    pub async fn delete_webhook(&self, uuid: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &["webhooks", uuid])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!(uuid = %uuid, "daily_webhook_deleted");
        Ok(())
    }
}

impl RecordingLookup for DailyClient {
    fn get_recording<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Recording, ApiError>> {
        Box::pin(self.fetch_recording(id))
    }

    fn get_access_link<'a>(
        &'a self,
        id: &'a str,
        valid_for_secs: u64,
    ) -> BoxFuture<'a, Result<AccessLink, ApiError>> {
        Box::pin(self.fetch_access_link(id, valid_for_secs))
    }
}
