//! Provider REST API module.
//!
//! This module provides:
//! - A bearer-authenticated client for rooms, recordings and webhook subscriptions
//! - The `RecordingLookup` seam the webhook receiver enriches events through
//! - Streaming recording downloads

pub mod client;
pub mod download;
pub mod types;

pub use client::{DailyClient, RecordingLookup};
pub use download::{recording_file_name, Downloaded};
pub use types::{
    AccessLink, CreateRoomRequest, Deleted, ListResponse, Recording, RecordingControl, Room,
    RoomPrivacy, RoomProperties, WebhookRequest, WebhookSubscription,
};
