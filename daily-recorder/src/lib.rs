//! Daily recording tools - cloud recording automation and webhook receiver.
//!
//! This library provides shared modules for the two binaries:
//! - `daily-webhook`: Receiver for signed recording webhooks
//! - `daily-cli`: Room, token, recording and webhook subscription tools
//!
//! ## Architecture
//!
//! ```text
//! Provider → daily-webhook → verify → classify → enrich (provider API) → event log
//! daily-cli → provider API (rooms, recordings, webhooks) + session file
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod token;
pub mod webhook;

// Re-export commonly used types
pub use api::{DailyClient, RecordingLookup};
pub use config::Config;
pub use error::{ApiError, ConfigError, SessionError, WebhookError};
pub use session::{Session, SessionStore};
pub use webhook::{router, AppState, EventLog};
