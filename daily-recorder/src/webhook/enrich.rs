//! Best-effort enrichment of ready-to-download events.

use tracing::{info, warn};

use super::event::{ready_log_line, RecordingReadyPayload};
use super::signature::Verification;
use crate::api::RecordingLookup;

/// A ready event plus whatever links could be resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedLogRecord {
    pub payload: RecordingReadyPayload,
    pub download_url: Option<String>,
    pub access_url: Option<String>,
}

impl EnrichedLogRecord {
    pub fn log_line(&self, verification: Verification) -> String {
        ready_log_line(
            &self.payload,
            self.download_url.as_deref(),
            self.access_url.as_deref(),
            verification,
        )
    }
}

/// Resolve the download and access links for a ready recording.
///
/// Both lookups run concurrently, once each, and never propagate failure:
/// a failed lookup leaves its field `None`.
pub async fn enrich_ready(
    lookup: &dyn RecordingLookup,
    payload: RecordingReadyPayload,
    valid_for_secs: u64,
) -> EnrichedLogRecord {
    if payload.recording_id.is_empty() {
        warn!(room_name = %payload.room_name, "enrichment_skipped_no_recording_id");
        return EnrichedLogRecord {
            payload,
            download_url: None,
            access_url: None,
        };
    }

    let id = payload.recording_id.as_str();
    let (metadata, link) = tokio::join!(
        lookup.get_recording(id),
        lookup.get_access_link(id, valid_for_secs)
    );

    let download_url = match metadata {
        Ok(recording) => {
            if recording.download_link.is_none() {
                info!(recording_id = %id, status = ?recording.status, "enrichment_download_link_not_ready");
            }
            recording.download_link
        }
        Err(e) => {
            warn!(recording_id = %id, error = %e, "enrichment_metadata_failed");
            None
        }
    };

    let access_url = match link {
        Ok(link) => Some(link.download_link).filter(|l| !l.is_empty()),
        Err(e) => {
            warn!(recording_id = %id, error = %e, "enrichment_access_link_failed");
            None
        }
    };

    info!(
        recording_id = %id,
        has_download_url = download_url.is_some(),
        has_access_url = access_url.is_some(),
        "enrichment_complete"
    );

    EnrichedLogRecord {
        payload,
        download_url,
        access_url,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{AccessLink, Recording};
    use crate::error::ApiError;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Lookup stub with canned outcomes and call counting.
    #[derive(Default)]
    pub struct StubLookup {
        pub download_link: Option<String>,
        pub access_link: Option<String>,
        pub metadata_calls: AtomicUsize,
        pub link_calls: AtomicUsize,
    }

    impl StubLookup {
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn succeeding(download: &str, access: &str) -> Self {
            Self {
                download_link: Some(download.to_string()),
                access_link: Some(access.to_string()),
                ..Default::default()
            }
        }
    }

    impl RecordingLookup for StubLookup {
        fn get_recording<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Recording, ApiError>> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match &self.download_link {
                    Some(link) => Ok(Recording {
                        id: id.to_string(),
                        room_name: None,
                        start_ts: None,
                        status: Some("finished".to_string()),
                        duration: None,
                        s3key: None,
                        download_link: Some(link.clone()),
                    }),
                    None => Err(ApiError::Status {
                        status: 503,
                        body: "unavailable".to_string(),
                    }),
                }
            })
        }

        fn get_access_link<'a>(
            &'a self,
            _id: &'a str,
            _valid_for_secs: u64,
        ) -> BoxFuture<'a, Result<AccessLink, ApiError>> {
            self.link_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match &self.access_link {
                    Some(link) => Ok(AccessLink {
                        download_link: link.clone(),
                        expires: None,
                    }),
                    None => Err(ApiError::Status {
                        status: 500,
                        body: "boom".to_string(),
                    }),
                }
            })
        }
    }

    fn ready(id: &str) -> RecordingReadyPayload {
        RecordingReadyPayload {
            room_name: "demo".to_string(),
            recording_id: id.to_string(),
            duration: Some(30.0),
            start_ts: Some(1700000000.0),
            s3_key: None,
        }
    }

    #[tokio::test]
    async fn test_enrich_both_succeed() {
        let lookup = StubLookup::succeeding("https://dl/r1", "https://signed/r1");
        let record = enrich_ready(&lookup, ready("r1"), 3600).await;

        assert_eq!(record.download_url.as_deref(), Some("https://dl/r1"));
        assert_eq!(record.access_url.as_deref(), Some("https://signed/r1"));
        assert_eq!(lookup.metadata_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lookup.link_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enrich_both_fail_marks_unavailable() {
        let lookup = StubLookup::failing();
        let record = enrich_ready(&lookup, ready("r1"), 3600).await;

        assert!(record.download_url.is_none());
        assert!(record.access_url.is_none());

        let line = record.log_line(Verification::Verified);
        assert!(line.contains("Download URL: unavailable"));
        assert!(line.contains("Access link: unavailable"));
        // single attempt each, no retry
        assert_eq!(lookup.metadata_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lookup.link_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enrich_partial_failure() {
        let lookup = StubLookup {
            access_link: Some("https://signed/r1".to_string()),
            ..Default::default()
        };
        let record = enrich_ready(&lookup, ready("r1"), 60).await;

        assert!(record.download_url.is_none());
        assert_eq!(record.access_url.as_deref(), Some("https://signed/r1"));
    }

    #[tokio::test]
    async fn test_enrich_skips_lookups_without_id() {
        let lookup = StubLookup::succeeding("a", "b");
        let record = enrich_ready(&lookup, ready(""), 3600).await;

        assert!(record.download_url.is_none());
        assert_eq!(lookup.metadata_calls.load(Ordering::SeqCst), 0);
        assert_eq!(lookup.link_calls.load(Ordering::SeqCst), 0);
    }
}
