//! Streaming recording download.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use super::client::DailyClient;
use crate::error::ApiError;

/// Result of a completed download.
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

/// File name a recording is saved under: `<room>_<id>.mp4`.
pub fn recording_file_name(room_name: Option<&str>, recording_id: &str) -> String {
    let room = room_name.unwrap_or("recording");
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    };
    format!("{}_{}.mp4", sanitize(room), sanitize(recording_id))
}

impl DailyClient {
    /// Download a recording into `dest_dir`, streaming the body chunk by chunk.
    ///
    /// The body lands in a `.part` file next to the target and is renamed
    /// into place only once complete. A failed transfer removes the `.part`
    /// file and leaves any earlier copy of the recording untouched.
    pub async fn download_recording(
        &self,
        recording_id: &str,
        valid_for_secs: u64,
        dest_dir: &Path,
    ) -> Result<Downloaded, ApiError> {
        let recording = self.fetch_recording(recording_id).await?;
        let link = self.fetch_access_link(recording_id, valid_for_secs).await?;

        if link.download_link.is_empty() {
            return Err(ApiError::NoDownloadLink(recording_id.to_string()));
        }

        fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(recording_file_name(
            recording.room_name.as_deref(),
            recording_id,
        ));
        let partial = partial_path(&path);

        info!(
            recording_id = %recording_id,
            path = %path.display(),
            "recording_download_starting"
        );

        let result = match self.stream_to_file(&link.download_link, &partial).await {
            Ok(bytes) => fs::rename(&partial, &path)
                .await
                .map(|()| bytes)
                .map_err(ApiError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                info!(
                    recording_id = %recording_id,
                    path = %path.display(),
                    bytes = bytes,
                    "recording_download_complete"
                );
                Ok(Downloaded { path, bytes })
            }
            Err(e) => {
                error!(recording_id = %recording_id, error = %e, "recording_download_failed");
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, ApiError> {
        let response = self.get_unauthenticated(url).await?;
        let mut file = fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

/// In-progress download path: `<name>.mp4.part`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
