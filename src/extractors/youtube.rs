use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{MetadataProvider, VideoMetadata};
use crate::config::AcquisitionConfig;
use crate::ProviderError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// YouTube metadata provider backed by yt-dlp in info-only mode
pub struct YtDlpClient {
    yt_dlp_path: String,
    timeout: Duration,
}

impl YtDlpClient {
    pub fn new(yt_dlp_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(
            config.yt_dlp_path.clone(),
            Duration::from_secs(config.metadata_timeout_secs),
        )
    }

    /// Dump video information as JSON, selecting the best audio stream
    async fn dump_json(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        tracing::debug!("Extracting video info for: {}", url);

        let socket_timeout = self.timeout.as_secs().max(1).to_string();
        let child = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                "--geo-bypass",
                "--format",
                "bestaudio/best",
                "--socket-timeout",
                &socket_timeout,
                "--add-header",
                &format!("User-Agent:{}", USER_AGENT),
                "--add-header",
                "Accept-Language:en-US,en;q=0.9",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("yt-dlp did not finish within {:?}", self.timeout))
            })??;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Tool(format!("yt-dlp failed: {}", error.trim())));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MetadataProvider for YtDlpClient {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, ProviderError> {
        let stdout = self.dump_json(url).await?;

        serde_json::from_slice(&stdout)
            .map_err(|e| ProviderError::InvalidResponse(format!("yt-dlp JSON: {}", e)))
    }
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::from_config(&AcquisitionConfig::default())
    }
}
