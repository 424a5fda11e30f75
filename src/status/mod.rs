use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::extractors::{MetadataProvider, VideoMetadata};

/// Whether a video's content can be retrieved right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    Ready,
    RecentlyUploaded,
    LiveStream,
    PostLiveProcessing,
    /// The metadata provider could not be queried
    ProviderError(String),
}

impl VideoStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, VideoStatus::Ready)
    }

    pub fn reason(&self) -> String {
        match self {
            VideoStatus::Ready => "Video is ready.".to_string(),
            VideoStatus::RecentlyUploaded => "Video recently uploaded, try after some time.".to_string(),
            VideoStatus::LiveStream => "Live streams are not supported.".to_string(),
            VideoStatus::PostLiveProcessing => "Live stream recording is still being processed.".to_string(),
            VideoStatus::ProviderError(msg) => format!("Error checking video status: {}", msg),
        }
    }

    /// Apply the readiness policy to a metadata record; first matching rule wins
    pub fn evaluate(metadata: &VideoMetadata, now: DateTime<Utc>) -> Self {
        if let Some(uploaded) = metadata.uploaded_at() {
            if now.signed_duration_since(uploaded) < Duration::days(1) {
                return VideoStatus::RecentlyUploaded;
            }
        }

        if metadata.is_live.unwrap_or(false) || metadata.was_live.unwrap_or(false) {
            return VideoStatus::LiveStream;
        }

        let post_live = metadata
            .live_status
            .as_deref()
            .map(|s| s.replace('-', "_") == "post_live")
            .unwrap_or(false);
        if post_live {
            return VideoStatus::PostLiveProcessing;
        }

        VideoStatus::Ready
    }
}

/// Verdict of a status check, with the metadata record it was based on
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: VideoStatus,
    /// `None` when the provider could not be queried
    pub metadata: Option<VideoMetadata>,
}

/// Queries the metadata provider to decide whether a video is retrievable
pub struct VideoStatusChecker {
    metadata: Arc<dyn MetadataProvider>,
}

impl VideoStatusChecker {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { metadata }
    }

    pub async fn check(&self, url: &str) -> VideoStatus {
        self.inspect(url).await.status
    }

    pub async fn check_at(&self, url: &str, now: DateTime<Utc>) -> VideoStatus {
        self.inspect_at(url, now).await.status
    }

    pub async fn inspect(&self, url: &str) -> StatusReport {
        self.inspect_at(url, Utc::now()).await
    }

    /// Provider failures become a not-ready status instead of an error
    pub async fn inspect_at(&self, url: &str, now: DateTime<Utc>) -> StatusReport {
        match self.metadata.fetch_metadata(url).await {
            Ok(metadata) => {
                let status = VideoStatus::evaluate(&metadata, now);
                tracing::debug!("Video status for {}: {:?}", url, status);
                StatusReport {
                    status,
                    metadata: Some(metadata),
                }
            }
            Err(e) => {
                tracing::warn!("Metadata lookup failed for {}: {}", url, e);
                StatusReport {
                    status: VideoStatus::ProviderError(e.to_string()),
                    metadata: None,
                }
            }
        }
    }
}
