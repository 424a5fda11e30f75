use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

pub mod transcript;
pub mod youtube;

use crate::ProviderError;

/// A video URL together with the content id derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    url: String,
    id: Option<String>,
}

impl VideoReference {
    pub fn parse(url: &str) -> Self {
        Self {
            url: url.to_string(),
            id: extract_video_id(url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `None` when the URL is not a recognised YouTube link
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Extract the video id from a `youtu.be/<id>` or `youtube.com/watch?v=<id>` URL.
///
/// Any other host, or a missing id, yields `None`.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;

    let id = match parsed.host_str()? {
        "youtu.be" => parsed.path().strip_prefix('/').map(str::to_string),
        "youtube.com" | "www.youtube.com" => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        _ => None,
    }?;

    (!id.is_empty()).then_some(id)
}

/// A downloadable subtitle or caption track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub url: String,

    #[serde(default)]
    pub ext: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Metadata record for a video, as returned in info-only mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,

    /// Unix timestamp of the upload
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Upload date as `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,

    #[serde(default)]
    pub is_live: Option<bool>,

    #[serde(default)]
    pub was_live: Option<bool>,

    #[serde(default)]
    pub live_status: Option<String>,

    /// Human-authored subtitles per language
    #[serde(default)]
    pub subtitles: HashMap<String, Vec<CaptionTrack>>,

    /// Auto-generated captions per language
    #[serde(default)]
    pub automatic_captions: HashMap<String, Vec<CaptionTrack>>,

    /// Direct URL of the selected best-audio stream
    #[serde(default, rename = "url")]
    pub audio_url: Option<String>,
}

impl VideoMetadata {
    /// Best known upload instant: exact timestamp, else midnight UTC of the upload date.
    /// An unparseable date is ignored.
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        if let Some(ts) = self.timestamp {
            if let Some(at) = Utc.timestamp_opt(ts, 0).single() {
                return Some(at);
            }
        }

        let date = NaiveDate::parse_from_str(self.upload_date.as_deref()?, "%Y%m%d").ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }

    /// First caption URL for `lang`, preferring human subtitles over automatic ones
    pub fn caption_url(&self, lang: &str) -> Option<&str> {
        self.subtitles
            .get(lang)
            .filter(|tracks| !tracks.is_empty())
            .or_else(|| self.automatic_captions.get(lang))
            .and_then(|tracks| tracks.first())
            .map(|track| track.url.as_str())
    }
}

/// Timed text segment of a published transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Why a transcript could not be produced
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for this video")]
    Disabled,

    #[error("No transcript found for languages {0:?}")]
    NotFound(Vec<String>),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Source of video metadata (upload info, live flags, caption tracks, audio stream)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Extract metadata for a URL without downloading any media
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, ProviderError>;
}

/// Source of published, pre-timed transcripts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch a transcript in the first available language of `languages`
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}
