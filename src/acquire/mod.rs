use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AcquisitionConfig;
use crate::extractors::{MetadataProvider, TranscriptError, TranscriptProvider, VideoMetadata};
use crate::transcribe::{AudioDownloader, SpeechToText};
use crate::utils;
use crate::ProviderError;

/// What the acquisition cascade produced for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentResult {
    /// Spoken content as plain text, ready for translation
    Text(String),
    /// A caption track URL; returned as-is, never translated
    CaptionLink(String),
    /// Every strategy came up empty
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct AcquisitionSettings {
    /// Transcript languages in order of preference
    pub transcript_languages: Vec<String>,
    pub caption_language: String,
}

impl From<&AcquisitionConfig> for AcquisitionSettings {
    fn from(config: &AcquisitionConfig) -> Self {
        Self {
            transcript_languages: config.transcript_languages.clone(),
            caption_language: config.caption_language.clone(),
        }
    }
}

/// Runs transcript -> caption link -> speech-to-text, stopping at the first hit
pub struct ContentAcquirer {
    metadata: Arc<dyn MetadataProvider>,
    transcripts: Arc<dyn TranscriptProvider>,
    speech: Arc<dyn SpeechToText>,
    downloader: AudioDownloader,
    settings: AcquisitionSettings,
}

impl ContentAcquirer {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        transcripts: Arc<dyn TranscriptProvider>,
        speech: Arc<dyn SpeechToText>,
        downloader: AudioDownloader,
        settings: AcquisitionSettings,
    ) -> Self {
        Self {
            metadata,
            transcripts,
            speech,
            downloader,
            settings,
        }
    }

    /// Acquire content for a video. `known` is a metadata record already fetched for this
    /// attempt; without one the acquirer fetches it at most once.
    ///
    /// Provider failures only skip to the next strategy; the one error returned is
    /// [`ProviderError::Cancelled`].
    pub async fn acquire(
        &self,
        video_id: &str,
        url: &str,
        known: Option<VideoMetadata>,
        cancel: &CancellationToken,
    ) -> Result<ContentResult, ProviderError> {
        if let Some(text) = self.fetch_transcript(video_id, cancel).await? {
            tracing::info!("Using published transcript ({} chars)", text.chars().count());
            return Ok(ContentResult::Text(text));
        }

        let metadata = match known {
            Some(metadata) => Some(metadata),
            None => self.fetch_metadata(url, cancel).await?,
        };

        let caption_link = metadata
            .as_ref()
            .and_then(|m| m.caption_url(&self.settings.caption_language));
        if let Some(link) = caption_link {
            tracing::info!("Caption track available, skipping translation");
            return Ok(ContentResult::CaptionLink(link.to_string()));
        }

        if let Some(audio_url) = metadata.and_then(|m| m.audio_url) {
            if let Some(text) = self.transcribe_audio(&audio_url, cancel).await? {
                tracing::info!("Using local transcription ({} chars)", text.chars().count());
                return Ok(ContentResult::Text(text));
            }
        }

        Ok(ContentResult::Unavailable(
            "Could not retrieve transcript or captions".to_string(),
        ))
    }

    async fn fetch_transcript(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ProviderError> {
        tracing::debug!("Requesting transcript for {}", video_id);

        let result = utils::cancellable(cancel, async {
            Ok(self
                .transcripts
                .fetch_transcript(video_id, &self.settings.transcript_languages)
                .await)
        })
        .await?;

        match result {
            Ok(segments) => {
                let text = segments
                    .iter()
                    .map(|segment| segment.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(non_empty(text))
            }
            Err(TranscriptError::Provider(ProviderError::Cancelled)) => Err(ProviderError::Cancelled),
            Err(e @ (TranscriptError::Disabled | TranscriptError::NotFound(_))) => {
                tracing::debug!("No transcript: {}", e);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Transcript error: {}", e);
                Ok(None)
            }
        }
    }

    /// Metadata for the caption and audio strategies; a failed lookup disables both
    async fn fetch_metadata(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<VideoMetadata>, ProviderError> {
        match utils::cancellable(cancel, self.metadata.fetch_metadata(url)).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(ProviderError::Cancelled) => Err(ProviderError::Cancelled),
            Err(e) => {
                tracing::warn!("Captions and audio lookup failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn transcribe_audio(
        &self,
        audio_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ProviderError> {
        // Dropping the handle deletes the file, whichever way this block exits
        let audio = match utils::cancellable(cancel, self.downloader.download(audio_url)).await {
            Ok(file) => file,
            Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
            Err(e) => {
                tracing::warn!("Audio download error: {}", e);
                return Ok(None);
            }
        };

        match utils::cancellable(cancel, self.speech.transcribe(audio.path())).await {
            Ok(text) => Ok(non_empty(text)),
            Err(ProviderError::Cancelled) => Err(ProviderError::Cancelled),
            Err(e) => {
                tracing::warn!("Speech-to-text error: {}", e);
                Ok(None)
            }
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
