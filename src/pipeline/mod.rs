//! The canonical pipeline: status check, content acquisition and translation run as
//! one unit, retried with linear backoff while the video is only temporarily unavailable.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

pub mod backoff;

pub use backoff::BackoffPolicy;

use crate::acquire::{AcquisitionSettings, ContentAcquirer, ContentResult};
use crate::config::Config;
use crate::extractors::transcript::YoutubeTranscriptClient;
use crate::extractors::youtube::YtDlpClient;
use crate::extractors::VideoReference;
use crate::status::VideoStatusChecker;
use crate::transcribe::{AudioDownloader, WhisperCli};
use crate::translate::detect::ScriptDetector;
use crate::translate::google::GoogleTranslateClient;
use crate::translate::{self, Translator, TranslatorSettings};
use crate::utils;
use crate::{PipelineError, ProviderError};

pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 5;

/// Successful result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutput {
    /// Original text and its translation
    Translated {
        original: String,
        translated: String,
        language: String,
        failed_chunks: usize,
    },
    /// No target language was requested
    Original { text: String },
    /// A caption track link; the captions themselves are not fetched or translated
    CaptionLink(String),
}

/// Result of one attempt, tagged with whether another attempt may help
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub result: Result<PipelineOutput, PipelineError>,
    pub retryable: bool,
}

impl From<Result<PipelineOutput, PipelineError>> for AttemptOutcome {
    fn from(result: Result<PipelineOutput, PipelineError>) -> Self {
        let retryable = matches!(&result, Err(err) if err.is_retryable());
        Self { result, retryable }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineAttempt {
    /// 1-based
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

pub struct PipelineOrchestrator {
    status: VideoStatusChecker,
    acquirer: ContentAcquirer,
    translator: Translator,
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl PipelineOrchestrator {
    pub fn new(
        status: VideoStatusChecker,
        acquirer: ContentAcquirer,
        translator: Translator,
        max_attempts: u32,
        backoff: BackoffPolicy,
    ) -> Self {
        let clamped = max_attempts.clamp(MIN_ATTEMPTS, MAX_ATTEMPTS);
        if clamped != max_attempts {
            tracing::warn!(
                "Retry attempts clamped from {} to {} (supported range {}-{})",
                max_attempts,
                clamped,
                MIN_ATTEMPTS,
                MAX_ATTEMPTS
            );
        }

        Self {
            status,
            acquirer,
            translator,
            max_attempts: clamped,
            backoff,
        }
    }

    /// Wire the production providers described by `config`
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let metadata = Arc::new(YtDlpClient::from_config(&config.acquisition));
        let transcripts = Arc::new(YoutubeTranscriptClient::new(Duration::from_secs(
            config.acquisition.http_timeout_secs,
        ))?);
        let speech = Arc::new(WhisperCli::new(&config.acquisition.whisper, config.app.show_progress));
        let downloader = AudioDownloader::from_config(&config.acquisition, &config.app)?;
        let google = Arc::new(GoogleTranslateClient::from_config(&config.translation)?);

        Ok(Self::new(
            VideoStatusChecker::new(metadata.clone()),
            ContentAcquirer::new(
                metadata,
                transcripts,
                speech,
                downloader,
                AcquisitionSettings::from(&config.acquisition),
            ),
            Translator::new(
                google,
                Arc::new(ScriptDetector),
                TranslatorSettings::from(&config.translation),
            ),
            config.pipeline.max_attempts,
            BackoffPolicy::linear(config.pipeline.backoff_base()),
        ))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run the pipeline for `url`. Translation is skipped when `target` is `None` or blank.
    pub async fn run(
        &self,
        url: &str,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id);

        self.run_attempts(url, target, cancel).instrument(span).await
    }

    async fn run_attempts(
        &self,
        url: &str,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        tracing::info!("Processing {}", url);
        let video = VideoReference::parse(url);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let PipelineAttempt {
                outcome: AttemptOutcome { result, retryable },
                ..
            } = self.attempt(attempt, &video, target, cancel).await;

            let error = match result {
                Err(error) if retryable => error,
                result => return result,
            };

            tracing::warn!("Attempt {}/{} not ready: {}", attempt, self.max_attempts, error);
            last_error = Some(error);

            if attempt < self.max_attempts {
                let delay = self.backoff.delay_for(attempt);
                tracing::info!("Retrying in {}", utils::format_duration(delay));
                utils::sleep_cancellable(delay, cancel)
                    .await
                    .map_err(|_| PipelineError::Cancelled)?;
            }
        }

        let last = last_error.unwrap_or(PipelineError::NoContent);
        Err(PipelineError::Exhausted {
            attempts: self.max_attempts,
            last: Box::new(last),
        })
    }

    /// One pass of status check, acquisition and translation
    pub async fn attempt(
        &self,
        attempt: u32,
        video: &VideoReference,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineAttempt {
        tracing::debug!("Starting attempt {}", attempt);
        let outcome = AttemptOutcome::from(self.process(video, target, cancel).await);
        PipelineAttempt { attempt, outcome }
    }

    async fn process(
        &self,
        video: &VideoReference,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let Some(video_id) = video.id() else {
            return Err(PipelineError::InvalidUrl(video.url().to_string()));
        };

        let report = utils::cancellable(cancel, async { Ok(self.status.inspect(video.url()).await) })
            .await
            .map_err(|_| PipelineError::Cancelled)?;
        if !report.status.is_ready() {
            return Err(PipelineError::NotReady(report.status));
        }

        let content = self
            .acquirer
            .acquire(video_id, video.url(), report.metadata, cancel)
            .await
            .map_err(|_| PipelineError::Cancelled)?;

        let text = match content {
            ContentResult::Text(text) => text,
            ContentResult::CaptionLink(link) => return Ok(PipelineOutput::CaptionLink(link)),
            ContentResult::Unavailable(reason) => {
                tracing::info!("{}", reason);
                return Err(PipelineError::NoContent);
            }
        };

        let Some(language) = target.map(str::trim).filter(|lang| !lang.is_empty()) else {
            return Ok(PipelineOutput::Original { text });
        };

        let chunks = self
            .translator
            .translate(&text, language, cancel)
            .await
            .map_err(|_| PipelineError::Cancelled)?;
        let failed_chunks = chunks.iter().filter(|chunk| !chunk.is_translated()).count();
        if failed_chunks > 0 {
            tracing::warn!("{} of {} chunk(s) could not be translated", failed_chunks, chunks.len());
        }

        Ok(PipelineOutput::Translated {
            translated: translate::assemble(&chunks),
            original: text,
            language: language.to_string(),
            failed_chunks,
        })
    }
}
