//! Video Translator - fetch the spoken content of a YouTube video and translate it
//!
//! The library acquires text for a video through a cascade of strategies (published
//! transcript, caption track link, local speech-to-text), splits it into bounded
//! chunks and translates each chunk with per-chunk retries. The whole unit is wrapped
//! in an orchestrator that retries transient availability failures with linear backoff.

pub mod acquire;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod transcribe;
pub mod translate;
pub mod utils;

pub use acquire::{ContentAcquirer, ContentResult};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use extractors::{MetadataProvider, TranscriptProvider, VideoMetadata, VideoReference};
pub use pipeline::{AttemptOutcome, BackoffPolicy, PipelineAttempt, PipelineOrchestrator, PipelineOutput};
pub use status::{StatusReport, VideoStatus, VideoStatusChecker};
pub use transcribe::SpeechToText;
pub use translate::{LanguageDetector, TranslationChunk, TranslationProvider, Translator};

/// Result type used by the application glue (config, CLI, export)
pub type Result<T> = anyhow::Result<T>;

/// Failure of an external collaborator (metadata, transcript, translation, transcription)
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("External tool failed: {0}")]
    Tool(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Payload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Tool(err.to_string())
    }
}

/// Outcome of a pipeline run that did not produce a result
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("{}", .0.reason())]
    NotReady(VideoStatus),

    #[error("Could not retrieve transcript or captions")]
    NoContent,

    #[error("Processing was cancelled")]
    Cancelled,

    #[error("Failed to process the video after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Whether the orchestrator should run another attempt after this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::NotReady(_))
    }
}
