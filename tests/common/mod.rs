#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use video_translator::acquire::AcquisitionSettings;
use video_translator::extractors::{
    CaptionTrack, MetadataProvider, TranscriptError, TranscriptProvider, TranscriptSegment, VideoMetadata,
};
use video_translator::transcribe::{AudioDownloader, SpeechToText};
use video_translator::translate::{LanguageDetector, TranslationProvider, Translator, TranslatorSettings};
use video_translator::{BackoffPolicy, ContentAcquirer, PipelineOrchestrator, ProviderError, VideoStatusChecker};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Uploaded two days ago, not live, no captions, no audio stream
pub fn ready_metadata() -> VideoMetadata {
    VideoMetadata {
        timestamp: Some((Utc::now() - ChronoDuration::days(2)).timestamp()),
        ..Default::default()
    }
}

pub fn recent_metadata() -> VideoMetadata {
    VideoMetadata {
        timestamp: Some(Utc::now().timestamp()),
        ..Default::default()
    }
}

pub fn live_metadata() -> VideoMetadata {
    VideoMetadata {
        is_live: Some(true),
        ..ready_metadata()
    }
}

pub fn with_captions(mut metadata: VideoMetadata, url: &str) -> VideoMetadata {
    metadata.subtitles.insert(
        "en".to_string(),
        vec![CaptionTrack {
            url: url.to_string(),
            ext: Some("vtt".to_string()),
            name: None,
        }],
    );
    metadata
}

/// Hands out scripted metadata in order; the last entry repeats
pub struct StubMetadata {
    script: Mutex<VecDeque<VideoMetadata>>,
    pub calls: AtomicUsize,
}

impl StubMetadata {
    pub fn new(script: Vec<VideoMetadata>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    async fn fetch_metadata(&self, _url: &str) -> Result<VideoMetadata, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.ok_or_else(|| ProviderError::Tool("no metadata scripted".to_string()))
    }
}

pub struct StubTranscripts {
    result: Result<Vec<TranscriptSegment>, TranscriptError>,
    pub calls: AtomicUsize,
}

impl StubTranscripts {
    pub fn text(text: &str) -> Arc<Self> {
        Self::with_result(Ok(vec![TranscriptSegment {
            text: text.to_string(),
            start: 0.0,
            duration: 1.0,
        }]))
    }

    pub fn failing(error: TranscriptError) -> Arc<Self> {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<Vec<TranscriptSegment>, TranscriptError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptProvider for StubTranscripts {
    async fn fetch_transcript(
        &self,
        _video_id: &str,
        _languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Default)]
pub struct StubSpeech {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechToText for StubSpeech {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Tool("speech-to-text unavailable".to_string()))
    }
}

/// Prefixes text with the target language; fails any chunk containing `fail_on`
pub struct StubTranslator {
    fail_on: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl StubTranslator {
    pub fn new() -> Arc<Self> {
        Self::failing_on(None)
    }

    pub fn failing_on(fail_on: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fail_on,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for StubTranslator {
    async fn translate(&self, _source: &str, target: &str, text: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_on {
            Some(marker) if text.contains(marker) => Err(ProviderError::Network("service unavailable".to_string())),
            _ => Ok(format!("[{}] {}", target, text)),
        }
    }
}

#[async_trait]
impl LanguageDetector for StubTranslator {
    async fn detect(&self, _text: &str) -> Result<String, ProviderError> {
        Ok("en".to_string())
    }
}

pub struct Harness {
    pub metadata: Arc<StubMetadata>,
    pub transcripts: Arc<StubTranscripts>,
    pub speech: Arc<StubSpeech>,
    pub translator: Arc<StubTranslator>,
}

impl Harness {
    pub fn new(metadata: Arc<StubMetadata>, transcripts: Arc<StubTranscripts>, translator: Arc<StubTranslator>) -> Self {
        Self {
            metadata,
            transcripts,
            speech: Arc::new(StubSpeech::default()),
            translator,
        }
    }

    /// Production timings: 5 s backoff base, 5 s rate-limit pause, 10 s chunk retry delay
    pub fn orchestrator(&self, max_attempts: u32, chunk_char_budget: usize) -> PipelineOrchestrator {
        let downloader = AudioDownloader::new(reqwest::Client::new(), None, Duration::from_secs(30), 1024, false);
        let settings = TranslatorSettings {
            chunk_char_budget,
            max_attempts: 3,
            rate_limit_delay: Duration::from_secs(5),
            retry_delay: Duration::from_secs(10),
        };

        PipelineOrchestrator::new(
            VideoStatusChecker::new(self.metadata.clone()),
            ContentAcquirer::new(
                self.metadata.clone(),
                self.transcripts.clone(),
                self.speech.clone(),
                downloader,
                AcquisitionSettings {
                    transcript_languages: vec!["en".to_string(), "hi".to_string()],
                    caption_language: "en".to_string(),
                },
            ),
            Translator::new(self.translator.clone(), self.translator.clone(), settings),
            max_attempts,
            BackoffPolicy::default(),
        )
    }
}
