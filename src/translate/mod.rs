//! Chunked translation with per-chunk language detection and retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod detect;
pub mod google;

use crate::config::TranslationConfig;
use crate::utils;
use crate::ProviderError;

/// Sentence terminator used to split source text into sentences
pub const SENTENCE_DELIMITER: &str = "। ";

/// Separator placed between translated chunks in the final output
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, source: &str, target: &str, text: &str) -> Result<String, ProviderError>;
}

/// Best-effort language identification
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Language code of `text`
    async fn detect(&self, text: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Translated(String),
    /// Every attempt failed
    Failed,
}

/// One translation unit and its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationChunk {
    /// Zero-based position in the source text
    pub index: usize,
    pub source_text: String,
    pub outcome: ChunkOutcome,
}

impl TranslationChunk {
    pub fn is_translated(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Translated(_))
    }

    /// Translated text, or the positional failure marker
    pub fn output_text(&self) -> String {
        match &self.outcome {
            ChunkOutcome::Translated(text) => text.clone(),
            ChunkOutcome::Failed => failure_marker(self.index),
        }
    }
}

pub fn failure_marker(index: usize) -> String {
    format!("[Translation failed for chunk {}]", index + 1)
}

/// Join chunk outputs in source order
pub fn assemble(chunks: &[TranslationChunk]) -> String {
    chunks
        .iter()
        .map(TranslationChunk::output_text)
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// Split text into sentences on [`SENTENCE_DELIMITER`] and pack consecutive sentences into
/// chunks of at most `budget` characters. A sentence longer than the budget becomes its own chunk.
pub fn split_into_chunks(text: &str, budget: usize) -> Vec<String> {
    let delimiter_len = SENTENCE_DELIMITER.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in text.split(SENTENCE_DELIMITER).map(str::trim).filter(|s| !s.is_empty()) {
        let sentence_len = sentence.chars().count();

        if current.is_empty() {
            current.push_str(sentence);
            current_len = sentence_len;
        } else if current_len + delimiter_len + sentence_len > budget {
            chunks.push(std::mem::take(&mut current));
            current.push_str(sentence);
            current_len = sentence_len;
        } else {
            current.push_str(SENTENCE_DELIMITER);
            current.push_str(sentence);
            current_len += delimiter_len + sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    pub chunk_char_budget: usize,
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
    pub retry_delay: Duration,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self::from(&TranslationConfig::default())
    }
}

impl From<&TranslationConfig> for TranslatorSettings {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            chunk_char_budget: config.chunk_char_budget,
            max_attempts: config.max_attempts_per_chunk.max(1),
            rate_limit_delay: Duration::from_millis(config.rate_limit_delay_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Translates text chunk by chunk, in order, one chunk at a time
pub struct Translator {
    provider: Arc<dyn TranslationProvider>,
    detector: Arc<dyn LanguageDetector>,
    settings: TranslatorSettings,
}

impl Translator {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        detector: Arc<dyn LanguageDetector>,
        settings: TranslatorSettings,
    ) -> Self {
        Self {
            provider,
            detector,
            settings,
        }
    }

    /// Translate every chunk of `text` into `target`.
    ///
    /// A chunk that fails all attempts is kept as [`ChunkOutcome::Failed`]; the only error
    /// returned is [`ProviderError::Cancelled`].
    pub async fn translate(
        &self,
        text: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranslationChunk>, ProviderError> {
        let pieces = split_into_chunks(text, self.settings.chunk_char_budget);
        let total = pieces.len();
        tracing::info!("Translating {} chunk(s) into '{}'", total, target);

        let mut chunks = Vec::with_capacity(total);
        for (index, source_text) in pieces.into_iter().enumerate() {
            let outcome = self.translate_chunk(index, &source_text, target, cancel).await?;

            chunks.push(TranslationChunk {
                index,
                source_text,
                outcome,
            });

            // Failed chunks pause too
            if index + 1 < total {
                utils::sleep_cancellable(self.settings.rate_limit_delay, cancel).await?;
            }
        }

        Ok(chunks)
    }

    async fn translate_chunk(
        &self,
        index: usize,
        source_text: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkOutcome, ProviderError> {
        for attempt in 1..=self.settings.max_attempts {
            match self.attempt_chunk(source_text, target, cancel).await {
                Ok(translated) => {
                    tracing::debug!("Chunk {} translated on attempt {}", index + 1, attempt);
                    return Ok(ChunkOutcome::Translated(translated));
                }
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
                Err(e) => {
                    tracing::warn!(
                        "Chunk {} attempt {}/{} failed: {}",
                        index + 1,
                        attempt,
                        self.settings.max_attempts,
                        e
                    );
                    if attempt < self.settings.max_attempts {
                        utils::sleep_cancellable(self.settings.retry_delay, cancel).await?;
                    }
                }
            }
        }

        tracing::warn!("Giving up on chunk {}", index + 1);
        Ok(ChunkOutcome::Failed)
    }

    async fn attempt_chunk(
        &self,
        source_text: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let source = utils::cancellable(cancel, self.detector.detect(source_text)).await?;
        utils::cancellable(cancel, self.provider.translate(&source, target, source_text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn sentences(count: usize, len: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{}{}", i % 10, "x".repeat(len - 1)))
            .collect()
    }

    fn detector(lang: &'static str) -> MockLanguageDetector {
        let mut detector = MockLanguageDetector::new();
        detector.expect_detect().returning(move |_| Ok(lang.to_string()));
        detector
    }

    #[test]
    fn test_split_packs_sentences_up_to_budget() {
        let parts = sentences(5, 900);
        let text = parts.join(SENTENCE_DELIMITER);

        let chunks = split_into_chunks(&text, 2000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
        assert_eq!(chunks.join(SENTENCE_DELIMITER), text);
    }

    #[test]
    fn test_split_is_lossless_for_multibyte_text() {
        let text = "पहला वाक्य। दूसरा वाक्य। तीसरा वाक्य।";
        let chunks = split_into_chunks(text, 12);
        assert_eq!(chunks.join(SENTENCE_DELIMITER), text);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let text = "a".repeat(5000);
        let chunks = split_into_chunks(&text, 2000);
        assert_eq!(chunks, vec![text.clone()]);

        let mixed = format!("short{}{}{}tail", SENTENCE_DELIMITER, text, SENTENCE_DELIMITER);
        let chunks = split_into_chunks(&mixed, 2000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].len(), 5000);
    }

    #[test]
    fn test_split_drops_blank_sentences() {
        assert!(split_into_chunks("", 2000).is_empty());
        assert_eq!(split_into_chunks("  ।  one । ", 2000), vec!["one"]);
        assert_eq!(split_into_chunks("a।  ।  b", 2000), vec!["a। b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_chunk_is_still_translated() {
        let text = "a".repeat(5000);
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .with(eq("en"), eq("hi"), eq(text.clone()))
            .times(1)
            .returning(|_, _, _| Ok("translated".to_string()));

        let translator = Translator::new(Arc::new(provider), Arc::new(detector("en")), TranslatorSettings::default());
        let chunks = translator.translate(&text, "hi", &CancellationToken::new()).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(assemble(&chunks), "translated");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_middle_chunk_becomes_marker() {
        let parts = sentences(3, 1500);
        let text = parts.join(SENTENCE_DELIMITER);
        let second = parts[1].clone();

        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .withf(move |_, _, text| text == second)
            .times(3)
            .returning(|_, _, _| Err(ProviderError::Network("quota exceeded".to_string())));
        provider
            .expect_translate()
            .times(2)
            .returning(|_, _, text| Ok(format!("T({})", &text[..1])));

        let translator = Translator::new(Arc::new(provider), Arc::new(detector("en")), TranslatorSettings::default());
        let started = tokio::time::Instant::now();
        let chunks = translator.translate(&text, "hi", &CancellationToken::new()).await.unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(assemble(&chunks), "T(0)\n\n[Translation failed for chunk 2]\n\nT(2)");
        // rate limit after chunks 1 and 2, two retry waits inside chunk 2
        assert_eq!(started.elapsed(), Duration::from_secs(5 + 10 + 10 + 5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_runs_per_chunk() {
        let parts = vec!["Hello there".to_string(), "Hola amigo".to_string()];
        let text = parts.join(SENTENCE_DELIMITER);
        let settings = TranslatorSettings {
            chunk_char_budget: 12,
            ..Default::default()
        };

        let mut seq = Sequence::new();
        let mut detector = MockLanguageDetector::new();
        detector
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("en".to_string()));
        detector
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("es".to_string()));

        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .returning(|source, _, _| Ok(format!("from-{}", source)));

        let translator = Translator::new(Arc::new(provider), Arc::new(detector), settings);
        let chunks = translator.translate(&text, "fr", &CancellationToken::new()).await.unwrap();

        assert_eq!(assemble(&chunks), "from-en\n\nfrom-es");
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_failure_counts_as_attempt() {
        let mut detector = MockLanguageDetector::new();
        detector
            .expect_detect()
            .times(1)
            .returning(|_| Err(ProviderError::Timeout("detect".to_string())));
        detector.expect_detect().returning(|_| Ok("en".to_string()));

        let mut provider = MockTranslationProvider::new();
        provider.expect_translate().times(1).returning(|_, _, _| Ok("ok".to_string()));

        let translator = Translator::new(Arc::new(provider), Arc::new(detector), TranslatorSettings::default());
        let chunks = translator.translate("hello", "hi", &CancellationToken::new()).await.unwrap();
        assert!(chunks[0].is_translated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_translation() {
        let mut provider = MockTranslationProvider::new();
        provider.expect_translate().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let translator = Translator::new(Arc::new(provider), Arc::new(detector("en")), TranslatorSettings::default());
        let result = translator.translate("hello", "hi", &cancel).await;
        assert_eq!(result, Err(ProviderError::Cancelled));
    }
}
