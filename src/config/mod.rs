use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whole-pipeline retry settings
    pub pipeline: PipelineConfig,

    /// Transcript, caption and audio acquisition settings
    pub acquisition: AcquisitionConfig,

    /// Translation settings
    pub translation: TranslationConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Attempts for the whole pipeline (1-5)
    pub max_attempts: u32,

    /// Backoff after attempt `n` is `n * backoff_base_secs`
    pub backoff_base_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Transcript languages in order of preference
    pub transcript_languages: Vec<String>,

    /// Language of the caption track looked up when no transcript exists
    pub caption_language: String,

    /// Timeout for metadata extraction
    pub metadata_timeout_secs: u64,

    /// Timeout for transcript HTTP requests
    pub http_timeout_secs: u64,

    /// Abort the audio download when no data arrives for this long
    pub audio_stall_timeout_secs: u64,

    /// Upper bound on the downloaded audio size
    pub max_audio_bytes: u64,

    /// Local speech-to-text model
    pub whisper: WhisperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// whisper executable
    pub binary: String,

    /// Model tier
    pub model: String,

    /// Cached model directory (defaults to ~/.cache/whisper)
    pub model_dir: Option<PathBuf>,

    /// Inference device
    pub device: String,

    /// Upper bound on a single transcription run
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Default target language; translation is skipped when empty
    pub target_language: Option<String>,

    /// Translation endpoint
    pub endpoint: String,

    /// Character budget of a chunk
    pub chunk_char_budget: usize,

    /// Attempts per chunk before a failure marker is substituted
    pub max_attempts_per_chunk: u32,

    /// Pause after each successfully translated chunk
    pub rate_limit_delay_ms: u64,

    /// Pause between failed attempts of the same chunk
    pub retry_delay_ms: u64,

    /// Timeout for one translation request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Temporary directory for downloads
    pub temp_dir: Option<PathBuf>,

    /// Show spinners for long-running steps
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 5,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            transcript_languages: vec!["en".to_string(), "hi".to_string()],
            caption_language: "en".to_string(),
            metadata_timeout_secs: 30,
            http_timeout_secs: 30,
            audio_stall_timeout_secs: 30,
            max_audio_bytes: 512 * 1024 * 1024,
            whisper: WhisperConfig::default(),
        }
    }
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary: "whisper".to_string(),
            model: "base".to_string(),
            model_dir: None,
            device: "cpu".to_string(),
            timeout_secs: 3600,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: Some("hi".to_string()),
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            chunk_char_budget: 2000,
            max_attempts_per_chunk: 3,
            rate_limit_delay_ms: 5000,
            retry_delay_ms: 10000,
            request_timeout_secs: 30,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            show_progress: true,
        }
    }
}

impl WhisperConfig {
    /// Model cache directory, falling back to ~/.cache/whisper
    pub fn resolved_model_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".cache")
                .join("whisper")
        })
    }
}

impl PipelineConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }
}

impl Config {
    /// Load configuration from `path` (or the default location), creating a default file if missing
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(&config_path).await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("video-translator").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.pipeline.max_attempts) {
            anyhow::bail!(
                "pipeline.max_attempts must be between 1 and 5 (got {})",
                self.pipeline.max_attempts
            );
        }

        if self.acquisition.transcript_languages.is_empty() {
            anyhow::bail!("acquisition.transcript_languages must name at least one language");
        }

        if self.translation.chunk_char_budget == 0 {
            anyhow::bail!("translation.chunk_char_budget must be positive");
        }

        if self.translation.max_attempts_per_chunk == 0 {
            anyhow::bail!("translation.max_attempts_per_chunk must be positive");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Pipeline Attempts: {}", self.pipeline.max_attempts);
        println!("  Backoff Base: {}s", self.pipeline.backoff_base_secs);
        println!("  Transcript Languages: {}", self.acquisition.transcript_languages.join(", "));
        println!("  Caption Language: {}", self.acquisition.caption_language);
        println!("  Whisper Model: {} ({})", self.acquisition.whisper.model, self.acquisition.whisper.device);
        println!(
            "  Target Language: {}",
            self.translation.target_language.as_deref().unwrap_or("(none)")
        );
        println!("  Chunk Budget: {} chars", self.translation.chunk_char_budget);
        if let Some(dir) = &self.app.temp_dir {
            println!("  Temp Dir: {}", dir.display());
        }
    }
}
