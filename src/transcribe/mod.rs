use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::config::{AcquisitionConfig, AppConfig, WhisperConfig};
use crate::utils;
use crate::ProviderError;

/// Local speech-to-text model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file into plain text
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ProviderError>;
}

/// Speech-to-text through the `whisper` command line tool
pub struct WhisperCli {
    binary: String,
    model: String,
    model_dir: PathBuf,
    device: String,
    timeout: Duration,
    show_progress: bool,
}

impl WhisperCli {
    pub fn new(config: &WhisperConfig, show_progress: bool) -> Self {
        Self {
            binary: config.binary.clone(),
            model: config.model.clone(),
            model_dir: config.resolved_model_dir(),
            device: config.device.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            show_progress,
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperCli {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ProviderError> {
        fs_err::create_dir_all(&self.model_dir)?;
        let output_dir = tempfile::tempdir()?;

        tracing::info!("Transcribing {} with whisper model '{}'", audio_path.display(), self.model);
        let progress = utils::spinner("Transcribing audio locally...", self.show_progress);

        let child = Command::new(&self.binary)
            .arg(audio_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--model_dir")
            .arg(&self.model_dir)
            .arg("--device")
            .arg(&self.device)
            .args(["--fp16", "False", "--output_format", "txt", "--verbose", "False"])
            .arg("--output_dir")
            .arg(output_dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(format!("whisper did not finish within {:?}", self.timeout)))??;

        if !output.status.success() {
            progress.finish_with_message("Transcription failed");
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Tool(format!("whisper failed: {}", error.trim())));
        }

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| ProviderError::Tool(format!("audio path has no file name: {}", audio_path.display())))?;
        let transcript_path = output_dir.path().join(stem).with_extension("txt");
        let text = fs_err::read_to_string(&transcript_path)?;

        progress.finish_with_message("Transcription complete");
        Ok(text.trim().to_string())
    }
}

/// Downloads an audio stream into a scoped temporary file
pub struct AudioDownloader {
    client: Client,
    temp_dir: Option<PathBuf>,
    stall_timeout: Duration,
    max_bytes: u64,
    show_progress: bool,
}

impl AudioDownloader {
    pub fn new(
        client: Client,
        temp_dir: Option<PathBuf>,
        stall_timeout: Duration,
        max_bytes: u64,
        show_progress: bool,
    ) -> Self {
        Self {
            client,
            temp_dir,
            stall_timeout,
            max_bytes,
            show_progress,
        }
    }

    pub fn from_config(acquisition: &AcquisitionConfig, app: &AppConfig) -> Result<Self, ProviderError> {
        let stall_timeout = Duration::from_secs(acquisition.audio_stall_timeout_secs);
        let client = Client::builder().connect_timeout(stall_timeout).build()?;

        Ok(Self::new(
            client,
            app.temp_dir.clone(),
            stall_timeout,
            acquisition.max_audio_bytes,
            app.show_progress,
        ))
    }

    /// Stream `url` into a new temporary file. The file is removed when the handle drops,
    /// so an error (or a dropped future) never leaves it behind.
    pub async fn download(&self, url: &str) -> Result<NamedTempFile, ProviderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("audio_").suffix(".webm");
        let mut file = match &self.temp_dir {
            Some(dir) => {
                fs_err::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        tracing::info!("Downloading audio to: {}", file.path().display());

        let response = tokio::time::timeout(self.stall_timeout, self.client.get(url).send())
            .await
            .map_err(|_| ProviderError::Timeout("audio stream did not respond".to_string()))??;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Failed to download audio: HTTP {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(ProviderError::TooLarge { limit: self.max_bytes });
            }
        }

        let progress = utils::spinner("Downloading audio...", self.show_progress);
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::time::timeout(self.stall_timeout, stream.next())
                .await
                .map_err(|_| ProviderError::Timeout(format!("audio download stalled for {:?}", self.stall_timeout)))?;

            let Some(chunk) = next else { break };
            let chunk = chunk?;

            downloaded += chunk.len() as u64;
            if downloaded > self.max_bytes {
                progress.finish_with_message("Download aborted");
                return Err(ProviderError::TooLarge { limit: self.max_bytes });
            }

            file.as_file_mut().write_all(&chunk)?;
            progress.set_message(format!("Downloading audio... {}", utils::format_file_size(downloaded)));
        }

        file.as_file_mut().flush()?;
        progress.finish_with_message("Download complete");
        tracing::debug!("Downloaded {} of audio", utils::format_file_size(downloaded));

        Ok(file)
    }
}
