use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::ProviderError;

/// Sleep for `duration` unless the token is cancelled first
pub async fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> Result<(), ProviderError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Race a provider call against cancellation; the call is dropped when cancelled
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = fut => result,
    }
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format a wait in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else if total_seconds == 0 && duration.subsec_millis() > 0 {
        format!("{}ms", duration.subsec_millis())
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, spaces, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Spinner for a long-running step; hidden when progress output is disabled
pub fn spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));
    progress.set_message(message.to_string());
    progress
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp: &str, whisper: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp, "--version").await {
        missing.push(format!("{} - required for video metadata, captions and audio streams", yt_dlp));
    }

    if !check_command_available(whisper, "--help").await {
        missing.push(format!("{} - required for the speech-to-text fallback", whisper));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, probe_arg: &str) -> bool {
    use std::process::Stdio;
    use tokio::process::Command;

    Command::new(command)
        .arg(probe_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello World!"), "Hello World_");
        assert_eq!(sanitize_filename("zh-CN"), "zh-CN");
        assert_eq!(sanitize_filename("mni/Mtei"), "mni_Mtei");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_cancellable() {
        let cancel = CancellationToken::new();
        tokio_test::assert_ok!(sleep_cancellable(Duration::from_secs(10), &cancel).await);

        cancel.cancel();
        let started = tokio::time::Instant::now();
        let result = sleep_cancellable(Duration::from_secs(10), &cancel).await;
        assert_eq!(result, Err(ProviderError::Cancelled));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cancellable_drops_pending_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), _> = cancellable(&cancel, std::future::pending()).await;
        assert_eq!(result, Err(ProviderError::Cancelled));
    }

    #[tokio::test]
    async fn test_missing_tools_are_reported() {
        let missing = check_dependencies("no-such-yt-dlp", "no-such-whisper").await;
        assert_eq!(missing.len(), 2);
        assert!(missing[0].starts_with("no-such-yt-dlp"));
    }
}
