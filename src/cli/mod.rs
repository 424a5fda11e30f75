use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "video-translator",
    about = "Video Translator - Fetch what a YouTube video says and translate it",
    version,
    long_about = "Fetches the spoken content of a YouTube video (published transcript, caption track or local Whisper transcription) and translates it chunk by chunk into the language of your choice."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "VIDEO_TRANSLATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and translate the spoken content of a video
    Translate {
        /// YouTube URL (youtube.com/watch?v=... or youtu.be/...)
        #[arg(value_name = "URL")]
        url: String,

        /// Target language code, e.g. hi, fr, zh-CN (defaults to the configured language)
        #[arg(short, long, value_name = "LANG")]
        target: Option<String>,

        /// Only fetch the original text
        #[arg(long, conflicts_with = "target")]
        no_translate: bool,

        /// Attempts for the whole pipeline when the video is temporarily unavailable
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=5))]
        retries: Option<u32>,

        /// Directory for plain-text exports of the original and translated text
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Check whether a video can be processed right now
    Status {
        /// YouTube URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show or locate the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
