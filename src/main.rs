use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_translator::cli::{Cli, Commands};
use video_translator::config::Config;
use video_translator::extractors::youtube::YtDlpClient;
use video_translator::extractors::VideoReference;
use video_translator::pipeline::PipelineOrchestrator;
use video_translator::status::VideoStatusChecker;
use video_translator::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_translator=debug"
    } else {
        "video_translator=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref()).await?;
    if cli.quiet {
        config.app.show_progress = false;
    }

    match cli.command {
        Commands::Translate {
            url,
            target,
            no_translate,
            retries,
            output,
        } => {
            warn_missing_dependencies(&config).await;

            if let Some(retries) = retries {
                config.pipeline.max_attempts = retries;
            }
            let target = if no_translate {
                None
            } else {
                target.or_else(|| config.translation.target_language.clone())
            };

            let pipeline = PipelineOrchestrator::from_config(&config)
                .context("Failed to set up the pipeline")?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Cancelling...");
                    on_interrupt.cancel();
                }
            });

            let result = pipeline.run(&url, target.as_deref(), &cancel).await?;

            output::print_to_console(&result);
            if let Some(dir) = output {
                for path in output::save_to_dir(&result, &dir)? {
                    println!("Saved: {}", path.display());
                }
            }
        }
        Commands::Status { url } => {
            let video = VideoReference::parse(&url);
            if video.id().is_none() {
                anyhow::bail!("Invalid YouTube URL: {}", url);
            }

            warn_missing_dependencies(&config).await;
            let checker = VideoStatusChecker::new(std::sync::Arc::new(YtDlpClient::from_config(
                &config.acquisition,
            )));
            let status = checker.check(video.url()).await;
            println!("{}", status.reason());
            if !status.is_ready() {
                std::process::exit(2);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("Configuration file: {}", path.display());
                println!("Run with --show to print the current settings.");
            }
        }
    }

    Ok(())
}

/// Missing tools only disable some strategies, so this never aborts
async fn warn_missing_dependencies(config: &Config) {
    let missing = utils::check_dependencies(
        &config.acquisition.yt_dlp_path,
        &config.acquisition.whisper.binary,
    )
    .await;

    if !missing.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }
}
