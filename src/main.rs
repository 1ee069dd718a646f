//! Reelpress - upload, probe, and re-encode media with ffmpeg
//!
//! Entry point: parses the command line, sets up logging, loads configuration
//! and runs the requested command.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelpress::cli::{Args, Commands};
use reelpress::config::Config;
use reelpress::janitor;
use reelpress::media::{version_info, MediaCommandBuilder};
use reelpress::upload::{MetadataTag, ProcessingOptions, UploadRequest};
use reelpress::web;
use reelpress::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Held until exit so buffered file logs are flushed
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env()?;

    match args.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            check_tools(&config).await.ok();

            let _janitor = janitor::spawn(&config.storage);
            web::serve(&config, Workflow::new(&config)).await?;
        }
        Commands::Check => {
            check_tools(&config).await?;
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
        Commands::Process {
            input,
            overlay,
            title,
            artist,
            album,
            genre,
            year,
            comment,
            copyright,
        } => {
            let values = [
                (MetadataTag::Title, title),
                (MetadataTag::Artist, artist),
                (MetadataTag::Album, album),
                (MetadataTag::Genre, genre),
                (MetadataTag::Year, year),
                (MetadataTag::Comment, comment),
                (MetadataTag::Copyright, copyright),
            ];
            let metadata: std::collections::HashMap<_, _> = values
                .into_iter()
                .filter_map(|(tag, value)| value.map(|v| (tag, v)))
                .collect();

            let options = ProcessingOptions {
                overlay_enabled: overlay,
                metadata_enabled: !metadata.is_empty(),
                metadata,
            };

            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let request = UploadRequest {
                filename: input.file_name().map(|name| name.to_string_lossy().into_owned()),
                data,
                options,
            };

            let workflow = Workflow::new(&config);
            workflow.storage().ensure_dirs().await?;
            let output = workflow.process(request).await?;
            println!("{}", output.output_path.display());
        }
    }

    Ok(())
}

/// Log ffmpeg / ffprobe versions, failing if either cannot run.
async fn check_tools(config: &Config) -> Result<()> {
    let builder = MediaCommandBuilder::new(&config.media);
    let mut missing = Vec::new();

    for binary in [&config.media.ffmpeg_path, &config.media.ffprobe_path] {
        match version_info(binary, &builder).await {
            Ok(version) => info!("{}: {}", binary, version),
            Err(e) => {
                warn!("{} unavailable: {}", binary, e);
                missing.push(binary.as_str());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Missing media tools: {}", missing.join(", "))
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".reelpress").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotated file
    let file_appender = rolling::daily(&log_dir, "reelpress.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("reelpress.log").display());

    Ok(guard)
}
