//! Subrelay - video transcription and caption relay
//!
//! Entry point: loads configuration, sets up logging and dispatches the
//! CLI subcommands, the main one being the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use subrelay::cli::{Args, Commands, ConfigAction};
use subrelay::config::Config;
use subrelay::media::MediaProcessorFactory;
use subrelay::server::{self, AppState};
use subrelay::subtitle::{CaptionEntry, format_srt, write_srt};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry the key
    dotenvy::dotenv().ok();

    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env()?;

    match args.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let state = AppState::from_config(&config)?;
            server::serve(state, &config.server).await?;
        }
        Commands::Srt { input, output } => {
            let content = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let captions: Vec<CaptionEntry> = serde_json::from_str(&content)
                .with_context(|| format!("Invalid caption list in {}", input.display()))?;

            match output {
                Some(output) => write_srt(&captions, &output).await?,
                None => print!("{}", format_srt(&captions)),
            }
        }
        Commands::Check => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;
            println!("{}", media.get_version_info().await?);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config)?;
                println!("{}", content);
            }
            ConfigAction::Init { output } => {
                Config::default().save_to_file(&output)?;
                println!("Default configuration written to {}", output.display());
            }
        },
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subrelay").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subrelay.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

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
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subrelay.log").display());

    Ok(())
}
