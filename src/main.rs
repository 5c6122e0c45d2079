use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use feedback_core::backend::LogBackend;
use feedback_core::config::Config;
use feedback_core::pipeline::moderation::ModerationPipeline;
use feedback_core::pipeline::{FeedbackInput, RequestMeta};
use feedback_core::web::{run_server, AppState};

/// feedback-core: a moderated feedback endpoint.
///
/// Submissions are scored for toxicity (Perspective) and checked for spam
/// (Akismet) before they reach the backend.
#[derive(Parser)]
#[command(name = "feedback-core", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the feedback endpoint, logging accepted submissions
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },

    /// Run the moderation checks on a piece of text and print the outcome
    Check {
        /// The feedback text to check
        text: String,

        /// Origin to report to the spam check
        #[arg(long)]
        origin: Option<String>,

        /// Client IP to report to the spam check
        #[arg(long)]
        ip: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("feedback_core=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            info!(
                perspective = config.perspective_enabled,
                akismet = config.akismet_enabled,
                allow_spam = config.allow_spam,
                dev_mode = config.dev_mode,
                "Configuration loaded"
            );
            let state = AppState::new(config, Arc::new(LogBackend))?
                .with_backend_attributes(LogBackend::attributes());
            run_server(state, port, &bind).await?;
        }

        Commands::Check { text, origin, ip } => {
            let config = Config::load()?;
            let pipeline = ModerationPipeline::from_config(&config)?;
            if pipeline.stage_names().is_empty() {
                println!("No checks enabled. Set PERSPECTIVE_API_KEY and/or AKISMET_API_KEY.");
            }

            let meta = RequestMeta {
                origin,
                client_ip: ip,
                ..RequestMeta::default()
            };
            let report = pipeline.moderate(&FeedbackInput::new(text), &meta).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
