// Prose Cascade command-line entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prose_cascade::{ConfigService, Orchestrator};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "prose-cascade",
    about = "Turn writing-style feedback into rewrite suggestions",
    version
)]
struct Args {
    /// Config file (defaults to ~/.prose-cascade/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one issue and print the suggestion as JSON
    Resolve {
        /// Feedback text reported for the sentence
        #[arg(long)]
        feedback: String,

        /// The sentence to rewrite
        #[arg(long)]
        sentence: String,

        /// Document type (general, technical, academic, ...)
        #[arg(long)]
        document_type: Option<String>,

        /// Writing goal; repeat for several
        #[arg(long = "goal")]
        goals: Vec<String>,
    },
    /// Print today's metered quota usage as JSON
    Quota,
    /// Print the active configuration as JSON
    Config {
        /// Overwrite the config file with defaults first
        #[arg(long)]
        reset: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prose_cascade=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<ConfigService> {
    let service = match path {
        Some(path) => ConfigService::open(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ConfigService::new().context("failed to load config")?,
    };
    Ok(service)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config)?;
    tracing::debug!("Using config {}", config.path().display());

    if let Command::Config { reset } = args.command {
        if reset {
            config.reset().context("failed to reset config")?;
            tracing::info!("Reset config at {}", config.path().display());
        }
        println!("{}", serde_json::to_string_pretty(config.get_config())?);
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(config.get_config())?;

    match args.command {
        Command::Resolve {
            feedback,
            sentence,
            document_type,
            goals,
        } => {
            let suggestion = orchestrator
                .resolve_feedback(&feedback, &sentence, document_type.as_deref(), &goals)
                .await;
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
        }
        Command::Quota => {
            let status = orchestrator
                .quota_status()
                .context("no quota tracker configured")?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Config { .. } => {}
    }
    Ok(())
}
