use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::settings::Settings;

mod cli;
mod core;
mod daemon;
mod providers;

#[derive(Parser)]
#[command(name = "covid-dashboard")]
#[command(author, version, about = "Personal covid dashboard with scheduled data and news updates")]
struct Cli {
    /// Path to config.json (default: ./config.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard
    Serve,

    /// Fetch and show the current covid stats
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch and show the latest covid news
    News {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Number of articles to request (default: news.article_count)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Summarise a nation-level covid CSV export
    Csv {
        /// CSV file to read
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let (settings, source) = Settings::load(config)?;
    init_logging(settings.log_file()?.as_deref())?;
    source.log();
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve => {
            let settings = load_settings(config)?;
            daemon::run(settings).await
        }
        Commands::Status { json } => {
            let settings = load_settings(config)?;
            cli::status::run(&settings, json).await
        }
        Commands::News { json, count } => {
            let settings = load_settings(config)?;
            cli::news::run(&settings, json, count).await
        }
        Commands::Csv { path, json } => {
            init_logging(None)?;
            cli::csv::run(&path, json)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
