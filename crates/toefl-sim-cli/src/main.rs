//! toefl-sim CLI: timed TOEFL reading and writing practice in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use toefl_sim_core::model::{WritingTaskKind, DEFAULT_QUESTIONS};

mod commands;

#[derive(Parser)]
#[command(
    name = "toefl-sim",
    version,
    about = "TOEFL reading and writing practice with generated material"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a timed reading section
    Reading {
        /// Question types, comma-separated (e.g. "inference,vocabulary")
        #[arg(long)]
        types: Option<String>,

        /// Number of questions (4-14)
        #[arg(long, default_value_t = DEFAULT_QUESTIONS)]
        count: usize,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a timed essay and get rubric feedback
    Writing {
        /// Task kind: integrated or independent
        #[arg(long, default_value = "independent")]
        task: WritingTaskKind,

        /// Read the essay from a file instead of stdin
        #[arg(long)]
        essay_file: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the reading topics and writing themes
    Topics {
        /// Only show one catalog
        #[arg(long, value_enum)]
        kind: Option<commands::topics::CatalogKind>,
    },

    /// Check that the configured model answers
    Check {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("toefl_sim=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reading {
            types,
            count,
            config,
        } => commands::reading::execute(types, count, config).await,
        Commands::Writing {
            task,
            essay_file,
            config,
        } => commands::writing::execute(task, essay_file, config).await,
        Commands::Topics { kind } => commands::topics::execute(kind),
        Commands::Check { config } => commands::check::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
