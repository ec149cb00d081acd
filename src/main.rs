use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use trackwatch::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "trackwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch shipment tracking pages and alert on new status events", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch tracking ids until Ctrl-C (prompts for ids when none are given)
    Track {
        /// Tracking ids (whitespace separated; duplicates ignored)
        ids: Vec<String>,

        /// Config file (default: ./trackwatch.toml, then the user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the last saved status history of a tracking id
    Status {
        /// Tracking id
        id: String,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,

        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so alerts on stdout stay readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }

    // Workers still finishing an in-flight fetch are not waited for
    runtime.shutdown_background();
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Track { ids, config } => {
            trackwatch::cli::track::run(&ids, config.as_deref()).await?;
        }

        Commands::Status { id, json, config } => {
            trackwatch::cli::status::run(&id, json, config.as_deref())?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "trackwatch", &mut io::stdout());
        }
    }

    Ok(())
}
