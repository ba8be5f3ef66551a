use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rbkv::bench::Scenario;
use rbkv::config::{Config, LogConfig};

/// Concurrent benchmark for the rbkv red-black tree store
#[derive(Debug, Parser)]
#[command(name = "rbkv", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Print one JSON report per line
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Disjoint concurrent writers, then read-back verification
    Writes,
    /// Concurrent readers over a pre-populated store
    Reads,
    /// Random writers and readers at the same time
    Mixed,
    /// Run every scenario in turn
    All,
}

impl Command {
    fn scenarios(self) -> Vec<Scenario> {
        match self {
            Command::Writes => vec![Scenario::Writes],
            Command::Reads => vec![Scenario::Reads],
            Command::Mixed => vec![Scenario::Mixed],
            Command::All => Scenario::ALL.to_vec(),
        }
    }
}

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }

    init_tracing(&config.log)?;

    info!("Starting rbkv concurrent red-black tree benchmark");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    for scenario in cli.command.unwrap_or(Command::All).scenarios() {
        let report = scenario
            .run(&config.bench)
            .with_context(|| format!("{scenario} failed"))?;

        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{report}\n");
        }
    }

    info!("All scenarios passed");
    Ok(())
}
