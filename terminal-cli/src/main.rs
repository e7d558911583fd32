//! Headless driver for the wheelhouse engine.

mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use wheelhouse_execution::logging::format_number_list;
use wheelhouse_execution::{GroupRegistry, Table};
use wheelhouse_types::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "wheelhouse", author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines spin log and print one report per resolved spin.
    Replay {
        /// Engine configuration (YAML).
        #[arg(long)]
        config: PathBuf,

        /// Spin log, one JSON object per line.
        #[arg(long)]
        spins: PathBuf,

        /// Overrides `log_level` from the configuration file.
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Validate a configuration file and print it.
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// List every wagerable group, including custom groups from an optional configuration.
    Groups {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file {}", path.display()))?;
    let config: EngineConfig =
        serde_yaml::from_str(&contents).context("Could not parse config file")?;
    config.validate().context("Invalid config file")?;
    Ok(config)
}

fn init_tracing(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("invalid log level: {level}"))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    match Args::parse().command {
        Command::Replay {
            config,
            spins,
            log_level,
        } => {
            let config = load_config(&config)?;
            init_tracing(log_level.as_deref().unwrap_or(&config.log_level))?;
            let file = File::open(&spins)
                .with_context(|| format!("Could not open spin log {}", spins.display()))?;
            let mut table = Table::new(config, 0).context("Could not open table")?;
            let stdout = io::stdout();
            replay::replay(&mut table, BufReader::new(file), stdout.lock())?;
        }
        Command::Check { config } => {
            let config = load_config(&config)?;
            let yaml = serde_yaml::to_string(&config).context("Could not encode config")?;
            print!("{yaml}");
        }
        Command::Groups { config } => {
            let registry = match config {
                Some(path) => {
                    let config = load_config(&path)?;
                    GroupRegistry::with_custom_groups(&config.custom_groups)?
                }
                None => GroupRegistry::standard(),
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for group in registry.groups() {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    group.key,
                    group.category,
                    group.payout,
                    format_number_list(&group.members)
                )?;
            }
        }
    }
    Ok(())
}
