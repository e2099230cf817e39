use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use mado::actor::replay;
use mado::common::{config::Config, log};

#[derive(Parser)]
#[command(name = "mado", version, about = "Reactive multi-monitor window manager core")]
struct Cli {
    /// Config file to use instead of the platform default location.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter spec, e.g. `debug` or `mado::actor=trace`.
    #[arg(long, value_name = "SPEC")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drives a recorded message script through the dispatcher against a
    /// simulated desktop and prints the resulting state.
    Replay {
        /// JSON script with the simulated desktop seed and the messages.
        script: PathBuf,
    },
    /// Loads and validates the config, then prints the effective values.
    CheckConfig,
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    match Config::default_path() {
        Some(path) if path.exists() => Ok(Config::load(&path)?),
        _ => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init(cli.log.as_deref());
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Replay { script } => {
            let script = replay::load(&script)?;
            let snapshot = replay::replay(config, script)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::CheckConfig => {
            let rendered =
                toml::to_string_pretty(&config).context("failed to render config")?;
            print!("{rendered}");
        }
    }
    Ok(())
}
