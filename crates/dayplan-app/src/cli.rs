//! CLI argument definitions for the dayplan binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// dayplan: fit chores and todos around fixed events.
#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON event store, overriding the config file.
    #[arg(short = 's', long = "store", global = true)]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Place a batch of new events around the current schedule.
    Reconcile {
        /// JSON array of event records to add.
        #[arg(short = 'b', long = "batch")]
        batch: PathBuf,

        /// JSON array of event records already in the schedule. Defaults to
        /// every readable event in the store.
        #[arg(long = "schedule")]
        schedule: Option<PathBuf>,

        /// Write the resulting additions and removals back to the store.
        #[arg(long = "apply")]
        apply: bool,
    },
    /// Print stored events, optionally for a single day.
    Show {
        #[arg(short = 'd', long = "date")]
        date: Option<NaiveDate>,
    },
    /// Validate the configuration and print it as resolved.
    CheckConfig,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DAYPLAN_CONFIG env var > ~/.dayplan/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("DAYPLAN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the event store path.
    ///
    /// Priority: --store flag > config file value, with a leading `~/`
    /// expanded to the home directory.
    pub fn resolve_store_path(&self, config_path: &str) -> PathBuf {
        if let Some(ref p) = self.store {
            return p.clone();
        }
        expand_home(config_path)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

fn expand_home(path: &str) -> PathBuf {
    let rest = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"));
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".dayplan").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
