//! CLI argument definitions for the headway binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Headway — a head-tracker to mouse, click, and dictation bridge.
#[derive(Parser, Debug)]
#[command(name = "headway", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Replay a recorded sensor capture file instead of a live link.
    #[arg(long = "replay")]
    pub replay: Option<PathBuf>,

    /// Delay between replayed sensor events, in milliseconds.
    #[arg(long = "pace-ms", default_value_t = 10)]
    pub pace_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Log injected input instead of performing it.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HEADWAY_CONFIG env var > ~/.headway/config.json.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HEADWAY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".headway").join("config.json");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".headway").join("config.json");
    }
    PathBuf::from("config.json")
}
