//! CLI argument definitions for the Parley server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use parley_core::ParleyConfig;
use std::path::PathBuf;

/// Parley - browser chat and scene analysis over local or cloud models.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind, e.g. 0.0.0.0 to listen on all interfaces.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        default_config_path(home_dir().as_deref())
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply_overrides(&self, config: &mut ParleyConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn home_dir() -> Option<String> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE").ok();
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME").ok();
    home
}

/// Default config file path under `home`, or the working directory without one.
fn default_config_path(home: Option<&str>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".parley").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
