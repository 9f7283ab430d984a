use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use case_history_core::models::settings::Settings;

/// Fetch CS2 case openings from a Steam inventory history and summarize them
#[derive(Parser, Debug)]
#[command(name = "case-history", version, about, long_about = None)]
pub struct Cli {
    /// Steam profile URL, e.g. https://steamcommunity.com/id/<name>/
    #[arg(long)]
    pub profile_url: Option<String>,

    /// Cookie header of a logged-in Steam session (must contain sessionid)
    #[arg(long, env = "CASE_HISTORY_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the report and cache files
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Walk the whole history instead of stopping at cached events
    #[arg(long)]
    pub full: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// Settings from `path` (defaults when absent), then CLI overrides.
pub fn load_settings(path: Option<&Path>, cli: &Cli) -> Result<Settings> {
    let mut settings = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file: {:?}", p))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", p))?
        }
        None => Settings::default(),
    };

    if let Some(dir) = &cli.results_dir {
        settings.results_dir = dir.clone();
    }
    Ok(settings)
}
