use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_LOG: &str = "warn";

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
    /// `tracing` filter directive, e.g. `grabview_html=debug`.
    pub log: Option<String>,
}

impl Config {
    /// Filter directive for the subscriber: `GRABVIEW_LOG`, then `log`, then `warn`.
    pub fn log_filter(&self) -> String {
        if let Ok(filter) = std::env::var("GRABVIEW_LOG") {
            if !filter.is_empty() {
                return filter;
            }
        }
        self.log
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG.to_string())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("grabview").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Config::default(),
    }
}

/// Reads a config file, falling back to defaults when it is missing or malformed.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };

    toml::from_str(&content).unwrap_or_default()
}
