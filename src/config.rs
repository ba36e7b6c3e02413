use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// What the detail pane does when the selection changes
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetailScroll {
    /// Jump back to the top of the record
    #[default]
    Reset,
    /// Keep the current scroll offset
    Keep,
}

/// Configuration for jlv
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Initial fraction of the width given to the log pane
    pub split_ratio: f64,
    /// How much `h`/`l` move the divider
    pub split_step: f64,
    /// Theme name (see `Theme::by_name`)
    pub theme: String,
    pub detail_scroll: DetailScroll,
    /// Start in the matches-only view
    pub matches_only: bool,
    /// Where to write diagnostics; logging is off when unset
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            split_ratio: 0.5,
            split_step: 0.05,
            theme: "nord".to_string(),
            detail_scroll: DetailScroll::Reset,
            matches_only: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/jlv/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jlv").join("config.toml"))
    }

    /// Load the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `JLV_*` overrides; unparsable values are ignored
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ratio) = var("JLV_SPLIT_RATIO").and_then(|s| s.parse().ok()) {
            self.split_ratio = ratio;
        }
        if let Some(theme) = var("JLV_THEME") {
            self.theme = theme;
        }
        if let Some(path) = var("JLV_LOG").filter(|s| !s.is_empty()) {
            self.log_file = Some(PathBuf::from(path));
        }
    }
}
