/// Configuration management for excise
///
/// excise stores configuration in ~/.excise/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backup_manager::DEFAULT_MAX_BACKUPS;
use crate::excision::{DEFAULT_PATTERN, DEFAULT_TARGET};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to excise, and from where
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_file")]
    pub file: String,

    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default)]
    pub replacement: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
            pattern: default_pattern(),
            replacement: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Custom backup directory
    #[serde(default)]
    pub backup_dir: Option<String>,

    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_dir: None,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Context lines around removed blocks in previews
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a debug log to ~/.excise/excise.log
    #[serde(default)]
    pub debug: bool,
}

// Default functions for serde
fn default_file() -> String { DEFAULT_TARGET.to_string() }
fn default_pattern() -> String { DEFAULT_PATTERN.to_string() }
fn default_max_backups() -> usize { DEFAULT_MAX_BACKUPS }
fn default_context_lines() -> usize { 2 }
fn default_color() -> bool { true }

/// ~/.excise, created on demand
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;

    let config_dir = home_dir.join(".excise");
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    Ok(config_dir)
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// The commented template written on first use
fn get_default_config_content() -> String {
    format!(
        r#"# excise configuration file
#
# Command-line flags override everything here.

[target]
# File to rewrite when none is given on the command line
file = "{file}"

# Block to remove. Matched with '.' spanning newlines; every match is replaced.
pattern = '{pattern}'

# Text that replaces each match (default: nothing)
replacement = ""

[backup]
# Custom backup directory (default: ~/.excise/backups/)
#backup_dir = "/mnt/backups/excise"

# Number of snapshots to keep (1-1000)
max_backups = {max_backups}

[output]
# Context lines around removed blocks in previews (max 10)
context_lines = 2

# Colored output (NO_COLOR and non-terminal stdout still disable it)
color = true

[logging]
# Append a debug log to ~/.excise/excise.log
debug = false
"#,
        file = DEFAULT_TARGET,
        pattern = DEFAULT_PATTERN,
        max_backups = DEFAULT_MAX_BACKUPS,
    )
}

fn save_default_config(config_path: &Path) -> Result<()> {
    fs::write(config_path, get_default_config_content())
        .with_context(|| format!("Failed to write default config file: {}", config_path.display()))
}

/// Load ~/.excise/config.toml, creating it with defaults if needed.
/// A malformed file is replaced by the default template.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        save_default_config(config_path)?;
    }

    let config_str = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config: Config = match toml::from_str(&config_str) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %config_path.display(), error = %e, "malformed config replaced with defaults");
            save_default_config(config_path)?;
            return Ok(Config::default());
        }
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn show_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.target.file.trim().is_empty() {
        anyhow::bail!("Invalid target.file: must not be empty");
    }

    if config.target.pattern.is_empty() {
        anyhow::bail!("Invalid target.pattern: must not be empty");
    }

    if !(1..=1000).contains(&config.backup.max_backups) {
        anyhow::bail!("Invalid max_backups: {} (must be 1-1000)", config.backup.max_backups);
    }

    if config.output.context_lines > 10 {
        anyhow::bail!("Invalid context_lines: {} (max 10)", config.output.context_lines);
    }

    Ok(())
}
