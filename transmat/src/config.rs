//! Configuration for the transmat CLI
//!
//! Sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`TRANSMAT_*`)
//! 3. Configuration files (.transmat.yaml, .transmat.json, etc.)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use transmat_parser::CompatMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransmatConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// `matlab` accepts command syntax and recovers after a malformed
    /// if-condition; `strict` rejects both
    #[serde(default)]
    pub compat: CompatMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Indent JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub debug: bool,
}

/// How the syntax tree is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// Rust `{:#?}` rendering
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

impl TransmatConfig {
    /// Effective log level: `debug: true` wins over `level`
    pub fn log_filter(&self) -> log::LevelFilter {
        if self.logging.debug {
            log::LevelFilter::Debug
        } else {
            self.logging.level.into()
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Result<TransmatConfig> {
        let mut config = Self::load_from_files()?;
        Self::apply_environment_variables(&mut config);
        Ok(config)
    }

    fn load_from_files() -> Result<TransmatConfig> {
        for path in Self::find_config_files() {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(TransmatConfig::default())
    }

    fn find_config_files() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(config_path) = env::var("TRANSMAT_CONFIG") {
            paths.push(PathBuf::from(config_path));
        }

        if let Ok(current_dir) = env::current_dir() {
            for name in [
                ".transmat.yaml",
                ".transmat.yml",
                ".transmat.json",
                ".transmat.toml",
                "transmat.config.yaml",
                "transmat.config.yml",
                "transmat.config.json",
                "transmat.config.toml",
            ] {
                paths.push(current_dir.join(name));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".transmat.yaml"));
            paths.push(home_dir.join(".transmat.yml"));
            paths.push(home_dir.join(".transmat.json"));
            paths.push(home_dir.join(".transmat.toml"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("transmat/config.yaml"));
            paths.push(config_dir.join("transmat/config.yml"));
            paths.push(config_dir.join("transmat/config.json"));
            paths.push(config_dir.join("transmat/config.toml"));
        }

        paths
    }

    pub fn load_from_file(path: &Path) -> Result<TransmatConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            _ => {
                if let Ok(config) = serde_yaml::from_str(&content) {
                    config
                } else if let Ok(config) = serde_json::from_str(&content) {
                    config
                } else {
                    return Err(anyhow::anyhow!(
                        "Could not parse config file {} (tried YAML, JSON)",
                        path.display()
                    ));
                }
            }
        };

        Ok(config)
    }

    fn apply_environment_variables(config: &mut TransmatConfig) {
        apply_overrides(config, |key| env::var(key).ok());
    }

    pub fn save_to_file(config: &TransmatConfig, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize config to JSON")?,
            Some("toml") => {
                toml::to_string_pretty(config).context("Failed to serialize config to TOML")?
            }
            _ => serde_yaml::to_string(config).context("Failed to serialize config to YAML")?,
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    pub fn generate_sample_config() -> String {
        let config = TransmatConfig::default();
        serde_yaml::to_string(&config).unwrap_or_else(|_| "# Failed to generate config".to_string())
    }
}

/// Applies `TRANSMAT_*` overrides read through `lookup`. Unrecognized values
/// leave the current setting alone.
fn apply_overrides(config: &mut TransmatConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(compat) = lookup("TRANSMAT_COMPAT") {
        config.parser.compat = match compat.to_lowercase().as_str() {
            "matlab" => CompatMode::Matlab,
            "strict" => CompatMode::Strict,
            _ => config.parser.compat,
        };
    }

    if let Some(format) = lookup("TRANSMAT_FORMAT") {
        config.output.format = OutputFormat::from_str(&format, true).unwrap_or(config.output.format);
    }

    if let Some(pretty) = lookup("TRANSMAT_PRETTY") {
        config.output.pretty = parse_bool(&pretty).unwrap_or(config.output.pretty);
    }

    if let Some(debug) = lookup("TRANSMAT_DEBUG") {
        config.logging.debug = parse_bool(&debug).unwrap_or(false);
    }

    if let Some(level) = lookup("TRANSMAT_LOG_LEVEL") {
        config.logging.level = LogLevel::from_str(&level, true).unwrap_or(config.logging.level);
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disable" | "disabled" => Some(false),
        "" => Some(false),
        _ => None,
    }
}
