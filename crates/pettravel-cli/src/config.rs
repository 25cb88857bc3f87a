use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use pettravel_client::ClientConfig;
use pettravel_client::config::{DEFAULT_API_BASE_URL, parse_base_url, parse_timeout};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ProfileConfig {
    pub api_url: Option<String>,
    pub format: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn base_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".pettravel");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("config.toml"))
}

/// Directory holding the persisted session of `profile`.
pub fn session_dir(profile: &str) -> Result<PathBuf> {
    if profile.is_empty() || !profile.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        anyhow::bail!("Invalid profile name \"{profile}\": use letters, digits, '-' or '_'");
    }
    let dir = base_dir()?.join(profile);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all()?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

/// Applies `key = value` to a profile, validating the value.
pub fn set_value(config: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" => {
            parse_base_url(value)?;
            config.api_url = Some(value.trim().to_string());
        }
        "format" => {
            if parse_format(value).is_none() {
                anyhow::bail!("Invalid format \"{value}\". Valid formats: json, yaml, table");
            }
            config.format = Some(value.to_string());
        }
        "timeout" => {
            config.timeout = Some(parse_timeout(value)?.as_secs());
        }
        other => anyhow::bail!("Unknown config key: {other}. Valid keys: api_url, format, timeout"),
    }
    Ok(())
}

fn parse_format(value: &str) -> Option<OutputFormat> {
    match value.to_ascii_lowercase().as_str() {
        "json" => Some(OutputFormat::Json),
        "yaml" => Some(OutputFormat::Yaml),
        "table" => Some(OutputFormat::Table),
        _ => None,
    }
}

/// Output format: `--format`, then the profile, then JSON.
pub fn resolve_format(cli: &Cli, profile: &ProfileConfig) -> OutputFormat {
    cli.format
        .or_else(|| profile.format.as_deref().and_then(parse_format))
        .unwrap_or_default()
}

/// Client settings: flags and env first, then the profile, then defaults.
pub fn resolve_client_config(cli: &Cli, profile: &ProfileConfig) -> Result<ClientConfig> {
    let api_url = cli
        .api_url
        .as_deref()
        .or(profile.api_url.as_deref())
        .unwrap_or(DEFAULT_API_BASE_URL);
    let mut config = ClientConfig::new(api_url)
        .with_context(|| format!("Invalid API URL \"{api_url}\""))?
        .with_user_agent(concat!("pettravel-cli/", env!("CARGO_PKG_VERSION")));

    if let Some(secs) = cli.timeout.or(profile.timeout) {
        if secs == 0 {
            anyhow::bail!("Timeout must be at least one second");
        }
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}
