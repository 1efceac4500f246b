use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/capture_prompt";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const LOG_FILENAME: &str = "PROMPTS_INPUT_LOG.md";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub hook: HookConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HookConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub model: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        HookConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 2000,
            model: "claude-sonnet-4-5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// File name used inside a workspace directory
    pub log_filename: String,
    /// Log used when the request has no usable workspace.
    /// Relative paths resolve against the service's working directory.
    pub fallback_log: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_filename: LOG_FILENAME.to_string(),
            fallback_log: PathBuf::from(LOG_FILENAME),
        }
    }
}

impl Config {
    /// Load config from `path`, or ~/.prompt-capture/config.toml.
    /// A missing file yields the defaults and nothing is written.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        Self::read_from(&config_path)
    }

    fn read_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        Ok(config)
    }

    /// Write this config to `path` (or the default location) with a header comment.
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() && !force {
            anyhow::bail!(
                "Config already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }

        // Ensure directory exists
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        let content_with_header = format!(
            "# Prompt capture configuration\n\
             # [hook]   where the UserPromptSubmit hook posts prompts\n\
             # [server] where `prompt-capture serve` listens and logs\n\
             \n{}",
            content
        );

        fs::write(&config_path, content_with_header)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(config_path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .context("Neither USERPROFILE nor HOME environment variable is set")?;

        Ok(PathBuf::from(home).join(".prompt-capture").join("config.toml"))
    }
}
