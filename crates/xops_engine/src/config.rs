use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xops_logging::{xops_info, xops_warn};

pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_POSTS_PER_DAY: usize = 15;
pub const LLM_MODE_COMMAND: &str = "command";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Post generation through an external command that reads the prompt on
/// stdin and prints the post on stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub mode: String,
    pub command: String,
}

impl LlmConfig {
    /// The command to run, when command mode is configured.
    pub fn command(&self) -> Option<&str> {
        let command = self.command.trim();
        (self.mode == LLM_MODE_COMMAND && !command.is_empty()).then_some(command)
    }
}

/// Queue generator settings, read from `data/sources.ron`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub timezone: String,
    pub posts_per_day: usize,
    /// Feeds whose entries are added to the `ai_hotspot` section.
    pub rss: Vec<String>,
    pub llm: LlmConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            posts_per_day: DEFAULT_POSTS_PER_DAY,
            rss: Vec::new(),
            llm: LlmConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Loads the config; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                xops_warn!("No generator config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        xops_info!("Loaded generator config from {:?}", path);
        Ok(config)
    }
}
