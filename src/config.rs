use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub karakeep_url: Option<String>,
    pub karakeep_token: Option<String>,

    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: Option<String>,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_min_content_len")]
    pub min_content_len: usize,

    #[serde(default = "default_section_size")]
    pub section_size: usize,

    #[serde(default = "default_tag_item_cap")]
    pub tag_item_cap: usize,

    #[serde(default = "default_recency_days")]
    pub recency_days: i64,

    #[serde(default)]
    pub priority_tags: Vec<String>,
}

fn default_concurrency() -> usize {
    5
}

fn default_min_content_len() -> usize {
    150
}

fn default_section_size() -> usize {
    3
}

fn default_tag_item_cap() -> usize {
    5
}

fn default_recency_days() -> i64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            karakeep_url: None,
            karakeep_token: None,
            anthropic_api_key: None,
            openai_api_key: None,
            openai_base_url: None,
            model: None,
            concurrency: default_concurrency(),
            min_content_len: default_min_content_len(),
            section_size: default_section_size(),
            tag_item_cap: default_tag_item_cap(),
            recency_days: default_recency_days(),
            priority_tags: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("karakeep-digest")
            .join("config.toml")
    }

    /// Reject configs the pipeline cannot run with. Provider credentials
    /// are checked separately when the provider is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.karakeep_url.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::Config("karakeep_url is not set".to_string()));
        }
        if self.karakeep_token.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::Config("karakeep_token is not set".to_string()));
        }
        if self.concurrency == 0 {
            return Err(AppError::Config("concurrency must be at least 1".to_string()));
        }
        if self.section_size == 0 {
            return Err(AppError::Config(
                "section_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
