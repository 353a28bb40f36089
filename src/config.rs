use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Credentials and project context shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    api_key: String,
    workspace: String,
    project_id: Option<u64>,
    #[serde(default)]
    base_url: Option<String>,
}

impl Config {
    /// Never fails; use [`Config::is_valid`] to check that every field is present.
    pub fn new(
        api_key: impl Into<String>,
        workspace: impl Into<String>,
        project_id: impl Into<Option<u64>>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            workspace: workspace.into(),
            project_id: project_id.into(),
            base_url: None,
        }
    }

    /// Send requests somewhere other than `https://{workspace}.kanbanery.com/api/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn from_env() -> Result<Self> {
        let project_id = match std::env::var("KANBANERY_PROJECT_ID") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("KANBANERY_PROJECT_ID is not a number: {raw}"))?,
            ),
            Err(_) => None,
        };
        let mut config = Self::new(
            std::env::var("KANBANERY_API_KEY").unwrap_or_default(),
            std::env::var("KANBANERY_WORKSPACE").unwrap_or_default(),
            project_id,
        );
        config.base_url = std::env::var("KANBANERY_BASE_URL").ok();
        Ok(config)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn project_id(&self) -> Option<u64> {
        self.project_id
    }

    pub fn base_uri(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.kanbanery.com/api/v1", self.workspace),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        if self.workspace.trim().is_empty() {
            missing.push("workspace");
        }
        if self.project_id.is_none() {
            missing.push("project_id");
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn validate(&self) -> crate::Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid {
                entity: "config",
                missing,
            })
        }
    }

    /// Project id for URL building; a config without one is a caller error.
    pub(crate) fn require_project_id(&self) -> crate::Result<u64> {
        self.project_id.ok_or(Error::Invalid {
            entity: "config",
            missing: vec!["project_id"],
        })
    }
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kanbantastic")
        .join("config.toml")
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
