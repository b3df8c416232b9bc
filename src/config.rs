use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{glog_debug, Error, Result};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Generation backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    Ollama,
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Anthropic, Provider::Ollama, Provider::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Provider::Ollama => DEFAULT_OLLAMA_MODEL,
            Provider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "provider_or_default")]
    pub provider: Provider,
    /// Fallback model for both commit and PR generation.
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_model: Option<String>,
    #[serde(default)]
    pub ollama_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            commit_model: None,
            pr_model: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            openai_url: None,
            openai_api_key: None,
        }
    }
}

/// An empty or null `provider` means the default provider.
fn provider_or_default<'de, D>(deserializer: D) -> std::result::Result<Provider, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(Provider::default()),
        Some(name) => Provider::deserialize(name.into_deserializer()),
    }
}

/// Command-line overrides layered on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub commit_model: Option<String>,
    pub pr_model: Option<String>,
    pub ollama_url: Option<String>,
    pub openai_url: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or(Error::NoHomeDir)?
            .join(".config")
            .join("gitcat"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Model used for commit message generation.
    pub fn commit_model(&self) -> &str {
        non_empty(&self.commit_model).unwrap_or(&self.model)
    }

    /// Model used for PR title/body generation.
    pub fn pr_model(&self) -> &str {
        non_empty(&self.pr_model).unwrap_or(&self.model)
    }

    pub fn openai_url(&self) -> &str {
        non_empty(&self.openai_url).unwrap_or(DEFAULT_OPENAI_URL)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        glog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            glog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let mut config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.fill_defaults();
        glog_debug!(
            "Config loaded: provider={} model={} commit_model={:?} pr_model={:?}",
            config.provider,
            config.model,
            config.commit_model,
            config.pr_model
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                glog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        glog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Apply command-line overrides.
    ///
    /// `--commit-model`/`--pr-model` beat `--model`, which beats anything in the file.
    /// Switching provider on the command line drops models configured for the
    /// other provider unless a model flag is also given.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Config {
        let mut config = self.clone();

        if let Some(provider) = overrides.provider {
            if provider != config.provider {
                config.model = provider.default_model().to_string();
                config.commit_model = None;
                config.pr_model = None;
            }
            config.provider = provider;
        }

        if let Some(model) = overrides.model.as_ref().filter(|m| !m.is_empty()) {
            config.model = model.clone();
            config.commit_model = None;
            config.pr_model = None;
        }
        if let Some(model) = overrides.commit_model.as_ref().filter(|m| !m.is_empty()) {
            config.commit_model = Some(model.clone());
        }
        if let Some(model) = overrides.pr_model.as_ref().filter(|m| !m.is_empty()) {
            config.pr_model = Some(model.clone());
        }

        if let Some(url) = overrides.ollama_url.as_ref().filter(|u| !u.is_empty()) {
            config.ollama_url = url.clone();
        }
        if let Some(url) = overrides.openai_url.as_ref().filter(|u| !u.is_empty()) {
            config.openai_url = Some(url.clone());
        }
        if let Some(key) = overrides.openai_api_key.as_ref().filter(|k| !k.is_empty()) {
            config.openai_api_key = Some(key.clone());
        }

        config
    }

    fn fill_defaults(&mut self) {
        if self.model.is_empty() {
            self.model = self.provider.default_model().to_string();
        }
        if self.ollama_url.is_empty() {
            self.ollama_url = DEFAULT_OLLAMA_URL.to_string();
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
