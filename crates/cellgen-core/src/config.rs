//! TOML configuration: which backend computes cells and how it is reached.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cellgen_engine::compute::{ComputeBackend, StubBackend};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CellgenError, Result};
use crate::field_types::DEFAULT_BATCH_SIZE;
use crate::remote::{
    DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT, HttpClient, HttpTranslator,
    LIBRETRANSLATE_API_BASE, OPENAI_API_BASE, OpenAiCompleter, RemoteBackend,
};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Stub,
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub compute: ComputeConfig,
    pub translate: TranslateConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComputeConfig {
    pub backend: BackendKind,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Stub,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    pub endpoint: String,
    /// Environment variable holding the API key; the key is optional.
    pub api_key_env: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: LIBRETRANSLATE_API_BASE.to_string(),
            api_key_env: "CELLGEN_TRANSLATE_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "CELLGEN_OPENAI_KEY".to_string(),
        }
    }
}

/// `<config dir>/cellgen/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellgen")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.compute.batch_size == 0 {
            return Err(CellgenError::Config(
                "compute.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(CellgenError::Config(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&content)
    }

    /// Load the user config file if there is one, otherwise use defaults.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.compute.timeout_secs)
    }

    /// Build the configured backend, reading API keys from the environment.
    pub fn build_backend(&self) -> Result<Box<dyn ComputeBackend>> {
        self.build_backend_with(|name| std::env::var(name).ok())
    }

    /// Build the configured backend, resolving key variables through `lookup`.
    pub fn build_backend_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Box<dyn ComputeBackend>> {
        match self.compute.backend {
            BackendKind::Stub => Ok(Box::new(StubBackend)),
            BackendKind::Remote => {
                let translate_key = lookup(&self.translate.api_key_env).filter(|k| !k.is_empty());
                let translator = HttpTranslator::new(
                    HttpClient::new("LibreTranslate", self.timeout(), self.compute.max_retries)?,
                    &self.translate.endpoint,
                    translate_key,
                );

                let Some(llm_key) = lookup(&self.llm.api_key_env).filter(|k| !k.is_empty())
                else {
                    return Err(CellgenError::MissingKey(self.llm.api_key_env.clone()));
                };
                let completer = OpenAiCompleter::new(
                    HttpClient::new("OpenAI", self.timeout(), self.compute.max_retries)?,
                    &self.llm.endpoint,
                    &self.llm.model,
                    llm_key,
                );

                Ok(Box::new(RemoteBackend::new(translator, Some(completer))))
            }
        }
    }

    /// Like [`Config::build_backend`], but without an LLM key the remote
    /// backend still translates and fails only when a prompt is computed.
    pub fn build_backend_lenient(&self) -> Result<Box<dyn ComputeBackend>> {
        match self.build_backend() {
            Err(CellgenError::MissingKey(var)) => {
                warn!(var = %var, "no LLM API key; prompt fields will fail to compute");
                let translator = HttpTranslator::new(
                    HttpClient::new("LibreTranslate", self.timeout(), self.compute.max_retries)?,
                    &self.translate.endpoint,
                    std::env::var(&self.translate.api_key_env).ok(),
                );
                Ok(Box::new(RemoteBackend::new(translator, None)))
            }
            other => other,
        }
    }
}
