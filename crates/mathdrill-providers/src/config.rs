//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mathdrill_core::controller::ControllerConfig;
use mathdrill_core::model::Difficulty;
use mathdrill_core::traits::LlmProvider;

use crate::gemini::{GeminiProvider, DEFAULT_TIMEOUT_SECS};
use crate::mock::MockProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Replays `responses` in order; no network access.
    Mock {
        #[serde(default)]
        responses: Vec<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { responses } => f
                .debug_struct("Mock")
                .field("responses", &responses.len())
                .finish(),
        }
    }
}

/// Top-level mathdrill configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathdrillConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Difficulty a practice session starts with.
    #[serde(default)]
    pub default_difficulty: Difficulty,
    /// Sampling temperature; the service default when unset.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Output token cap; the service default when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for MathdrillConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_difficulty: Difficulty::default(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

impl MathdrillConfig {
    /// Controller settings for a session, with optional CLI overrides.
    pub fn controller_config(
        &self,
        model: Option<String>,
        difficulty: Option<Difficulty>,
    ) -> ControllerConfig {
        ControllerConfig {
            model: model.unwrap_or_else(|| self.default_model.clone()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            initial_difficulty: difficulty.unwrap_or(self.default_difficulty),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Mock { responses } => ProviderConfig::Mock {
            responses: responses.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mathdrill.toml` in the current directory
/// 2. `~/.config/mathdrill/config.toml`
///
/// Environment variable override: `MATHDRILL_GEMINI_KEY`.
pub fn load_config() -> Result<MathdrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MathdrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mathdrill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<MathdrillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MathdrillConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("MATHDRILL_GEMINI_KEY") {
        config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let Some(ProviderConfig::Gemini { api_key, .. }) = config.providers.get_mut("gemini")
        {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mathdrill"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(
    config: &ProviderConfig,
    request_timeout_secs: u64,
) -> Result<Arc<dyn LlmProvider>> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            if api_key.is_empty() {
                tracing::warn!("gemini provider has an empty api_key");
            }
            let provider = GeminiProvider::new(api_key, base_url.clone(), request_timeout_secs)?;
            Ok(Arc::new(provider))
        }
        ProviderConfig::Mock { responses } => Ok(Arc::new(MockProvider::scripted(
            responses.iter().cloned().map(Ok),
        ))),
    }
}

/// Look up `name` (or the default provider) in `config` and build it.
pub fn provider_from_config(
    config: &MathdrillConfig,
    name: Option<&str>,
) -> Result<Arc<dyn LlmProvider>> {
    let name = name.unwrap_or(&config.default_provider);
    let provider_config = config.providers.get(name).with_context(|| {
        let mut available: Vec<_> = config.providers.keys().collect();
        available.sort();
        format!("provider '{name}' not found in config. Available: {available:?}")
    })?;
    create_provider(provider_config, config.request_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_MATHDRILL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_MATHDRILL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_MATHDRILL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_MATHDRILL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = MathdrillConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.0-flash");
        assert_eq!(config.default_difficulty, Difficulty::Medium);
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "gemini"
default_model = "gemini-2.5-flash"
default_difficulty = "hard"
temperature = 0.7
max_tokens = 1024

[providers.gemini]
type = "gemini"
api_key = "test-key"

[providers.offline]
type = "mock"
responses = ["What is 2 + 2?", '{"isCorrect": true, "explanation": "4"}']
"#;
        let config: MathdrillConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.default_difficulty, Difficulty::Hard);
        assert!(matches!(
            config.providers.get("offline"),
            Some(ProviderConfig::Mock { responses }) if responses.len() == 2
        ));

        let controller = config.controller_config(None, Some(Difficulty::Easy));
        assert_eq!(controller.model, "gemini-2.5-flash");
        assert_eq!(controller.temperature, Some(0.7));
        assert_eq!(controller.max_tokens, Some(1024));
        assert_eq!(controller.initial_difficulty, Difficulty::Easy);
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mathdrill.toml");
        std::fs::write(
            &path,
            r#"
default_provider = "offline"

[providers.offline]
type = "mock"
"#,
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_provider, "offline");
        let provider = provider_from_config(&config, None).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/mathdrill.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn unknown_provider_lists_available() {
        let config = MathdrillConfig::default();
        let err = provider_from_config(&config, Some("openai")).err().unwrap();
        assert!(err.to_string().contains("provider 'openai' not found"));
    }
}
