//! Configuration loading and client factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use toefl_sim_core::client::{ModelClient, RetryPolicy, DEFAULT_MAX_TOKENS};
use toefl_sim_core::practice::TrainerConfig;
use toefl_sim_core::traits::LlmProvider;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "toefl-sim.toml";
/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Which backend generates content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Canned offline material, no API key needed.
    Mock,
}

/// Gemini connection settings.
///
/// Custom Debug impl masks the API key.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_empty() { "" } else { "***" };
        f.debug_struct("GeminiConfig")
            .field("api_key", &key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Top-level toefl-sim configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToeflSimConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default = "default_model")]
    pub model: String,
    /// Retries on transient provider errors. Off unless configured.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for ToeflSimConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            gemini: GeminiConfig::default(),
            model: default_model(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ToeflSimConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            max_tokens: self.max_tokens,
            ..TrainerConfig::default()
        }
    }
}

/// Resolve `${VAR_NAME}` references using `lookup`. Unknown variables become
/// empty; an unterminated reference is left as is.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = lookup(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
        from = start + value.len();
    }
    result
}

/// Apply environment overrides and resolve `${VAR}` references in place.
pub fn apply_env(config: &mut ToeflSimConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.gemini.api_key = key;
    }
    config.gemini.api_key = resolve_env_vars(&config.gemini.api_key, &lookup);
    config.gemini.base_url = config
        .gemini
        .base_url
        .as_deref()
        .map(|u| resolve_env_vars(u, &lookup))
        .filter(|u| !u.is_empty());
    config.model = resolve_env_vars(&config.model, &lookup);
    if config.model.trim().is_empty() {
        config.model = default_model();
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `toefl-sim.toml` in the current directory
/// 2. `~/.config/toefl-sim/config.toml`
///
/// `GEMINI_API_KEY` overrides the key from the file.
pub fn load_config() -> Result<ToeflSimConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ToeflSimConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_file(&path)?
        }
        None => ToeflSimConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<ToeflSimConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ToeflSimConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("toefl-sim"))
}

/// Create the provider selected by `config`.
pub fn create_provider(config: &ToeflSimConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.provider {
        ProviderKind::Gemini => {
            if config.gemini.api_key.trim().is_empty() {
                anyhow::bail!(
                    "no Gemini API key configured; set {API_KEY_ENV} or add api_key under [gemini] in {CONFIG_FILE_NAME}"
                );
            }
            Ok(Arc::new(GeminiProvider::new(
                &config.gemini.api_key,
                config.gemini.base_url.clone(),
            )))
        }
        ProviderKind::Mock => Ok(Arc::new(MockProvider::practice_material())),
    }
}

/// Create a model client for the configured provider, model and retry policy.
pub fn create_client(config: &ToeflSimConfig) -> Result<ModelClient> {
    let provider = create_provider(config)?;
    Ok(ModelClient::new(provider, config.model.clone()).with_retry(config.retry_policy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("_TOEFL_SIM_TEST_VAR", "hello")]);
        assert_eq!(resolve_env_vars("${_TOEFL_SIM_TEST_VAR}", &lookup), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_TOEFL_SIM_TEST_VAR}_suffix", &lookup),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${MISSING}", &lookup), "");
        assert_eq!(resolve_env_vars("${UNTERMINATED", &lookup), "${UNTERMINATED");
    }

    #[test]
    fn resolved_values_are_not_expanded_again() {
        let lookup = env(&[("A", "${B}"), ("B", "nope")]);
        assert_eq!(resolve_env_vars("${A}", &lookup), "${B}");
    }

    #[test]
    fn default_config() {
        let config = ToeflSimConfig::default();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
model = "gemini-2.0-flash-lite"
max_retries = 2
retry_delay_ms = 250
max_tokens = 1500

[gemini]
api_key = "${GEMINI_KEY_FROM_VAULT}"
base_url = "http://localhost:9000"
"#;
        let mut config: ToeflSimConfig = toml::from_str(toml_str).unwrap();
        apply_env(&mut config, env(&[("GEMINI_KEY_FROM_VAULT", "k-123")]));

        assert_eq!(config.gemini.api_key, "k-123");
        assert_eq!(config.gemini.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.model, "gemini-2.0-flash-lite");
        assert_eq!(config.retry_policy().max_retries, 2);
        assert_eq!(config.retry_policy().initial_delay, Duration::from_millis(250));
        assert_eq!(config.trainer_config().max_tokens, 1500);
    }

    #[test]
    fn env_key_overrides_file() {
        let mut config: ToeflSimConfig =
            toml::from_str("[gemini]\napi_key = \"from-file\"").unwrap();
        apply_env(&mut config, env(&[(API_KEY_ENV, "from-env")]));
        assert_eq!(config.gemini.api_key, "from-env");

        let mut config: ToeflSimConfig =
            toml::from_str("[gemini]\napi_key = \"from-file\"").unwrap();
        apply_env(&mut config, env(&[(API_KEY_ENV, "  ")]));
        assert_eq!(config.gemini.api_key, "from-file");
    }

    #[test]
    fn debug_masks_key() {
        let mut config = ToeflSimConfig::default();
        config.gemini.api_key = "super-secret".into();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn missing_key_is_reported() {
        let err = create_client(&ToeflSimConfig::default()).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn mock_provider_needs_no_key() {
        let config: ToeflSimConfig = toml::from_str("provider = \"mock\"").unwrap();
        let client = create_client(&config).unwrap();
        assert_eq!(client.provider_name(), "mock");
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn explicit_path_is_loaded_and_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "provider = \"mock\"\nmax_tokens = 900\n").unwrap();

        let config = load_config_from(Some(path.as_path())).unwrap();
        assert_eq!(config.provider, ProviderKind::Mock);
        assert_eq!(config.max_tokens, 900);

        let err = load_config_from(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "max_tokens = \"lots\"").unwrap();
        let err = load_config_from(Some(path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }
}
