//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags (applied by the binary after loading)
//! 2. Environment variables
//! 3. `.prscribe.toml` in repo root
//! 4. `~/.config/prscribe/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants;
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid comment marker {0:?}: must be a single-line HTML comment like <!-- name -->")]
    InvalidMarker(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub diff: DiffConfig,
    pub comment: CommentConfig,
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Per-attempt timeout for the completion call.
    pub timeout_secs: u64,
    /// Total attempts for transient failures (1 disables retrying).
    pub max_attempts: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::OpenAI,
            model: "gpt-4o".to_string(),
            base_url: None,
            api_key: None,
            timeout_secs: 60,
            max_attempts: 2,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Diff range and size limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub base_ref: String,
    pub head_ref: String,
    /// Diffs longer than this are truncated before being sent to the model.
    pub max_chars: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            base_ref: "origin/main".to_string(),
            head_ref: "HEAD".to_string(),
            max_chars: 100_000,
        }
    }
}

/// Comment rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Hidden token identifying comments posted by this tool.
    pub marker: String,
}

impl CommentConfig {
    /// Reject markers that could match comments this tool did not post.
    ///
    /// The marker must be a non-empty, single-line `<!-- ... -->` comment
    /// so it stays hidden in the rendered body.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker = self.marker.trim();
        let inner = marker
            .strip_prefix("<!--")
            .and_then(|rest| rest.strip_suffix("-->"))
            .map(str::trim);

        match inner {
            Some(inner) if !inner.is_empty() && !marker.contains(['\n', '\r']) => Ok(()),
            _ => Err(ConfigError::InvalidMarker(self.marker.clone())),
        }
    }
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            marker: constants::COMMENT_MARKER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(root) = repo_root {
            let local_path = root.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);
        config.comment.validate()?;

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.timeout_secs != default_provider.timeout_secs {
            self.provider.timeout_secs = other.provider.timeout_secs;
        }
        if other.provider.max_attempts != default_provider.max_attempts {
            self.provider.max_attempts = other.provider.max_attempts;
        }

        let default_diff = DiffConfig::default();
        if other.diff.base_ref != default_diff.base_ref {
            self.diff.base_ref = other.diff.base_ref;
        }
        if other.diff.head_ref != default_diff.head_ref {
            self.diff.head_ref = other.diff.head_ref;
        }
        if other.diff.max_chars != default_diff.max_chars {
            self.diff.max_chars = other.diff.max_chars;
        }

        if other.comment.marker != CommentConfig::default().marker {
            self.comment.marker = other.comment.marker;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.non_empty(constants::ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = name,
                Err(_) => tracing::warn!(
                    "ignoring invalid {} value: {val}",
                    constants::ENV_PROVIDER
                ),
            }
        }
        if let Some(val) = env.non_empty(constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env
            .non_empty(constants::ENV_API_KEY)
            .or_else(|| env.non_empty(self.provider.name.api_key_env_var()));
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Some(val) = env.non_empty(constants::ENV_BASE_REF) {
            self.diff.base_ref = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_HEAD_REF) {
            self.diff.head_ref = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.provider.name, ProviderName::OpenAI);
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.max_attempts, 2);
        assert_eq!(config.diff.base_ref, "origin/main");
        assert_eq!(config.diff.head_ref, "HEAD");
        assert_eq!(config.comment.marker, constants::COMMENT_MARKER);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[provider]
name = "anthropic"
model = "claude-sonnet-4-20250514"
timeout_secs = 30

[diff]
base_ref = "origin/develop"
max_chars = 5000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.name, ProviderName::Anthropic);
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(config.provider.timeout(), Duration::from_secs(30));
        assert_eq!(config.diff.base_ref, "origin/develop");
        assert_eq!(config.diff.head_ref, "HEAD");
        assert_eq!(config.diff.max_chars, 5000);
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.provider.name = ProviderName::Groq;
        other.provider.model = "llama-3.3-70b".to_string();
        other.provider.api_key = Some("gsk-test".to_string());
        other.provider.max_attempts = 1;
        other.diff.base_ref = "origin/trunk".to_string();
        other.comment.marker = "<!-- custom -->".to_string();

        base.merge(other);

        assert_eq!(base.provider.name, ProviderName::Groq);
        assert_eq!(base.provider.model, "llama-3.3-70b");
        assert_eq!(base.provider.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(base.provider.max_attempts, 1);
        assert_eq!(base.diff.base_ref, "origin/trunk");
        assert_eq!(base.comment.marker, "<!-- custom -->");
    }

    #[test]
    fn merge_keeps_base_when_other_is_default() {
        let mut base = Config::default();
        base.provider.model = "gpt-4o-mini".to_string();
        base.diff.head_ref = "feature".to_string();

        base.merge(Config::default());

        assert_eq!(base.provider.model, "gpt-4o-mini");
        assert_eq!(base.diff.head_ref, "feature");
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("read"));
    }

    #[test]
    fn load_from_repo_root() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".prscribe.toml"),
            "[provider]\nname = \"gemini\"\nmodel = \"gemini-2.5-pro\"\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.provider.name, ProviderName::Gemini);
        assert_eq!(config.provider.model, "gemini-2.5-pro");
    }

    #[test]
    fn default_marker_is_valid() {
        assert!(CommentConfig::default().validate().is_ok());
        let custom = CommentConfig {
            marker: "<!-- acme:summary -->".to_string(),
        };
        assert!(custom.validate().is_ok());
    }

    #[test]
    fn load_rejects_unsafe_markers() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        for marker in ["", "   ", "summary", "<!---->", "<!-- a\\nb -->", "<!-- open"] {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(
                dir.path().join(".prscribe.toml"),
                format!("[comment]\nmarker = \"{marker}\"\n"),
            )
            .unwrap();

            let err = Config::load(Some(dir.path()), &env).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidMarker(_)),
                "marker {marker:?} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn apply_env_vars_provider_and_api_key() {
        let env = Env::mock([
            ("PRSCRIBE_PROVIDER", "anthropic"),
            ("PRSCRIBE_API_KEY", "sk-env-test"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, ProviderName::Anthropic);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env-test"));
    }

    #[test]
    fn apply_env_vars_provider_specific_api_key_fallback() {
        let env = Env::mock([("OPENAI_API_KEY", "sk-openai")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn apply_env_vars_invalid_provider_falls_back() {
        let env = Env::mock([("PRSCRIBE_PROVIDER", "not-a-provider")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.provider.name, ProviderName::OpenAI);
    }

    #[test]
    fn apply_env_vars_diff_refs() {
        let env = Env::mock([
            ("PRSCRIBE_BASE_REF", "origin/release"),
            ("PRSCRIBE_HEAD_REF", "abc123"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.diff.base_ref, "origin/release");
        assert_eq!(config.diff.head_ref, "abc123");
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = ProviderConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
