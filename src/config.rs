//! Assistant configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, the optional
//! TOML file, then environment variables (after `.env` is loaded).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::IgnorePolicy;

/// Default config file name, looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "patchwright.toml";

/// Default Anthropic messages endpoint.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// An environment override could not be parsed.
    #[error("environment variable {name}={value:?} is not a valid number")]
    Env {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// A field holds a value the assistant cannot run with.
    #[error("{0}")]
    Invalid(String),
}

/// Assistant configuration (TOML).
///
/// Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Generator model identifier.
    pub model: String,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Messages endpoint.
    pub api_url: String,
    /// API key. Normally supplied through `ANTHROPIC_API_KEY` rather than the file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// HTTP timeout per completion, in seconds.
    pub request_timeout_secs: u64,
    /// Attempts per task before it is reported as failed.
    pub task_max_attempts: u32,
    /// Base delay for linear backoff between task attempts, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Upper bound on files read into a planning prompt.
    pub max_context_files: usize,
    /// Directory names and extensions excluded from workspace listings.
    pub ignore: IgnorePolicy,
    /// Extensions used when a planned target has none.
    pub extensions: ExtensionConfig,
}

/// Extensions assigned by path keyword when a target has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Controllers, models, services and anything unmatched.
    pub source: String,
    /// Views and pages.
    pub template: String,
    /// Scripts.
    pub script: String,
    /// Stylesheets.
    pub stylesheet: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            source: ".cs".to_string(),
            template: ".cshtml".to_string(),
            script: ".js".to_string(),
            stylesheet: ".css".to_string(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
            api_url: ANTHROPIC_API_URL.to_string(),
            api_key: None,
            request_timeout_secs: 300,
            task_max_attempts: 2,
            retry_base_delay_ms: 1000,
            max_context_files: 10,
            ignore: IgnorePolicy {
                dirs: [".git", ".vs", ".idea", "bin", "obj", "node_modules", "target"]
                    .map(String::from)
                    .to_vec(),
                extensions: [".dll", ".exe", ".pdb", ".png", ".jpg", ".ico", ".zip"]
                    .map(String::from)
                    .to_vec(),
            },
            extensions: ExtensionConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Rejects values the assistant cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.model.trim().is_empty() {
            return invalid("model must not be empty");
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens must be > 0");
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be > 0");
        }
        if self.task_max_attempts == 0 {
            return invalid("task_max_attempts must be > 0");
        }
        let ext = &self.extensions;
        for value in [&ext.source, &ext.template, &ext.script, &ext.stylesheet] {
            if !value.starts_with('.') || value.len() < 2 {
                return invalid("extensions must look like \".ext\"");
            }
        }
        Ok(())
    }

    /// Applies `PATCHWRIGHT_*` and `ANTHROPIC_API_KEY` overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a numeric variable does not parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("PATCHWRIGHT_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("PATCHWRIGHT_API_URL") {
            self.api_url = url;
        }
        parse_env(&lookup, "PATCHWRIGHT_MAX_TOKENS", &mut self.max_tokens)?;
        parse_env(&lookup, "PATCHWRIGHT_TIMEOUT_SECS", &mut self.request_timeout_secs)?;
        parse_env(&lookup, "PATCHWRIGHT_TASK_ATTEMPTS", &mut self.task_max_attempts)?;
        parse_env(&lookup, "PATCHWRIGHT_RETRY_DELAY_MS", &mut self.retry_base_delay_ms)?;
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, name: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(value) = lookup(name) {
        *slot = value.trim().parse().map_err(|_| ConfigError::Env { name, value })?;
    }
    Ok(())
}

/// Reads a config file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<AssistantConfig, ConfigError> {
    if !path.exists() {
        return Ok(AssistantConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Loads the full layered configuration.
///
/// `explicit` overrides the default `<workspace>/patchwright.toml` location.
///
/// # Errors
///
/// Returns an error if the file or environment is malformed or the result
/// fails validation.
pub fn load(workspace: &Path, explicit: Option<&Path>) -> Result<AssistantConfig, ConfigError> {
    let _ = dotenvy::from_path(workspace.join(".env"));
    let _ = dotenvy::dotenv();

    let path = explicit.map_or_else(|| workspace.join(CONFIG_FILE_NAME), Path::to_path_buf);
    let mut config = load_file(&path)?;
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AssistantConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.task_max_attempts, 2);
        assert_eq!(cfg.request_timeout_secs, 300);
    }

    #[test]
    fn missing_file_returns_default() {
        let path = std::env::temp_dir().join("patchwright_config_missing.toml");
        let _ = std::fs::remove_file(&path);
        assert_eq!(load_file(&path).unwrap(), AssistantConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = std::env::temp_dir().join("patchwright_config_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "task_max_attempts = 4\n\n[extensions]\nsource = \".rs\"\n\n[ignore]\ndirs = [\"target\"]\n",
        )
        .unwrap();

        let cfg = load_file(&path).unwrap();
        assert_eq!(cfg.task_max_attempts, 4);
        assert_eq!(cfg.extensions.source, ".rs");
        assert_eq!(cfg.extensions.template, ".cshtml");
        assert_eq!(cfg.ignore.dirs, vec!["target"]);
        assert!(cfg.ignore.extensions.is_empty());
        assert_eq!(cfg.max_tokens, AssistantConfig::default().max_tokens);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = std::env::temp_dir().join("patchwright_config_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "task_max_attempts = \"many\"").unwrap();

        assert!(matches!(load_file(&path), Err(ConfigError::Parse { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("PATCHWRIGHT_TASK_ATTEMPTS", "3"),
            ("PATCHWRIGHT_RETRY_DELAY_MS", " 25 "),
        ]);
        let mut cfg = AssistantConfig::default();
        cfg.apply_env(|name| vars.get(name).map(ToString::to_string)).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.task_max_attempts, 3);
        assert_eq!(cfg.retry_base_delay_ms, 25);
    }

    #[test]
    fn bad_env_number_is_rejected() {
        let mut cfg = AssistantConfig::default();
        let err = cfg
            .apply_env(|name| (name == "PATCHWRIGHT_MAX_TOKENS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "PATCHWRIGHT_MAX_TOKENS", .. }));
    }

    #[test]
    fn validation_rejects_zero_attempts() {
        let cfg = AssistantConfig { task_max_attempts: 0, ..AssistantConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = AssistantConfig {
            extensions: ExtensionConfig { script: "js".into(), ..ExtensionConfig::default() },
            ..AssistantConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
