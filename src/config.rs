//! Configuration management for gptplugin
//!
//! Handles loading and merging configuration from multiple sources:
//! 1. Compiled defaults
//! 2. User config (~/.gptplugin/config.toml)
//! 3. CLI-specified config file
//! 4. Environment variables

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Names of the plugins shipped with the crate
pub const BUILTIN_PLUGINS: &[&str] = &["calculator", "v2ex"];

/// LLM providers with a client implementation
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub plugins: PluginConfig,
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// LLM provider; must be one of `SUPPORTED_PROVIDERS`
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// API endpoint URL
    pub endpoint: String,
    /// Environment variable containing API key
    pub api_key_env: String,
    /// Maximum tokens for response
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Temperature for generation
    pub temperature: f32,
}

/// Plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Built-in plugins to register, in catalog order
    pub enabled: Vec<String>,
    /// Resolve the model's plugin name ignoring case and surrounding whitespace
    pub case_insensitive_lookup: bool,
    /// Hot topics endpoint used by the v2ex plugin
    pub hot_topics_url: String,
    /// HTTP timeout for plugins, in seconds
    pub timeout: u64,
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON-lines audit log; disabled when unset
    pub audit_log: Option<PathBuf>,
    /// Redact secrets from audit entries
    pub redact_secrets: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 1024,
            timeout: 60,
            temperature: 0.0,
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: BUILTIN_PLUGINS.iter().map(|s| s.to_string()).collect(),
            case_insensitive_lookup: false,
            hot_topics_url: "https://www.v2ex.com/api/topics/hot.json".to_string(),
            timeout: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            audit_log: None,
            redact_secrets: true,
        }
    }
}

impl LlmConfig {
    /// Get API key from environment
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(cli_config: Option<&Path>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gptplugin/config.toml");
            if user_config.exists() {
                debug!("Loading user config from {:?}", user_config);
                layers.push(user_config);
            }
        }

        if let Some(path) = cli_config {
            debug!("Loading CLI config from {:?}", path);
            layers.push(path.to_path_buf());
        }

        let mut config = Self::from_files(&layers)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Build a config from files, later files overriding only the keys they set
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for path in paths {
            merge_tables(&mut merged, read_layer(path.as_ref())?);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GPTPLUGIN_MODEL") {
            self.llm.model = model;
        }
        if let Ok(endpoint) = std::env::var("GPTPLUGIN_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Ok(log) = std::env::var("GPTPLUGIN_AUDIT_LOG") {
            self.logging.audit_log = Some(PathBuf::from(log));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported llm.provider '{}', expected one of: {:?}",
                self.llm.provider, SUPPORTED_PROVIDERS
            )));
        }
        if self.llm.model.is_empty() {
            return Err(ConfigError::MissingField("llm.model".to_string()));
        }
        if self.llm.endpoint.is_empty() {
            return Err(ConfigError::MissingField("llm.endpoint".to_string()));
        }
        if self.llm.timeout == 0 {
            return Err(ConfigError::Invalid(
                "llm.timeout must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.plugins.timeout == 0 {
            return Err(ConfigError::Invalid(
                "plugins.timeout must be greater than zero".to_string(),
            ));
        }

        for name in &self.plugins.enabled {
            let normalized = name.trim().to_lowercase();
            if !BUILTIN_PLUGINS.contains(&normalized.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown plugin '{}', expected one of: {:?}",
                    name, BUILTIN_PLUGINS
                )));
            }
        }

        Ok(())
    }
}

/// Read one config file as a raw TOML table
fn read_layer(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

    let table: toml::Table = toml::from_str(&contents)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

    // Type errors are reported against the file that introduced them
    toml::Value::Table(table.clone())
        .try_into::<Config>()
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

    Ok(table)
}

/// Recursively merge `overlay` into `base`; tables merge, other values replace
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(nested) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, nested),
                _ => {
                    base.insert(key, toml::Value::Table(nested));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.plugins.enabled, vec!["calculator", "v2ex"]);
        assert!(!config.plugins.case_insensitive_lookup);
        assert!(config.logging.audit_log.is_none());
        assert!(config.logging.redact_secrets);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let mut config = Config::default();
        config.plugins.enabled.push("google".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_model() {
        let mut config = Config::default();
        config.llm.model.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(field)) if field == "llm.model"
        ));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [llm]
            model = "gpt-4o-mini"
            temperature = 0.2

            [plugins]
            enabled = ["calculator"]
            case_insensitive_lookup = true

            [logging]
            audit_log = "/tmp/gptplugin.log"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.endpoint, LlmConfig::default().endpoint);
        assert_eq!(config.plugins.enabled, vec!["calculator"]);
        assert!(config.plugins.case_insensitive_lookup);
        assert_eq!(
            config.logging.audit_log,
            Some(PathBuf::from("/tmp/gptplugin.log"))
        );
    }

    #[test]
    fn test_unsupported_provider() {
        let mut config = Config::default();
        config.llm.provider = "anthropic".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("anthropic")
        ));
    }

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_from_single_file() {
        let file = write_file(
            "[llm]\nendpoint = \"http://localhost:8080/v1/chat/completions\"\n\n[plugins]\ntimeout = 5\n",
        );

        let config = Config::from_files(&[file.path()]).unwrap();

        assert_eq!(
            config.llm.endpoint,
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.plugins.timeout, 5);
    }

    #[test]
    fn test_later_file_keeps_unset_keys() {
        let user = write_file(
            "[llm]\nmodel = \"gpt-3.5-turbo\"\n\n[plugins]\ncase_insensitive_lookup = true\n\n[logging]\nredact_secrets = false\n",
        );
        let cli = write_file("[llm]\nendpoint = \"http://localhost:9000/v1/chat/completions\"\n");

        let config = Config::from_files(&[user.path(), cli.path()]).unwrap();

        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(
            config.llm.endpoint,
            "http://localhost:9000/v1/chat/completions"
        );
        assert!(config.plugins.case_insensitive_lookup);
        assert!(!config.logging.redact_secrets);
    }

    #[test]
    fn test_later_file_can_restore_defaults() {
        let user = write_file(
            "[llm]\nmodel = \"gpt-3.5-turbo\"\n\n[plugins]\nenabled = [\"calculator\"]\ncase_insensitive_lookup = true\n",
        );
        let cli = write_file(
            "[llm]\nmodel = \"gpt-4\"\n\n[plugins]\nenabled = [\"calculator\", \"v2ex\"]\ncase_insensitive_lookup = false\n",
        );

        let config = Config::from_files(&[user.path(), cli.path()]).unwrap();

        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.plugins.enabled, vec!["calculator", "v2ex"]);
        assert!(!config.plugins.case_insensitive_lookup);
    }

    #[test]
    fn test_from_no_files_is_default() {
        let config = Config::from_files::<&Path>(&[]).unwrap();
        assert_eq!(config.llm.model, LlmConfig::default().model);
        assert_eq!(config.plugins.enabled, PluginConfig::default().enabled);
    }

    #[test]
    fn test_merge_tables_replaces_arrays() {
        let mut base: toml::Table =
            toml::from_str("[plugins]\nenabled = [\"calculator\", \"v2ex\"]\ntimeout = 5\n").unwrap();
        let overlay: toml::Table = toml::from_str("[plugins]\nenabled = [\"v2ex\"]\n").unwrap();

        merge_tables(&mut base, overlay);

        let plugins = base["plugins"].as_table().unwrap();
        assert_eq!(plugins["enabled"].as_array().unwrap().len(), 1);
        assert_eq!(plugins["timeout"].as_integer(), Some(5));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_files(&[Path::new("/nonexistent/gptplugin.toml")]).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_malformed_file() {
        let file = write_file("[llm\nmodel = ");

        let err = Config::from_files(&[file.path()]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_wrong_type_names_file() {
        let file = write_file("[llm]\ntimeout = \"soon\"\n");

        let err = Config::from_files(&[file.path()]).unwrap_err();
        match err {
            ConfigError::Parse(msg) => {
                assert!(msg.contains(&file.path().display().to_string()))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
