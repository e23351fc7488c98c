//! TOML-based configuration for nl2sql.
//!
//! Supports a config file (nl2sql.toml) with environment variable expansion
//! in paths. Every section is optional.
//!
//! Example configuration:
//! ```toml
//! [model]
//! dir = "${HOME}/models/nl_to_sql_model"
//! device = "cpu"
//!
//! [generation]
//! num_beams = 4
//! max_length = 64
//!
//! [store]
//! path = "./user_db.sqlite"
//!
//! [aliases]
//! match_mode = "word_boundary"
//! use_defaults = true
//!
//! [[aliases.entries]]
//! alias = "dept"
//! canonical = "departments"
//!
//! [logging]
//! filter = "nl2sql=debug"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alias::{AliasEntry, AliasTable, MatchMode};
use crate::inference::t5::DevicePreference;
use crate::inference::GenerationOptions;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub generation: GenerationOptions,
    pub store: StoreSettings,
    pub aliases: AliasSettings,
    pub logging: LoggingSettings,
}

/// Where the pretrained model lives and where it runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory with config.json, model.safetensors and tokenizer.json.
    pub dir: String,

    pub device: DevicePreference,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: "nl_to_sql_model".to_string(),
            device: DevicePreference::Auto,
        }
    }
}

/// Location of the SQLite database.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "user_db.sqlite".to_string(),
        }
    }
}

/// Alias table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasSettings {
    pub match_mode: MatchMode,

    /// Start from the built-in table.
    pub use_defaults: bool,

    /// Extra entries, applied after the built-in ones.
    pub entries: Vec<AliasEntry>,
}

impl Default for AliasSettings {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Substring,
            use_defaults: true,
            entries: Vec::new(),
        }
    }
}

impl AliasSettings {
    /// Build the effective alias table.
    pub fn table(&self) -> AliasTable {
        let mut table = if self.use_defaults {
            AliasTable::builtin()
        } else {
            AliasTable::new()
        };
        table.extend(self.entries.iter().cloned());
        table
    }
}

/// Log filter used when `RUST_LOG` is not set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings for a run: `explicit` (from `--config`) when given, else
    /// [`Settings::load`].
    ///
    /// A named file that is missing, and any file that fails to parse or
    /// validate, is an error. Defaults apply only when the implicit lookup
    /// finds nothing.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `NL2SQL_CONFIG`
    /// 2. `./nl2sql.toml`
    /// 3. `<config dir>/nl2sql/config.toml`
    ///
    /// Falls back to defaults when no file is found.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("NL2SQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("nl2sql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("nl2sql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.generation
            .validate()
            .map_err(|e| SettingsError::InvalidConfig(e.to_string()))?;
        if self.model.dir.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "model.dir must not be empty".to_string(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "store.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Model directory with environment variables expanded.
    pub fn model_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.model.dir).map(PathBuf::from)
    }

    /// Database path with environment variables expanded.
    pub fn store_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.store.path).map(PathBuf::from)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated variable reference '${{{}'",
                    var_name
                )));
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
