//! Configuration module for nl2sql.
//!
//! Handles the config file, environment variable expansion, and defaults.

mod settings;

pub use settings::{
    expand_env_vars, AliasSettings, LoggingSettings, ModelSettings, Settings, SettingsError,
    StoreSettings,
};
