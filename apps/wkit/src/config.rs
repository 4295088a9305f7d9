// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::Level;
use wirekit_core::WireMode;

/// Environment variable prefix; nested keys use `__` (`WK_LOG__CONSOLE_LEVEL=debug`).
pub const ENV_PREFIX: &str = "WK_";

/// Log level for filtering messages.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Log file format options.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text format
    #[default]
    Text,
    /// JSON format (structured, one object per line)
    Json,
}

const fn default_true() -> bool {
    true
}

/// Logging configuration for console and file output.
///
/// Console output goes to stderr so it never mixes with command output.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub console_enable: bool,
    #[serde(default)]
    pub file_enable: bool,
    #[serde(default)]
    pub console_level: LogLevel,
    #[serde(default)]
    pub file_level: LogLevel,
    #[serde(default)]
    pub file_path: String,
    /// Format for file logging: "text" (default) or "json"
    #[serde(default)]
    pub file_format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enable: true,
            file_enable: false,
            console_level: LogLevel::Warn,
            file_level: LogLevel::Info,
            file_path: "./wkit.log".to_string(),
            file_format: LogFormat::default(),
        }
    }
}

fn default_history_file() -> String {
    ".wkit_history".to_string()
}

/// Design editing defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct DesignConfig {
    /// JSON design file the shell writes on exit. Unset disables autosave.
    #[serde(default)]
    pub autosave_path: Option<String>,
    /// Wire mode given to newly added analog sensors.
    #[serde(default)]
    pub default_wire_mode: WireMode,
    /// Shell history file.
    #[serde(default = "default_history_file")]
    pub history_file: String,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            autosave_path: None,
            default_wire_mode: WireMode::default(),
            history_file: default_history_file(),
        }
    }
}

/// Export formatting options.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ExportConfig {
    /// Quote every CSV field, not only those that need it.
    #[serde(default = "default_true")]
    pub csv_quote_all: bool,
    /// Indent exported JSON.
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { csv_quote_all: true, pretty_json: true }
    }
}

/// Root configuration for `wkit`.
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub design: DesignConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub file_missing: Option<String>,
}

/// Loads the configuration from defaults, a TOML file, and environment variables.
///
/// # Errors
///
/// Returns an error if the configuration file exists but is not valid TOML, or
/// if a value (from the file or the environment) has the wrong type.
pub fn load(config_path: &str) -> Result<ConfigLoadResult, Box<figment::Error>> {
    let mut figment =
        Figment::new().merge(figment::providers::Serialized::defaults(Config::default()));

    let mut file_missing = None;

    // A missing file is not an error; defaults apply.
    if std::path::Path::new(config_path).exists() {
        figment = figment.merge(Toml::file(config_path));
    } else {
        file_missing = Some(config_path.to_string());
    }

    let config: Config =
        figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().map_err(Box::new)?;

    Ok(ConfigLoadResult { config, file_missing })
}

/// Generates the default configuration as a TOML string.
///
/// # Errors
///
/// Returns an error if TOML serialization fails.
pub fn generate_default() -> Result<String, toml::ser::Error> {
    let default_config = Config::default();
    toml::to_string_pretty(&default_config)
}
