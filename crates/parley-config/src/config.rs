use parley_session::{SessionError, SessionStoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: SessionStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            session: SessionStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        let model = &self.session.default_settings.model;
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["session", "placeholder_title"] => Some(self.session.placeholder_title.clone()),
            ["session", "title_max_chars"] => Some(self.session.title_max_chars.to_string()),
            ["session", "title_ellipsis"] => Some(self.session.title_ellipsis.clone()),
            ["session", "default_settings", "system_prompt"] => {
                Some(self.session.default_settings.system_prompt.clone())
            }
            ["session", "default_settings", "model", "model"] => Some(model.model.clone()),
            ["session", "default_settings", "model", "temperature"] => {
                Some(model.temperature.to_string())
            }
            ["session", "default_settings", "model", "max_tokens"] => {
                Some(model.max_tokens.to_string())
            }
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "json_format"] => Some(self.logging.json_format.to_string()),
            ["logging", "ansi_colors"] => Some(self.logging.ansi_colors.to_string()),
            ["logging", "modules", module] => self.logging.module_levels.get(*module).cloned(),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["session", "placeholder_title"] => {
                self.session.placeholder_title = value.to_string();
            }
            ["session", "title_max_chars"] => {
                self.session.title_max_chars = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["session", "title_ellipsis"] => {
                self.session.title_ellipsis = value.to_string();
            }
            ["session", "default_settings", "system_prompt"] => {
                self.session.default_settings.system_prompt = value.to_string();
            }
            ["session", "default_settings", "model", "model"] => {
                self.session.default_settings.model.model = value.to_string();
            }
            ["session", "default_settings", "model", "temperature"] => {
                self.session.default_settings.model.temperature = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["session", "default_settings", "model", "max_tokens"] => {
                self.session.default_settings.model.max_tokens = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json_format"] => {
                self.logging.json_format = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["logging", "ansi_colors"] => {
                self.logging.ansi_colors = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["logging", "modules", module] => {
                let level: LogLevel = value.parse()?;
                self.logging
                    .module_levels
                    .insert(module.to_string(), level.to_string());
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_true")]
    pub include_target: bool,
    /// 模块级别的日志配置，例如 `parley_session = "debug"`
    #[serde(default)]
    pub module_levels: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json_format: false,
            ansi_colors: true,
            include_target: true,
            module_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// 设置日志级别
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: LogLevel) -> Self {
        self.module_levels.insert(module.into(), level.to_string());
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Session config error: {0}")]
    Session(#[from] SessionError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
