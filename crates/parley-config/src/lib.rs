pub mod config;
pub mod manager;

pub use config::{Config, ConfigError, ConfigResult, LogLevel, LoggingConfig};
pub use manager::ConfigManager;
pub use parley_session::SessionStoreConfig;

use std::path::PathBuf;

/// 获取 Parley 配置目录路径
pub fn parley_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".parley"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    parley_dir().map(|dir| dir.join("config.json"))
}
