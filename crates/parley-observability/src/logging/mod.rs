//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use std::sync::Arc;

use parking_lot::RwLock;
use parley_config::{LogLevel, LoggingConfig};
use tracing_subscriber::{
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 日志管理器
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄
    reload_handle: Arc<RwLock<ReloadHandle>>,
}

impl LogManager {
    /// 安装全局 subscriber
    ///
    /// 进程内只能成功一次，重复调用返回 [`ObservabilityError::AlreadyInitialized`]。
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let filter = build_filter(config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        // 创建基础注册表
        let registry = tracing_subscriber::registry().with(filter);

        // 添加输出层
        let installed = if config.json_format {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(config.include_target)
                .with_ansi(false);
            registry.with(layer).try_init()
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(config.include_target)
                .with_ansi(config.ansi_colors);
            registry.with(layer).try_init()
        };
        installed.map_err(|_| ObservabilityError::AlreadyInitialized)?;

        tracing::info!(
            target: "parley_observability",
            "Log manager initialized with level: {}",
            config.level
        );

        Ok(Self {
            config: config.clone(),
            reload_handle: Arc::new(RwLock::new(reload_handle)),
        })
    }

    /// 动态更新日志级别，模块级别配置保留
    pub fn update_level(&mut self, level: LogLevel) -> Result<()> {
        let mut next = self.config.clone();
        next.level = level;
        let new_filter = build_filter(&next)?;

        self.reload_handle
            .write()
            .modify(|filter| *filter = new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config = next;
        tracing::info!(
            target: "parley_observability",
            "Log level updated to: {}",
            level
        );
        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(config.level.to_string())
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    // 添加模块级别的过滤器
    for (module, level) in &config.module_levels {
        let directive = format!("{}={}", module, level)
            .parse()
            .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// 创建带有会话上下文的 span
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_session::{NewMessage, SessionStore};

    #[test]
    fn test_build_filter_with_module_levels() {
        let config = LoggingConfig::default()
            .with_level(LogLevel::Warn)
            .with_module_level("parley_session", LogLevel::Debug);

        let filter = build_filter(&config).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("parley_session=debug"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_build_filter_rejects_bad_directive() {
        let mut config = LoggingConfig::default();
        config
            .module_levels
            .insert("parley_session".to_string(), "loud".to_string());
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_log_manager_init_and_reload() {
        let config = LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .with_json_format(false);

        let mut manager = LogManager::new(&config).unwrap();
        assert!(matches!(
            LogManager::new(&config),
            Err(ObservabilityError::AlreadyInitialized)
        ));

        // 日志输出路径上的 store 操作
        let store = SessionStore::new();
        let id = store.create_draft();
        let _span = session_span(&id).entered();
        store.add_message(&id, NewMessage::user("hi"));
        store.rename_session("missing", "ignored");

        manager.update_level(LogLevel::Error).unwrap();
        assert_eq!(manager.config().level, LogLevel::Error);
    }

    #[test]
    fn test_session_span_name() {
        let span = session_span("sess-1");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "session");
        }
    }
}
