//! 观测性错误类型

/// 观测性错误类型
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ObservabilityError {
    /// 日志配置错误
    #[error("Logging error: {message}")]
    Logging {
        /// 错误描述
        message: String,
    },

    /// 全局 subscriber 已被安装
    #[error("Global tracing subscriber already installed")]
    AlreadyInitialized,
}

impl ObservabilityError {
    /// 创建日志错误
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> &'static str {
        match self {
            Self::Logging { .. } => "logging",
            Self::AlreadyInitialized => "init",
        }
    }
}

/// 观测性结果类型
pub type Result<T> = std::result::Result<T, ObservabilityError>;
