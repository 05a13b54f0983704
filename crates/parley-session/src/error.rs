//! # Session Error Types
//!
//! 会话状态核心的错误类型。生命周期操作内部使用这些错误定位目标，
//! 对外一律降级为静默的 no-op（仅记录 warn 日志）。

use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 目标 id 既不在草稿槽也不在仓库中
    #[error("Session not found in draft slot or repository: {id}")]
    ReferentialMiss { id: String },

    /// 操作需要当前选中会话，但选择指针为空
    #[error("No session is currently selected")]
    NoActiveSelection,

    /// 配置错误
    #[error("Invalid session store config: {message}")]
    InvalidConfig { message: String },
}

impl SessionError {
    /// 创建引用缺失错误
    pub fn referential_miss(id: impl Into<String>) -> Self {
        Self::ReferentialMiss { id: id.into() }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// 是否属于可静默忽略的错误
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::ReferentialMiss { .. } | Self::NoActiveSelection)
    }
}

/// 会话结果类型
pub type SessionResult<T> = Result<T, SessionError>;
