//! Parley Observability
//!
//! 基于 tracing 的结构化日志初始化与运行时级别调整。

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::{ObservabilityError, Result};
pub use logging::{build_filter, session_span, LogManager};

/// 便捷导入模块
pub mod prelude {
    //! 常用类型的便捷导入

    pub use crate::{session_span, LogManager, ObservabilityError, Result};

    // 日志
    pub use tracing::{debug, error, info, instrument, trace, warn, Span};
}
