//! # Parley Session
//!
//! 聊天应用的会话状态核心：管理多个会话、当前选中的会话，
//! 以及尚未收到任何消息的草稿会话。
//!
//! ## 组成
//!
//! - **会话仓库**：已提升会话的有序集合，最新提升的排在最前
//! - **草稿槽**：最多一个尚未提升的会话
//! - **选择指针**：当前聚焦的会话 id，可以悬空
//! - **派生视图**：`current_session`、`current_settings`、
//!   `is_current_session_draft`、`sessions_with_messages`
//! - **生命周期操作**：[`SessionStore`] 上的全部写操作
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use parley_session::{NewMessage, SessionStore};
//!
//! let store = SessionStore::new();
//!
//! // 创建草稿并选中
//! let id = store.create_draft();
//! assert!(store.is_current_session_draft());
//!
//! // 首条消息将草稿提升为正式会话
//! store.add_message(&id, NewMessage::user("hi"));
//! assert!(!store.is_current_session_draft());
//! assert_eq!(store.current_session().unwrap().title, "hi");
//! ```

pub mod clock;
pub mod config;
pub mod derived;
pub mod draft;
pub mod error;
pub mod repository;
pub mod selection;
pub mod store;
pub mod types;
pub mod watcher;

// 重新导出主要类型
pub use clock::{Clock, IdGenerator, SequentialIdGenerator, SteppingClock, SystemClock, UuidIdGenerator};
pub use config::SessionStoreConfig;
pub use derived::StoreSnapshot;
pub use draft::DraftSlot;
pub use error::{SessionError, SessionResult};
pub use repository::SessionRepository;
pub use selection::SelectionPointer;
pub use store::SessionStore;
pub use types::{Message, ModelSettings, NewMessage, Role, Session, Settings, Variable};
pub use watcher::StoreWatcher;

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
