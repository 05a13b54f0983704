//! 状态订阅
//!
//! UI 层通过 [`StoreWatcher`] 接收推送：每次生命周期操作成功后，
//! `changed()` 返回，随后 `snapshot()` 读到的就是最新的完整状态。

use std::sync::Arc;

use tokio::sync::watch;

use crate::derived::{StoreSnapshot, StoreState};
use crate::types::{Session, Settings};

/// 状态订阅者
#[derive(Debug)]
pub struct StoreWatcher {
    rx: watch::Receiver<Arc<StoreState>>,
    default_settings: Arc<Settings>,
    last_current: Option<Arc<Session>>,
}

impl StoreWatcher {
    pub(crate) fn new(rx: watch::Receiver<Arc<StoreState>>, default_settings: Arc<Settings>) -> Self {
        let mut watcher = Self {
            rx,
            default_settings,
            last_current: None,
        };
        watcher.last_current = watcher.snapshot().current_session();
        watcher
    }

    /// 等待下一次状态发布
    ///
    /// store 被释放后返回 `false`。
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// 最新状态快照，并标记为已读
    pub fn snapshot(&mut self) -> StoreSnapshot {
        let state = Arc::clone(&self.rx.borrow_and_update());
        StoreSnapshot::new(state, Arc::clone(&self.default_settings))
    }

    /// 等待派生的当前会话发生变化（按引用比较）
    ///
    /// store 被释放后返回 `None`。
    pub async fn current_session_changed(&mut self) -> Option<Option<Arc<Session>>> {
        loop {
            if !self.changed().await {
                return None;
            }
            let current = self.snapshot().current_session();
            let same = match (&current, &self.last_current) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if !same {
                self.last_current = current.clone();
                return Some(current);
            }
        }
    }
}
