//! # Session Repository
//!
//! 已持久化会话的有序集合，最近提升的会话排在最前。
//! 所有更新都是整体替换（写时复制），观察者可用 `Arc::ptr_eq` 检测变化。

use std::sync::Arc;

use crate::types::Session;

/// 会话仓库
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRepository {
    sessions: Vec<Arc<Session>>,
}

impl SessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入到最前
    pub fn insert_front(&mut self, session: Session) {
        self.sessions.insert(0, Arc::new(session));
    }

    /// 用 `patch` 的结果替换匹配的会话，不改变顺序
    ///
    /// 返回是否找到了目标。
    pub fn update_by_id<F>(&mut self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&Session) -> Session,
    {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                let next = patch(slot);
                *slot = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// 按 id 移除
    pub fn remove_by_id(&mut self, id: &str) -> Option<Arc<Session>> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(index))
    }

    pub fn find(&self, id: &str) -> Option<&Arc<Session>> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Session>> {
        self.sessions.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Session>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
