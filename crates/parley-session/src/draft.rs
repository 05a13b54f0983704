//! 草稿槽：最多容纳一个尚未提升的会话。

use std::sync::Arc;

use crate::types::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftSlot {
    draft: Option<Arc<Session>>,
}

impl DraftSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入（或清空）草稿，原有草稿直接丢弃
    pub fn set(&mut self, session: Option<Session>) {
        self.draft = session.map(Arc::new);
    }

    pub fn get(&self) -> Option<&Arc<Session>> {
        self.draft.as_ref()
    }

    /// 取出草稿并清空槽位
    pub fn take(&mut self) -> Option<Arc<Session>> {
        self.draft.take()
    }

    pub fn is_draft(&self, id: &str) -> bool {
        self.draft.as_ref().is_some_and(|d| d.id == id)
    }

    /// 仅当当前草稿 id 匹配时应用 `patch`
    pub fn update_if_id<F>(&mut self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&Session) -> Session,
    {
        match self.draft.as_mut() {
            Some(draft) if draft.id == id => {
                let next = patch(draft);
                *draft = Arc::new(next);
                true
            }
            _ => false,
        }
    }
}
