//! # Derived Views
//!
//! 由仓库、草稿槽和选择指针计算出的只读视图。这里的函数都是纯函数，
//! 每次读取快照时重新计算，因此不存在过期读。

use std::sync::Arc;

use crate::draft::DraftSlot;
use crate::repository::SessionRepository;
use crate::selection::SelectionPointer;
use crate::types::{Session, Settings};

/// 三个底层容器的一次完整状态
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StoreState {
    pub(crate) repository: SessionRepository,
    pub(crate) draft: DraftSlot,
    pub(crate) selection: SelectionPointer,
}

/// 当前会话：选择为空时为 None；草稿优先；找不到的 id 解析为 None
pub fn current_session<'a>(
    repository: &'a SessionRepository,
    selection: &SelectionPointer,
    draft: &'a DraftSlot,
) -> Option<&'a Arc<Session>> {
    let id = selection.get()?;
    match draft.get() {
        Some(d) if d.id == id => Some(d),
        _ => repository.find(id),
    }
}

/// 当前设置，没有当前会话时回退到默认模板
pub fn current_settings<'a>(current: Option<&'a Session>, defaults: &'a Settings) -> &'a Settings {
    current.map(|s| &s.settings).unwrap_or(defaults)
}

pub fn is_current_session_draft(selection: &SelectionPointer, draft: &DraftSlot) -> bool {
    selection.get().is_some_and(|id| draft.is_draft(id))
}

/// 有消息的会话，用于历史列表
pub fn sessions_with_messages(repository: &SessionRepository) -> Vec<Arc<Session>> {
    repository
        .iter()
        .filter(|s| !s.messages.is_empty())
        .cloned()
        .collect()
}

/// 某一时刻的不可变快照
///
/// 快照内的会话都是 `Arc` 共享的，拿到之后不会再被修改。
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    state: Arc<StoreState>,
    default_settings: Arc<Settings>,
}

impl StoreSnapshot {
    pub(crate) fn new(state: Arc<StoreState>, default_settings: Arc<Settings>) -> Self {
        Self {
            state,
            default_settings,
        }
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        current_session(
            &self.state.repository,
            &self.state.selection,
            &self.state.draft,
        )
        .cloned()
    }

    /// 当前设置；默认模板以共享引用返回，不可原地修改
    pub fn current_settings(&self) -> &Settings {
        let current = current_session(
            &self.state.repository,
            &self.state.selection,
            &self.state.draft,
        );
        current_settings(current.map(|s| s.as_ref()), &self.default_settings)
    }

    pub fn is_current_session_draft(&self) -> bool {
        is_current_session_draft(&self.state.selection, &self.state.draft)
    }

    pub fn sessions_with_messages(&self) -> Vec<Arc<Session>> {
        sessions_with_messages(&self.state.repository)
    }

    /// 仓库原始内容
    pub fn sessions(&self) -> &[Arc<Session>] {
        self.state.repository.as_slice()
    }

    pub fn selection(&self) -> Option<&str> {
        self.state.selection.get()
    }

    pub fn draft(&self) -> Option<&Arc<Session>> {
        self.state.draft.get()
    }

    /// 两个快照是否来自同一次发布
    pub fn same_state(&self, other: &StoreSnapshot) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}
