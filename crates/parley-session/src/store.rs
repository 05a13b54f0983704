//! # Session Store
//!
//! 会话生命周期操作，是仓库、草稿槽和选择指针的唯一写入方。
//!
//! 三个容器保存在同一个 [`StoreState`] 中，通过 `tokio::sync::watch` 发布。
//! 每个操作在一次 `send_if_modified` 内完成：先在副本上应用全部写入，
//! 成功后整体替换，因此观察者永远看不到只完成一半的多容器更新。
//!
//! 所有操作都不向调用方返回错误。目标缺失（ReferentialMiss）或没有选中会话
//! （NoActiveSelection）时记录 warn 日志并保持状态不变。
//!
//! 时钟、id 生成器和调用方传入的闭包都在 `send_if_modified` 之外执行，
//! 它们可以安全地回读 store。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crate::config::SessionStoreConfig;
use crate::derived::{StoreSnapshot, StoreState};
use crate::error::{SessionError, SessionResult};
use crate::types::{NewMessage, Session, Settings};
use crate::watcher::StoreWatcher;

/// 消息追加的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Appended {
    /// 草稿收到首条消息并被提升到仓库
    Promoted,
    /// 追加到仍为草稿的会话
    Draft,
    /// 追加到仓库中的会话
    Repository,
}

/// 会话状态核心
pub struct SessionStore {
    config: SessionStoreConfig,
    default_settings: Arc<Settings>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<Arc<StoreState>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// 使用默认配置、uuid 与系统时钟创建
    pub fn new() -> Self {
        Self::build(SessionStoreConfig::default())
    }

    /// 使用指定配置创建
    pub fn with_config(config: SessionStoreConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SessionStoreConfig) -> Self {
        let (state, _) = watch::channel(Arc::new(StoreState::default()));
        Self {
            default_settings: Arc::new(config.default_settings.clone()),
            config,
            ids: Arc::new(UuidIdGenerator),
            clock: Arc::new(SystemClock),
            state,
        }
    }

    /// 替换 id 生成器与时钟
    pub fn with_collaborators(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    /// 默认设置模板
    pub fn default_settings(&self) -> &Settings {
        &self.default_settings
    }

    /// 在状态副本上执行操作，成功后整体发布
    ///
    /// `f` 在 watch 通道的写锁内运行，不能调用任何会读取 store 的代码。
    fn apply<T, F>(&self, operation: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&mut StoreState) -> SessionResult<T>,
    {
        let _span = tracing::debug_span!("session_op", operation).entered();

        let mut outcome = None;
        self.state.send_if_modified(|current| {
            let mut next = StoreState::clone(current);
            match f(&mut next) {
                Ok(value) => {
                    *current = Arc::new(next);
                    outcome = Some(Ok(value));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });

        match outcome? {
            Ok(value) => Some(value),
            Err(e) => {
                if e.is_ignorable() {
                    warn!("Ignored {}: {}", operation, e);
                } else {
                    error!("Rejected {}: {}", operation, e);
                }
                metrics::counter!("parley_operations_ignored_total", "operation" => operation)
                    .increment(1);
                None
            }
        }
    }

    /// 创建新草稿并选中它，已有草稿被直接丢弃
    ///
    /// 返回新草稿的 id。
    pub fn create_draft(&self) -> String {
        let now = self.clock.now();
        let id = self.ids.new_id();
        let draft = Session::new(
            id.clone(),
            self.config.placeholder_title.clone(),
            Settings::clone(&self.default_settings),
            now,
        );

        self.apply("create_draft", |state| {
            if let Some(previous) = state.draft.get() {
                debug!("Discarding previous draft: {}", previous.id);
            }
            state.draft.set(Some(draft));
            state.selection.set(Some(id.clone()));
            Ok(())
        });

        metrics::counter!("parley_drafts_created_total").increment(1);
        debug!("Created draft session: {}", id);
        id
    }

    /// 设置选择指针，不做校验
    pub fn select_session(&self, id: Option<&str>) {
        self.apply("select_session", |state| {
            state.selection.set(id.map(str::to_owned));
            Ok(())
        });
        debug!("Selected session: {:?}", id);
    }

    /// 向会话追加消息
    ///
    /// 草稿收到首条消息时被提升：插入仓库最前并清空草稿槽。
    /// 若标题仍是占位标题，则从首条消息内容推导标题。
    pub fn add_message(&self, session_id: &str, message: NewMessage) {
        if session_id.is_empty() {
            debug!("Ignored add_message with empty session id");
            return;
        }

        let now = self.clock.now();
        let message = message.into_message(self.ids.new_id(), now);

        let appended = self.apply("add_message", |state| {
            let draft = state.draft.get().filter(|d| d.id == session_id).cloned();

            if let Some(draft) = draft {
                let first_message = draft.is_empty();
                let title = (first_message && draft.title == self.config.placeholder_title)
                    .then(|| self.config.derive_title(&message.content));

                let mut updated = draft.with_message(message, now);
                if let Some(title) = title {
                    updated.title = title;
                }

                if first_message {
                    state.repository.insert_front(updated);
                    state.draft.set(None);
                    Ok(Appended::Promoted)
                } else {
                    state.draft.set(Some(updated));
                    Ok(Appended::Draft)
                }
            } else if state
                .repository
                .update_by_id(session_id, |s| s.with_message(message, now))
            {
                Ok(Appended::Repository)
            } else {
                Err(SessionError::referential_miss(session_id))
            }
        });

        match appended {
            Some(Appended::Promoted) => {
                metrics::counter!("parley_sessions_promoted_total").increment(1);
                metrics::counter!("parley_messages_added_total").increment(1);
                info!("Promoted draft session: {}", session_id);
            }
            Some(_) => {
                metrics::counter!("parley_messages_added_total").increment(1);
                debug!("Added message to session: {}", session_id);
            }
            None => {}
        }
    }

    /// 删除会话
    ///
    /// 删除草稿时无条件清空选择；删除仓库会话时仅当选择指向它才清空。
    pub fn delete_session(&self, id: &str) {
        let deleted = self.apply("delete_session", |state| {
            if state.draft.is_draft(id) {
                state.draft.take();
                state.selection.set(None);
                return Ok(());
            }

            let removed = state.repository.remove_by_id(id).is_some();
            let deselected = state.selection.clear_if(id);
            if removed || deselected {
                Ok(())
            } else {
                Err(SessionError::referential_miss(id))
            }
        });

        if deleted.is_some() {
            metrics::counter!("parley_sessions_deleted_total").increment(1);
            info!("Deleted session: {}", id);
        }
    }

    /// 更新加载状态，草稿与仓库都会检查
    pub fn update_session_loading_state(&self, id: &str, loading: bool) {
        let updated = self.apply("update_session_loading_state", |state| {
            patch_everywhere(state, id, |s| Session {
                is_loading: loading,
                ..s.clone()
            })
        });

        if updated.is_some() {
            debug!("Session {} loading: {}", id, loading);
        }
    }

    /// 更新当前选中会话的设置
    ///
    /// `updater` 基于调用时的快照执行，可以读取 store。若执行期间选择已指向
    /// 别的会话，本次更新被放弃。
    pub fn update_session_settings<F>(&self, updater: F)
    where
        F: FnOnce(&Settings) -> Settings,
    {
        let snapshot = self.snapshot();
        let prepared = match snapshot.selection() {
            None => Err(SessionError::NoActiveSelection),
            Some(id) => match snapshot.current_session() {
                Some(current) => Ok((id.to_owned(), updater(&current.settings), self.clock.now())),
                None => Err(SessionError::referential_miss(id)),
            },
        };

        let updated = self.apply("update_session_settings", |state| {
            let (id, settings, now) = prepared?;
            if state.selection.get() != Some(id.as_str()) {
                return Err(SessionError::referential_miss(id));
            }

            patch_everywhere(state, &id, |s| {
                let mut next = s.clone();
                next.settings = settings.clone();
                next.touch(now);
                next
            })?;
            Ok(id)
        });

        if let Some(id) = updated {
            debug!("Updated settings of session: {}", id);
        }
    }

    /// 重命名会话
    pub fn rename_session(&self, id: &str, title: impl Into<String>) {
        let title = title.into();
        let now = self.clock.now();
        let renamed = self.apply("rename_session", |state| {
            patch_everywhere(state, id, |s| {
                let mut next = s.clone();
                next.title = title.clone();
                next.touch(now);
                next
            })
        });

        if renamed.is_some() {
            debug!("Renamed session {} to {:?}", id, title);
        }
    }

    /// `id` 是否为当前草稿
    pub fn is_draft(&self, id: Option<&str>) -> bool {
        match id {
            Some(id) => self.state.borrow().draft.is_draft(id),
            None => false,
        }
    }

    /// 清空草稿槽，选择指针保持不变
    pub fn clear_draft(&self) {
        let mut cleared = None;
        self.state.send_if_modified(|current| {
            if current.draft.get().is_none() {
                return false;
            }
            let mut next = StoreState::clone(current);
            cleared = next.draft.take().map(|d| d.id.clone());
            *current = Arc::new(next);
            true
        });

        if let Some(id) = cleared {
            debug!("Cleared draft session: {}", id);
        }
    }

    /// 当前状态的快照
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = Arc::clone(&self.state.borrow());
        StoreSnapshot::new(state, Arc::clone(&self.default_settings))
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> StoreWatcher {
        StoreWatcher::new(self.state.subscribe(), Arc::clone(&self.default_settings))
    }

    /// 当前会话：草稿优先，其次仓库
    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.snapshot().current_session()
    }

    /// 当前会话的设置，无当前会话时为默认模板
    pub fn current_settings(&self) -> Settings {
        self.snapshot().current_settings().clone()
    }

    /// 选中的是否为草稿
    pub fn is_current_session_draft(&self) -> bool {
        self.snapshot().is_current_session_draft()
    }

    /// 至少有一条消息的仓库会话
    pub fn sessions_with_messages(&self) -> Vec<Arc<Session>> {
        self.snapshot().sessions_with_messages()
    }

    /// 仓库原始内容，最新的在前
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.snapshot().sessions().to_vec()
    }

    /// 选择指针的原始值，可能悬空
    pub fn selection(&self) -> Option<String> {
        self.state.borrow().selection.get().map(str::to_owned)
    }

    /// 当前草稿
    pub fn draft(&self) -> Option<Arc<Session>> {
        self.state.borrow().draft.get().cloned()
    }
}

/// 对草稿和仓库中匹配 `id` 的会话都应用 `patch`
///
/// 两处都会检查；按不变式最多只有一处持有该 id。
fn patch_everywhere<F>(state: &mut StoreState, id: &str, mut patch: F) -> SessionResult<()>
where
    F: FnMut(&Session) -> Session,
{
    let in_draft = state.draft.update_if_id(id, &mut patch);
    let in_repository = state.repository.update_by_id(id, &mut patch);

    if in_draft || in_repository {
        Ok(())
    } else {
        Err(SessionError::referential_miss(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{SequentialIdGenerator, SteppingClock};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn store() -> SessionStore {
        SessionStore::new().with_collaborators(
            Arc::new(SequentialIdGenerator::new("s")),
            Arc::new(SteppingClock::new(start(), Duration::seconds(1))),
        )
    }

    #[test]
    fn test_create_draft_selects_it() {
        let store = store();
        let id = store.create_draft();

        assert_eq!(id, "s-1");
        assert_eq!(store.selection().as_deref(), Some("s-1"));
        assert!(store.is_current_session_draft());
        assert!(store.sessions().is_empty());

        let draft = store.draft().unwrap();
        assert_eq!(draft.title, "untitled conversation");
        assert_eq!(draft.created_at, draft.updated_at);
        assert!(!draft.is_loading);
    }

    #[test]
    fn test_second_draft_replaces_first() {
        let store = store();
        let first = store.create_draft();
        let second = store.create_draft();

        assert!(!store.is_draft(Some(&first)));
        assert!(store.is_draft(Some(&second)));
        assert!(!store.is_draft(None));
    }

    #[test]
    fn test_message_to_draft_after_promotion_goes_to_repository() {
        let store = store();
        let id = store.create_draft();
        store.add_message(&id, NewMessage::user("hi"));
        store.add_message(&id, NewMessage::assistant("hello"));

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages.len(), 2);
        assert_eq!(sessions[0].title, "hi");
        assert!(store.draft().is_none());
    }

    #[test]
    fn test_renamed_draft_keeps_custom_title_on_promotion() {
        let store = store();
        let id = store.create_draft();
        store.rename_session(&id, "My topic");
        store.add_message(&id, NewMessage::user("first question"));

        let session = store.current_session().unwrap();
        assert_eq!(session.title, "My topic");
        assert!(!store.is_current_session_draft());
    }

    #[test]
    fn test_message_timestamp_matches_updated_at() {
        let store = store();
        let id = store.create_draft();
        store.add_message(&id, NewMessage::user("hi"));

        let session = store.current_session().unwrap();
        assert_eq!(session.messages[0].timestamp, session.updated_at);
        assert!(session.updated_at > session.created_at);
    }

    #[test]
    fn test_add_message_to_unknown_session_is_ignored() {
        let store = store();
        let id = store.create_draft();
        let before = store.snapshot();

        store.add_message("nope", NewMessage::user("lost"));
        store.add_message("", NewMessage::user("lost"));

        assert!(store.snapshot().same_state(&before));
        assert!(store.draft().unwrap().is_empty());
        assert_eq!(store.selection().as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_loading_state_does_not_touch_updated_at() {
        let store = store();
        let id = store.create_draft();
        store.add_message(&id, NewMessage::user("hi"));
        let before = store.current_session().unwrap();

        store.update_session_loading_state(&id, true);

        let after = store.current_session().unwrap();
        assert!(after.is_loading);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_update_settings_without_selection_is_noop() {
        let store = store();
        let id = store.create_draft();
        store.select_session(None);

        store.update_session_settings(|s| s.clone().with_system_prompt("changed"));

        store.select_session(Some(&id));
        assert_eq!(store.current_settings(), Settings::default());
    }

    #[test]
    fn test_clear_draft_leaves_selection_dangling() {
        let store = store();
        let id = store.create_draft();
        store.clear_draft();

        assert!(store.draft().is_none());
        assert_eq!(store.selection().as_deref(), Some(id.as_str()));
        assert!(store.current_session().is_none());
        assert!(!store.is_current_session_draft());

        let before = store.snapshot();
        store.clear_draft();
        assert!(store.snapshot().same_state(&before));
    }

    #[test]
    fn test_delete_dangling_selection_clears_it() {
        let store = store();
        let id = store.create_draft();
        store.clear_draft();

        store.delete_session(&id);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let mut config = SessionStoreConfig::default();
        config.title_max_chars = 0;
        assert!(SessionStore::with_config(config).is_err());

        let config = SessionStoreConfig::default().with_placeholder_title("New chat");
        let store = SessionStore::with_config(config).unwrap();
        store.create_draft();
        assert_eq!(store.draft().unwrap().title, "New chat");
    }
}
