//! # Parley Session Types
//!
//! 定义会话相关的核心数据类型：消息、模型参数、会话设置与会话本身。
//! 这些类型只承载数据，状态变更全部由 [`crate::store::SessionStore`] 完成。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// 已记录的消息，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// 调用方提交的消息内容，id 与时间戳由 store 填充
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
}

impl NewMessage {
    /// 创建用户消息
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// 创建助手消息
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub(crate) fn into_message(self, id: String, timestamp: DateTime<Utc>) -> Message {
        Message {
            id,
            role: self.role,
            content: self.content,
            timestamp,
        }
    }
}

/// 模型参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// 提示词模板变量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 会话设置
///
/// `Settings::default()` 即默认模板。每个新会话拿到的是模板的独立副本，
/// 修改某个会话的设置不会影响模板或其他会话。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub model: ModelSettings,
    pub system_prompt: String,
    pub variables: Vec<Variable>,
}

impl Settings {
    /// 设置系统提示词
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// 追加模板变量
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push(Variable::new(name, value));
        self
    }
}

/// 会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    /// 按时间顺序追加，只增不减
    pub messages: Vec<Message>,
    pub settings: Settings,
    pub is_loading: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// 创建空会话
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        settings: Settings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            settings,
            is_loading: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否还没有任何消息
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 返回追加了一条消息的新副本
    pub(crate) fn with_message(&self, message: Message, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next.touch(now);
        next
    }

    /// 刷新更新时间，保证不早于创建时间
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_default_settings_template() {
        let settings = Settings::default();
        assert_eq!(settings.model.model, "gpt-4");
        assert_eq!(settings.model.max_tokens, 2048);
        assert!((settings.model.temperature - 0.7).abs() < f64::EPSILON);
        assert!(settings.system_prompt.is_empty());
        assert!(settings.variables.is_empty());
    }

    #[test]
    fn test_with_message_leaves_original_untouched() {
        let session = Session::new("s-1", "title", Settings::default(), at(0));
        let message = NewMessage::user("hello").into_message("m-1".to_string(), at(5));

        let next = session.with_message(message, at(5));

        assert!(session.is_empty());
        assert_eq!(next.messages.len(), 1);
        assert_eq!(next.updated_at, at(5));
        assert_eq!(next.created_at, at(0));
        assert_eq!(next.messages[0].content, "hello");
    }

    #[test]
    fn test_touch_never_precedes_created_at() {
        let mut session = Session::new("s-1", "title", Settings::default(), at(10));
        session.touch(at(3));
        assert_eq!(session.updated_at, at(10));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let session = Session::new("s-1", "title", Settings::default(), at(0));
        let json = serde_json::to_value(&session).unwrap();

        assert!(json.get("isLoading").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["settings"]["model"]["maxTokens"], 2048);
        assert!(json["settings"].get("systemPrompt").is_some());

        let role = serde_json::to_value(Role::Assistant).unwrap();
        assert_eq!(role, "assistant");
        assert_eq!(Role::User.to_string(), "user");
    }
}
