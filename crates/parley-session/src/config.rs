//! SessionStore 配置

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::types::Settings;

/// SessionStore 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStoreConfig {
    /// 新草稿的占位标题
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,
    /// 自动生成标题时截取的最大字符数
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    /// 内容被截断时追加的省略标记
    #[serde(default = "default_title_ellipsis")]
    pub title_ellipsis: String,
    /// 新会话设置的模板
    #[serde(default)]
    pub default_settings: Settings,
}

fn default_placeholder_title() -> String {
    "untitled conversation".to_string()
}

fn default_title_max_chars() -> usize {
    50
}

fn default_title_ellipsis() -> String {
    "...".to_string()
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            placeholder_title: default_placeholder_title(),
            title_max_chars: default_title_max_chars(),
            title_ellipsis: default_title_ellipsis(),
            default_settings: Settings::default(),
        }
    }
}

impl SessionStoreConfig {
    /// 设置占位标题
    pub fn with_placeholder_title(mut self, title: impl Into<String>) -> Self {
        self.placeholder_title = title.into();
        self
    }

    /// 设置默认会话设置模板
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings;
        self
    }

    /// 验证配置
    pub fn validate(&self) -> SessionResult<()> {
        if self.placeholder_title.is_empty() {
            return Err(SessionError::config("placeholder_title cannot be empty"));
        }
        if self.title_max_chars == 0 {
            return Err(SessionError::config(
                "title_max_chars must be greater than 0",
            ));
        }

        let model = &self.default_settings.model;
        if model.model.trim().is_empty() {
            return Err(SessionError::config("default model name cannot be empty"));
        }
        if model.max_tokens == 0 {
            return Err(SessionError::config("maxTokens must be greater than 0"));
        }
        check_range("temperature", model.temperature, 0.0, 2.0)?;
        check_range("topP", model.top_p, 0.0, 1.0)?;
        check_range("frequencyPenalty", model.frequency_penalty, -2.0, 2.0)?;
        check_range("presencePenalty", model.presence_penalty, -2.0, 2.0)?;

        Ok(())
    }

    /// 从首条消息内容推导标题
    pub fn derive_title(&self, content: &str) -> String {
        let mut chars = content.chars();
        let head: String = chars.by_ref().take(self.title_max_chars).collect();
        if chars.next().is_some() {
            format!("{}{}", head, self.title_ellipsis)
        } else {
            head
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> SessionResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(SessionError::config(format!(
            "{} must be within {}..={}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}
