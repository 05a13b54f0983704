//! 选择指针：当前聚焦的会话 id。
//!
//! 写入时不做校验，指向即将创建或已删除会话的 id 都是合法的，
//! 由派生视图在读取时解析。

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPointer {
    current: Option<String>,
}

impl SelectionPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: Option<String>) {
        self.current = id;
    }

    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
    }

    /// 仅当指针等于 `id` 时清空
    pub fn clear_if(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            self.current = None;
            true
        } else {
            false
        }
    }
}
