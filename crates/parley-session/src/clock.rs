//! 外部协作者：id 生成与时钟。
//!
//! 生产环境使用 [`UuidIdGenerator`] 与 [`SystemClock`]；测试环境使用
//! 可预测的 [`SequentialIdGenerator`] 与 [`SteppingClock`]。

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// 全局唯一 id 生成器
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// 时间源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 基于 uuid v4 的 id 生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 顺序 id 生成器：`prefix-1`, `prefix-2`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// 步进时钟：从固定时刻开始，每次调用前进固定步长
#[derive(Debug)]
pub struct SteppingClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// 查看下一次 `now()` 将返回的时刻，不推进时钟
    pub fn peek(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default(), Duration::seconds(1))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock();
        let now = *current;
        *current = now + self.step;
        now
    }
}
