//! 单槽"最新值"寄存器
//!
//! 消费者只关心最新的估计值，因此输出端不是 FIFO，而是一个可原子替换的槽位：
//! 写入总是覆盖未读的旧值，读取是"取出并清空"。基于 `ArcSwapOption`，读写两侧均无锁。

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// 最新值寄存器（单写者 / 单读者）
///
/// # Example
///
/// ```
/// use odom_engine::slot::LatestSlot;
///
/// let slot = LatestSlot::new();
/// assert!(!slot.store(1));
/// assert!(slot.store(2)); // 覆盖了未读的 1
/// assert_eq!(slot.take(), Some(2));
/// assert_eq!(slot.take(), None);
/// ```
#[derive(Debug, Default)]
pub struct LatestSlot<T> {
    inner: ArcSwapOption<T>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: ArcSwapOption::const_empty(),
        }
    }

    /// 写入新值
    ///
    /// 返回 `true` 表示覆盖了一个尚未被读取的旧值。
    pub fn store(&self, value: T) -> bool {
        self.inner.swap(Some(Arc::new(value))).is_some()
    }

    /// 取出并清空
    pub fn take(&self) -> Option<T> {
        self.inner
            .swap(None)
            .map(|value| Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// 只读不清空（诊断用）
    pub fn peek(&self) -> Option<T> {
        self.inner.load_full().map(|value| (*value).clone())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_none()
    }
}
