//! 有界通道
//!
//! 固定容量的 FIFO，生产端永不阻塞（满则丢弃新值），消费端可选择立即返回或限时等待。
//! 这是整个系统唯一的背压机制：调用方线程可能处于实时路径上，绝不能被阻塞。

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::time::Duration;

/// 有界通道（reject-new 策略）
///
/// 同时持有发送端和接收端，因此不会出现 `Disconnected`。
///
/// # Example
///
/// ```
/// use odom_engine::channel::BoundedChannel;
///
/// let channel = BoundedChannel::new(2);
/// assert!(channel.push(1));
/// assert!(channel.push(2));
/// assert!(!channel.push(3)); // 已满，丢弃最新值
/// assert_eq!(channel.try_pop(), Some(1));
/// ```
#[derive(Debug)]
pub struct BoundedChannel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// 创建固定容量的通道
    ///
    /// `capacity` 为 0 时按 1 处理（0 容量的 crossbeam 通道是会合通道，`try_send` 几乎总是失败）。
    /// 引擎层面在 `EngineConfig::validate` 中拒绝 0 容量。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// 非阻塞推送
    ///
    /// 通道已满时丢弃 `item` 并返回 `false`（被丢弃的是最新值，而不是队列中较早的值）。
    pub fn push(&self, item: T) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// 非阻塞弹出
    pub fn try_pop(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// 限时等待弹出（仅供工作线程使用）
    ///
    /// 最多等待 `timeout`，超时返回 `None`。
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// 当前排队数量
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 丢弃所有排队元素，返回丢弃数量
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }
}
