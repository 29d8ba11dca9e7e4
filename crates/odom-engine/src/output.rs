//! 估计输出端
//!
//! 估计线程（单写者）与外部消费者（单读者）之间唯一的共享资源。

use crate::channel::BoundedChannel;
use crate::config::OutputMode;
use crate::slot::LatestSlot;
use crate::types::OdometrySample;

/// 一次发布的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// 已写入
    Stored,
    /// 已写入，并覆盖了一个未读的估计
    Overwritten,
    /// 队列已满，本次估计被丢弃
    Dropped,
}

/// 输出缓冲
#[derive(Debug)]
pub enum OutputBuffer {
    /// 单槽最新值
    Latest(LatestSlot<OdometrySample>),
    /// 有界 FIFO（reject-new）
    Queue(BoundedChannel<OdometrySample>),
}

impl OutputBuffer {
    pub fn from_mode(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Latest => Self::Latest(LatestSlot::new()),
            OutputMode::Queue { capacity } => Self::Queue(BoundedChannel::new(capacity)),
        }
    }

    /// 发布一个估计（永不阻塞）
    pub fn publish(&self, sample: OdometrySample) -> Publish {
        match self {
            Self::Latest(slot) => {
                if slot.store(sample) {
                    Publish::Overwritten
                } else {
                    Publish::Stored
                }
            },
            Self::Queue(queue) => {
                if queue.push(sample) {
                    Publish::Stored
                } else {
                    Publish::Dropped
                }
            },
        }
    }

    /// 取出一个估计（永不阻塞）
    pub fn take(&self) -> Option<OdometrySample> {
        match self {
            Self::Latest(slot) => slot.take(),
            Self::Queue(queue) => queue.try_pop(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Latest(slot) => slot.is_empty(),
            Self::Queue(queue) => queue.is_empty(),
        }
    }
}
