//! 引擎运行指标
//!
//! 原子计数器，任何线程都可以无锁读取，用于观察丢包和估计发布情况。

use std::sync::atomic::{AtomicU64, Ordering};

/// 引擎实时指标
///
/// 所有计数器使用 `Ordering::Relaxed`：只要求最终可见，不参与同步。
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// 被输入通道接受的采样数
    pub submitted: AtomicU64,
    /// 输入通道已满而丢弃的采样数
    pub dropped_full: AtomicU64,
    /// 计数值越界被拒绝的采样数
    pub rejected_out_of_range: AtomicU64,

    /// 输入线程处理的采样数（含基准和被拒绝的）
    pub processed: AtomicU64,
    /// 作为基准的首个采样数
    pub primed: AtomicU64,
    /// 时间差非正被拒绝的采样数
    pub rejected_elapsed: AtomicU64,

    /// 发布的组合估计数
    pub estimates_published: AtomicU64,
    /// 覆盖了未读估计的次数（Latest 模式）
    pub estimates_overwritten: AtomicU64,
    /// 输出队列已满而丢弃的估计数（Queue 模式）
    pub estimates_dropped: AtomicU64,
    /// 被消费者取走的估计数
    pub estimates_consumed: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            rejected_out_of_range: self.rejected_out_of_range.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            primed: self.primed.load(Ordering::Relaxed),
            rejected_elapsed: self.rejected_elapsed.load(Ordering::Relaxed),
            estimates_published: self.estimates_published.load(Ordering::Relaxed),
            estimates_overwritten: self.estimates_overwritten.load(Ordering::Relaxed),
            estimates_dropped: self.estimates_dropped.load(Ordering::Relaxed),
            estimates_consumed: self.estimates_consumed.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub dropped_full: u64,
    pub rejected_out_of_range: u64,
    pub processed: u64,
    pub primed: u64,
    pub rejected_elapsed: u64,
    pub estimates_published: u64,
    pub estimates_overwritten: u64,
    pub estimates_dropped: u64,
    pub estimates_consumed: u64,
}

impl MetricsSnapshot {
    /// 输入丢弃率（百分比）
    ///
    /// 返回 0.0 到 100.0 之间的值。没有任何提交时返回 0.0。
    pub fn drop_rate(&self) -> f64 {
        let total = self.submitted + self.dropped_full;
        if total == 0 {
            return 0.0;
        }
        (self.dropped_full as f64 / total as f64) * 100.0
    }

    /// 已提交但尚未被输入线程处理的采样数
    pub fn pending(&self) -> u64 {
        self.submitted.saturating_sub(self.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = EngineMetrics::new();
        metrics.submitted.fetch_add(3, Ordering::Relaxed);
        metrics.dropped_full.fetch_add(1, Ordering::Relaxed);
        metrics.processed.fetch_add(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted, 3);
        assert_eq!(snapshot.dropped_full, 1);
        assert_eq!(snapshot.pending(), 1);
        assert!((snapshot.drop_rate() - 25.0).abs() < 1e-9);
        assert_eq!(snapshot.estimates_published, 0);
    }

    #[test]
    fn test_drop_rate_empty() {
        assert_eq!(MetricsSnapshot::default().drop_rate(), 0.0);
    }
}
