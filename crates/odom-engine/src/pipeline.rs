//! Pipeline 工作线程循环
//!
//! 每个引擎三个常驻线程：左右两个输入线程各自消费本侧通道并更新追踪器，
//! 一个估计线程在有新数据时组合两侧速度并发布。
//!
//! 空闲时线程在通道 / 条件变量上限时等待（而不是 sleep 轮询），
//! 停止标志最多在一个轮询间隔内被观察到。

use crate::channel::BoundedChannel;
use crate::config::EngineConfig;
use crate::estimator::Estimator;
use crate::metrics::EngineMetrics;
use crate::output::{OutputBuffer, Publish};
use crate::tracker::TrackerUpdate;
use crate::types::{EncoderSample, WheelSide};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{trace, warn};

/// 引擎共享上下文
///
/// 由引擎与三个工作线程通过 `Arc` 共享。
pub struct EngineContext<E> {
    /// 估计策略（两侧追踪器状态都在这把锁内）
    pub estimator: Mutex<E>,
    /// 有新的速度更新时通知估计线程
    pub data_ready: Condvar,
    /// 左右输入通道（按 `WheelSide::index()` 索引）
    pub inputs: [BoundedChannel<EncoderSample>; 2],
    /// 输出端
    pub output: OutputBuffer,
    /// 运行标志
    pub is_running: AtomicBool,
    /// 运行指标
    pub metrics: EngineMetrics,
    /// 空闲等待上限
    pub poll_interval: Duration,
}

impl<E: Estimator> EngineContext<E> {
    /// 按配置创建上下文（配置须已校验）
    pub fn new(config: &EngineConfig, estimator: E) -> Self {
        Self {
            estimator: Mutex::new(estimator),
            data_ready: Condvar::new(),
            inputs: [
                BoundedChannel::new(config.left_capacity),
                BoundedChannel::new(config.right_capacity),
            ],
            output: OutputBuffer::from_mode(config.output),
            is_running: AtomicBool::new(false),
            metrics: EngineMetrics::new(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn input(&self, side: WheelSide) -> &BoundedChannel<EncoderSample> {
        &self.inputs[side.index()]
    }

    fn running(&self) -> bool {
        // Acquire: 看到 false 时，必须同时看到停止方之前的所有写入
        self.is_running.load(Ordering::Acquire)
    }
}

/// 输入线程主循环（每侧一个）
///
/// 从本侧通道取采样交给估计策略。FIFO 只在单个通道内保证，两侧完全独立。
pub fn ingest_loop<E: Estimator>(side: WheelSide, ctx: Arc<EngineContext<E>>) {
    apply_realtime_priority(side.as_str());

    let input = ctx.input(side);
    loop {
        if !ctx.running() {
            trace!("Ingest thread ({}): is_running flag is false, exiting", side);
            break;
        }

        let Some(sample) = input.pop_timeout(ctx.poll_interval) else {
            continue;
        };

        let update = ctx.estimator.lock().process(side, sample);
        ctx.metrics.processed.fetch_add(1, Ordering::Relaxed);

        match update {
            TrackerUpdate::Updated(speed) => {
                trace!(
                    %side,
                    tick = sample.tick,
                    ts = %sample.timestamp,
                    speed,
                    "wheel speed updated"
                );
                ctx.data_ready.notify_one();
            },
            TrackerUpdate::Primed => {
                ctx.metrics.primed.fetch_add(1, Ordering::Relaxed);
            },
            TrackerUpdate::Rejected => {
                ctx.metrics.rejected_elapsed.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    trace!("Ingest thread ({}): loop exited", side);
}

/// 估计线程主循环
///
/// `combine` 在共享锁内执行，两侧状态是同一时刻的快照。
/// 没有可发布的估计时，在条件变量上等待至多一个轮询间隔（等待期间释放锁）。
pub fn estimate_loop<E: Estimator>(ctx: Arc<EngineContext<E>>) {
    apply_realtime_priority("estimate");

    let mut estimator = ctx.estimator.lock();
    loop {
        if !ctx.running() {
            trace!("Estimate thread: is_running flag is false, exiting");
            break;
        }

        let Some(sample) = estimator.combine() else {
            ctx.data_ready.wait_for(&mut estimator, ctx.poll_interval);
            continue;
        };

        // 发布是无锁且非阻塞的，但仍在锁外进行，避免拖慢输入线程
        let outcome = MutexGuard::unlocked(&mut estimator, || ctx.output.publish(sample));

        ctx.metrics.estimates_published.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Publish::Stored => {},
            Publish::Overwritten => {
                ctx.metrics.estimates_overwritten.fetch_add(1, Ordering::Relaxed);
            },
            Publish::Dropped => {
                ctx.metrics.estimates_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Estimate thread: output queue full, estimate dropped");
            },
        }
        trace!(speed = sample.speed, ts = %sample.timestamp, "odometry estimate published");
    }

    trace!("Estimate thread: loop exited");
}

/// 提升当前线程优先级（可选 feature）
#[cfg(feature = "realtime")]
fn apply_realtime_priority(name: &str) {
    use thread_priority::*;
    use tracing::info;

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(_) => {
            info!("{} thread priority set to MAX (realtime)", name);
        },
        Err(e) => {
            warn!(
                "Failed to set {} thread priority: {}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                name, e
            );
        },
    }
}

#[cfg(not(feature = "realtime"))]
fn apply_realtime_priority(_name: &str) {}
