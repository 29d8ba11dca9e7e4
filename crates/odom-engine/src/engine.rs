//! 引擎 API 模块
//!
//! 提供对外的 `OdometryEngine`，封装三个工作线程、通道和共享状态。
//! `submit` 与 `try_consume` 永不阻塞，可在任意线程调用。

use crate::config::EngineConfig;
use crate::error::{EngineError, SubmitError};
use crate::estimator::{DifferentialEstimator, Estimator};
use crate::lifecycle::{AtomicEngineState, EngineState};
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{EngineContext, estimate_loop, ingest_loop};
use crate::tracker::WheelSnapshot;
use crate::types::{EncoderSample, OdometrySample, Timestamp, WheelSide};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看门狗线程负责真正的 join，本线程只限时等待结果
        thread::spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(Box::new(
                std::io::Error::new(std::io::ErrorKind::TimedOut, "Thread join timeout"),
            )),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(Box::new(
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "Thread panicked during join",
                ),
            )),
        }
    }
}

/// 轮式里程计引擎
///
/// # 线程模型
///
/// `start()` 之后有三个常驻线程：
/// - `odom-left` / `odom-right`：消费各自的输入通道，更新追踪器
/// - `odom-estimate`：两侧有新速度时组合并发布估计
///
/// # 背压
///
/// 输入通道满时 `submit` 返回 `false`，新采样被丢弃；调用方永远不会被阻塞。
///
/// # Example
///
/// ```
/// use odom_engine::{EncoderSample, EngineConfig, OdometryEngine, Timestamp, WheelSide};
///
/// let engine = OdometryEngine::new(EngineConfig::with_ticks_per_meter(300)).unwrap();
/// engine.start().unwrap();
///
/// let sample = EncoderSample::new(0, Timestamp::new(0, 0));
/// assert!(engine.submit(sample, WheelSide::Left));
/// assert!(engine.submit(sample, WheelSide::Right));
///
/// // 只有基准采样，没有速度
/// assert!(engine.try_consume().is_none());
/// engine.stop();
/// ```
pub struct OdometryEngine<E: Estimator = DifferentialEstimator> {
    /// 共享上下文
    ctx: Arc<EngineContext<E>>,
    /// 构造时的配置
    config: EngineConfig,
    /// 生命周期状态
    state: AtomicEngineState,
    /// 工作线程句柄（stop 时 join）
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl OdometryEngine<DifferentialEstimator> {
    /// 使用默认差速估计器创建引擎（不启动线程）
    ///
    /// # 错误
    /// - `EngineError::Config`: 配置无效
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let estimator = DifferentialEstimator::from_config(&config);
        Self::with_estimator(config, estimator)
    }
}

impl<E: Estimator> OdometryEngine<E> {
    /// stop 时等待每个线程退出的上限
    const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

    /// 使用自定义估计策略创建引擎（不启动线程）
    pub fn with_estimator(config: EngineConfig, estimator: E) -> Result<Self, EngineError> {
        config.validate()?;
        let ctx = Arc::new(EngineContext::new(&config, estimator));
        Ok(Self {
            ctx,
            config,
            state: AtomicEngineState::new(EngineState::Idle),
            workers: Mutex::new(Vec::with_capacity(3)),
        })
    }

    /// 启动三个工作线程
    ///
    /// 每个实例最多成功调用一次。
    ///
    /// # 错误
    /// - `EngineError::AlreadyStarted`: 已经启动过
    /// - `EngineError::Stopped`: 已经停止，不能重启
    /// - `EngineError::Spawn`: 线程创建失败（已创建的线程会被回收，引擎进入 Stopped）
    pub fn start(&self) -> Result<(), EngineError> {
        match self.state.compare_exchange(
            EngineState::Idle,
            EngineState::Running,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {},
            Err(EngineState::Stopped) => return Err(EngineError::Stopped),
            Err(_) => return Err(EngineError::AlreadyStarted),
        }

        // Release: 工作线程看到 true 时，必须同时看到上下文的初始化
        self.ctx.is_running.store(true, Ordering::Release);

        let mut workers = self.workers.lock();
        for side in WheelSide::BOTH {
            let ctx = self.ctx.clone();
            let spawned = thread::Builder::new()
                .name(format!("odom-{}", side))
                .spawn(move || ingest_loop(side, ctx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    drop(workers);
                    self.stop();
                    return Err(EngineError::Spawn(e));
                },
            }
        }

        let ctx = self.ctx.clone();
        match thread::Builder::new()
            .name("odom-estimate".to_string())
            .spawn(move || estimate_loop(ctx))
        {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                drop(workers);
                self.stop();
                return Err(EngineError::Spawn(e));
            },
        }

        info!(
            left_capacity = self.config.left_capacity,
            right_capacity = self.config.right_capacity,
            ticks_per_meter = self.config.ticks_per_meter,
            "Odometry engine started"
        );
        Ok(())
    }

    /// 停止引擎并 join 所有工作线程
    ///
    /// 阻塞时间以一个轮询间隔为界。队列中尚未处理的采样被丢弃。可重复调用。
    pub fn stop(&self) {
        let previous = self.state.swap(EngineState::Stopped, Ordering::AcqRel);
        if previous == EngineState::Stopped {
            return;
        }

        // Release: 所有之前的写入对看到 false 的线程可见
        self.ctx.is_running.store(false, Ordering::Release);
        // 估计线程可能在条件变量上等待，直接唤醒
        self.ctx.data_ready.notify_all();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            let name = handle.thread().name().unwrap_or("odom-worker").to_string();
            if let Err(_e) = handle.join_timeout(Self::JOIN_TIMEOUT) {
                error!(
                    "{} thread panicked or failed to shut down within {:?}",
                    name,
                    Self::JOIN_TIMEOUT
                );
            }
        }

        let discarded: usize = self.ctx.inputs.iter().map(|input| input.clear()).sum();
        if discarded > 0 {
            debug!(discarded, "discarded queued encoder samples on shutdown");
        }
        if previous == EngineState::Running {
            info!("Odometry engine stopped");
        }
    }

    /// 提交一个编码器采样（非阻塞）
    ///
    /// 返回 `false` 表示采样被丢弃（通道已满或计数值越界）。
    pub fn submit(&self, sample: EncoderSample, side: WheelSide) -> bool {
        self.try_submit(sample, side).is_ok()
    }

    /// 以原始参数提交（`submit(tick, timestamp, side)` 形式）
    pub fn submit_tick(&self, tick: i64, timestamp: Timestamp, side: WheelSide) -> bool {
        self.submit(EncoderSample::new(tick, timestamp), side)
    }

    /// 提交一个编码器采样，失败时给出原因（非阻塞）
    ///
    /// # 错误
    /// - `SubmitError::TickOutOfRange`: 计数值不在 `[0, MAX_TICK]`
    /// - `SubmitError::Full`: 本侧输入通道已满
    pub fn try_submit(&self, sample: EncoderSample, side: WheelSide) -> Result<(), SubmitError> {
        let metrics = &self.ctx.metrics;
        if !sample.is_valid_tick() {
            metrics.rejected_out_of_range.fetch_add(1, Ordering::Relaxed);
            warn!(%side, tick = sample.tick, "rejecting out-of-range encoder tick");
            return Err(SubmitError::TickOutOfRange { tick: sample.tick });
        }

        if self.ctx.input(side).push(sample) {
            metrics.submitted.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            metrics.dropped_full.fetch_add(1, Ordering::Relaxed);
            Err(SubmitError::Full { side })
        }
    }

    /// 取出最新的里程计估计（非阻塞）
    ///
    /// 返回 `None` 是正常结果：表示自上次读取以来没有新的估计。
    pub fn try_consume(&self) -> Option<OdometrySample> {
        let sample = self.ctx.output.take()?;
        self.ctx.metrics.estimates_consumed.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }

    /// 当前生命周期状态
    pub fn state(&self) -> EngineState {
        self.state.get(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// 单轮状态快照（需要短暂持有共享锁）
    pub fn wheel(&self, side: WheelSide) -> WheelSnapshot {
        self.ctx.estimator.lock().wheel(side)
    }

    /// 本侧输入通道中排队的采样数
    pub fn pending(&self, side: WheelSide) -> usize {
        self.ctx.input(side).len()
    }

    /// 获取运行指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<E: Estimator> Drop for OdometryEngine<E> {
    fn drop(&mut self) {
        self.stop();
    }
}
