//! 估计策略
//!
//! 流水线本身不关心速度如何计算：它只负责把采样交给策略对象、
//! 在有新数据时向策略要一个组合估计。策略以泛型参数注入引擎（静态分发）。

use crate::config::EngineConfig;
use crate::tracker::{TrackerUpdate, WheelSnapshot, WheelTracker};
use crate::types::{EncoderSample, OdometrySample, WheelSide};
use tracing::debug;

/// 估计策略接口
///
/// 所有方法都在引擎的共享锁内被调用：`process` 由对应侧的输入线程调用，
/// `combine` 由估计线程调用，因此 `combine` 看到的两侧状态总是一致的快照。
pub trait Estimator: Send + 'static {
    /// 处理一侧的新采样
    fn process(&mut self, side: WheelSide, sample: EncoderSample) -> TrackerUpdate;

    /// 尝试组合出一个里程计估计
    ///
    /// 返回 `None` 表示本轮没有可发布的估计（冷启动、单侧数据、无新数据等），这不是错误。
    fn combine(&mut self) -> Option<OdometrySample>;

    /// 单轮状态快照
    fn wheel(&self, side: WheelSide) -> WheelSnapshot;
}

/// 差速底盘估计器（默认策略）
///
/// # 发布策略
///
/// - 两侧都已计算出速度才可组合（只有一个基准采样的一侧不参与）
/// - `speed = (left + right) / 2`，`timestamp = max(left.ts, right.ts)`
/// - 只有自上次 `combine` 以来至少一侧速度有更新时才产生估计，不会重复发布同一个估计
/// - 设置了 `max_skew_periods` 时，两侧最近更新时间之差不得超过
///   `max_skew_periods × 采样周期`（周期取两侧最近一次采样间隔的较大者）。
///   一侧漏掉一个或多个周期而另一侧持续更新时，这些周期不产生输出；
///   两侧各自健康但存在相位差时，偏差小于一个周期，正常发布
///
/// # Example
///
/// ```
/// use odom_engine::{DifferentialEstimator, EncoderSample, Estimator, Timestamp, WheelSide};
///
/// let mut estimator = DifferentialEstimator::new(300);
/// for i in 0..2 {
///     let sample = EncoderSample::new(i, Timestamp::new(i as u32, 0));
///     estimator.process(WheelSide::Left, sample);
///     estimator.process(WheelSide::Right, sample);
/// }
/// let odom = estimator.combine().unwrap();
/// assert!((odom.speed - 1.0 / 300.0).abs() < 1e-6);
/// assert!(estimator.combine().is_none()); // 没有新数据
/// ```
#[derive(Debug, Clone)]
pub struct DifferentialEstimator {
    wheels: [WheelTracker; 2],
    ticks_per_meter: f64,
    max_skew_periods: Option<f64>,
    /// 上次 `combine` 时两侧更新次数之和
    combined_generation: u64,
}

impl DifferentialEstimator {
    /// 默认最大轮间偏差（采样周期数）
    pub const DEFAULT_MAX_SKEW_PERIODS: f64 = 0.75;

    /// 创建估计器（`ticks_per_meter` 必须为正）
    pub fn new(ticks_per_meter: u32) -> Self {
        Self {
            wheels: [WheelTracker::new(), WheelTracker::new()],
            ticks_per_meter: f64::from(ticks_per_meter),
            max_skew_periods: Some(Self::DEFAULT_MAX_SKEW_PERIODS),
            combined_generation: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.ticks_per_meter).with_max_skew_periods(config.max_skew_periods())
    }

    /// 设置最大轮间偏差（采样周期数），`None` 关闭陈旧检查
    pub fn with_max_skew_periods(mut self, max_skew_periods: Option<f64>) -> Self {
        self.max_skew_periods = max_skew_periods;
        self
    }

    pub fn ticks_per_meter(&self) -> f64 {
        self.ticks_per_meter
    }

    pub fn tracker(&self, side: WheelSide) -> &WheelTracker {
        &self.wheels[side.index()]
    }

    fn generation(&self) -> u64 {
        self.wheels.iter().map(WheelTracker::updates).sum()
    }
}

impl Estimator for DifferentialEstimator {
    fn process(&mut self, side: WheelSide, sample: EncoderSample) -> TrackerUpdate {
        self.wheels[side.index()].update(sample, self.ticks_per_meter)
    }

    fn combine(&mut self) -> Option<OdometrySample> {
        let [left, right] = &self.wheels;
        let (left_speed, right_speed) = (left.speed()?, right.speed()?);
        let (left_ts, right_ts) = (left.last_timestamp()?, right.last_timestamp()?);
        let (left_period, right_period) = (left.period()?, right.period()?);

        let generation = self.generation();
        if generation == self.combined_generation {
            return None;
        }
        self.combined_generation = generation;

        if let Some(max_periods) = self.max_skew_periods {
            let skew = left_ts.abs_diff(right_ts);
            let period = left_period.max(right_period);
            if skew.as_secs_f64() > period.as_secs_f64() * max_periods {
                debug!(
                    left = %left_ts,
                    right = %right_ts,
                    ?skew,
                    ?period,
                    "suppressing odometry estimate: stale wheel"
                );
                return None;
            }
        }

        Some(OdometrySample {
            speed: (left_speed + right_speed) / 2.0,
            timestamp: left_ts.max(right_ts),
        })
    }

    fn wheel(&self, side: WheelSide) -> WheelSnapshot {
        self.wheels[side.index()].snapshot(self.ticks_per_meter)
    }
}
