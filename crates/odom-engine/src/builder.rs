//! Builder 模式实现
//!
//! 提供链式构造 `OdometryEngine` 实例的便捷方式。

use crate::config::{EngineConfig, OutputMode};
use crate::engine::OdometryEngine;
use crate::error::EngineError;
use crate::estimator::{DifferentialEstimator, Estimator};
use std::time::Duration;

/// 引擎 Builder（链式构造）
///
/// # Example
///
/// ```
/// use odom_engine::{EngineBuilder, OutputMode};
/// use std::time::Duration;
///
/// let engine = EngineBuilder::new()
///     .ticks_per_meter(500)
///     .capacity(256)
///     .poll_interval(Duration::from_millis(5))
///     .output(OutputMode::Queue { capacity: 64 })
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.config().ticks_per_meter, 500);
/// assert_eq!(engine.config().left_capacity, 256);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 左轮输入通道容量
    pub fn left_capacity(mut self, capacity: usize) -> Self {
        self.config.left_capacity = capacity;
        self
    }

    /// 右轮输入通道容量
    pub fn right_capacity(mut self, capacity: usize) -> Self {
        self.config.right_capacity = capacity;
        self
    }

    /// 同时设置左右两侧容量
    pub fn capacity(self, capacity: usize) -> Self {
        self.left_capacity(capacity).right_capacity(capacity)
    }

    pub fn ticks_per_meter(mut self, ticks_per_meter: u32) -> Self {
        self.config.ticks_per_meter = ticks_per_meter;
        self
    }

    /// 工作线程空闲等待上限（也是 stop 的响应上限）
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// 两侧时间戳允许的最大偏差（采样周期数）
    ///
    /// `None` 关闭检查：任一侧有新速度就发布。
    pub fn max_skew_periods(mut self, periods: Option<f64>) -> Self {
        match periods {
            Some(periods) => {
                self.config.reject_stale_wheel = true;
                self.config.max_skew_periods = periods;
            },
            None => self.config.reject_stale_wheel = false,
        }
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.config.output = output;
        self
    }

    /// 用完整配置替换当前设置（例如从 TOML 加载的配置）
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 构建使用默认差速估计器的引擎（不启动）
    pub fn build(self) -> Result<OdometryEngine, EngineError> {
        OdometryEngine::new(self.config)
    }

    /// 构建使用自定义估计策略的引擎（不启动）
    pub fn build_with_estimator<E: Estimator>(
        self,
        estimator: E,
    ) -> Result<OdometryEngine<E>, EngineError> {
        OdometryEngine::with_estimator(self.config, estimator)
    }

    /// 构建并立即启动
    pub fn spawn(self) -> Result<OdometryEngine<DifferentialEstimator>, EngineError> {
        let engine = self.build()?;
        engine.start()?;
        Ok(engine)
    }
}
