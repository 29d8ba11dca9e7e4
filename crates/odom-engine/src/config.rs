//! 引擎配置
//!
//! 通道容量、标定值、轮询间隔和新鲜度策略。支持从 TOML 加载。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 输出端模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputMode {
    /// 单槽最新值寄存器（默认）：新估计覆盖未读的旧估计
    #[default]
    Latest,
    /// 有界 FIFO（reject-new）：消费者需要每一个估计时使用
    Queue { capacity: usize },
}

/// 引擎配置
///
/// # Example
///
/// ```
/// use odom_engine::EngineConfig;
///
/// // 默认配置（1000/1000 输入容量，300 tick/m，10ms 轮询，最大轮间偏差 0.75 个采样周期）
/// let config = EngineConfig::default();
/// assert!(config.validate().is_ok());
///
/// let config = EngineConfig::from_toml_str(
///     r#"
///     ticks_per_meter = 512
///     poll_interval_ms = 5
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.ticks_per_meter, 512);
/// assert_eq!(config.left_capacity, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 左轮输入通道容量
    pub left_capacity: usize,
    /// 右轮输入通道容量
    pub right_capacity: usize,
    /// 标定值（tick/米，必须为正）
    pub ticks_per_meter: u32,
    /// 工作线程空闲时的最长等待时间（毫秒）
    ///
    /// 同时也是 `stop()` 的最长响应时间。
    pub poll_interval_ms: u64,
    /// 是否抑制陈旧的组合估计
    ///
    /// 关闭时，沉默一侧的最后速度会一直参与组合。
    pub reject_stale_wheel: bool,
    /// 两轮最近一次更新之间允许的最大时间偏差，以采样周期为单位
    ///
    /// 采样周期取两轮最近一次采样间隔中的较大者。仅在 `reject_stale_wheel`
    /// 开启时生效，超出时不发布组合估计。小于 1 时，一侧漏掉一个周期即被视为陈旧；
    /// 不小于 0.5 时，任意相位差的两路健康数据每个周期至少产生一个估计。
    pub max_skew_periods: f64,
    /// 输出端模式（TOML 中为 `[output]` 表，放在最后）
    pub output: OutputMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            left_capacity: 1000,
            right_capacity: 1000,
            ticks_per_meter: 300,
            poll_interval_ms: 10,
            reject_stale_wheel: true,
            max_skew_periods: 0.75,
            output: OutputMode::Latest,
        }
    }
}

impl EngineConfig {
    /// 以给定标定值创建默认配置
    pub fn with_ticks_per_meter(ticks_per_meter: u32) -> Self {
        Self {
            ticks_per_meter,
            ..Self::default()
        }
    }

    /// 检查配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.left_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "left_capacity",
            });
        }
        if self.right_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "right_capacity",
            });
        }
        if let OutputMode::Queue { capacity: 0 } = self.output {
            return Err(ConfigError::ZeroCapacity {
                name: "output.capacity",
            });
        }
        if self.ticks_per_meter == 0 {
            return Err(ConfigError::InvalidTicksPerMeter(self.ticks_per_meter));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if !(self.max_skew_periods.is_finite() && self.max_skew_periods > 0.0) {
            return Err(ConfigError::InvalidSkewPeriods(self.max_skew_periods));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 生效的最大轮间偏差（周期数，关闭陈旧检查时为 `None`）
    pub fn max_skew_periods(&self) -> Option<f64> {
        self.reject_stale_wheel.then_some(self.max_skew_periods)
    }

    /// 从 TOML 字符串解析（缺省字段取默认值）并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
