//! 基础数据类型
//!
//! 编码器采样、里程计输出和调用方提供的时间戳。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 编码器计数器最大值（24 位自由计数器）
///
/// 计数值在 `[0, MAX_TICK]` 内按 `MAX_TICK + 1` 取模回绕。
pub const MAX_TICK: i64 = (1 << 24) - 1;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// 调用方提供的时间戳（单调时钟域）
///
/// 引擎内部从不采样系统时间，同一引擎实例的所有采样必须来自同一个时钟域。
/// 比较顺序为先秒后纳秒。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// 秒
    pub secs: u32,
    /// 纳秒（`< 1_000_000_000`）
    pub nsecs: u32,
}

impl Timestamp {
    /// 创建时间戳
    ///
    /// 超出一秒的纳秒部分会进位到秒。
    pub fn new(secs: u32, nsecs: u32) -> Self {
        Self {
            secs: secs.saturating_add(nsecs / NANOS_PER_SEC),
            nsecs: nsecs % NANOS_PER_SEC,
        }
    }

    /// 从 `Duration` 转换（超出 u32 秒范围时饱和）
    pub fn from_duration(duration: Duration) -> Self {
        let secs = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        Self {
            secs,
            nsecs: duration.subsec_nanos(),
        }
    }

    /// 转换为 `Duration`
    pub fn as_duration(&self) -> Duration {
        Duration::new(u64::from(self.secs), self.nsecs)
    }

    /// 转换为浮点秒
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.secs) + f64::from(self.nsecs) * 1e-9
    }

    /// 计算距 `earlier` 的有符号时间差（秒）
    ///
    /// 保留纳秒精度，不截断为整秒。`earlier` 晚于 `self` 时返回负值。
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        let secs = i64::from(self.secs) - i64::from(earlier.secs);
        let nanos = i64::from(self.nsecs) - i64::from(earlier.nsecs);
        secs as f64 + nanos as f64 * 1e-9
    }

    /// 两个时间戳之间的绝对间隔
    pub fn abs_diff(&self, other: Timestamp) -> Duration {
        let (a, b) = if *self >= other { (*self, other) } else { (other, *self) };
        a.as_duration() - b.as_duration()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nsecs)
    }
}

/// 轮子侧别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelSide {
    /// 左驱动轮
    Left,
    /// 右驱动轮
    Right,
}

impl WheelSide {
    /// 两侧（固定顺序：先左后右）
    pub const BOTH: [WheelSide; 2] = [WheelSide::Left, WheelSide::Right];

    /// 数组下标
    pub fn index(self) -> usize {
        match self {
            WheelSide::Left => 0,
            WheelSide::Right => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WheelSide::Left => "left",
            WheelSide::Right => "right",
        }
    }
}

impl fmt::Display for WheelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 编码器采样
///
/// # 输入约定
///
/// `tick` 必须位于 `[0, MAX_TICK]`。引擎在 `try_submit` 入口处拒绝越界值，
/// 但追踪器本身假设输入已满足约定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSample {
    /// 自由计数值
    pub tick: i64,
    /// 采样时间
    pub timestamp: Timestamp,
}

impl EncoderSample {
    pub fn new(tick: i64, timestamp: Timestamp) -> Self {
        Self { tick, timestamp }
    }

    /// 计数值是否在 `[0, MAX_TICK]` 内
    pub fn is_valid_tick(&self) -> bool {
        (0..=MAX_TICK).contains(&self.tick)
    }
}

/// 里程计输出
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometrySample {
    /// 线速度（m/s，有符号，后退为负）
    pub speed: f32,
    /// 两轮中较新的一次更新时间
    pub timestamp: Timestamp,
}
