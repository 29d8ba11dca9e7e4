//! 直线行驶场景
//!
//! 每个场景生成一串步骤：每步包含左右两侧各自要提交的采样（可能缺失，模拟丢帧）。

use clap::ValueEnum;
use odom_engine::{EncoderSample, MAX_TICK, Timestamp};

/// 模拟场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// 恒速前进：每秒 +1 tick
    Constant,
    /// 恒速前进，计数器从 MAX_TICK 附近上溢回绕
    Wrap,
    /// 恒速后退，计数器从 0 附近下溢回绕
    Underflow,
    /// 加速：第 i 步前进 i tick
    Accelerate,
    /// 恒速前进，右轮周期性丢帧
    Dropped,
    /// 加速 + 右轮丢帧，采样周期 2.5 秒
    Fractional,
}

/// 一步要提交的采样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub left: Option<EncoderSample>,
    pub right: Option<EncoderSample>,
}

impl Step {
    fn both(sample: EncoderSample) -> Self {
        Self {
            left: Some(sample),
            right: Some(sample),
        }
    }

    fn left_only(sample: EncoderSample) -> Self {
        Self {
            left: Some(sample),
            right: None,
        }
    }
}

impl Scenario {
    /// 生成 `count` 步
    pub fn steps(self, count: u32) -> Vec<Step> {
        let mut tick: i64 = 0;
        (0..count)
            .map(|i| {
                let step = i as i64;
                match self {
                    Scenario::Constant => Step::both(sample(step, Timestamp::new(i, 0))),
                    Scenario::Wrap => {
                        let tick = (MAX_TICK - 10 + step).rem_euclid(MAX_TICK + 1);
                        Step::both(sample(tick, Timestamp::new(i, 0)))
                    },
                    Scenario::Underflow => {
                        let tick = (10 - step + MAX_TICK).rem_euclid(MAX_TICK + 1);
                        Step::both(sample(tick, Timestamp::new(i, 0)))
                    },
                    Scenario::Accelerate => {
                        tick += step;
                        Step::both(sample(tick.rem_euclid(MAX_TICK + 1), Timestamp::new(i, 0)))
                    },
                    Scenario::Dropped => {
                        with_right_drops(i, sample(step, Timestamp::new(i, 0)))
                    },
                    Scenario::Fractional => {
                        tick += step;
                        let nsecs = if i % 2 == 1 { 500_000_000 } else { 0 };
                        let ts = Timestamp::new(2 * i + i / 2, nsecs);
                        with_right_drops(i, sample(tick.rem_euclid(MAX_TICK + 1), ts))
                    },
                }
            })
            .collect()
    }
}

fn sample(tick: i64, timestamp: Timestamp) -> EncoderSample {
    EncoderSample::new(tick, timestamp)
}

/// 每 10 步中第 5、6 步右轮丢帧
fn with_right_drops(i: u32, sample: EncoderSample) -> Step {
    if matches!(i % 10, 5 | 6) {
        Step::left_only(sample)
    } else {
        Step::both(sample)
    }
}
