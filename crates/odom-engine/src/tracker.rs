//! 单轮计数追踪器
//!
//! 把连续的 (tick, timestamp) 采样转换为瞬时线速度，并处理计数器回绕。
//!
//! # 前置条件：半量程假设
//!
//! 回绕修正假设两次相邻采样之间真实的计数位移不超过计数器量程的一半
//! （`MAX_TICK / 2`，约 838 万个 tick）。也就是说采样频率必须足够高，
//! 使得 `最大轮速 × ticks_per_meter × 采样周期 < MAX_TICK / 2`。
//! 违反该条件时，正向大位移会被误判为反向位移，反之亦然。

use crate::types::{EncoderSample, MAX_TICK, Timestamp};
use std::time::Duration;
use tracing::{debug, trace};

/// 计算两次计数之间的有符号位移（已做回绕修正）
///
/// 最多修正一次回绕。
///
/// ```
/// use odom_engine::tracker::tick_delta;
/// use odom_engine::MAX_TICK;
///
/// assert_eq!(tick_delta(MAX_TICK, 0), 1);
/// assert_eq!(tick_delta(0, MAX_TICK), -1);
/// assert_eq!(tick_delta(10, 15), 5);
/// ```
pub fn tick_delta(previous: i64, current: i64) -> i64 {
    let raw = current - previous;
    if raw > MAX_TICK / 2 {
        raw - (MAX_TICK + 1)
    } else if raw < -MAX_TICK / 2 {
        raw + (MAX_TICK + 1)
    } else {
        raw
    }
}

/// 一次 `update` 的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    /// 首个采样，只记录基准，不产生速度
    Primed,
    /// 计算出新的速度（m/s）
    Updated(f32),
    /// 时间差 `<= 0`（乱序或重复采样），状态保持不变
    Rejected,
}

/// 单轮状态快照（诊断用）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSnapshot {
    /// 最近一次被接受的计数值（未收到采样时为 `None`）
    pub tick: Option<i64>,
    /// 最近一次被接受的采样时间
    pub timestamp: Option<Timestamp>,
    /// 最近一次计算出的速度
    pub speed: Option<f32>,
    /// 最近两次被接受的采样之间的间隔（采样周期）
    pub period: Option<Duration>,
    /// 累计行驶距离（米，有符号）
    pub distance_m: f64,
    /// 速度更新次数
    pub updates: u64,
}

/// 单轮追踪器
///
/// `has_sample` 与 `last_speed` 是两个独立的状态：0 是合法速度，
/// 不能用速度为 0 来表示"尚无数据"。
#[derive(Debug, Clone, Default)]
pub struct WheelTracker {
    last_tick: i64,
    last_timestamp: Timestamp,
    has_sample: bool,
    last_speed: Option<f32>,
    last_period: Option<Duration>,
    /// 每次速度更新 +1，用于判断是否有新数据
    updates: u64,
    /// 累计有符号位移（tick）
    travelled_ticks: i64,
}

impl WheelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个新采样
    ///
    /// `ticks_per_meter` 必须为正（由 `EngineConfig::validate` 保证）。
    pub fn update(&mut self, sample: EncoderSample, ticks_per_meter: f64) -> TrackerUpdate {
        if !self.has_sample {
            self.last_tick = sample.tick;
            self.last_timestamp = sample.timestamp;
            self.has_sample = true;
            trace!(tick = sample.tick, ts = %sample.timestamp, "tracker primed");
            return TrackerUpdate::Primed;
        }

        let elapsed = sample.timestamp.seconds_since(self.last_timestamp);
        if elapsed <= 0.0 {
            debug!(
                last = %self.last_timestamp,
                ts = %sample.timestamp,
                "rejecting encoder sample with non-positive elapsed time"
            );
            return TrackerUpdate::Rejected;
        }

        let delta = tick_delta(self.last_tick, sample.tick);
        let speed = (delta as f64 / (ticks_per_meter * elapsed)) as f32;

        self.last_period = Some(sample.timestamp.abs_diff(self.last_timestamp));
        self.last_tick = sample.tick;
        self.last_timestamp = sample.timestamp;
        self.last_speed = Some(speed);
        self.updates += 1;
        self.travelled_ticks += delta;

        TrackerUpdate::Updated(speed)
    }

    pub fn has_sample(&self) -> bool {
        self.has_sample
    }

    /// 最近一次速度（首个采样之后、第二个有效采样之前为 `None`）
    pub fn speed(&self) -> Option<f32> {
        self.last_speed
    }

    /// 最近一次采样周期（与 `speed` 同时可用）
    pub fn period(&self) -> Option<Duration> {
        self.last_period
    }

    pub fn last_tick(&self) -> Option<i64> {
        self.has_sample.then_some(self.last_tick)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.has_sample.then_some(self.last_timestamp)
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn snapshot(&self, ticks_per_meter: f64) -> WheelSnapshot {
        WheelSnapshot {
            tick: self.last_tick(),
            timestamp: self.last_timestamp(),
            speed: self.last_speed,
            period: self.last_period,
            distance_m: self.travelled_ticks as f64 / ticks_per_meter,
            updates: self.updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TPM: f64 = 300.0;

    fn sample(tick: i64, secs: u32, nsecs: u32) -> EncoderSample {
        EncoderSample::new(tick, Timestamp::new(secs, nsecs))
    }

    fn is_same_float(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_first_sample_only_primes() {
        let mut tracker = WheelTracker::new();
        assert_eq!(tracker.update(sample(5, 0, 0), TPM), TrackerUpdate::Primed);
        assert!(tracker.has_sample());
        assert_eq!(tracker.speed(), None);
        assert_eq!(tracker.updates(), 0);
    }

    #[test]
    fn test_linear_speed() {
        let mut tracker = WheelTracker::new();
        tracker.update(sample(0, 0, 0), TPM);
        for i in 1..10 {
            match tracker.update(sample(i, i as u32, 0), TPM) {
                TrackerUpdate::Updated(speed) => assert!(is_same_float(speed, 1.0 / 300.0)),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(tracker.updates(), 9);
    }

    #[test]
    fn test_zero_speed_is_a_real_speed() {
        let mut tracker = WheelTracker::new();
        tracker.update(sample(100, 0, 0), TPM);
        assert_eq!(tracker.update(sample(100, 1, 0), TPM), TrackerUpdate::Updated(0.0));
        assert_eq!(tracker.speed(), Some(0.0));
    }

    #[test]
    fn test_wraparound_forward() {
        let mut tracker = WheelTracker::new();
        let ticks = [MAX_TICK - 1, MAX_TICK, 0, 1];
        tracker.update(sample(ticks[0], 0, 0), TPM);
        for (i, &tick) in ticks.iter().enumerate().skip(1) {
            let update = tracker.update(sample(tick, i as u32, 0), TPM);
            assert_eq!(update, TrackerUpdate::Updated((1.0 / TPM) as f32));
        }
    }

    #[test]
    fn test_wraparound_backward() {
        let mut tracker = WheelTracker::new();
        let ticks = [1, 0, MAX_TICK, MAX_TICK - 1];
        tracker.update(sample(ticks[0], 0, 0), TPM);
        for (i, &tick) in ticks.iter().enumerate().skip(1) {
            let update = tracker.update(sample(tick, i as u32, 0), TPM);
            assert_eq!(update, TrackerUpdate::Updated((-1.0 / TPM) as f32));
        }
    }

    #[test]
    fn test_fractional_elapsed() {
        // 0.5s 周期，不能被截断为 0 秒
        let mut tracker = WheelTracker::new();
        tracker.update(sample(0, 1, 0), TPM);
        match tracker.update(sample(3, 1, 500_000_000), TPM) {
            TrackerUpdate::Updated(speed) => assert!(is_same_float(speed, 3.0 / 150.0)),
            other => panic!("unexpected {:?}", other),
        }

        // 2.5s 周期，不能被截断为 2 秒
        let update = tracker.update(sample(10, 4, 0), TPM);
        match update {
            TrackerUpdate::Updated(speed) => {
                assert!(is_same_float(speed, 7.0 / 300.0 / 2.5));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_elapsed_rejected_without_state_change() {
        let mut tracker = WheelTracker::new();
        tracker.update(sample(0, 1, 0), TPM);
        tracker.update(sample(3, 2, 0), TPM);
        let before = tracker.snapshot(TPM);

        // 重复时间戳
        assert_eq!(tracker.update(sample(9, 2, 0), TPM), TrackerUpdate::Rejected);
        // 乱序
        assert_eq!(tracker.update(sample(9, 1, 500), TPM), TrackerUpdate::Rejected);

        assert_eq!(tracker.snapshot(TPM), before);

        // 后续正常采样基于未被修改的基准计算
        let update = tracker.update(sample(6, 3, 0), TPM);
        assert_eq!(update, TrackerUpdate::Updated((3.0 / TPM) as f32));
    }

    #[test]
    fn test_snapshot_distance() {
        let mut tracker = WheelTracker::new();
        tracker.update(sample(MAX_TICK - 149, 0, 0), TPM);
        tracker.update(sample(0, 1, 0), TPM); // +150
        tracker.update(sample(150, 2, 0), TPM); // +150
        let snapshot = tracker.snapshot(TPM);
        assert!((snapshot.distance_m - 1.0).abs() < 1e-9);
        assert_eq!(snapshot.tick, Some(150));
        assert_eq!(snapshot.updates, 2);
    }

    #[test]
    fn test_period_follows_accepted_samples() {
        let mut tracker = WheelTracker::new();
        tracker.update(sample(0, 0, 0), TPM);
        assert_eq!(tracker.period(), None);

        tracker.update(sample(3, 2, 500_000_000), TPM);
        assert_eq!(tracker.period(), Some(Duration::from_millis(2500)));

        // 被拒绝的采样不改变周期
        tracker.update(sample(4, 1, 0), TPM);
        assert_eq!(tracker.period(), Some(Duration::from_millis(2500)));

        tracker.update(sample(5, 3, 0), TPM);
        assert_eq!(tracker.snapshot(TPM).period, Some(Duration::from_millis(500)));
    }

    proptest! {
        /// 在半量程内的任意位移，经回绕后都能被准确恢复
        #[test]
        fn prop_tick_delta_recovers_displacement(
            start in 0..=MAX_TICK,
            displacement in -(MAX_TICK / 2)..=(MAX_TICK / 2),
        ) {
            let end = (start + displacement).rem_euclid(MAX_TICK + 1);
            prop_assert_eq!(tick_delta(start, end), displacement);
        }
    }
}
