//! 直线行驶场景集成测试
//!
//! 使用真实工作线程：每一步提交采样后等待一小段时间，再读取输出寄存器。
//! 标定值 300 tick/m。

use odom_engine::{
    EncoderSample, EngineBuilder, MAX_TICK, OdometryEngine, OdometrySample, Timestamp, WheelSide,
};
use std::thread;
use std::time::Duration;

const TICKS_PER_METER: u32 = 300;

/// 等待工作线程处理完本步提交的采样
fn settle() {
    thread::sleep(Duration::from_millis(60));
}

fn is_same_float(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

fn engine() -> OdometryEngine {
    EngineBuilder::new().ticks_per_meter(TICKS_PER_METER).spawn().unwrap()
}

fn engine_without_skew_check() -> OdometryEngine {
    EngineBuilder::new()
        .ticks_per_meter(TICKS_PER_METER)
        .max_skew_periods(None)
        .spawn()
        .unwrap()
}

fn submit_both(engine: &OdometryEngine, tick: i64, timestamp: Timestamp) {
    let sample = EncoderSample::new(tick, timestamp);
    assert!(engine.submit(sample, WheelSide::Left));
    assert!(engine.submit(sample, WheelSide::Right));
}

fn expect_speed(engine: &OdometryEngine, expected: f32) -> OdometrySample {
    let odom = engine.try_consume().expect("expected an odometry estimate");
    assert!(
        is_same_float(odom.speed, expected),
        "speed {} != expected {}",
        odom.speed,
        expected
    );
    odom
}

#[test]
fn test_single_pair_has_no_speed() {
    let engine = engine();
    submit_both(&engine, 0, Timestamp::new(0, 0));
    settle();
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_constant_speed_across_overflow() {
    let engine = engine();
    for i in 0..20i64 {
        let tick = (MAX_TICK - 10 + i) % (MAX_TICK + 1);
        submit_both(&engine, tick, Timestamp::new(i as u32, 0));
        settle();
        if i == 0 {
            assert!(engine.try_consume().is_none());
            continue;
        }
        let odom = expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
        assert_eq!(odom.timestamp, Timestamp::new(i as u32, 0));
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_speeding_up() {
    let engine = engine();
    let mut tick = 0;
    for i in 0..10i64 {
        tick += i;
        submit_both(&engine, tick, Timestamp::new(i as u32, 0));
        settle();
        if i == 0 {
            assert!(engine.try_consume().is_none());
            continue;
        }
        expect_speed(&engine, i as f32 / TICKS_PER_METER as f32);
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_reverse_across_underflow() {
    let engine = engine();
    for i in 0..20i64 {
        let tick = (10 - i + MAX_TICK) % (MAX_TICK + 1);
        submit_both(&engine, tick, Timestamp::new(i as u32, 0));
        settle();
        if i == 0 {
            assert!(engine.try_consume().is_none());
            continue;
        }
        expect_speed(&engine, -1.0 / TICKS_PER_METER as f32);
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_delayed_right_wheel_catches_up() {
    let engine = engine_without_skew_check();

    // 只有左轮数据：右轮没有速度，不能组合
    for i in 0..10i64 {
        let sample = EncoderSample::new(i, Timestamp::new(i as u32, 0));
        assert!(engine.submit(sample, WheelSide::Left));
        settle();
        assert!(engine.try_consume().is_none());
    }

    for i in 0..10i64 {
        let sample = EncoderSample::new(i, Timestamp::new(i as u32, 0));
        assert!(engine.submit(sample, WheelSide::Right));
        settle();
        if i == 0 {
            assert!(engine.try_consume().is_none());
            continue;
        }
        let odom = expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
        // 时间戳取两侧较新者
        assert_eq!(odom.timestamp, Timestamp::new(9, 0));
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_delayed_right_wheel_suppressed_until_in_step() {
    let engine = engine();

    for i in 0..10i64 {
        let sample = EncoderSample::new(i, Timestamp::new(i as u32, 0));
        assert!(engine.submit(sample, WheelSide::Left));
        settle();
    }
    assert!(engine.try_consume().is_none());

    for i in 0..10i64 {
        let sample = EncoderSample::new(i, Timestamp::new(i as u32, 0));
        assert!(engine.submit(sample, WheelSide::Right));
        settle();
        if i < 9 {
            // 右轮落后左轮超过允许偏差
            assert!(engine.try_consume().is_none());
        } else {
            expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
        }
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_phase_offset_wheels_publish() {
    // 两侧同为 1 秒周期，右轮晚半个周期采样
    let engine = engine();
    for i in 0..10u32 {
        let left = EncoderSample::new(i as i64, Timestamp::new(i, 0));
        assert!(engine.submit(left, WheelSide::Left));
        settle();
        if i < 2 {
            assert!(engine.try_consume().is_none());
        } else {
            let odom = expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
            assert_eq!(odom.timestamp, Timestamp::new(i, 0));
        }

        let right = EncoderSample::new(i as i64, Timestamp::new(i, 500_000_000));
        assert!(engine.submit(right, WheelSide::Right));
        settle();
        if i < 1 {
            assert!(engine.try_consume().is_none());
        } else {
            let odom = expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
            assert_eq!(odom.timestamp, Timestamp::new(i, 500_000_000));
        }
    }
    assert!(engine.try_consume().is_none());
    assert_eq!(engine.metrics().estimates_published, 17);
}

#[test]
fn test_dropped_right_updates() {
    let engine = engine();
    for i in 0..10i64 {
        let ts = Timestamp::new(i as u32, 0);
        if i == 0 {
            submit_both(&engine, i, ts);
            settle();
            assert!(engine.try_consume().is_none());
        } else if i == 5 || i == 6 {
            assert!(engine.submit(EncoderSample::new(i, ts), WheelSide::Left));
            settle();
            assert!(engine.try_consume().is_none());
        } else {
            submit_both(&engine, i, ts);
            settle();
            expect_speed(&engine, 1.0 / TICKS_PER_METER as f32);
        }
    }
    assert!(engine.try_consume().is_none());
}

/// 加速 + 丢帧，采样周期 `period_of(i)`，期望速度 `i / tpm / period`
fn run_accelerating_with_drops(timestamp_of: impl Fn(u32) -> Timestamp, period: f32) {
    let engine = engine();
    let mut tick = 0;
    for i in 0..10u32 {
        tick += i as i64;
        let ts = timestamp_of(i);
        if i == 0 {
            submit_both(&engine, tick, ts);
            settle();
            assert!(engine.try_consume().is_none());
        } else if i == 5 || i == 6 {
            assert!(engine.submit(EncoderSample::new(tick, ts), WheelSide::Left));
            settle();
            assert!(engine.try_consume().is_none());
        } else if i == 7 {
            // 右轮跨越了三个周期，两侧速度不同，只检查有输出
            submit_both(&engine, tick, ts);
            settle();
            assert!(engine.try_consume().is_some());
        } else {
            submit_both(&engine, tick, ts);
            settle();
            expect_speed(&engine, i as f32 / TICKS_PER_METER as f32 / period);
        }
    }
    assert!(engine.try_consume().is_none());
}

#[test]
fn test_accelerating_with_drops_two_second_period() {
    run_accelerating_with_drops(|i| Timestamp::new(2 * i, 0), 2.0);
}

#[test]
fn test_accelerating_with_drops_fractional_period() {
    run_accelerating_with_drops(
        |i| Timestamp::new(2 * i + i / 2, if i % 2 == 1 { 500_000_000 } else { 0 }),
        2.5,
    );
}

#[test]
fn test_unread_estimate_is_overwritten() {
    let engine = engine();
    let mut tick = 0;
    for i in 0..10i64 {
        tick += i;
        submit_both(&engine, tick, Timestamp::new(i as u32, 0));
        settle();
        if i == 0 {
            assert!(engine.try_consume().is_none());
            continue;
        }
        if i % 2 == 0 {
            // 奇数步的估计未被读取，已被本步覆盖
            expect_speed(&engine, i as f32 / TICKS_PER_METER as f32);
        }
    }

    // 最后一步（i == 9）尚未读取
    expect_speed(&engine, 9.0 / TICKS_PER_METER as f32);
    assert!(engine.try_consume().is_none());

    let metrics = engine.metrics();
    assert_eq!(metrics.estimates_published, 9);
    assert_eq!(metrics.estimates_overwritten, 4);
    assert_eq!(metrics.estimates_consumed, 5);
}
