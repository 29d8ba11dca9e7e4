//! 差速轮式里程计引擎
//!
//! 接收左右两个轮式编码器的计数采样，实时估计底盘的线速度。
//!
//! - 采集层（任意线程）：`submit` 非阻塞地把采样放入每侧的有界通道，满则丢弃
//! - 处理层（三个常驻线程）：每侧一个输入线程更新追踪器，一个估计线程组合两侧速度
//! - 消费层（任意线程）：`try_consume` 非阻塞地取出最新估计
//!
//! 编码器计数值是 24 位无符号计数器，回绕（溢出/下溢）会被自动修正，
//! 前提是相邻两次采样之间的真实位移小于半个计数范围。
//!
//! # Example
//!
//! ```
//! use odom_engine::{EncoderSample, EngineBuilder, Timestamp, WheelSide};
//! use std::time::Duration;
//!
//! let engine = EngineBuilder::new().ticks_per_meter(300).spawn().unwrap();
//!
//! for i in 0..2 {
//!     let sample = EncoderSample::new(i * 300, Timestamp::new(i as u32, 0));
//!     engine.submit(sample, WheelSide::Left);
//!     engine.submit(sample, WheelSide::Right);
//! }
//!
//! std::thread::sleep(Duration::from_millis(100));
//! let odom = engine.try_consume().unwrap();
//! assert!((odom.speed - 1.0).abs() < 1e-6);
//! ```

pub mod builder;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod lifecycle;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod slot;
pub mod tracker;
pub mod types;

pub use builder::EngineBuilder;
pub use channel::BoundedChannel;
pub use config::{EngineConfig, OutputMode};
pub use engine::OdometryEngine;
pub use error::{ConfigError, EngineError, SubmitError};
pub use estimator::{DifferentialEstimator, Estimator};
pub use lifecycle::EngineState;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use slot::LatestSlot;
pub use tracker::{TrackerUpdate, WheelSnapshot, WheelTracker, tick_delta};
pub use types::{EncoderSample, MAX_TICK, OdometrySample, Timestamp, WheelSide};
