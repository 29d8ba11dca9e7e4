//! 场景模拟命令
//!
//! 把一个直线行驶场景按真实时间逐步喂给运行中的引擎，并打印每一步读到的估计。

use crate::scenario::Scenario;
use anyhow::{Context, Result};
use clap::Args;
use odom_engine::{EngineBuilder, MetricsSnapshot, OdometryEngine, WheelSide};
use spin_sleep::SpinSleeper;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// 模拟命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 场景
    #[arg(short, long, value_enum, default_value_t = Scenario::Constant)]
    pub scenario: Scenario,

    /// 标定值（覆盖配置文件）
    #[arg(short, long)]
    pub ticks_per_meter: Option<u32>,

    /// 步数
    #[arg(short = 'n', long, default_value_t = 20)]
    pub steps: u32,

    /// 每步之间的真实等待时间（毫秒）
    #[arg(long, default_value_t = 100)]
    pub step_ms: u64,

    /// 关闭轮间偏差检查
    #[arg(long)]
    pub no_skew_check: bool,

    /// 引擎配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SimulateCommand {
    pub fn execute(&self) -> Result<()> {
        let mut config = super::load_engine_config(self.config.as_deref())?;
        if let Some(ticks_per_meter) = self.ticks_per_meter {
            config.ticks_per_meter = ticks_per_meter;
        }
        if self.no_skew_check {
            config.reject_stale_wheel = false;
        }

        let engine = EngineBuilder::new()
            .config(config)
            .spawn()
            .context("Failed to start odometry engine")?;

        info!(
            scenario = ?self.scenario,
            steps = self.steps,
            ticks_per_meter = engine.config().ticks_per_meter,
            "running simulation"
        );

        let sleeper = SpinSleeper::default();
        let step_interval = Duration::from_millis(self.step_ms);

        for (i, step) in self.scenario.steps(self.steps).into_iter().enumerate() {
            for (side, sample) in [(WheelSide::Left, step.left), (WheelSide::Right, step.right)] {
                let Some(sample) = sample else {
                    debug!(step = i, %side, "skipping sample");
                    continue;
                };
                if let Err(e) = engine.try_submit(sample, side) {
                    println!("step {:>3}: {}", i, e);
                }
            }

            sleeper.sleep(step_interval);
            print_step(i, &engine);
        }

        engine.stop();
        print_metrics(&engine.metrics());
        Ok(())
    }
}

fn print_step(i: usize, engine: &OdometryEngine) {
    match engine.try_consume() {
        Some(odom) => println!(
            "step {:>3}: speed = {:>+12.6} m/s  ts = {}",
            i, odom.speed, odom.timestamp
        ),
        None => println!("step {:>3}: (no estimate)", i),
    }
}

fn print_metrics(metrics: &MetricsSnapshot) {
    println!();
    println!("submitted:             {}", metrics.submitted);
    println!("dropped (full):        {}", metrics.dropped_full);
    println!("rejected (range):      {}", metrics.rejected_out_of_range);
    println!("rejected (elapsed):    {}", metrics.rejected_elapsed);
    println!("estimates published:   {}", metrics.estimates_published);
    println!("estimates overwritten: {}", metrics.estimates_overwritten);
    println!("estimates consumed:    {}", metrics.estimates_consumed);
}
