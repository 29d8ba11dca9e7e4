//! # Odometry CLI
//!
//! 轮式里程计引擎的命令行工具：按场景模拟直线行驶，查看和检查配置。
//!
//! ```bash
//! # 计数器上溢回绕场景，300 tick/m
//! odom-cli simulate --scenario wrap --ticks-per-meter 300
//!
//! # 打印默认配置
//! odom-cli config show
//!
//! # 调试日志
//! RUST_LOG=odom_engine=debug odom-cli simulate --scenario dropped
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod scenario;

use commands::{ConfigCommand, SimulateCommand};

/// Odometry CLI - 轮式里程计命令行工具
#[derive(Parser, Debug)]
#[command(name = "odom-cli")]
#[command(about = "Command-line harness for the wheel odometry engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行直线行驶模拟场景
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("odom_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Simulate { args } => args.execute(),
    }
}
