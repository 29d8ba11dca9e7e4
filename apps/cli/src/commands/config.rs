//! 配置管理命令
//!
//! 查看和检查引擎配置文件（TOML）

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show {
        /// 配置文件（缺省时打印默认配置）
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 检查配置文件
    Check {
        /// 配置文件
        file: PathBuf,
    },

    /// 把默认配置写入文件
    Init {
        /// 目标文件
        file: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { file } => Self::show_(file),
            ConfigCommand::Check { file } => Self::check_(file),
            ConfigCommand::Init { file, force } => Self::init_(file, force),
        }
    }

    fn show_(file: Option<PathBuf>) -> Result<()> {
        let config = super::load_engine_config(file.as_deref())?;
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn check_(file: PathBuf) -> Result<()> {
        let config = super::load_engine_config(Some(file.as_path()))?;
        println!("✅ {} is valid", file.display());
        println!("  ticks_per_meter: {}", config.ticks_per_meter);
        println!(
            "  capacity: left={}, right={}",
            config.left_capacity, config.right_capacity
        );
        match config.max_skew_periods() {
            Some(periods) => println!("  max wheel skew: {} sampling periods", periods),
            None => println!("  max wheel skew: disabled"),
        }
        Ok(())
    }

    fn init_(file: PathBuf, force: bool) -> Result<()> {
        if file.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", file.display());
        }
        let content = odom_engine::EngineConfig::default().to_toml_string()?;
        fs::write(&file, content)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        println!("✅ Wrote default config to {}", file.display());
        Ok(())
    }
}
