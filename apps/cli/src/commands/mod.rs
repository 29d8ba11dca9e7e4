//! 命令定义和实现

pub mod config;
pub mod simulate;

pub use config::ConfigCommand;
pub use simulate::SimulateCommand;

use anyhow::{Context, Result};
use odom_engine::EngineConfig;
use std::path::Path;

/// 加载引擎配置（未指定文件时使用默认值）
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}
