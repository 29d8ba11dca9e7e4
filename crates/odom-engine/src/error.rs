//! 引擎错误类型定义

use crate::types::WheelSide;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 通道容量为 0（crossbeam 的 0 容量通道是会合通道，无法满足非阻塞推送）
    #[error("Invalid capacity for {name}: must be at least 1")]
    ZeroCapacity { name: &'static str },

    /// 标定值必须为正
    #[error("Invalid ticks_per_meter: {0} (must be positive)")]
    InvalidTicksPerMeter(u32),

    /// 轮询间隔为 0 会退化为忙等待
    #[error("Invalid poll interval: must be at least 1 ms")]
    ZeroPollInterval,

    /// 轮间偏差窗口必须是正的有限值
    #[error("Invalid max_skew_periods: {0} (must be positive and finite)")]
    InvalidSkewPeriods(f64),

    /// 配置文件读取失败
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 提交采样失败的原因
///
/// `OdometryEngine::submit` 只返回 `bool`，需要区分原因时使用 `try_submit`。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// 输入通道已满，新采样被丢弃
    #[error("Encoder channel full ({side}), sample dropped")]
    Full { side: WheelSide },

    /// 计数值超出 `[0, MAX_TICK]`
    #[error("Encoder tick out of range: {tick}")]
    TickOutOfRange { tick: i64 },
}

/// 引擎生命周期错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// `start()` 只能调用一次
    #[error("Engine already started")]
    AlreadyStarted,

    /// 引擎已停止，不能重新启动
    #[error("Engine stopped")]
    Stopped,

    /// 工作线程创建失败
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_display() {
        let err = SubmitError::Full { side: WheelSide::Left };
        assert_eq!(err.to_string(), "Encoder channel full (left), sample dropped");

        let err = SubmitError::TickOutOfRange { tick: -3 };
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(EngineError::AlreadyStarted.to_string(), "Engine already started");

        let err = EngineError::from(ConfigError::ZeroCapacity { name: "left_capacity" });
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration") && msg.contains("left_capacity"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
        match EngineError::from(io) {
            EngineError::Spawn(e) => assert_eq!(e.to_string(), "no threads"),
            _ => panic!("Expected Spawn variant"),
        }
    }
}
