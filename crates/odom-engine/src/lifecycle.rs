//! 引擎生命周期状态
//!
//! `Idle -> Running -> Stopped`，只能单向推进：`start()` 最多成功一次，停止后不能重启。

use std::sync::atomic::{AtomicU8, Ordering};

/// 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EngineState {
    /// 已构造，工作线程尚未启动（此时提交的采样会排队）
    #[default]
    Idle = 0,
    /// 工作线程运行中
    Running = 1,
    /// 已停止，工作线程已退出
    Stopped = 2,
}

impl EngineState {
    /// 从 u8 转换
    ///
    /// 无效值视为 `Stopped`。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// 引擎状态（原子版本）
#[derive(Debug)]
pub struct AtomicEngineState {
    inner: AtomicU8,
}

impl AtomicEngineState {
    pub fn new(state: EngineState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> EngineState {
        EngineState::from_u8(self.inner.load(ordering))
    }

    /// 比较并交换
    ///
    /// 失败时返回实际的当前状态。
    pub fn compare_exchange(
        &self,
        current: EngineState,
        new: EngineState,
        success: Ordering,
        failure: Ordering,
    ) -> Result<EngineState, EngineState> {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .map(EngineState::from_u8)
            .map_err(EngineState::from_u8)
    }

    /// 设置新状态并返回旧状态
    pub fn swap(&self, state: EngineState, ordering: Ordering) -> EngineState {
        EngineState::from_u8(self.inner.swap(state.as_u8(), ordering))
    }
}
