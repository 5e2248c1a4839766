//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the timing wheel library.
///
/// Scheduling itself never fails: over-range delays are clamped and
/// deferred, race-lost stop/reset calls are no-ops, and dispatch-pool
/// saturation falls back to spawning. The only fallible surface is
/// dispatch-pool construction.
///
/// 时间轮库的主要错误类型。
///
/// 调度本身永不失败：超出范围的延迟会被钳制并延后处理，输掉竞争的
/// stop/reset 调用是空操作，派发池饱和时回退到独立任务。唯一可能
/// 失败的接口是派发池的构造。
#[derive(Debug, Error)]
pub enum Error {
    /// The dispatch pool was configured without any workers.
    /// 派发池配置的工作者数量为零。
    #[error("dispatch pool requires at least one worker")]
    NoWorkers,

    /// The dispatch pool was configured with a zero-capacity queue.
    /// 派发池配置的队列容量为零。
    #[error("dispatch pool queue capacity must be non-zero")]
    ZeroQueueCapacity,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
