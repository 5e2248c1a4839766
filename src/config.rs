//! 定义了时间轮的可配置参数。
//! Defines configurable parameters for the timing wheel.

use crate::dispatch::WorkerPool;
use std::fmt;
use std::sync::Arc;

/// Construction-time options for a [`Wheel`](crate::Wheel).
///
/// The one recognized option substitutes a bounded worker pool for the
/// default spawn-per-batch dispatch. Selecting the dispatch target here,
/// once, keeps the hot path free of runtime type inspection.
///
/// [`Wheel`](crate::Wheel) 的构造期选项。
///
/// 目前唯一的选项是用一个有界工作者池替换默认的按批次独立任务派发。
/// 派发目标在构造时一次性选定，热路径上无需运行时类型判断。
#[derive(Clone, Default)]
pub struct WheelConfig {
    /// Optional bounded dispatch pool; `None` means spawn-only dispatch.
    /// 可选的有界派发池；`None` 表示只使用独立任务派发。
    pub(crate) dispatch_pool: Option<Arc<dyn WorkerPool>>,
}

impl WheelConfig {
    /// Creates an empty configuration (spawn-only dispatch).
    /// 创建空配置（只使用独立任务派发）。
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitutes the bounded pool for the spawn-fallback dispatch.
    /// 用有界池替换默认派发；池饱和时仍会回退到独立任务。
    pub fn with_dispatch_pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.dispatch_pool = Some(pool);
        self
    }
}

impl fmt::Debug for WheelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WheelConfig")
            .field("dispatch_pool", &self.dispatch_pool.is_some())
            .finish()
    }
}
