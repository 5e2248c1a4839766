//! 时间轮统计信息
//! Timing wheel statistics

use std::time::Duration;

/// A point-in-time snapshot of wheel occupancy.
/// 时间轮占用情况的瞬时快照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelStats {
    /// The wheel's virtual tick counter.
    /// 时间轮的虚拟滴答计数器。
    pub jiffies: u64,
    /// Live records across all levels.
    /// 所有层级中存活记录的总数。
    pub pending_timers: usize,
    /// Live records per level (fine level first).
    /// 逐层存活记录数（细粒度层在前）。
    pub level_occupancy: [usize; 5],
    /// Duration of one tick.
    /// 单个滴答的时长。
    pub tick: Duration,
}
