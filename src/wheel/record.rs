//! 定时器记录实现
//! Timer record implementation

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// The callback run when a timer fires, with the dispatch-time instant.
/// 定时器触发时执行的回调，参数为派发时刻。
pub(crate) type TimerCallback = Box<dyn Fn(Instant) + Send + Sync + 'static>;

/// Locks a mutex, recovering the guard from a poisoned lock. The guarded
/// wheel state stays consistent across a panicking callback because
/// callbacks never run under a lock.
///
/// 对互斥锁加锁，遇到中毒锁时恢复其守卫。回调从不持锁执行，因此
/// 被守护的轮状态在回调恐慌后依然一致。
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A record's position inside the bucket levels: which bucket holds it and
/// at which index. Mutated only under the engine lock.
///
/// 记录在桶层级中的位置：位于哪个桶、桶内哪个下标。只在引擎锁下修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) level: usize,
    pub(crate) slot: usize,
    pub(crate) index: usize,
}

/// Expiry state guarded by the record-local lock.
/// 由记录本地锁守护的到期状态。
struct Schedule {
    /// Absolute fire tick in jiffies.
    /// 以 jiffies 计的绝对触发滴答。
    expires: u64,
    /// Re-arm period in ticks; 0 means one-shot.
    /// 以滴答计的重装周期；0 表示一次性。
    period: u64,
}

/// One scheduled unit of work.
///
/// `expires`/`period` live behind a record-local lock so `when()` can read
/// them concurrently with a fire/re-arm; placement is owned by the engine
/// lock. A live record occupies exactly one bucket.
///
/// 一个已调度的工作单元。
///
/// `expires`/`period` 位于记录本地锁之后，使 `when()` 可以与触发/重装
/// 并发读取；位置信息归引擎锁所有。存活的记录恰好占据一个桶。
pub(crate) struct TimerRecord {
    schedule: Mutex<Schedule>,
    placement: Mutex<Option<Placement>>,
    callback: TimerCallback,
}

impl TimerRecord {
    pub(crate) fn new(expires: u64, period: u64, callback: TimerCallback) -> Arc<Self> {
        Arc::new(Self {
            schedule: Mutex::new(Schedule { expires, period }),
            placement: Mutex::new(None),
            callback,
        })
    }

    /// Runs the callback with the dispatch-time instant.
    /// 以派发时刻为参数执行回调。
    pub(crate) fn fire(&self, now: Instant) {
        (self.callback)(now);
    }

    pub(crate) fn expires(&self) -> u64 {
        lock(&self.schedule).expires
    }

    pub(crate) fn period(&self) -> u64 {
        lock(&self.schedule).period
    }

    /// Rewrites expiry and period together (reset path).
    /// 同时改写到期与周期（reset 路径）。
    pub(crate) fn set_schedule(&self, expires: u64, period: u64) {
        let mut schedule = lock(&self.schedule);
        schedule.expires = expires;
        schedule.period = period;
    }

    /// Rewrites only the expiry (periodic re-arm path).
    /// 只改写到期（周期性重装路径）。
    pub(crate) fn set_expires(&self, expires: u64) {
        lock(&self.schedule).expires = expires;
    }

    pub(crate) fn placement(&self) -> Option<Placement> {
        *lock(&self.placement)
    }

    pub(crate) fn set_placement(&self, placement: Option<Placement>) {
        *lock(&self.placement) = placement;
    }

    pub(crate) fn take_placement(&self) -> Option<Placement> {
        lock(&self.placement).take()
    }
}

impl fmt::Debug for TimerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schedule = lock(&self.schedule);
        f.debug_struct("TimerRecord")
            .field("expires", &schedule.expires)
            .field("period", &schedule.period)
            .field("placement", &*lock(&self.placement))
            .finish()
    }
}
