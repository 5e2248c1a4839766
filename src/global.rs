//! 进程级默认时间轮
//! Process-wide default wheel
//!
//! 为零配置使用提供一个惰性创建的默认时间轮（100ms 滴答），由本模块
//! 的顶层便捷函数持有。生命周期是手动的：默认轮一旦创建便不再停止，
//! 其滴答循环绑定在首次使用时处于活动状态的 tokio 运行时上。
//!
//! A lazily-created default wheel (100ms tick) for zero-configuration use,
//! owned by this module's top-level convenience functions. The lifecycle is
//! manual: once created the default wheel is never stopped, and its tick
//! loop is bound to the tokio runtime active at first use.

use crate::ticker::Ticker;
use crate::timer::Timer;
use crate::wheel::Wheel;
use std::sync::OnceLock;
use std::time::Duration;

/// Tick interval of the default wheel.
/// 默认时间轮的滴答间隔。
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

static DEFAULT_WHEEL: OnceLock<Wheel> = OnceLock::new();

fn default_wheel() -> &'static Wheel {
    DEFAULT_WHEEL.get_or_init(|| Wheel::new(DEFAULT_TICK))
}

/// Schedules a channel-backed one-shot timer on the default wheel.
/// 在默认时间轮上调度一个由通道支撑的一次性定时器。
pub fn new_timer(delay: Duration) -> Timer {
    default_wheel().new_timer(delay)
}

/// Schedules a channel-backed ticker firing every `period`.
/// 在默认时间轮上调度每 `period` 触发一次的周期定时器。
pub fn new_ticker(period: Duration) -> Ticker {
    default_wheel().new_ticker(period, period)
}

/// Runs `f` once after `delay` on the default wheel.
/// 在默认时间轮上 `delay` 后执行一次 `f`。
pub fn after_func<F>(delay: Duration, f: F) -> Timer
where
    F: Fn() + Send + Sync + 'static,
{
    default_wheel().after_func(delay, f)
}

/// Runs `f` every `period` on the default wheel until stopped.
/// 在默认时间轮上每 `period` 执行一次 `f`，直至停止。
pub fn tick_func<F>(period: Duration, f: F) -> Ticker
where
    F: Fn() + Send + Sync + 'static,
{
    default_wheel().tick_func(period, period, f)
}

/// Waits at least `delay` of default-wheel time.
/// 等待至少 `delay` 的默认轮时间。
pub async fn sleep(delay: Duration) {
    default_wheel().sleep(delay).await;
}
