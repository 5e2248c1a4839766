//! 一次性定时器外观类型
//! One-shot timer facade
//!
//! 围绕一条定时器记录的薄句柄，提供 stop/reset/when 以及（对通道支撑
//! 的定时器）接收触发时刻的能力。丢弃句柄不会取消定时器。
//!
//! A thin handle around one timer record, exposing stop/reset/when and,
//! for channel-backed timers, receiving the fire instant. Dropping the
//! handle does not cancel the timer.

use crate::wheel::{TimerRecord, WheelShared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A one-shot timer scheduled on a [`Wheel`](crate::Wheel).
/// 调度在 [`Wheel`](crate::Wheel) 上的一次性定时器。
pub struct Timer {
    pub(crate) record: Arc<TimerRecord>,
    pub(crate) shared: Arc<WheelShared>,
    pub(crate) rx: Option<mpsc::Receiver<Instant>>,
}

impl Timer {
    /// Cancels the timer. Idempotent; losing the race against an in-flight
    /// fire makes this a no-op, not an error.
    ///
    /// 取消定时器。幂等；与正在进行的触发竞争失败时成为空操作，而非
    /// 错误。
    pub fn stop(&self) {
        self.shared.cancel(&self.record);
    }

    /// Re-arms the timer to fire once after `delay` from now.
    /// 重置定时器，使其从现在起 `delay` 后触发一次。
    pub fn reset(&self, delay: Duration) {
        self.shared.reset(&self.record, delay, Duration::ZERO);
    }

    /// The deadline this timer is armed for, on the wheel's timeline.
    /// 定时器当前瞄准的截止时刻（时间轮时间轴上）。
    pub fn when(&self) -> Instant {
        self.shared.when(&self.record)
    }

    /// Waits for the fire notification. Returns `None` immediately for
    /// timers constructed without a channel (`after_func`).
    ///
    /// 等待触发通知。对无通道构造的定时器（`after_func`）立即返回
    /// `None`。
    pub async fn recv(&mut self) -> Option<Instant> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}
