//! 周期定时器外观类型
//! Periodic ticker facade
//!
//! 周期定时器在每次触发后以相同周期自动重装，直到被停止。与一次性
//! 定时器一样，通知通道只有一个槽位且满则丢弃：慢消费者丢失滴答，
//! 但永远不会拖住时间轮。
//!
//! A ticker re-arms itself with the same period after each firing until
//! stopped. As with one-shot timers, the notification channel has a single
//! slot and drops on overflow: a slow consumer loses ticks but can never
//! stall the wheel.

use crate::wheel::{TimerRecord, WheelShared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A periodic timer scheduled on a [`Wheel`](crate::Wheel).
/// 调度在 [`Wheel`](crate::Wheel) 上的周期定时器。
pub struct Ticker {
    pub(crate) record: Arc<TimerRecord>,
    pub(crate) shared: Arc<WheelShared>,
    pub(crate) rx: Option<mpsc::Receiver<Instant>>,
}

impl Ticker {
    /// Stops the ticker. Idempotent; a stop racing an in-flight fire is a
    /// no-op for that firing and the ticker re-arms once more.
    ///
    /// 停止周期定时器。幂等；与正在进行的触发竞争时对该次触发无效，
    /// 定时器会再重装一次。
    pub fn stop(&self) {
        self.shared.cancel(&self.record);
    }

    /// Re-arms to first fire after `period` and every `period` thereafter.
    /// 重置：`period` 后首次触发，此后每 `period` 触发一次。
    pub fn reset(&self, period: Duration) {
        self.shared.reset(&self.record, period, period);
    }

    /// Re-arms with an explicit initial delay and period.
    /// 以显式的初始延迟和周期重置。
    pub fn reset_with_period(&self, delay: Duration, period: Duration) {
        self.shared.reset(&self.record, delay, period);
    }

    /// The deadline of the next firing, on the wheel's timeline.
    /// 下一次触发的截止时刻（时间轮时间轴上）。
    pub fn when(&self) -> Instant {
        self.shared.when(&self.record)
    }

    /// Waits for the next fire notification. Returns `None` immediately
    /// for tickers constructed without a channel (`tick_func`).
    ///
    /// 等待下一次触发通知。对无通道构造的周期定时器（`tick_func`）
    /// 立即返回 `None`。
    pub async fn recv(&mut self) -> Option<Instant> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}
