#![deny(clippy::expect_used, clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

//! 分层时间轮定时器库的根。
//! The root of the hierarchical timing-wheel timer library.
//!
//! 一个进程内软件时钟：单个后台任务驱动一个 256+4×64 槽的多级时间轮，
//! 以摊还 O(1) 的代价调度海量一次性与周期性回调（连接超时、重试退避、
//! 心跳）。回调经由派发抽象在锁外执行，慢回调不会拖慢时钟。
//!
//! An in-process software clock: a single background task drives a
//! 256+4x64-slot hierarchical wheel, scheduling very large numbers of
//! one-shot and periodic callbacks (connection timeouts, retry backoffs,
//! heartbeats) at amortized O(1) cost. Callbacks run outside the engine
//! lock through a dispatch abstraction, so slow callbacks never slow the
//! clock.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod ticker;
pub mod timer;
pub mod wheel;

pub use config::WheelConfig;
pub use dispatch::{BoundedPool, Task, WorkerPool};
pub use error::{Error, Result};
pub use global::{DEFAULT_TICK, after_func, new_timer, new_ticker, sleep, tick_func};
pub use ticker::Ticker;
pub use timer::Timer;
pub use wheel::{Wheel, WheelStats};
