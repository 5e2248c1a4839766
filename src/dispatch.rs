//! 回调派发模块
//! Callback dispatch module
//!
//! 该模块定义了时间轮触发回调的执行方式。到期批次通过一个单方法的
//! `submit` 能力派发：要么交给一个有界的工作者池，要么在池缺失或
//! 饱和时回退为独立的并发任务。提交永远不会阻塞滴答循环。
//!
//! This module defines how fired callbacks are executed. Expired batches are
//! dispatched through a single-method `submit` capability: either onto a
//! bounded worker pool, or, when the pool is absent or saturated, onto an
//! independently spawned task. Submission never blocks the tick loop.

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// A unit of work handed to the dispatcher.
/// 交给派发器的工作单元。
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A bounded worker pool consumed by the wheel.
///
/// `submit` must be non-blocking: it either accepts the task or returns it
/// to the caller on saturation. The pool's internal concurrency control is
/// opaque to the wheel.
///
/// 供时间轮消费的有界工作者池。
///
/// `submit` 必须是非阻塞的：要么接受任务，要么在饱和时把任务原样
/// 归还给调用方。池内部的并发控制对时间轮是不透明的。
pub trait WorkerPool: Send + Sync {
    /// Attempts a non-blocking enqueue. On rejection the task is handed back.
    /// 尝试非阻塞入队。被拒绝时任务被原样归还。
    fn submit(&self, task: Task) -> std::result::Result<(), Task>;
}

/// A bounded worker pool backed by a tokio mpsc queue and a fixed set of
/// worker tasks.
///
/// 基于 tokio mpsc 队列和固定数量工作者任务的有界工作者池。
pub struct BoundedPool {
    queue: mpsc::Sender<Task>,
}

impl BoundedPool {
    /// Creates a pool with `workers` draining tasks from a queue of
    /// `queue_capacity` slots. Must be called within a tokio runtime.
    ///
    /// 创建一个池：`workers` 个工作者从容量为 `queue_capacity` 的队列
    /// 中取出任务执行。必须在 tokio 运行时内调用。
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::NoWorkers);
        }
        if queue_capacity == 0 {
            return Err(Error::ZeroQueueCapacity);
        }

        let (queue, rx) = mpsc::channel::<Task>(queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        for worker_id in 0..workers {
            let rx = Arc::clone(&rx);
            tokio::spawn(async move {
                loop {
                    let task = { rx.lock().await.recv().await };
                    match task {
                        Some(task) => task(),
                        None => break,
                    }
                }
                trace!(worker_id, "dispatch worker exited");
            });
        }

        Ok(Self { queue })
    }
}

impl WorkerPool for BoundedPool {
    fn submit(&self, task: Task) -> std::result::Result<(), Task> {
        self.queue.try_send(task).map_err(|err| match err {
            TrySendError::Full(task) | TrySendError::Closed(task) => task,
        })
    }
}

/// The wheel-internal dispatch target: an optional pool with spawn fallback.
/// 时间轮内部的派发目标：可选的池，带独立任务回退。
#[derive(Clone)]
pub(crate) struct Dispatcher {
    pool: Option<Arc<dyn WorkerPool>>,
}

impl Dispatcher {
    pub(crate) fn new(pool: Option<Arc<dyn WorkerPool>>) -> Self {
        Self { pool }
    }

    /// Executes the task without ever blocking the caller. Pool saturation
    /// is recovered transparently by spawning.
    ///
    /// 执行任务且永不阻塞调用方。池饱和时透明地回退到独立任务。
    pub(crate) fn submit(&self, task: Task) {
        let task = match &self.pool {
            Some(pool) => match pool.submit(task) {
                Ok(()) => return,
                Err(task) => {
                    trace!("dispatch pool saturated, falling back to spawn");
                    task
                }
            },
            None => task,
        };
        tokio::spawn(async move { task() });
    }
}
