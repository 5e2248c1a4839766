//! 分层时间轮核心实现
//! Hierarchical timing wheel core implementation

use crate::config::WheelConfig;
use crate::dispatch::Dispatcher;
use crate::ticker::Ticker;
use crate::timer::Timer;
use crate::wheel::record::{Placement, TimerCallback, TimerRecord, lock};
use crate::wheel::stats::WheelStats;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, trace};

/// 细粒度层的位宽与规模（256 槽，取 expires 的低 8 位）
/// Fine level geometry (256 slots, indexed by the low 8 bits of expires)
pub(super) const TVR_BITS: u64 = 8;
pub(super) const TVR_SIZE: u64 = 1 << TVR_BITS;
pub(super) const TVR_MASK: u64 = TVR_SIZE - 1;

/// 粗粒度层的位宽与规模（每层 64 槽，取连续的 6 位字段）
/// Coarse level geometry (64 slots each, indexed by successive 6-bit fields)
pub(super) const TVN_BITS: u64 = 6;
pub(super) const TVN_SIZE: u64 = 1 << TVN_BITS;
pub(super) const TVN_MASK: u64 = TVN_SIZE - 1;

/// 粗粒度层数；加上细粒度层共 5 层
/// Number of coarse levels; five levels in total with the fine one
pub(super) const COARSE_LEVELS: usize = 4;

/// 可寻址的最大滴答跨度；超出的延迟被钳制到此处并在级联时重新评估
/// Maximum addressable tick span; longer delays are clamped here and
/// re-evaluated as cascading brings them into range
pub(super) const MAX_TICK_SPAN: u64 = u32::MAX as u64;

/// 每个桶保留的初始容量
/// Capacity retained by each bucket
const BUCKET_CAPACITY: usize = 128;

/// 桶：同一 (层, 槽) 坐标上定时器记录的有序列表。移除将槽位置空，
/// 从不压缩；遍历时跳过空位。
/// Bucket: ordered list of records at one (level, slot) coordinate.
/// Removal nils entries in place, never compacts; iteration skips nils.
type Bucket = Vec<Option<Arc<TimerRecord>>>;

fn fresh_bucket() -> Bucket {
    Vec::with_capacity(BUCKET_CAPACITY)
}

/// All state serialized under the engine lock: the monotonic jiffies
/// counter and the five bucket levels.
///
/// 引擎锁串行化的全部状态：单调的 jiffies 计数器与五个桶层级。
pub(super) struct WheelState {
    jiffies: u64,
    levels: [Vec<Bucket>; 5],
}

impl WheelState {
    pub(super) fn new() -> Self {
        let sizes = [TVR_SIZE, TVN_SIZE, TVN_SIZE, TVN_SIZE, TVN_SIZE];
        Self {
            jiffies: 0,
            levels: sizes.map(|size| (0..size).map(|_| fresh_bucket()).collect()),
        }
    }

    pub(super) fn jiffies(&self) -> u64 {
        self.jiffies
    }

    /// Computes the (level, slot) coordinate for an absolute expiry tick,
    /// clamping deltas beyond the addressable span. The record keeps its
    /// true expiry; only the placement is clamped.
    ///
    /// 计算绝对到期滴答对应的 (层, 槽) 坐标，超出可寻址跨度的增量会被
    /// 钳制。记录保留真实到期；只有位置计算被钳制。
    fn target_slot(&self, expires: u64) -> (usize, usize) {
        if expires < self.jiffies {
            // 已过期：放入细粒度层的当前槽，下一次滴答即触发
            // Past due: fine level at the current slot, fires next tick
            return (0, (self.jiffies & TVR_MASK) as usize);
        }
        let idx = expires - self.jiffies;
        if idx < TVR_SIZE {
            (0, (expires & TVR_MASK) as usize)
        } else if idx < 1 << (TVR_BITS + TVN_BITS) {
            (1, ((expires >> TVR_BITS) & TVN_MASK) as usize)
        } else if idx < 1 << (TVR_BITS + 2 * TVN_BITS) {
            (2, ((expires >> (TVR_BITS + TVN_BITS)) & TVN_MASK) as usize)
        } else if idx < 1 << (TVR_BITS + 3 * TVN_BITS) {
            (3, ((expires >> (TVR_BITS + 2 * TVN_BITS)) & TVN_MASK) as usize)
        } else {
            let expires = if idx > MAX_TICK_SPAN {
                self.jiffies + MAX_TICK_SPAN
            } else {
                expires
            };
            (4, ((expires >> (TVR_BITS + 3 * TVN_BITS)) & TVN_MASK) as usize)
        }
    }

    /// Appends the record to its target bucket and stamps the placement.
    /// 将记录追加到目标桶并写入位置信息。
    pub(super) fn place(&mut self, record: &Arc<TimerRecord>) {
        let expires = record.expires();
        let (level, slot) = self.target_slot(expires);
        let bucket = &mut self.levels[level][slot];
        let index = bucket.len();
        bucket.push(Some(Arc::clone(record)));
        record.set_placement(Some(Placement { level, slot, index }));
        trace!(expires, level, slot, index, "timer placed");
    }

    /// Nils the record's slot if it still holds this exact record.
    /// Idempotent, O(1), never shifts siblings.
    ///
    /// 若槽位仍持有这条记录则将其置空。幂等、O(1)、不移动兄弟条目。
    pub(super) fn remove(&mut self, record: &Arc<TimerRecord>) -> bool {
        let Some(placement) = record.take_placement() else {
            return false;
        };
        let entry = self
            .levels
            .get_mut(placement.level)
            .and_then(|level| level.get_mut(placement.slot))
            .and_then(|bucket| bucket.get_mut(placement.index));
        if let Some(entry) = entry {
            if entry.as_ref().is_some_and(|held| Arc::ptr_eq(held, record)) {
                *entry = None;
                return true;
            }
        }
        false
    }

    /// The slot of level `level` due for cascading at the current jiffies.
    /// 当前 jiffies 下第 `level` 层应级联的槽。
    fn cascade_slot(&self, level: usize) -> usize {
        ((self.jiffies >> (TVR_BITS + (level as u64 - 1) * TVN_BITS)) & TVN_MASK) as usize
    }

    /// Redistributes one coarse bucket into fresh placements.
    /// 将一个粗粒度桶重新分布到新的位置。
    fn cascade(&mut self, level: usize, slot: usize) {
        if self.levels[level][slot].is_empty() {
            return;
        }
        let bucket = mem::replace(&mut self.levels[level][slot], fresh_bucket());
        let moved = bucket.iter().flatten().count();
        for record in bucket.into_iter().flatten() {
            self.place(&record);
        }
        if moved > 0 {
            debug!(level, slot, moved, "cascaded coarse bucket");
        }
    }

    /// Advances the wheel by one tick: cascades coarse levels when the fine
    /// index wraps, increments jiffies, and extracts the due fine bucket.
    /// Returns the fired tick and the due records, placements cleared.
    ///
    /// 将时间轮推进一个滴答：细粒度下标回绕到 0 时级联粗粒度层，递增
    /// jiffies，并取出到期的细粒度桶。返回触发的滴答值和到期记录，
    /// 记录的位置信息已清空。
    pub(super) fn advance(&mut self) -> (u64, Vec<Arc<TimerRecord>>) {
        let fired_jiffies = self.jiffies;
        let index = (self.jiffies & TVR_MASK) as usize;

        if index == 0 {
            // 只要上一层级联落在槽 0 就继续向更粗的层传播
            // Keep propagating upwards only while the cascaded slot is 0
            for level in 1..=COARSE_LEVELS {
                let slot = self.cascade_slot(level);
                self.cascade(level, slot);
                if slot != 0 {
                    break;
                }
            }
        }

        self.jiffies += 1;

        if self.levels[0][index].is_empty() {
            return (fired_jiffies, Vec::new());
        }
        let bucket = mem::replace(&mut self.levels[0][index], fresh_bucket());
        let mut due = Vec::with_capacity(bucket.len());
        for record in bucket.into_iter().flatten() {
            record.set_placement(None);
            due.push(record);
        }
        (fired_jiffies, due)
    }

    /// Counts live records per level (nil slots skipped).
    /// 逐层统计存活记录数（跳过空位）。
    pub(super) fn occupancy(&self) -> [usize; 5] {
        let mut counts = [0usize; 5];
        for (level, buckets) in self.levels.iter().enumerate() {
            counts[level] = buckets
                .iter()
                .map(|bucket| bucket.iter().flatten().count())
                .sum();
        }
        counts
    }
}

/// Engine state shared between the public handle, the facades, and the
/// tick-loop task.
///
/// 公共句柄、外观类型与滴答循环任务共享的引擎状态。
pub(crate) struct WheelShared {
    state: Mutex<WheelState>,
    tick: Duration,
    start: Instant,
    pub(crate) dispatcher: Dispatcher,
}

impl WheelShared {
    /// Converts a duration to ticks, rounding up.
    /// 将时长向上取整换算为滴答数。
    fn ticks_for(&self, duration: Duration) -> u64 {
        if duration.is_zero() {
            return 0;
        }
        let ticks = duration.as_nanos().div_ceil(self.tick.as_nanos());
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Creates and inserts a record under the engine lock.
    /// 在引擎锁下创建并插入一条记录。
    pub(crate) fn schedule(
        &self,
        delay: Duration,
        period: Duration,
        callback: TimerCallback,
    ) -> Arc<TimerRecord> {
        let mut state = lock(&self.state);
        let expires = state.jiffies() + self.ticks_for(delay);
        let record = TimerRecord::new(expires, self.ticks_for(period), callback);
        state.place(&record);
        record
    }

    /// Removes the record from its bucket if it is still there.
    /// 若记录仍在桶中则将其移除。
    pub(crate) fn cancel(&self, record: &Arc<TimerRecord>) {
        let mut state = lock(&self.state);
        if state.remove(record) {
            trace!("timer cancelled");
        }
    }

    /// Cancel + recompute + reinsert as one locked operation. A concurrent
    /// in-flight fire may race this; the imprecision is accepted.
    ///
    /// 取消、重算、重插作为一次持锁操作完成。可能与正在进行的触发
    /// 竞争；该不精确性是可接受的。
    pub(crate) fn reset(&self, record: &Arc<TimerRecord>, delay: Duration, period: Duration) {
        let mut state = lock(&self.state);
        state.remove(record);
        let expires = state.jiffies() + self.ticks_for(delay);
        record.set_schedule(expires, self.ticks_for(period));
        state.place(record);
    }

    /// Re-arms a periodic record relative to the tick it fired on, so its
    /// schedule never drifts with dispatch latency. Skipped when a
    /// concurrent reset already re-placed the record.
    ///
    /// 相对触发滴答重装周期性记录，调度不随派发延迟漂移。若并发的
    /// reset 已重新放置该记录则跳过。
    fn reschedule(&self, record: &Arc<TimerRecord>, fired_jiffies: u64) {
        let mut state = lock(&self.state);
        if record.placement().is_some() {
            return;
        }
        record.set_expires(fired_jiffies + record.period());
        state.place(record);
    }

    /// The record's deadline on the wall of this wheel: `start + tick * expires`.
    /// Reads the true (never clamped) expiry under the record lock.
    ///
    /// 记录在本轮时间轴上的截止时刻：`start + tick * expires`。
    /// 在记录锁下读取真实（从未被钳制的）到期值。
    pub(crate) fn when(&self, record: &TimerRecord) -> Instant {
        let nanos = self.tick.as_nanos().saturating_mul(record.expires() as u128);
        self.start + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// One tick: advance under the lock, then dispatch the batch outside it.
    /// 一次滴答：持锁推进，随后在锁外派发批次。
    fn on_tick(self: &Arc<Self>) {
        let (fired_jiffies, due) = {
            let mut state = lock(&self.state);
            state.advance()
        };
        if due.is_empty() {
            return;
        }
        debug!(fired_jiffies, batch = due.len(), "dispatching due timers");

        let shared = Arc::clone(self);
        self.dispatcher.submit(Box::new(move || {
            let now = Instant::now();
            for record in due {
                record.fire(now);
                if record.period() > 0 {
                    shared.reschedule(&record, fired_jiffies);
                }
            }
        }));
    }

    pub(crate) fn stats(&self) -> WheelStats {
        let state = lock(&self.state);
        let level_occupancy = state.occupancy();
        WheelStats {
            jiffies: state.jiffies(),
            pending_timers: level_occupancy.iter().sum(),
            level_occupancy,
            tick: self.tick,
        }
    }
}

/// The tick-loop task: wakes once per tick interval and blocks only on the
/// clock or the termination signal, never on callback completion.
///
/// 滴答循环任务：每个滴答间隔唤醒一次，只阻塞在时钟或终止信号上，
/// 从不等待回调完成。
async fn run(shared: Arc<WheelShared>, mut quit: watch::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + shared.tick, shared.tick);
    debug!(tick = ?shared.tick, "tick loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => shared.on_tick(),
            _ = quit.changed() => break,
        }
    }
    debug!("tick loop stopped");
}

/// A hierarchical timing wheel: an in-process software clock scheduling
/// one-shot and periodic callbacks with O(1) amortized insertion and
/// cancellation and bounded per-tick work.
///
/// A dedicated background task advances the wheel once per `tick`. All
/// mutation of shared wheel state is serialized under one engine lock;
/// callbacks execute strictly outside it through the dispatcher. Must be
/// created within a tokio runtime.
///
/// 分层时间轮：进程内的软件时钟，以摊还 O(1) 的插入/取消开销和有界的
/// 每滴答工作量调度一次性与周期性回调。
///
/// 一个专用后台任务每 `tick` 推进时间轮一次。共享状态的所有修改都由
/// 单个引擎锁串行化；回调严格在锁外经由派发器执行。必须在 tokio
/// 运行时内创建。
pub struct Wheel {
    pub(crate) shared: Arc<WheelShared>,
    quit: watch::Sender<()>,
}

impl Wheel {
    /// Creates a wheel with the given tick interval and default dispatch.
    /// 以给定滴答间隔和默认派发方式创建时间轮。
    pub fn new(tick: Duration) -> Self {
        Self::with_config(tick, WheelConfig::default())
    }

    /// Creates a wheel with explicit configuration.
    ///
    /// # Panics
    /// Panics if `tick` is zero.
    ///
    /// 以显式配置创建时间轮。`tick` 为零时 panic。
    pub fn with_config(tick: Duration, config: WheelConfig) -> Self {
        assert!(!tick.is_zero(), "tick interval must be non-zero");

        let shared = Arc::new(WheelShared {
            state: Mutex::new(WheelState::new()),
            tick,
            start: Instant::now(),
            dispatcher: Dispatcher::new(config.dispatch_pool),
        });
        let (quit, quit_rx) = watch::channel(());
        tokio::spawn(run(Arc::clone(&shared), quit_rx));
        info!(tick = ?tick, "timing wheel started");

        Self { shared, quit }
    }

    /// Schedules a one-shot timer backed by a single-slot notification
    /// channel. The channel is written non-blockingly (drop-if-full) so a
    /// slow consumer cannot stall the wheel.
    ///
    /// 调度一个由单槽通知通道支撑的一次性定时器。通道以非阻塞方式
    /// 写入（满则丢弃），慢消费者不会拖住时间轮。
    pub fn new_timer(&self, delay: Duration) -> Timer {
        let (tx, rx) = mpsc::channel(1);
        let record = self.shared.schedule(
            delay,
            Duration::ZERO,
            Box::new(move |now| {
                let _ = tx.try_send(now);
            }),
        );
        Timer {
            record,
            shared: Arc::clone(&self.shared),
            rx: Some(rx),
        }
    }

    /// Schedules a channel-backed periodic timer: first fire after `delay`,
    /// then every `period`.
    ///
    /// 调度一个由通道支撑的周期定时器：`delay` 后首次触发，此后每
    /// `period` 触发一次。
    pub fn new_ticker(&self, delay: Duration, period: Duration) -> Ticker {
        let (tx, rx) = mpsc::channel(1);
        let record = self.shared.schedule(
            delay,
            period,
            Box::new(move |now| {
                let _ = tx.try_send(now);
            }),
        );
        Ticker {
            record,
            shared: Arc::clone(&self.shared),
            rx: Some(rx),
        }
    }

    /// Runs `f` once after `delay`. The function is routed through the
    /// dispatcher on its own, so a slow `f` cannot stall the rest of its
    /// firing batch.
    ///
    /// `delay` 后执行一次 `f`。函数单独经由派发器执行，慢的 `f` 不会
    /// 拖住同批次的其他定时器。
    pub fn after_func<F>(&self, delay: Duration, f: F) -> Timer
    where
        F: Fn() + Send + Sync + 'static,
    {
        Timer {
            record: self.schedule_func(delay, Duration::ZERO, f),
            shared: Arc::clone(&self.shared),
            rx: None,
        }
    }

    /// Runs `f` after `delay` and then every `period` until stopped.
    /// `delay` 后执行 `f`，此后每 `period` 执行一次，直至停止。
    pub fn tick_func<F>(&self, delay: Duration, period: Duration, f: F) -> Ticker
    where
        F: Fn() + Send + Sync + 'static,
    {
        Ticker {
            record: self.schedule_func(delay, period, f),
            shared: Arc::clone(&self.shared),
            rx: None,
        }
    }

    fn schedule_func<F>(&self, delay: Duration, period: Duration, f: F) -> Arc<TimerRecord>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let dispatcher = self.shared.dispatcher.clone();
        let f = Arc::new(f);
        self.shared.schedule(
            delay,
            period,
            Box::new(move |_now| {
                let f = Arc::clone(&f);
                dispatcher.submit(Box::new(move || f()));
            }),
        )
    }

    /// Waits until at least `delay` of wheel time has elapsed.
    /// 等待至少 `delay` 的轮时间流逝。
    pub async fn sleep(&self, delay: Duration) {
        let mut timer = self.new_timer(delay);
        timer.recv().await;
    }

    /// Stops the tick loop. Idempotent. Pending timers are abandoned,
    /// neither fired nor errored; already-dispatched callbacks are not
    /// retracted.
    ///
    /// 停止滴答循环。幂等。未决定时器被放弃，既不触发也不报错；已派发
    /// 的回调不会被撤回。
    pub fn stop(&self) {
        let _ = self.quit.send(());
        info!("timing wheel stopped");
    }

    /// A snapshot of jiffies and per-level occupancy.
    /// jiffies 与逐层占用情况的快照。
    pub fn stats(&self) -> WheelStats {
        self.shared.stats()
    }
}

impl Drop for Wheel {
    fn drop(&mut self) {
        let _ = self.quit.send(());
    }
}
