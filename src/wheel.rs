//! 分层时间轮模块
//! Hierarchical timing wheel module
//!
//! 该模块实现了多基数的分层时间轮：一个 256 槽的细粒度层加四个 64 槽
//! 的粗粒度层构成多级表盘。随着时钟推进，粗粒度桶中的定时器被级联到
//! 更细的层级；每个定时器在其生命周期内摊还只移动 O(log N) 次。
//!
//! This module implements the multi-radix hierarchical timing wheel: one
//! fine level of 256 slots plus four coarse levels of 64 slots form a
//! multi-resolution clock face. As the clock advances, timers in coarse
//! buckets cascade into finer levels; each timer moves an amortized
//! O(log N) times over its lifetime.

mod core;
mod record;
mod stats;

pub use core::Wheel;
pub use stats::WheelStats;

pub(crate) use core::WheelShared;
pub(crate) use record::TimerRecord;

#[cfg(test)]
mod tests {
    use super::core::{MAX_TICK_SPAN, TVR_MASK, WheelState};
    use super::record::TimerRecord;
    use std::sync::Arc;

    fn record(expires: u64, period: u64) -> Arc<TimerRecord> {
        TimerRecord::new(expires, period, Box::new(|_| {}))
    }

    /// 推进 n 次，返回每次触发的记录批次
    /// Advance n times, returning each fired batch
    fn advance_n(state: &mut WheelState, n: u64) -> Vec<Vec<Arc<TimerRecord>>> {
        (0..n).map(|_| state.advance().1).collect()
    }

    // ========== 放置规则 ==========

    #[test]
    fn test_fine_level_placement() {
        let mut state = WheelState::new();
        let timer = record(10, 0);
        state.place(&timer);

        let placement = timer.placement().unwrap();
        assert_eq!(placement.level, 0);
        assert_eq!(placement.slot, (10 & TVR_MASK) as usize);
    }

    #[test]
    fn test_coarse_level_placement_boundaries() {
        let mut state = WheelState::new();
        // (到期滴答, 期望层级, 期望槽位)
        // (expiry tick, expected level, expected slot)
        let cases: [(u64, usize, usize); 5] = [
            (255, 0, 255),
            (256, 1, 1),
            (1 << 14, 2, 1),
            (1 << 20, 3, 1),
            (1 << 26, 4, 1),
        ];
        for (expires, level, slot) in cases {
            let timer = record(expires, 0);
            state.place(&timer);
            let placement = timer.placement().unwrap();
            assert_eq!(placement.level, level, "expires={expires}");
            assert_eq!(placement.slot, slot, "expires={expires}");
        }
    }

    #[test]
    fn test_past_due_placed_in_current_slot() {
        let mut state = WheelState::new();
        advance_n(&mut state, 5);
        assert_eq!(state.jiffies(), 5);

        // 到期值已落后于 jiffies：放入当前槽，下一滴答触发
        // Expiry behind jiffies: current slot, fires on the next tick
        let timer = record(2, 0);
        state.place(&timer);
        let placement = timer.placement().unwrap();
        assert_eq!(placement.level, 0);
        assert_eq!(placement.slot, 5);

        let (fired_jiffies, due) = state.advance();
        assert_eq!(fired_jiffies, 5);
        assert_eq!(due.len(), 1);
        assert!(Arc::ptr_eq(&due[0], &timer));
    }

    #[test]
    fn test_over_range_delay_clamped_not_dropped() {
        let mut state = WheelState::new();
        let far = MAX_TICK_SPAN + 5000;
        let timer = record(far, 0);
        state.place(&timer);

        // 位置被钳制到最外层最远槽，但记录保留真实到期值
        // Placement clamps to the outermost level; the record keeps its
        // true expiry
        let placement = timer.placement().unwrap();
        assert_eq!(placement.level, 4);
        assert_eq!(placement.slot, 63);
        assert_eq!(timer.expires(), far);
    }

    // ========== 推进与级联 ==========

    #[test]
    fn test_one_shot_fires_exactly_on_its_tick() {
        let mut state = WheelState::new();
        let timer = record(10, 0);
        state.place(&timer);

        for batch in advance_n(&mut state, 10) {
            assert!(batch.is_empty(), "fired early");
        }
        let (fired_jiffies, due) = state.advance();
        assert_eq!(fired_jiffies, 10);
        assert_eq!(due.len(), 1);
        assert!(Arc::ptr_eq(&due[0], &timer));
        assert!(timer.placement().is_none());

        // 之后不再有重复触发
        // No duplicate afterwards
        for batch in advance_n(&mut state, 600) {
            assert!(batch.is_empty());
        }
    }

    #[test]
    fn test_cascade_relocates_into_fine_level() {
        let mut state = WheelState::new();
        let timer = record(300, 0);
        state.place(&timer);
        assert_eq!(timer.placement().unwrap().level, 1);

        // jiffies 到达 256 时细粒度下标回绕，触发一次级联
        // The fine index wraps when jiffies reaches 256, cascading once
        advance_n(&mut state, 257);
        let placement = timer.placement().unwrap();
        assert_eq!(placement.level, 0);
        assert_eq!(placement.slot, (300 & TVR_MASK) as usize);

        let fired: Vec<_> = advance_n(&mut state, 43).into_iter().flatten().collect();
        assert!(fired.is_empty());
        let (fired_jiffies, due) = state.advance();
        assert_eq!(fired_jiffies, 300);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_deep_delay_cascades_and_fires_once() {
        let mut state = WheelState::new();
        let timer = record(20_000, 0);
        state.place(&timer);
        assert_eq!(timer.placement().unwrap().level, 2);

        let mut fired = 0;
        for tick in 0..20_001u64 {
            let (fired_jiffies, due) = state.advance();
            assert_eq!(fired_jiffies, tick);
            if !due.is_empty() {
                assert_eq!(fired_jiffies, 20_000, "fired off schedule");
                fired += due.len();
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_jiffies_monotonic() {
        let mut state = WheelState::new();
        for expected in 0..1000 {
            assert_eq!(state.jiffies(), expected);
            state.advance();
        }
    }

    // ========== 移除 ==========

    #[test]
    fn test_removal_idempotent_and_skips_siblings() {
        let mut state = WheelState::new();
        let first = record(50, 0);
        let second = record(50, 0);
        let third = record(50, 0);
        state.place(&first);
        state.place(&second);
        state.place(&third);

        // 移除中间的记录不移动兄弟条目
        // Removing the middle record does not shift its siblings
        let first_placement = first.placement().unwrap();
        let third_placement = third.placement().unwrap();
        assert!(state.remove(&second));
        assert_eq!(first.placement().unwrap(), first_placement);
        assert_eq!(third.placement().unwrap(), third_placement);

        // 幂等：再次移除是空操作
        // Idempotent: removing again is a no-op
        assert!(!state.remove(&second));

        // 触发时跳过被置空的槽位，保持插入顺序
        // Firing skips the nil slot and preserves insertion order
        advance_n(&mut state, 50);
        let (_, due) = state.advance();
        assert_eq!(due.len(), 2);
        assert!(Arc::ptr_eq(&due[0], &first));
        assert!(Arc::ptr_eq(&due[1], &third));
    }

    #[test]
    fn test_occupancy_tracks_live_records() {
        let mut state = WheelState::new();
        let near = record(10, 0);
        let far = record(1000, 0);
        state.place(&near);
        state.place(&far);
        assert_eq!(state.occupancy(), [1, 1, 0, 0, 0]);

        state.remove(&near);
        assert_eq!(state.occupancy().iter().sum::<usize>(), 1);
    }
}
