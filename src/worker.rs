//! Per-worker state: counters, session-slot allocation, and the aging
//! queues. Replaces VPP's `am->per_worker_data[thread_index]` global with a
//! struct the caller owns and passes explicitly into `process_frame`, with
//! no hidden globals.

use crate::pipeline::{Counters, GlobalCounters};
use crate::session::{LruList, SessionKey, TimeoutClass};
use std::sync::Arc;

const TIMEOUT_CLASS_COUNT: usize = 5;

/// Owns a worker's private slice of dataplane state: its counters
/// accumulator, its session-slot allocator, and its per-timeout-class aging
/// queues.
///
/// The aging queues are not further partitioned per interface (the
/// original keeps one LRU per interface per worker); admission's
/// per-interface cap is enforced by the shared session table instead, and a
/// single per-worker-per-class queue is enough to satisfy the
/// recycle-on-exhaustion contract tested in this crate. See DESIGN.md.
pub struct WorkerContext {
    pub worker_index: u32,
    pub counters: Counters,
    next_slot: u32,
    session_count: usize,
    epoch_invalidations: u64,
    lru: [LruList; TIMEOUT_CLASS_COUNT],
}

impl WorkerContext {
    pub fn new(worker_index: u32, global_counters: Arc<GlobalCounters>) -> Self {
        Self {
            worker_index,
            counters: Counters::new(global_counters),
            next_slot: 0,
            session_count: 0,
            epoch_invalidations: 0,
            lru: std::array::from_fn(|_| LruList::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.session_count
    }

    pub fn epoch_invalidations(&self) -> u64 {
        self.epoch_invalidations
    }

    pub fn note_epoch_invalidation(&mut self) {
        self.epoch_invalidations += 1;
    }

    /// Allocate the slot index for a session this worker is about to
    /// create. Wrapping is acceptable: slot reuse is safe once the prior
    /// occupant has been deleted from the table.
    pub fn alloc_slot(&mut self) -> u32 {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.wrapping_add(1);
        slot
    }

    pub fn track_new_session(&mut self, class: TimeoutClass, key: SessionKey) {
        self.lru[class as usize].push_front(key);
        self.session_count += 1;
    }

    pub fn move_session(&mut self, old: TimeoutClass, new: TimeoutClass, key: SessionKey) {
        if old == new {
            self.lru[new as usize].move_to_front(&key);
        } else {
            self.lru[old as usize].remove(&key);
            self.lru[new as usize].push_front(key);
        }
    }

    pub fn forget_session(&mut self, class: TimeoutClass, key: &SessionKey) {
        if self.lru[class as usize].remove(key) {
            self.session_count = self.session_count.saturating_sub(1);
        }
    }

    /// Evict the least-recently-used transient session this worker knows
    /// about, if any.
    pub fn try_recycle_transient(&mut self) -> Option<SessionKey> {
        let evicted = self.lru[TimeoutClass::Transient as usize].pop_lru();
        if evicted.is_some() {
            self.session_count = self.session_count.saturating_sub(1);
        }
        evicted
    }
}
