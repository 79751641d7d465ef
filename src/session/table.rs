//! Concurrent session table. Reads are lock-free-ish (dashmap's sharded
//! locking, no single global lock); writes obey single-writer-per-record by
//! convention enforced at the call site, not by the table itself.

use super::key::SessionKey;
use super::record::{FullSessionId, SessionRecord};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-interface session cap and global per-worker cap enforced by
/// `can_add`.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionLimits {
    pub per_interface_cap: usize,
    pub per_worker_cap: usize,
}

pub struct SessionTable {
    sessions: DashMap<SessionKey, Arc<SessionRecord>, ahash::RandomState>,
    interface_counts: DashMap<u32, Arc<AtomicUsize>, ahash::RandomState>,
    total_count: AtomicUsize,
    limits: AdmissionLimits,
}

impl SessionTable {
    pub fn new(limits: AdmissionLimits) -> Self {
        Self {
            sessions: DashMap::with_hasher(ahash::RandomState::new()),
            interface_counts: DashMap::with_hasher(ahash::RandomState::new()),
            total_count: AtomicUsize::new(0),
            limits,
        }
    }

    /// Table-wide fast guard, deliberately not scoped to `interface`: the
    /// key a session is stored under carries no interface component (see
    /// `SessionKey`), so a session created on one interface is still the
    /// correct hit for a colliding packet arriving on another. Scoping this
    /// guard per interface would let that exact collision skip the lookup
    /// that is supposed to catch it.
    pub fn has_sessions(&self, _interface: u32) -> bool {
        self.total_count.load(Ordering::Relaxed) > 0
    }

    pub fn find(&self, key: &SessionKey) -> Option<Arc<SessionRecord>> {
        self.sessions.get(key).map(|r| r.clone())
    }

    /// Insert a new record. Only the owning worker (`full_session_id.worker_index`)
    /// may call this for a given slot.
    pub fn add(
        &self,
        key: SessionKey,
        full_session_id: FullSessionId,
        interface: u32,
        now: u64,
    ) -> Arc<SessionRecord> {
        let record = Arc::new(SessionRecord::new(key, full_session_id, interface, now));
        self.sessions.insert(key, record.clone());
        self.interface_count(interface).fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
        record
    }

    /// Remove a record by key. Returns `false` if it was already removed by
    /// a concurrent expirer; callers must treat that as success, not retry.
    pub fn delete(&self, key: &SessionKey, interface: u32) -> bool {
        if self.sessions.remove(key).is_some() {
            if let Some(count) = self.interface_counts.get(&interface) {
                count.fetch_sub(1, Ordering::Relaxed);
            }
            self.total_count.fetch_sub(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    pub fn can_add(&self, worker_session_count: usize, interface: u32) -> bool {
        worker_session_count < self.limits.per_worker_cap
            && self.interface_session_count(interface) < self.limits.per_interface_cap
    }

    fn interface_count(&self, interface: u32) -> Arc<AtomicUsize> {
        self.interface_counts
            .entry(interface)
            .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
            .clone()
    }

    fn interface_session_count(&self, interface: u32) -> usize {
        self.interface_counts
            .get(&interface)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}
