//! The seven named packet counters. Increments happen against a per-worker
//! local accumulator on the hot path; the orchestrator flushes the
//! accumulator into the shared, eventually-consistent global counters once
//! per frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

macro_rules! counter_fields {
    ($($field:ident => $label:expr),+ $(,)?) => {
        #[derive(Debug, Default)]
        pub struct GlobalCounters {
            $(pub $field: AtomicU64,)+
        }

        impl GlobalCounters {
            pub const LABELS: &'static [(&'static str, &'static str)] = &[
                $((stringify!($field), $label)),+
            ];

            fn flush(&self, local: &LocalCounters) {
                $(self.$field.fetch_add(local.$field, Ordering::Relaxed);)+
            }
        }

        #[derive(Debug, Default, Clone, Copy)]
        pub struct LocalCounters {
            $(pub $field: u64,)+
        }
    };
}

counter_fields! {
    checked => "checked packets",
    permitted => "ACL permit packets",
    denied => "ACL deny packets",
    new_sessions => "new sessions added",
    existing_session_hits => "existing session packets",
    restart_session_timer => "restart session timer",
    too_many_sessions => "too many sessions to add new",
}

/// Owns the frame-local accumulator and a handle to the shared totals.
pub struct Counters {
    local: LocalCounters,
    global: Arc<GlobalCounters>,
}

impl Counters {
    pub fn new(global: Arc<GlobalCounters>) -> Self {
        Self {
            local: LocalCounters::default(),
            global,
        }
    }

    pub fn checked(&mut self) {
        self.local.checked += 1;
    }

    pub fn permitted(&mut self) {
        self.local.permitted += 1;
    }

    pub fn denied(&mut self) {
        self.local.denied += 1;
    }

    pub fn new_session(&mut self) {
        self.local.new_sessions += 1;
    }

    pub fn existing_session_hit(&mut self) {
        self.local.existing_session_hits += 1;
    }

    pub fn restart_session_timer(&mut self) {
        self.local.restart_session_timer += 1;
    }

    pub fn too_many_sessions(&mut self) {
        self.local.too_many_sessions += 1;
    }

    /// Flush the frame's local accumulator into the shared counters and
    /// reset it. Call once per frame.
    pub fn flush(&mut self) {
        self.global.flush(&self.local);
        self.local = LocalCounters::default();
    }

    pub fn local_snapshot(&self) -> LocalCounters {
        self.local
    }
}
