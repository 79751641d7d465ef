//! Per-(interface, direction) policy-epoch sequences. Bumped rarely (on an
//! ACL rebind) and read on every packet, so the table is an immutable
//! snapshot swapped wholesale on write, the same replace-on-write shape as
//! a hot-reloaded TLS config, just applied to a tiny map instead of a
//! certificate.

use crate::session::PolicyEpoch;
use ahash::AHashMap;
use arc_swap::ArcSwap;

#[derive(Default)]
pub struct EpochTable {
    epochs: ArcSwap<AHashMap<(u32, bool), PolicyEpoch>>,
}

impl EpochTable {
    pub fn new() -> Self {
        Self {
            epochs: ArcSwap::from_pointee(AHashMap::default()),
        }
    }

    /// Default epoch for an interface never bound by the control plane is
    /// `is_input ? 0x8000 : 0x0000`, even though its interaction with
    /// staleness on a never-bound interface is subtle.
    pub fn current(&self, interface: u32, is_input: bool) -> PolicyEpoch {
        self.epochs
            .load()
            .get(&(interface, is_input))
            .copied()
            .unwrap_or_else(|| PolicyEpoch::default_for(is_input))
    }

    pub fn bump(&self, interface: u32, is_input: bool) -> PolicyEpoch {
        let next = self.current(interface, is_input).next();
        self.epochs.rcu(|current| {
            let mut updated = (**current).clone();
            updated.insert((interface, is_input), next);
            updated
        });
        next
    }
}
