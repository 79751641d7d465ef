//! Interface -> lookup-context bindings, one map per direction. Read-only at
//! the dataplane; the control plane publishes a full replacement snapshot
//! whenever bindings change.

use ahash::AHashMap;
use arc_swap::ArcSwap;

#[derive(Default, Clone)]
struct Bindings {
    input: AHashMap<u32, u32>,
    output: AHashMap<u32, u32>,
}

#[derive(Default)]
pub struct LookupContextTable {
    bindings: ArcSwap<Bindings>,
}

impl LookupContextTable {
    pub fn new() -> Self {
        Self {
            bindings: ArcSwap::from_pointee(Bindings::default()),
        }
    }

    pub fn bind(&self, interface: u32, is_input: bool, lookup_context: u32) {
        self.bindings.rcu(|current| {
            let mut updated = (**current).clone();
            let map = if is_input {
                &mut updated.input
            } else {
                &mut updated.output
            };
            map.insert(interface, lookup_context);
            updated
        });
    }

    pub fn lookup(&self, interface: u32, is_input: bool) -> Option<u32> {
        let snapshot = self.bindings.load();
        let map = if is_input { &snapshot.input } else { &snapshot.output };
        map.get(&interface).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_interface_has_no_lookup_context() {
        let table = LookupContextTable::new();
        assert_eq!(table.lookup(5, true), None);
    }

    #[test]
    fn bind_is_per_direction() {
        let table = LookupContextTable::new();
        table.bind(5, true, 10);
        assert_eq!(table.lookup(5, true), Some(10));
        assert_eq!(table.lookup(5, false), None);
    }
}
