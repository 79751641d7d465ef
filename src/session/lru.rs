//! Index-based doubly-linked free list backing each worker's per-timeout-
//! class LRU queue. Adapted from the classic explicit free-list allocator
//! idiom to use slab indices instead of raw pointers, since this crate
//! forbids unsafe code.

use super::key::SessionKey;
use ahash::AHashMap;

struct Node {
    key: SessionKey,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A most-recently-used-at-head queue of session keys, with O(1) insert,
/// remove, and move-to-front via a slab of linked nodes plus an index from
/// key to slot for lookup.
#[derive(Default)]
pub struct LruList {
    slab: Vec<Option<Node>>,
    free: Vec<usize>,
    index: AHashMap<SessionKey, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.index.contains_key(key)
    }

    /// Insert `key` at the head. No-op if already present (callers should
    /// check with `contains` first if that distinction matters).
    pub fn push_front(&mut self, key: SessionKey) {
        if self.index.contains_key(&key) {
            return;
        }
        let slot = self.alloc(Node {
            key,
            prev: None,
            next: self.head,
        });
        if let Some(head) = self.head {
            self.set_prev(head, Some(slot));
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
        self.index.insert(key, slot);
    }

    /// Move an existing key to the head (most-recently-used).
    pub fn move_to_front(&mut self, key: &SessionKey) {
        let Some(&slot) = self.index.get(key) else {
            return;
        };
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    pub fn remove(&mut self, key: &SessionKey) -> bool {
        let Some(slot) = self.index.remove(key) else {
            return false;
        };
        self.unlink(slot);
        self.slab[slot] = None;
        self.free.push(slot);
        true
    }

    /// Evict and return the least-recently-used key (the tail).
    pub fn pop_lru(&mut self) -> Option<SessionKey> {
        let slot = self.tail?;
        let key = self.slab[slot].as_ref().map(|n| n.key)?;
        self.remove(&key);
        Some(key)
    }

    fn alloc(&mut self, node: Node) -> usize {
        if let Some(slot) = self.free.pop() {
            self.slab[slot] = Some(node);
            slot
        } else {
            self.slab.push(Some(node));
            self.slab.len() - 1
        }
    }

    fn set_prev(&mut self, slot: usize, prev: Option<usize>) {
        if let Some(node) = self.slab[slot].as_mut() {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, slot: usize, next: Option<usize>) {
        if let Some(node) = self.slab[slot].as_mut() {
            node.next = next;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.slab[slot].as_ref() {
            Some(n) => (n.prev, n.next),
            None => return,
        };
        match prev {
            Some(p) => self.set_next(p, next),
            None => self.head = next,
        }
        match next {
            Some(n) => self.set_prev(n, prev),
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, slot: usize) {
        self.set_prev(slot, None);
        self.set_next(slot, self.head);
        if let Some(head) = self.head {
            self.set_prev(head, Some(slot));
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
