//! Session record, full session id, and the policy-epoch type shared
//! between the table and the control-plane-facing epoch sequences.

use super::key::SessionKey;
use crate::fingerprint::TcpFlags;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Per-(interface, direction) policy generation. The MSB marks the arc
/// (input sessions always carry bit 15 set, output sessions never do); the
/// low 15 bits are a change counter the control plane bumps on every ACL
/// rebind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyEpoch(pub u16);

const INPUT_ARC_BIT: u16 = 0x8000;
const COUNTER_MASK: u16 = 0x7fff;

impl PolicyEpoch {
    pub fn new(is_input: bool, counter: u16) -> Self {
        let arc = if is_input { INPUT_ARC_BIT } else { 0 };
        Self(arc | (counter & COUNTER_MASK))
    }

    /// Default epoch for an interface the control plane has never bound:
    /// `is_input ? 0x8000 : 0x0000` (counter 0), preserved verbatim.
    pub fn default_for(is_input: bool) -> Self {
        Self::new(is_input, 0)
    }

    pub fn is_input_arc(self) -> bool {
        self.0 & INPUT_ARC_BIT != 0
    }

    pub fn counter(self) -> u16 {
        self.0 & COUNTER_MASK
    }

    pub fn next(self) -> Self {
        Self::new(self.is_input_arc(), self.counter().wrapping_add(1))
    }

    /// A session is stale iff it was cut on the same arc but a different
    /// change counter than the interface's current epoch.
    pub fn is_stale_against(self, current: PolicyEpoch) -> bool {
        self.is_input_arc() == current.is_input_arc() && self != current
    }
}

/// Coarse aging classification; selects which worker-owned LRU queue a
/// session lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeoutClass {
    Transient = 0,
    Established = 1,
    TcpTransient = 2,
    TcpEstablished = 3,
    Special = 4,
}

impl TimeoutClass {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Transient,
            1 => Self::Established,
            2 => Self::TcpTransient,
            3 => Self::TcpEstablished,
            _ => Self::Special,
        }
    }
}

/// (worker index, slot index, policy epoch) identifying both the owning
/// worker/slab slot and the epoch a session was cut under. Packed into a
/// `u64` only as a convenience for callers that want a single atomic load;
/// the table itself stores the struct form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullSessionId {
    pub worker_index: u16,
    pub slot_index: u32,
    pub policy_epoch: PolicyEpoch,
}

impl FullSessionId {
    pub fn pack(self) -> u64 {
        (self.worker_index as u64) << 48 | (self.slot_index as u64) << 16 | self.policy_epoch.0 as u64
    }

    pub fn unpack(bits: u64) -> Self {
        Self {
            worker_index: (bits >> 48) as u16,
            slot_index: (bits >> 16) as u32,
            policy_epoch: PolicyEpoch((bits & 0xffff) as u16),
        }
    }
}

/// A tracked flow. Mutable fields are atomics so any worker can read a
/// consistent snapshot through a shared `Arc`; only the owning worker
/// (`full_session_id.worker_index`) ever writes them.
#[derive(Debug)]
pub struct SessionRecord {
    pub key: SessionKey,
    pub full_session_id: FullSessionId,
    pub interface_index: u32,
    pub created_at: u64,
    last_activity_fwd: AtomicU64,
    last_activity_rev: AtomicU64,
    tcp_flags_fwd: AtomicU8,
    tcp_flags_rev: AtomicU8,
    packet_count_fwd: AtomicU32,
    packet_count_rev: AtomicU32,
    timeout_class: AtomicU32,
}

impl SessionRecord {
    pub fn new(
        key: SessionKey,
        full_session_id: FullSessionId,
        interface_index: u32,
        now: u64,
    ) -> Self {
        Self {
            key,
            full_session_id,
            interface_index,
            created_at: now,
            last_activity_fwd: AtomicU64::new(now),
            last_activity_rev: AtomicU64::new(now),
            tcp_flags_fwd: AtomicU8::new(0),
            tcp_flags_rev: AtomicU8::new(0),
            packet_count_fwd: AtomicU32::new(0),
            packet_count_rev: AtomicU32::new(0),
            timeout_class: AtomicU32::new(TimeoutClass::Transient as u32),
        }
    }

    pub fn last_activity(&self, reversed: bool) -> u64 {
        self.side(reversed).load(Ordering::Relaxed)
    }

    pub fn touch(&self, reversed: bool, now: u64) {
        self.side(reversed).store(now, Ordering::Relaxed);
    }

    pub fn accumulated_flags(&self, reversed: bool) -> TcpFlags {
        TcpFlags::from_bits_truncate(self.flags_side(reversed).load(Ordering::Relaxed))
    }

    pub fn accumulate_flags(&self, reversed: bool, flags: TcpFlags) {
        self.flags_side(reversed)
            .fetch_or(flags.bits(), Ordering::Relaxed);
    }

    pub fn bump_packet_count(&self, reversed: bool) -> u32 {
        self.count_side(reversed).fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn packet_count(&self, reversed: bool) -> u32 {
        self.count_side(reversed).load(Ordering::Relaxed)
    }

    pub fn timeout_class(&self) -> TimeoutClass {
        TimeoutClass::from_u8(self.timeout_class.load(Ordering::Relaxed) as u8)
    }

    pub fn set_timeout_class(&self, class: TimeoutClass) {
        self.timeout_class.store(class as u32, Ordering::Relaxed);
    }

    fn side(&self, reversed: bool) -> &AtomicU64 {
        if reversed {
            &self.last_activity_rev
        } else {
            &self.last_activity_fwd
        }
    }

    fn flags_side(&self, reversed: bool) -> &AtomicU8 {
        if reversed {
            &self.tcp_flags_rev
        } else {
            &self.tcp_flags_fwd
        }
    }

    fn count_side(&self, reversed: bool) -> &AtomicU32 {
        if reversed {
            &self.packet_count_rev
        } else {
            &self.packet_count_fwd
        }
    }
}
