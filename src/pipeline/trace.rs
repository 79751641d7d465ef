//! Trace bitmap bits and the trace record shape. Traces are only built when
//! tracing is enabled for the node and selected on the current buffer.

use crate::fingerprint::FiveTuple;
use crate::rules::Action;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TraceBits: u32 {
        const EXISTING_SESSION_HIT = 0x8000_0000;
        const STALE_EPOCH_KILLED   = 0x4000_0000;
        /// The low word carries a timeout-class transition as
        /// `0x00010000 | (old << 8) | new`; this flag alone just marks that
        /// one occurred. Combine with `timeout_transition_bits`.
        const TIMEOUT_TRANSITION   = 0x0001_0000;
    }
}

pub fn timeout_transition_bits(old: u8, new: u8) -> u32 {
    TraceBits::TIMEOUT_TRANSITION.bits() | ((old as u32) << 8) | new as u32
}

/// Packs a fingerprint into six 64-bit words for the trace record, per the
/// external-interfaces trace layout.
pub fn fingerprint_words(fingerprint: &FiveTuple) -> [u64; 6] {
    let src = u128::from_be_bytes(fingerprint.src_addr);
    let dst = u128::from_be_bytes(fingerprint.dst_addr);
    [
        (src >> 64) as u64,
        src as u64,
        (dst >> 64) as u64,
        dst as u64,
        (fingerprint.proto.0 as u64) << 32
            | (fingerprint.src_port as u64) << 16
            | fingerprint.dst_port as u64,
        (fingerprint.is_ipv6 as u64) << 3
            | (fingerprint.is_nonfirst_fragment as u64) << 2
            | (fingerprint.l4_valid as u64) << 1
            | fingerprint.tcp_flags_valid as u64,
    ]
}

#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub interface_index: u32,
    pub lookup_context: u32,
    pub next_node: u32,
    pub acl_index: Option<u32>,
    pub rule_index: Option<u32>,
    pub fingerprint_words: [u64; 6],
    pub action: Action,
    pub trace_bits: u32,
}
