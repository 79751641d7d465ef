//! The per-packet frame loop: fingerprint -> session lookup -> rule match
//! -> admission control -> dispatch, plus its counters, trace records, and
//! next-node resolution.

pub(crate) mod counters;
mod next_node;
mod orchestrator;
mod trace;

pub use counters::{Counters, GlobalCounters, LocalCounters};
pub use next_node::{L2NextNodeTable, L3FeatureArc, NextNodeResolver, DROP_NODE};
pub use orchestrator::{
    in_ip4_l2, in_ip4_l3, in_ip6_l2, in_ip6_l3, out_ip4_l2, out_ip4_l3, out_ip6_l2, out_ip6_l3,
    process_frame, Packet, PacketOutcome, PathConfig, ProcessedPacket, SharedState,
};
pub use trace::TraceRecord;
