#![forbid(unsafe_code)]

//! Stateful ACL dataplane node: fingerprint extraction, direction-agnostic
//! session tracking, and ACL rule evaluation for a software packet
//! forwarder's per-worker fast path.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod policy;
pub mod rules;
pub mod session;
pub mod telemetry;
pub mod worker;

pub use config::{build_runtime, load_from_path, Config};
pub use error::{AclDataplaneError, Result};
pub use fingerprint::{extract, FiveTuple, L4Proto, PacketBuf, PacketInterfaces, TcpFlags};
pub use pipeline::{
    in_ip4_l2, in_ip4_l3, in_ip6_l2, in_ip6_l3, out_ip4_l2, out_ip4_l3, out_ip6_l2, out_ip6_l3,
    process_frame, Packet, PacketOutcome, PathConfig, ProcessedPacket, SharedState,
};
pub use rules::{Acl, AclRule, Action, LinearAclMatcher, MatchResult, RuleMatcher};
pub use session::{make_key, track, PolicyEpoch, SessionKey, SessionTable, TimeoutClass};
pub use worker::WorkerContext;
