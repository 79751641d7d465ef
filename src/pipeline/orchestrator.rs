//! The frame loop: sequences fingerprinting, session lookup, rule
//! evaluation, session admission, and dispatch for every packet in a frame.

use super::counters::GlobalCounters;
use super::next_node::{NextNodeResolver, DROP_NODE};
use super::trace::{fingerprint_words, timeout_transition_bits, TraceBits, TraceRecord};
use crate::fingerprint::{extract, PacketBuf, PacketInterfaces};
use crate::policy::{EpochTable, LookupContextTable};
use crate::rules::{Action, RuleMatcher};
use crate::session::{self, FullSessionId, SessionTable};
use crate::worker::WorkerContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Which of the eight dispatch entry points this call is specialized for.
#[derive(Debug, Clone, Copy)]
pub struct PathConfig {
    pub ip6: bool,
    pub is_input: bool,
    pub is_l2_path: bool,
}

/// A single packet as the orchestrator needs to see it: a byte buffer plus
/// the two interface indices the real forwarder would carry alongside it.
pub struct Packet<'a> {
    pub data: &'a [u8],
    pub rx_interface: u32,
    pub tx_interface: u32,
    pub trace_requested: bool,
}

/// The dataplane state shared across every worker: the session table, the
/// control-plane-published epoch and lookup-context bindings, and the
/// global (eventually-consistent) counters.
pub struct SharedState {
    pub sessions: SessionTable,
    pub epochs: EpochTable,
    pub lookup_contexts: LookupContextTable,
    pub global_counters: Arc<GlobalCounters>,
    pub reclassify_sessions: bool,
    collision_warning_gate: CollisionWarningGate,
}

impl SharedState {
    pub fn new(sessions: SessionTable, global_counters: Arc<GlobalCounters>) -> Self {
        Self {
            sessions,
            epochs: EpochTable::new(),
            lookup_contexts: LookupContextTable::new(),
            global_counters,
            reclassify_sessions: true,
            collision_warning_gate: CollisionWarningGate::new(Duration::from_secs(1)),
        }
    }
}

/// Rate-limits the interface-collision warning so a misconfigured,
/// collision-prone setup cannot log-storm.
struct CollisionWarningGate {
    interval_ms: u64,
    last_emitted_ms: AtomicU64,
}

impl CollisionWarningGate {
    fn new(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            last_emitted_ms: AtomicU64::new(0),
        }
    }

    fn allow(&self, now_ms: u64) -> bool {
        let last = self.last_emitted_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) >= self.interval_ms {
            self.last_emitted_ms.store(now_ms, Ordering::Relaxed);
            true
        } else {
            false
        }
    }
}

/// The packet-level outcome a forwarder acts on. Surfaced as a plain field,
/// never as a panicking `Result`: packet processing cannot fail the
/// function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    AclDrop,
    AclPermit,
    AclNewSession,
    AclExistSession,
    AclTooManySessions,
}

pub struct ProcessedPacket {
    pub outcome: PacketOutcome,
    pub restarted_timer: bool,
    pub next_node: u32,
    pub trace: Option<TraceRecord>,
}

/// The single polymorphic dispatch the eight original entry points share;
/// `cfg` pins the three booleans the original baked into eight near-
/// duplicate functions.
pub fn process_frame(
    packets: &[Packet<'_>],
    cfg: PathConfig,
    worker: &mut WorkerContext,
    shared: &SharedState,
    matcher: &dyn RuleMatcher,
    next_node_resolver: &dyn NextNodeResolver,
    node_tracing_enabled: bool,
    now_ms: u64,
) -> Vec<ProcessedPacket> {
    let processed = packets
        .iter()
        .map(|packet| {
            process_one(
                packet,
                cfg,
                worker,
                shared,
                matcher,
                next_node_resolver,
                node_tracing_enabled,
                now_ms,
            )
        })
        .collect();
    worker.counters.flush();
    processed
}

fn process_one(
    packet: &Packet<'_>,
    cfg: PathConfig,
    worker: &mut WorkerContext,
    shared: &SharedState,
    matcher: &dyn RuleMatcher,
    next_node_resolver: &dyn NextNodeResolver,
    node_tracing_enabled: bool,
    now_ms: u64,
) -> ProcessedPacket {
    worker.counters.checked();

    let interface_index = if cfg.is_input {
        packet.rx_interface
    } else {
        packet.tx_interface
    };

    let Some(lookup_context) = shared.lookup_contexts.lookup(interface_index, cfg.is_input) else {
        worker.counters.denied();
        return deny(DROP_NODE, None);
    };

    let interfaces = PacketInterfaces {
        rx_index: packet.rx_interface,
        tx_index: packet.tx_interface,
    };
    let fingerprint = extract(
        PacketBuf::new(packet.data),
        interfaces,
        lookup_context,
        cfg.ip6,
        cfg.is_input,
        cfg.is_l2_path,
    );
    let key_result = session::make_key(&fingerprint);
    let current_epoch = shared.epochs.current(interface_index, cfg.is_input);

    let mut trace_bits = TraceBits::empty();

    if shared.sessions.has_sessions(interface_index) {
        if let Some(sess) = shared.sessions.find(&key_result.key) {
            trace_bits |= TraceBits::EXISTING_SESSION_HIT;
            let old_class = sess.timeout_class();
            let track_result = session::track(&sess, &fingerprint, key_result.reversed, now_ms);

            if sess.interface_index != interface_index {
                if shared.collision_warning_gate.allow(now_ms) {
                    warn!(
                        interface_index,
                        session_interface = sess.interface_index,
                        "dropping packet: session/interface index collision"
                    );
                }
                worker.counters.denied();
                let trace_record = trace(&fingerprint, interface_index, lookup_context, DROP_NODE, None, trace_bits)
                    .filter(|_| node_tracing_enabled && packet.trace_requested);
                return deny(DROP_NODE, trace_record);
            }

            let stale = shared.reclassify_sessions
                && sess.full_session_id.policy_epoch.is_stale_against(current_epoch);

            if stale {
                worker.note_epoch_invalidation();
                trace_bits |= TraceBits::STALE_EPOCH_KILLED;
                shared.sessions.delete(&key_result.key, interface_index);
                worker.forget_session(old_class, &key_result.key);
                // Falls through to rule evaluation below, as on a miss.
            } else {
                if old_class != track_result.new_class {
                    worker.move_session(old_class, track_result.new_class, key_result.key);
                    worker.counters.restart_session_timer();
                    trace_bits |= TraceBits::from_bits_truncate(timeout_transition_bits(
                        old_class as u8,
                        track_result.new_class as u8,
                    ));
                }
                worker.counters.existing_session_hit();
                worker.counters.permitted();
                let next_node = next_node_resolver.resolve(interface_index, cfg.is_l2_path);
                return ProcessedPacket {
                    outcome: PacketOutcome::AclExistSession,
                    restarted_timer: old_class != track_result.new_class,
                    next_node,
                    trace: trace(
                        &fingerprint,
                        interface_index,
                        lookup_context,
                        next_node,
                        None,
                        trace_bits,
                    )
                    .filter(|_| node_tracing_enabled && packet.trace_requested),
                };
            }
        }
    }

    let match_result = matcher.match_packet(lookup_context, &fingerprint, cfg.ip6);

    let (outcome, action) = match match_result.action {
        Action::Deny => {
            worker.counters.denied();
            (PacketOutcome::AclDrop, Action::Deny)
        }
        Action::Permit => {
            worker.counters.permitted();
            (PacketOutcome::AclPermit, Action::Permit)
        }
        Action::PermitReflect => {
            if !shared.sessions.can_add(worker.session_count(), interface_index) {
                if let Some(evicted) = worker.try_recycle_transient() {
                    let evicted_interface = shared
                        .sessions
                        .find(&evicted)
                        .map(|record| record.interface_index)
                        .unwrap_or(interface_index);
                    shared.sessions.delete(&evicted, evicted_interface);
                }
            }
            if !shared.sessions.can_add(worker.session_count(), interface_index) {
                worker.counters.too_many_sessions();
                worker.counters.denied();
                (PacketOutcome::AclTooManySessions, Action::Deny)
            } else if key_result.valid_new_session {
                let full_session_id = FullSessionId {
                    worker_index: worker.worker_index as u16,
                    slot_index: worker.alloc_slot(),
                    policy_epoch: current_epoch,
                };
                let record = shared
                    .sessions
                    .add(key_result.key, full_session_id, interface_index, now_ms);
                session::track(&record, &fingerprint, key_result.reversed, now_ms);
                worker.track_new_session(record.timeout_class(), key_result.key);
                worker.counters.new_session();
                worker.counters.permitted();
                (PacketOutcome::AclNewSession, Action::Permit)
            } else {
                // ICMP of a type that cannot open a session: forward bare.
                worker.counters.permitted();
                (PacketOutcome::AclPermit, Action::Permit)
            }
        }
    };

    let next_node = if action == Action::Deny {
        DROP_NODE
    } else {
        next_node_resolver.resolve(interface_index, cfg.is_l2_path)
    };

    ProcessedPacket {
        outcome,
        restarted_timer: false,
        next_node,
        trace: trace(
            &fingerprint,
            interface_index,
            lookup_context,
            next_node,
            Some((match_result.acl_index, match_result.rule_index, action)),
            trace_bits,
        )
        .filter(|_| node_tracing_enabled && packet.trace_requested),
    }
}

fn deny(next_node: u32, trace: Option<TraceRecord>) -> ProcessedPacket {
    ProcessedPacket {
        outcome: PacketOutcome::AclDrop,
        restarted_timer: false,
        next_node,
        trace,
    }
}

#[allow(clippy::too_many_arguments)]
fn trace(
    fingerprint: &crate::fingerprint::FiveTuple,
    interface_index: u32,
    lookup_context: u32,
    next_node: u32,
    matched: Option<(Option<u32>, Option<u32>, Action)>,
    trace_bits: TraceBits,
) -> Option<TraceRecord> {
    let (acl_index, rule_index, action) = matched.unwrap_or((None, None, Action::Deny));
    Some(TraceRecord {
        interface_index,
        lookup_context,
        next_node,
        acl_index,
        rule_index,
        fingerprint_words: fingerprint_words(fingerprint),
        action,
        trace_bits: trace_bits.bits(),
    })
}

// --- Eight thin wrappers, one per original dispatch entry point ---------

macro_rules! path_fn {
    ($name:ident, $ip6:expr, $is_input:expr, $is_l2:expr) => {
        #[allow(clippy::too_many_arguments)]
        pub fn $name(
            packets: &[Packet<'_>],
            worker: &mut WorkerContext,
            shared: &SharedState,
            matcher: &dyn RuleMatcher,
            next_node_resolver: &dyn NextNodeResolver,
            node_tracing_enabled: bool,
            now_ms: u64,
        ) -> Vec<ProcessedPacket> {
            process_frame(
                packets,
                PathConfig {
                    ip6: $ip6,
                    is_input: $is_input,
                    is_l2_path: $is_l2,
                },
                worker,
                shared,
                matcher,
                next_node_resolver,
                node_tracing_enabled,
                now_ms,
            )
        }
    };
}

path_fn!(in_ip4_l2, false, true, true);
path_fn!(in_ip6_l2, true, true, true);
path_fn!(out_ip4_l2, false, false, true);
path_fn!(out_ip6_l2, true, false, true);
path_fn!(in_ip4_l3, false, true, false);
path_fn!(in_ip6_l3, true, true, false);
path_fn!(out_ip4_l3, false, false, false);
path_fn!(out_ip6_l3, true, false, false);
