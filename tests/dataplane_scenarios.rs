//! End-to-end coverage of the frame loop: the universal invariants and the
//! literal scenarios a stateful ACL dataplane node must get right. Every
//! test drives the real `process_frame` against a real `SessionTable`,
//! `LinearAclMatcher`, and `WorkerContext` - synthetic packet bytes are the
//! only fixture.

use acl_dataplane::pipeline::{
    GlobalCounters, L2NextNodeTable, Packet, PacketOutcome, PathConfig, SharedState,
};
use acl_dataplane::rules::PortRange;
use acl_dataplane::session::AdmissionLimits;
use acl_dataplane::{
    in_ip4_l2, process_frame, Acl, AclRule, Action, LinearAclMatcher, SessionTable, WorkerContext,
};
use std::sync::Arc;

/// A reflexive flow egresses the same physical interface it ingressed on
/// (VPP's `dataplane_node.c` uses one `sw_if_index0` for both directions),
/// so the harness drives both directions through this one interface.
const IFACE: u32 = 0x0001_0001;
const LC: u32 = 1;

const TCP_SYN: u8 = 0x02;
const TCP_SYN_ACK: u8 = 0x12;
const TCP_ACK: u8 = 0x10;

fn eth_ip4(src: [u8; 4], dst: [u8; 4], proto: u8, payload: &[u8]) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(14 + 20 + payload.len());
    pkt.extend_from_slice(&[0xaa; 6]);
    pkt.extend_from_slice(&[0xbb; 6]);
    pkt.extend_from_slice(&[0x08, 0x00]);

    let total_len = (20 + payload.len()) as u16;
    pkt.push(0x45);
    pkt.push(0x00);
    pkt.extend_from_slice(&total_len.to_be_bytes());
    pkt.extend_from_slice(&[0x00, 0x00]);
    pkt.extend_from_slice(&[0x00, 0x00]);
    pkt.push(64);
    pkt.push(proto);
    pkt.extend_from_slice(&[0x00, 0x00]);
    pkt.extend_from_slice(&src);
    pkt.extend_from_slice(&dst);

    pkt.extend_from_slice(payload);
    pkt
}

fn tcp_packet(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16, flags: u8) -> Vec<u8> {
    let mut tcp = Vec::with_capacity(20);
    tcp.extend_from_slice(&sport.to_be_bytes());
    tcp.extend_from_slice(&dport.to_be_bytes());
    tcp.extend_from_slice(&[0x00; 4]); // seq
    tcp.extend_from_slice(&[0x00; 4]); // ack
    tcp.push(0x50);
    tcp.push(flags);
    tcp.extend_from_slice(&[0xff, 0xff]);
    tcp.extend_from_slice(&[0x00, 0x00]);
    tcp.extend_from_slice(&[0x00, 0x00]);
    eth_ip4(src, dst, 6, &tcp)
}

fn udp_packet(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16) -> Vec<u8> {
    let mut udp = Vec::with_capacity(8);
    udp.extend_from_slice(&sport.to_be_bytes());
    udp.extend_from_slice(&dport.to_be_bytes());
    udp.extend_from_slice(&[0x00, 0x08]); // length
    udp.extend_from_slice(&[0x00, 0x00]); // checksum
    eth_ip4(src, dst, 17, &udp)
}

fn icmp_packet(src: [u8; 4], dst: [u8; 4], icmp_type: u8, icmp_code: u8) -> Vec<u8> {
    let icmp = [icmp_type, icmp_code, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00];
    eth_ip4(src, dst, 1, &icmp)
}

struct Harness {
    shared: SharedState,
    worker: WorkerContext,
    matcher: LinearAclMatcher,
    next_node: L2NextNodeTable,
}

impl Harness {
    fn new(acl: Acl, cap_per_interface: usize, cap_per_worker: usize) -> Self {
        let sessions = SessionTable::new(AdmissionLimits {
            per_interface_cap: cap_per_interface,
            per_worker_cap: cap_per_worker,
        });
        let global_counters = Arc::new(GlobalCounters::default());
        let shared = SharedState::new(sessions, global_counters.clone());
        shared.lookup_contexts.bind(IFACE, true, LC);
        shared.lookup_contexts.bind(IFACE, false, LC);

        let mut matcher = LinearAclMatcher::new();
        matcher.bind(LC, vec![acl]);

        Self {
            shared,
            worker: WorkerContext::new(0, global_counters),
            matcher,
            next_node: L2NextNodeTable::new(7),
        }
    }

    fn send_in(&mut self, data: &[u8], now_ms: u64) -> PacketOutcome {
        let packets = [Packet { data, rx_interface: IFACE, tx_interface: IFACE, trace_requested: false }];
        let out = process_frame(
            &packets,
            PathConfig { ip6: false, is_input: true, is_l2_path: true },
            &mut self.worker,
            &self.shared,
            &self.matcher,
            &self.next_node,
            false,
            now_ms,
        );
        out.into_iter().next().unwrap().outcome
    }

    fn send_in_on(&mut self, data: &[u8], rx_interface: u32, now_ms: u64) -> acl_dataplane::pipeline::ProcessedPacket {
        let packets = [Packet { data, rx_interface, tx_interface: rx_interface, trace_requested: false }];
        process_frame(
            &packets,
            PathConfig { ip6: false, is_input: true, is_l2_path: true },
            &mut self.worker,
            &self.shared,
            &self.matcher,
            &self.next_node,
            false,
            now_ms,
        )
        .into_iter()
        .next()
        .unwrap()
    }

    fn send_out(&mut self, data: &[u8], now_ms: u64) -> PacketOutcome {
        let packets = [Packet { data, rx_interface: IFACE, tx_interface: IFACE, trace_requested: false }];
        let out = process_frame(
            &packets,
            PathConfig { ip6: false, is_input: false, is_l2_path: true },
            &mut self.worker,
            &self.shared,
            &self.matcher,
            &self.next_node,
            false,
            now_ms,
        );
        out.into_iter().next().unwrap().outcome
    }
}

fn reflect_tcp_acl(port: u16) -> Acl {
    Acl {
        rules: vec![AclRule {
            proto: Some(acl_dataplane::L4Proto::TCP),
            src_net: None,
            dst_net: None,
            src_ports: PortRange::any(),
            dst_ports: PortRange { low: port, high: port },
            icmp_type: None,
            action: Action::PermitReflect,
        }],
    }
}

// --- Scenario 1: TCP handshake, permitted ----------------------------------

#[test]
fn tcp_handshake_opens_session_then_hits_on_synack() {
    let mut h = Harness::new(reflect_tcp_acl(80), 1_000, 1_000);

    let syn = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_SYN);
    assert_eq!(h.send_in(&syn, 1_000), PacketOutcome::AclNewSession);

    let synack = tcp_packet([10, 0, 0, 2], 80, [10, 0, 0, 1], 33000, TCP_SYN_ACK);
    assert_eq!(h.send_out(&synack, 1_100), PacketOutcome::AclExistSession);
}

// --- Scenario 2: deny by default -------------------------------------------

#[test]
fn non_matching_traffic_is_denied_by_default() {
    let udp_only = Acl {
        rules: vec![AclRule {
            proto: Some(acl_dataplane::L4Proto::UDP),
            src_net: None,
            dst_net: None,
            src_ports: PortRange::any(),
            dst_ports: PortRange { low: 53, high: 53 },
            icmp_type: None,
            action: Action::PermitReflect,
        }],
    };
    let mut h = Harness::new(udp_only, 1_000, 1_000);

    let syn = tcp_packet([10, 0, 0, 1], 1000, [10, 0, 0, 2], 80, TCP_SYN);
    assert_eq!(h.send_in(&syn, 1_000), PacketOutcome::AclDrop);
}

// --- Scenario 3: ICMP echo reflect -----------------------------------------

#[test]
fn icmp_echo_request_opens_session_reply_hits() {
    let icmp_acl = Acl {
        rules: vec![AclRule {
            proto: Some(acl_dataplane::L4Proto::ICMP),
            src_net: None,
            dst_net: None,
            src_ports: PortRange::any(),
            dst_ports: PortRange::any(),
            icmp_type: None,
            action: Action::PermitReflect,
        }],
    };
    let mut h = Harness::new(icmp_acl, 1_000, 1_000);

    let echo_request = icmp_packet([10, 0, 0, 1], [10, 0, 0, 2], 8, 0);
    assert_eq!(h.send_in(&echo_request, 1_000), PacketOutcome::AclNewSession);

    let echo_reply = icmp_packet([10, 0, 0, 2], [10, 0, 0, 1], 0, 0);
    assert_eq!(h.send_out(&echo_reply, 1_050), PacketOutcome::AclExistSession);
}

// --- Scenario 4: non-valid ICMP type never opens a session -----------------

#[test]
fn icmp_destination_unreachable_is_permitted_without_a_session() {
    let icmp_acl = Acl {
        rules: vec![AclRule {
            proto: Some(acl_dataplane::L4Proto::ICMP),
            src_net: None,
            dst_net: None,
            src_ports: PortRange::any(),
            dst_ports: PortRange::any(),
            icmp_type: None,
            action: Action::PermitReflect,
        }],
    };
    let mut h = Harness::new(icmp_acl, 1_000, 1_000);

    let dest_unreachable = icmp_packet([10, 0, 0, 1], [10, 0, 0, 2], 3, 1);
    assert_eq!(h.send_in(&dest_unreachable, 1_000), PacketOutcome::AclPermit);
    assert!(!h.shared.sessions.has_sessions(IFACE));
}

// --- Scenario 5: interface-LSB collision drops the packet ------------------

#[test]
fn interface_collision_forces_a_drop() {
    let mut h = Harness::new(reflect_tcp_acl(80), 1_000, 1_000);
    h.shared.lookup_contexts.bind(0x0002_0001, true, LC);

    let syn = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_SYN);
    let opened = h.send_in_on(&syn, IFACE, 1_000);
    assert_eq!(opened.outcome, PacketOutcome::AclNewSession);

    // Same 5-tuple, arriving on an interface whose low 16 bits collide with
    // `IFACE`'s (both 0x0001).
    let colliding = h.send_in_on(&syn, 0x0002_0001, 1_050);
    assert_eq!(colliding.outcome, PacketOutcome::AclDrop);
}

// --- Scenario 6: session-cap exhaustion ------------------------------------

#[test]
fn admission_denies_once_the_cap_is_reached_and_nothing_can_recycle() {
    let mut h = Harness::new(reflect_tcp_acl(80), 1, 1);

    // Take the one admissible slot through a full handshake so it becomes
    // TCP-established - recycling only evicts from the *transient* LRU, so
    // an established session is not a recycle victim.
    let syn = tcp_packet([10, 0, 0, 1], 40000, [10, 0, 0, 2], 80, TCP_SYN);
    assert_eq!(h.send_in(&syn, 1_000), PacketOutcome::AclNewSession);
    let synack = tcp_packet([10, 0, 0, 2], 80, [10, 0, 0, 1], 40000, TCP_SYN_ACK);
    assert_eq!(h.send_out(&synack, 1_010), PacketOutcome::AclExistSession);

    let second = tcp_packet([10, 0, 0, 3], 40001, [10, 0, 0, 2], 80, TCP_SYN);
    assert_eq!(h.send_in(&second, 1_020), PacketOutcome::AclTooManySessions);
}

// --- Universal invariants ---------------------------------------------------

#[test]
fn hit_idempotence_counts_two_existing_session_hits() {
    let mut h = Harness::new(reflect_tcp_acl(80), 1_000, 1_000);

    let syn = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_SYN);
    h.send_in(&syn, 1_000);

    let ack1 = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_ACK);
    let ack2 = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_ACK);
    assert_eq!(h.send_in(&ack1, 1_010), PacketOutcome::AclExistSession);
    assert_eq!(h.send_in(&ack2, 1_020), PacketOutcome::AclExistSession);

    let totals = &h.shared.global_counters;
    assert_eq!(totals.existing_session_hits.load(std::sync::atomic::Ordering::Relaxed), 2);
    assert_eq!(totals.new_sessions.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[test]
fn at_most_one_session_survives_repeated_packets_on_the_same_key() {
    let mut h = Harness::new(reflect_tcp_acl(80), 1_000, 1_000);

    let syn = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_SYN);
    h.send_in(&syn, 1_000);

    for i in 0..10 {
        let ack = tcp_packet([10, 0, 0, 1], 33000, [10, 0, 0, 2], 80, TCP_ACK);
        h.send_in(&ack, 1_000 + i);
    }

    assert_eq!(h.worker.session_count(), 1);
}

#[test]
fn udp_flow_is_established_after_its_second_packet() {
    let udp_acl = Acl {
        rules: vec![AclRule {
            proto: Some(acl_dataplane::L4Proto::UDP),
            src_net: None,
            dst_net: None,
            src_ports: PortRange::any(),
            dst_ports: PortRange::any(),
            icmp_type: None,
            action: Action::PermitReflect,
        }],
    };
    let mut h = Harness::new(udp_acl, 1_000, 1_000);

    let a = udp_packet([10, 0, 0, 1], 9000, [10, 0, 0, 2], 53);
    assert_eq!(h.send_in(&a, 1_000), PacketOutcome::AclNewSession);

    let b = udp_packet([10, 0, 0, 2], 53, [10, 0, 0, 1], 9000);
    assert_eq!(h.send_out(&b, 1_050), PacketOutcome::AclExistSession);
}
