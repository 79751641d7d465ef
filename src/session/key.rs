//! Canonicalizes a directional [`FiveTuple`] into a direction-agnostic
//! [`SessionKey`] so a flow's two directions land on the same table entry.

use crate::fingerprint::{FiveTuple, L4Proto, TcpFlags};

/// Direction-agnostic flow identity. Deliberately does not carry VPP's
/// "reversed" marker bit: that bit only records which side of *this packet*
/// got swapped during canonicalization, not the flow's identity, and two
/// packets of the same flow disagree on it by construction. Leaving it out
/// of the struct entirely keeps it out of `Hash`/`Eq`, which is what makes
/// direction-agnostic lookup correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    addr_a: [u8; 16],
    port_a: u16,
    addr_b: [u8; 16],
    port_b: u16,
    proto: L4Proto,
    is_ipv6: bool,
}

/// `true` when the endpoint pair was swapped to reach canonical order.
/// Useful for trace/debug output, not part of the key's identity.
pub struct KeyResult {
    pub key: SessionKey,
    pub reversed: bool,
    pub valid_new_session: bool,
}

pub fn make_key(fingerprint: &FiveTuple) -> KeyResult {
    let src = (fingerprint.src_addr, fingerprint.src_port);
    let dst = (fingerprint.dst_addr, fingerprint.dst_port);

    let (low, high, reversed) = if src > dst { (dst, src, true) } else { (src, dst, false) };

    let key = SessionKey {
        addr_a: low.0,
        port_a: low.1,
        addr_b: high.0,
        port_b: high.1,
        proto: fingerprint.proto,
        is_ipv6: fingerprint.is_ipv6,
    };

    KeyResult {
        key,
        reversed,
        valid_new_session: valid_new_session(fingerprint),
    }
}

fn valid_new_session(fingerprint: &FiveTuple) -> bool {
    if fingerprint.proto.is_tcp() {
        return fingerprint.tcp_flags_valid
            && fingerprint.tcp_flags.contains(TcpFlags::SYN)
            && !fingerprint.tcp_flags.contains(TcpFlags::ACK);
    }
    if fingerprint.proto.is_udp() {
        return fingerprint.l4_valid;
    }
    if fingerprint.proto.is_icmp() {
        return fingerprint.l4_valid
            && is_session_opening_icmp_type(fingerprint.src_port as u8, fingerprint.is_ipv6);
    }
    false
}

/// ICMP(v4) echo-request is type 8. ICMPv6 session-opening types are echo
/// request (128) and the neighbor-discovery family: router solicitation
/// (133), router advertisement (134), neighbor solicitation (135), neighbor
/// advertisement (136), and redirect (137).
pub fn is_session_opening_icmp_type(icmp_type: u8, is_ipv6: bool) -> bool {
    if is_ipv6 {
        matches!(icmp_type, 128 | 133..=137)
    } else {
        icmp_type == 8
    }
}
