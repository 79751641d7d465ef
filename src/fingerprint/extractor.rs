//! Turns a packet buffer into a [`FiveTuple`]. Mirrors VPP's
//! `acl_plugin_fill_5tuple_inline`: never fails, marks `l4_valid = false` on
//! anything it cannot parse instead of returning an error.

use super::types::{FiveTuple, L4Proto, TcpFlags};

const ETHERNET_HEADER_LEN: usize = 14;

/// A read-only view of a packet, positioned so offset 0 is either the start
/// of the Ethernet frame (`is_l2_path`) or the start of the IP header
/// (L3 path), matching VPP's buffer offset convention.
#[derive(Debug, Clone, Copy)]
pub struct PacketBuf<'a> {
    data: &'a [u8],
}

impl<'a> PacketBuf<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn get(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        self.get(offset, 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn u8_at(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }
}

/// A packet's two interfaces: the one it arrived on and the one it's
/// destined for. Input-path nodes key session state off `rx_index`,
/// output-path nodes off `tx_index`.
#[derive(Debug, Clone, Copy)]
pub struct PacketInterfaces {
    pub rx_index: u32,
    pub tx_index: u32,
}

impl PacketInterfaces {
    fn selected(&self, is_input: bool) -> u32 {
        if is_input {
            self.rx_index
        } else {
            self.tx_index
        }
    }
}

/// Extract the 5-tuple fingerprint from `buf`.
///
/// `ip6` tells the extractor which IP version to expect (the dataplane node
/// is specialized per IP version, it does not sniff it); `is_input`/
/// `is_l2_path` select the interface slot and whether an Ethernet header
/// must be skipped to reach the IP header.
pub fn extract(
    buf: PacketBuf<'_>,
    interfaces: PacketInterfaces,
    lookup_context: u32,
    ip6: bool,
    is_input: bool,
    is_l2_path: bool,
) -> FiveTuple {
    let l3_offset = if is_l2_path { ETHERNET_HEADER_LEN } else { 0 };
    let interface_index_lsb = (interfaces.selected(is_input) & 0xffff) as u16;

    let mut tuple = FiveTuple {
        src_addr: [0; 16],
        dst_addr: [0; 16],
        proto: L4Proto(0),
        src_port: 0,
        dst_port: 0,
        is_ipv6: ip6,
        is_nonfirst_fragment: false,
        l4_valid: false,
        tcp_flags: TcpFlags::empty(),
        tcp_flags_valid: false,
        interface_index_lsb,
        lookup_context,
    };

    let Some(header) = (if ip6 {
        parse_ipv6(&buf, l3_offset)
    } else {
        parse_ipv4(&buf, l3_offset)
    }) else {
        return tuple;
    };

    tuple.src_addr = header.src;
    tuple.dst_addr = header.dst;
    tuple.proto = header.proto;
    tuple.is_nonfirst_fragment = header.is_nonfirst_fragment;

    if header.is_nonfirst_fragment {
        return tuple;
    }

    parse_l4(&buf, header.l4_offset, header.proto, &mut tuple);
    tuple
}

struct IpHeader {
    src: [u8; 16],
    dst: [u8; 16],
    proto: L4Proto,
    l4_offset: usize,
    is_nonfirst_fragment: bool,
}

fn parse_ipv4(buf: &PacketBuf<'_>, offset: usize) -> Option<IpHeader> {
    let vihl = buf.u8_at(offset)?;
    let ihl_words = vihl & 0x0f;
    let ihl_bytes = (ihl_words as usize).max(5) * 4;

    let proto = L4Proto(buf.u8_at(offset + 9)?);
    let frag_field = buf.u16_at(offset + 6)?;
    let is_nonfirst_fragment = (frag_field & 0x1fff) != 0;

    let src = buf.get(offset + 12, 4)?;
    let dst = buf.get(offset + 16, 4)?;

    Some(IpHeader {
        src: [src[0], src[1], src[2], src[3], 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        dst: [dst[0], dst[1], dst[2], dst[3], 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        proto,
        l4_offset: offset + ihl_bytes,
        is_nonfirst_fragment,
    })
}

/// Only a directly-present IPv6 Fragment Header (next-header 44) is
/// recognized; a chain of other extension headers before it is not walked.
/// This is a deliberate simplification of the original's generic L4 header
/// walk (see DESIGN.md).
fn parse_ipv6(buf: &PacketBuf<'_>, offset: usize) -> Option<IpHeader> {
    let next_header = buf.u8_at(offset + 6)?;
    let src = buf.get(offset + 8, 16)?;
    let dst = buf.get(offset + 24, 16)?;
    let mut src_arr = [0u8; 16];
    let mut dst_arr = [0u8; 16];
    src_arr.copy_from_slice(src);
    dst_arr.copy_from_slice(dst);

    const IPV6_HEADER_LEN: usize = 40;
    const FRAGMENT_HEADER: u8 = 44;

    if next_header == FRAGMENT_HEADER {
        let frag_offset_field = buf.u16_at(offset + IPV6_HEADER_LEN + 2)?;
        let is_nonfirst_fragment = (frag_offset_field >> 3) != 0;
        let inner_proto = buf.u8_at(offset + IPV6_HEADER_LEN)?;
        return Some(IpHeader {
            src: src_arr,
            dst: dst_arr,
            proto: L4Proto(inner_proto),
            l4_offset: offset + IPV6_HEADER_LEN + 8,
            is_nonfirst_fragment,
        });
    }

    Some(IpHeader {
        src: src_arr,
        dst: dst_arr,
        proto: L4Proto(next_header),
        l4_offset: offset + IPV6_HEADER_LEN,
        is_nonfirst_fragment: false,
    })
}

fn parse_l4(buf: &PacketBuf<'_>, l4_offset: usize, proto: L4Proto, tuple: &mut FiveTuple) {
    if proto.is_tcp() {
        let (Some(sport), Some(dport), Some(flags)) = (
            buf.u16_at(l4_offset),
            buf.u16_at(l4_offset + 2),
            buf.u8_at(l4_offset + 13),
        ) else {
            return;
        };
        tuple.src_port = sport;
        tuple.dst_port = dport;
        tuple.tcp_flags = TcpFlags::from_bits_truncate(flags);
        tuple.tcp_flags_valid = true;
        tuple.l4_valid = true;
    } else if proto.is_udp() {
        let (Some(sport), Some(dport)) = (buf.u16_at(l4_offset), buf.u16_at(l4_offset + 2)) else {
            return;
        };
        tuple.src_port = sport;
        tuple.dst_port = dport;
        tuple.l4_valid = true;
    } else if proto.is_icmp() {
        let (Some(icmp_type), Some(icmp_code)) = (buf.u8_at(l4_offset), buf.u8_at(l4_offset + 1))
        else {
            return;
        };
        tuple.src_port = icmp_type as u16;
        tuple.dst_port = icmp_code as u16;
        tuple.l4_valid = true;
    }
}
