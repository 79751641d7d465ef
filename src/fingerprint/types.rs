use bitflags::bitflags;
use std::net::IpAddr;

bitflags! {
    /// TCP control bits, laid out exactly like the wire byte so accumulating
    /// flags across a session ("OR the packet's TCP flags into the
    /// per-direction accumulator") is a plain bitwise-or.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
        const ECE = 0x40;
        const CWR = 0x80;
    }
}

/// L4 protocol number (IANA assigned). Only TCP/UDP/ICMP/ICMPv6 get
/// special-cased port/type-code handling; anything else is carried through
/// unmodified with `l4_valid = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct L4Proto(pub u8);

impl L4Proto {
    pub const ICMP: L4Proto = L4Proto(1);
    pub const TCP: L4Proto = L4Proto(6);
    pub const UDP: L4Proto = L4Proto(17);
    pub const ICMPV6: L4Proto = L4Proto(58);

    pub fn is_tcp(self) -> bool {
        self == Self::TCP
    }

    pub fn is_udp(self) -> bool {
        self == Self::UDP
    }

    pub fn is_icmp(self) -> bool {
        self == Self::ICMP || self == Self::ICMPV6
    }
}

/// A fixed-size 5-tuple-plus-flags record identifying a packet's flow.
///
/// Addresses are always stored zero-extended to 16 bytes (IPv4 addresses
/// occupy the first 4 bytes); `is_ipv6` disambiguates. `src_port`/`dst_port`
/// carry ICMP (type, code) when `proto` is ICMP/ICMPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub src_addr: [u8; 16],
    pub dst_addr: [u8; 16],
    pub proto: L4Proto,
    pub src_port: u16,
    pub dst_port: u16,
    pub is_ipv6: bool,
    pub is_nonfirst_fragment: bool,
    pub l4_valid: bool,
    pub tcp_flags: TcpFlags,
    pub tcp_flags_valid: bool,
    /// Low 16 bits of the ingress/egress interface index this tuple was
    /// extracted against.
    pub interface_index_lsb: u16,
    /// Lookup context this packet will be (or was) matched against.
    pub lookup_context: u32,
}

impl FiveTuple {
    pub fn src_ip(&self) -> IpAddr {
        addr16_to_ip(self.src_addr, self.is_ipv6)
    }

    pub fn dst_ip(&self) -> IpAddr {
        addr16_to_ip(self.dst_addr, self.is_ipv6)
    }
}

fn addr16_to_ip(bytes: [u8; 16], is_ipv6: bool) -> IpAddr {
    if is_ipv6 {
        IpAddr::from(bytes)
    } else {
        IpAddr::from([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

pub fn ip_to_addr16(ip: IpAddr) -> [u8; 16] {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            [o[0], o[1], o[2], o[3], 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        }
        IpAddr::V6(v6) => v6.octets(),
    }
}
