//! The reference rule matcher: ACLs are ordered lists of rules, first match
//! wins, default deny, evaluated through the `RuleMatcher` trait object the
//! orchestrator depends on.

use super::matcher::{Action, MatchResult, RuleMatcher};
use crate::fingerprint::{FiveTuple, L4Proto};
use ahash::AHashMap;
use ipnet::IpNet;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy)]
pub struct PortRange {
    pub low: u16,
    pub high: u16,
}

impl PortRange {
    pub fn any() -> Self {
        Self { low: 0, high: u16::MAX }
    }

    fn contains(self, port: u16) -> bool {
        (self.low..=self.high).contains(&port)
    }
}

#[derive(Debug, Clone)]
pub struct AclRule {
    pub proto: Option<L4Proto>,
    pub src_net: Option<IpNet>,
    pub dst_net: Option<IpNet>,
    pub src_ports: PortRange,
    pub dst_ports: PortRange,
    /// ICMP type to match; `None` matches any type (only consulted for
    /// ICMP/ICMPv6 protocols).
    pub icmp_type: Option<u8>,
    pub action: Action,
}

impl AclRule {
    fn matches(&self, fingerprint: &FiveTuple) -> bool {
        if let Some(proto) = self.proto {
            if proto != fingerprint.proto {
                return false;
            }
        }
        if let Some(net) = self.src_net {
            if !net_contains(net, fingerprint.src_ip()) {
                return false;
            }
        }
        if let Some(net) = self.dst_net {
            if !net_contains(net, fingerprint.dst_ip()) {
                return false;
            }
        }

        if fingerprint.proto.is_icmp() {
            if let Some(icmp_type) = self.icmp_type {
                return icmp_type == fingerprint.src_port as u8;
            }
            return true;
        }

        self.src_ports.contains(fingerprint.src_port) && self.dst_ports.contains(fingerprint.dst_port)
    }
}

fn net_contains(net: IpNet, addr: IpAddr) -> bool {
    match (net, addr) {
        (IpNet::V4(n), IpAddr::V4(a)) => n.contains(&a),
        (IpNet::V6(n), IpAddr::V6(a)) => n.contains(&a),
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Acl {
    pub rules: Vec<AclRule>,
}

/// `lc_index -> ordered ACL list` reference matcher, grounded stylistically
/// on CIDR-containment checks over an ordered allow/deny list.
#[derive(Default)]
pub struct LinearAclMatcher {
    by_lc: AHashMap<u32, Vec<Acl>>,
}

impl LinearAclMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, lc_index: u32, acls: Vec<Acl>) {
        self.by_lc.insert(lc_index, acls);
    }
}

impl RuleMatcher for LinearAclMatcher {
    fn match_packet(&self, lc_index: u32, fingerprint: &FiveTuple, _ip6: bool) -> MatchResult {
        let Some(acls) = self.by_lc.get(&lc_index) else {
            return MatchResult::deny();
        };

        for (acl_pos, acl) in acls.iter().enumerate() {
            for (rule_index, rule) in acl.rules.iter().enumerate() {
                if rule.matches(fingerprint) {
                    return MatchResult {
                        action: rule.action,
                        acl_index: Some(acl_pos as u32),
                        rule_index: Some(rule_index as u32),
                    };
                }
            }
        }

        MatchResult::deny()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{ip_to_addr16, TcpFlags};

    fn tcp_tuple(dport: u16, flags: TcpFlags) -> FiveTuple {
        FiveTuple {
            src_addr: ip_to_addr16("10.0.0.1".parse().unwrap()),
            dst_addr: ip_to_addr16("10.0.0.2".parse().unwrap()),
            proto: L4Proto::TCP,
            src_port: 33000,
            dst_port: dport,
            is_ipv6: false,
            is_nonfirst_fragment: false,
            l4_valid: true,
            tcp_flags: flags,
            tcp_flags_valid: true,
            interface_index_lsb: 1,
            lookup_context: 0,
        }
    }

    #[test]
    fn first_match_wins_and_default_is_deny() {
        let mut matcher = LinearAclMatcher::new();
        matcher.bind(
            1,
            vec![Acl {
                rules: vec![AclRule {
                    proto: Some(L4Proto::TCP),
                    src_net: None,
                    dst_net: None,
                    src_ports: PortRange::any(),
                    dst_ports: PortRange { low: 80, high: 80 },
                    icmp_type: None,
                    action: Action::PermitReflect,
                }],
            }],
        );

        let permitted = tcp_tuple(80, TcpFlags::SYN);
        assert_eq!(matcher.match_packet(1, &permitted, false).action, Action::PermitReflect);

        let other_port = tcp_tuple(443, TcpFlags::SYN);
        assert_eq!(matcher.match_packet(1, &other_port, false).action, Action::Deny);

        assert_eq!(matcher.match_packet(99, &permitted, false).action, Action::Deny);
    }
}
