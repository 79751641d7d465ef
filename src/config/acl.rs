use crate::error::AclDataplaneError;
use crate::fingerprint::L4Proto;
use crate::rules::{Acl, AclRule, Action, PortRange};
use ipnet::IpNet;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ActionConfig {
    Deny,
    Permit,
    PermitReflect,
}

impl From<ActionConfig> for Action {
    fn from(value: ActionConfig) -> Self {
        match value {
            ActionConfig::Deny => Action::Deny,
            ActionConfig::Permit => Action::Permit,
            ActionConfig::PermitReflect => Action::PermitReflect,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RuleConfig {
    /// "tcp" | "udp" | "icmp" | "icmpv6"; omitted matches any protocol.
    #[serde(default)]
    pub proto: Option<String>,
    #[serde(default)]
    pub src_net: Option<String>,
    #[serde(default)]
    pub dst_net: Option<String>,
    #[serde(default)]
    pub src_port_low: Option<u16>,
    #[serde(default)]
    pub src_port_high: Option<u16>,
    #[serde(default)]
    pub dst_port_low: Option<u16>,
    #[serde(default)]
    pub dst_port_high: Option<u16>,
    #[serde(default)]
    pub icmp_type: Option<u8>,
    pub action: ActionConfig,
}

impl RuleConfig {
    pub fn into_rule(self) -> Result<AclRule, AclDataplaneError> {
        let proto = self
            .proto
            .as_deref()
            .map(parse_proto)
            .transpose()?;
        let src_net = self
            .src_net
            .as_deref()
            .map(|s| s.parse::<IpNet>().map_err(|e| invalid(format!("bad src_net {s}: {e}"))))
            .transpose()?;
        let dst_net = self
            .dst_net
            .as_deref()
            .map(|s| s.parse::<IpNet>().map_err(|e| invalid(format!("bad dst_net {s}: {e}"))))
            .transpose()?;

        Ok(AclRule {
            proto,
            src_net,
            dst_net,
            src_ports: PortRange {
                low: self.src_port_low.unwrap_or(0),
                high: self.src_port_high.unwrap_or(u16::MAX),
            },
            dst_ports: PortRange {
                low: self.dst_port_low.unwrap_or(0),
                high: self.dst_port_high.unwrap_or(u16::MAX),
            },
            icmp_type: self.icmp_type,
            action: self.action.into(),
        })
    }
}

fn parse_proto(s: &str) -> Result<L4Proto, AclDataplaneError> {
    match s.to_ascii_lowercase().as_str() {
        "tcp" => Ok(L4Proto::TCP),
        "udp" => Ok(L4Proto::UDP),
        "icmp" => Ok(L4Proto::ICMP),
        "icmpv6" => Ok(L4Proto::ICMPV6),
        other => Err(invalid(format!("unknown protocol {other}"))),
    }
}

fn invalid(msg: String) -> AclDataplaneError {
    AclDataplaneError::InvalidRule(msg)
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AclConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl AclConfig {
    pub fn into_acl(self) -> Result<Acl, AclDataplaneError> {
        let rules = self
            .rules
            .into_iter()
            .map(RuleConfig::into_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Acl { rules })
    }
}

/// Orders which ACLs (by index into the top-level `acls` list) apply to a
/// lookup context, first-to-last.
#[derive(Debug, Deserialize, Clone)]
pub struct LookupContextBinding {
    pub lc_index: u32,
    pub acl_indices: Vec<usize>,
}
