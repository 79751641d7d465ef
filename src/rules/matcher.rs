//! The rule-matcher contract the orchestrator depends on. Pure: the matcher
//! inspects a fingerprint and a lookup context and returns a verdict, never
//! touching the session table.

use crate::fingerprint::FiveTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deny = 0,
    Permit = 1,
    PermitReflect = 2,
}

/// Everything the orchestrator needs to act on and trace a match.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult {
    pub action: Action,
    pub acl_index: Option<u32>,
    pub rule_index: Option<u32>,
}

impl MatchResult {
    pub fn deny() -> Self {
        Self {
            action: Action::Deny,
            acl_index: None,
            rule_index: None,
        }
    }
}

/// ACLs bound to `lc_index` are evaluated in order, and within each ACL,
/// rules in order; first match wins; default on no match is deny. Must not
/// mutate the session table.
pub trait RuleMatcher: Send + Sync {
    fn match_packet(&self, lc_index: u32, fingerprint: &FiveTuple, ip6: bool) -> MatchResult;
}
