//! Rule matching: the `RuleMatcher` contract the orchestrator depends on,
//! plus `LinearAclMatcher`, the linear first-match-wins evaluator this
//! crate uses.

mod acl;
mod matcher;

pub use acl::{Acl, AclRule, LinearAclMatcher, PortRange};
pub use matcher::{Action, MatchResult, RuleMatcher};
