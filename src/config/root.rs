use serde::Deserialize;

use super::acl::{AclConfig, LookupContextBinding};
use super::interface::InterfaceConfig;
use super::session::SessionLimitsConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};

/// Top-level configuration: interface bindings, the ACL rule sets bound to
/// each lookup context, session admission caps, and the ambient
/// logging/telemetry stack.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Interfaces this node runs on, and which lookup context each arc is
    /// bound to.
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    /// ACLs, referenced by index from `lookup_contexts`.
    #[serde(default)]
    pub acls: Vec<AclConfig>,
    /// Which ACLs (in order) apply to each lookup context.
    #[serde(default)]
    pub lookup_contexts: Vec<LookupContextBinding>,
    /// Per-interface and per-worker session admission caps.
    #[serde(default)]
    pub session: SessionLimitsConfig,
    /// Whether a bumped policy epoch invalidates matching sessions.
    /// Default: true.
    #[serde(default = "default_true")]
    pub reclassify_sessions: bool,
    /// Number of workers to build contexts for.
    #[serde(default = "default_worker_count")]
    pub workers: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_true() -> bool {
    true
}

fn default_worker_count() -> usize {
    1
}
