use crate::session::AdmissionLimits;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct SessionLimitsConfig {
    #[serde(default = "default_per_interface_cap")]
    pub per_interface_cap: usize,
    #[serde(default = "default_per_worker_cap")]
    pub per_worker_cap: usize,
}

impl Default for SessionLimitsConfig {
    fn default() -> Self {
        Self {
            per_interface_cap: default_per_interface_cap(),
            per_worker_cap: default_per_worker_cap(),
        }
    }
}

impl From<SessionLimitsConfig> for AdmissionLimits {
    fn from(cfg: SessionLimitsConfig) -> Self {
        AdmissionLimits {
            per_interface_cap: cfg.per_interface_cap,
            per_worker_cap: cfg.per_worker_cap,
        }
    }
}

fn default_per_interface_cap() -> usize {
    65536
}

fn default_per_worker_cap() -> usize {
    262144
}
