use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AclDataplaneError, Result};
use crate::pipeline::GlobalCounters;
use crate::pipeline::SharedState;
use crate::rules::LinearAclMatcher;
use crate::session::SessionTable;
use crate::worker::WorkerContext;

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| AclDataplaneError::Config(format!("failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&text)
        .map_err(|e| AclDataplaneError::Config(format!("failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.interfaces.is_empty() {
        return Err(AclDataplaneError::NoInterfaces);
    }

    let acl_count = cfg.acls.len();
    for binding in &cfg.lookup_contexts {
        for &acl_index in &binding.acl_indices {
            if acl_index >= acl_count {
                return Err(AclDataplaneError::Config(format!(
                    "lookup context {} references out-of-range ACL index {acl_index}",
                    binding.lc_index
                )));
            }
        }
    }

    let bound_lcs: HashSet<u32> = cfg.lookup_contexts.iter().map(|b| b.lc_index).collect();
    for iface in &cfg.interfaces {
        if let Some(lc) = iface.input_lookup_context {
            if !bound_lcs.contains(&lc) {
                return Err(AclDataplaneError::UnknownLookupContext(lc));
            }
        }
        if let Some(lc) = iface.output_lookup_context {
            if !bound_lcs.contains(&lc) {
                return Err(AclDataplaneError::UnknownLookupContext(lc));
            }
        }
    }

    if cfg.workers == 0 {
        return Err(AclDataplaneError::Config("workers must be > 0".into()));
    }

    Ok(())
}

/// Turn a validated config into the runtime pieces a caller wires into
/// `process_frame`: the shared dataplane state, the reference rule matcher,
/// and one `WorkerContext` per configured worker.
pub fn build_runtime(cfg: &Config) -> Result<(SharedState, LinearAclMatcher, Vec<WorkerContext>)> {
    let sessions = SessionTable::new(cfg.session.clone().into());
    let global_counters = Arc::new(GlobalCounters::default());
    let mut shared = SharedState::new(sessions, global_counters.clone());
    shared.reclassify_sessions = cfg.reclassify_sessions;

    for iface in &cfg.interfaces {
        if let Some(lc) = iface.input_lookup_context {
            shared.lookup_contexts.bind(iface.index, true, lc);
        }
        if let Some(lc) = iface.output_lookup_context {
            shared.lookup_contexts.bind(iface.index, false, lc);
        }
    }

    let mut matcher = LinearAclMatcher::new();
    for binding in &cfg.lookup_contexts {
        let acls = binding
            .acl_indices
            .iter()
            .map(|&i| cfg.acls[i].clone().into_acl())
            .collect::<Result<Vec<_>>>()?;
        matcher.bind(binding.lc_index, acls);
    }

    let workers = (0..cfg.workers as u32)
        .map(|i| WorkerContext::new(i, global_counters.clone()))
        .collect();

    Ok((shared, matcher, workers))
}
