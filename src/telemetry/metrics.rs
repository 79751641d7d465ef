use crate::pipeline::GlobalCounters;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The seven named packet counters, exported through an
/// `opentelemetry`/`prometheus` meter for scraping. Serving the `/metrics`
/// endpoint itself is left to the embedding application; this crate only
/// owns the registry and the counter instruments.
#[derive(Clone)]
pub struct Metrics {
    checked: Counter<u64>,
    permitted: Counter<u64>,
    denied: Counter<u64>,
    new_sessions: Counter<u64>,
    existing_session_hits: Counter<u64>,
    restart_session_timer: Counter<u64>,
    too_many_sessions: Counter<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            checked: meter
                .u64_counter("acl_dataplane_checked_packets")
                .with_description("checked packets")
                .build(),
            permitted: meter
                .u64_counter("acl_dataplane_permit_packets")
                .with_description("ACL permit packets")
                .build(),
            denied: meter
                .u64_counter("acl_dataplane_deny_packets")
                .with_description("ACL deny packets")
                .build(),
            new_sessions: meter
                .u64_counter("acl_dataplane_new_sessions_added")
                .with_description("new sessions added")
                .build(),
            existing_session_hits: meter
                .u64_counter("acl_dataplane_existing_session_packets")
                .with_description("existing session packets")
                .build(),
            restart_session_timer: meter
                .u64_counter("acl_dataplane_restart_session_timer")
                .with_description("restart session timer")
                .build(),
            too_many_sessions: meter
                .u64_counter("acl_dataplane_too_many_sessions")
                .with_description("too many sessions to add new")
                .build(),
        }
    }

    /// Copy every worker-flushed global counter's current total into the
    /// OTel instruments. Counters only grow, so each call adds the delta
    /// since the last observation.
    pub fn observe(&self, global: &GlobalCounters, previous: &mut GlobalCountersSnapshot) {
        add_delta(&self.checked, &global.checked, &mut previous.checked);
        add_delta(&self.permitted, &global.permitted, &mut previous.permitted);
        add_delta(&self.denied, &global.denied, &mut previous.denied);
        add_delta(&self.new_sessions, &global.new_sessions, &mut previous.new_sessions);
        add_delta(
            &self.existing_session_hits,
            &global.existing_session_hits,
            &mut previous.existing_session_hits,
        );
        add_delta(
            &self.restart_session_timer,
            &global.restart_session_timer,
            &mut previous.restart_session_timer,
        );
        add_delta(
            &self.too_many_sessions,
            &global.too_many_sessions,
            &mut previous.too_many_sessions,
        );
    }
}

fn add_delta(counter: &Counter<u64>, source: &std::sync::atomic::AtomicU64, previous: &mut u64) {
    let current = source.load(Ordering::Relaxed);
    let delta = current.saturating_sub(*previous);
    if delta > 0 {
        counter.add(delta, &[]);
    }
    *previous = current;
}

/// Last-observed value of each global counter, used to turn the
/// monotonic atomics into OTel `add()` deltas.
#[derive(Default)]
pub struct GlobalCountersSnapshot {
    checked: u64,
    permitted: u64,
    denied: u64,
    new_sessions: u64,
    existing_session_hits: u64,
    restart_session_timer: u64,
    too_many_sessions: u64,
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(meter_provider);

    let meter = global::meter("acl-dataplane");
    let metrics = Arc::new(Metrics::new(meter));

    Ok((metrics, registry))
}
