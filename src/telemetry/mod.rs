pub mod metrics;
pub mod tracing_setup;

pub use metrics::{init_metrics, GlobalCountersSnapshot, Metrics};
pub use tracing_setup::{init_tracing_with_otel, shutdown_tracing};
