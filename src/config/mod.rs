mod acl;
mod interface;
mod loader;
mod root;
mod session;
mod telemetry;

pub use acl::{AclConfig, ActionConfig, LookupContextBinding, RuleConfig};
pub use interface::InterfaceConfig;
pub use loader::{build_runtime, load_from_path};
pub use root::Config;
pub use session::SessionLimitsConfig;
pub use telemetry::{LoggingConfig, TelemetryConfig};
