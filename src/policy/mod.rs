//! Control-plane inputs the dataplane reads but never writes on the hot
//! path: policy epochs and interface-to-lookup-context bindings.

mod epoch;
mod lookup_context;

pub use epoch::EpochTable;
pub use lookup_context::LookupContextTable;
