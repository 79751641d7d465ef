//! Session key normalization, the concurrent session table, and per-hit
//! state tracking.

mod key;
mod lru;
mod record;
mod table;
mod tracking;

pub use key::{is_session_opening_icmp_type, make_key, KeyResult, SessionKey};
pub use lru::LruList;
pub use record::{FullSessionId, PolicyEpoch, SessionRecord, TimeoutClass};
pub use table::{AdmissionLimits, SessionTable};
pub use tracking::{track, TrackResult};
