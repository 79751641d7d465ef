//! Packet fingerprinting: turning a raw packet buffer into the 5-tuple the
//! rest of the pipeline keys its session lookups and rule matches on.

mod extractor;
mod types;

pub use extractor::{extract, PacketBuf, PacketInterfaces};
pub use types::{ip_to_addr16, FiveTuple, L4Proto, TcpFlags};
