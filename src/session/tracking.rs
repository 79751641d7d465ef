//! Per-hit session state update: refresh activity timestamps, accumulate
//! TCP flags, and reclassify the timeout class.

use super::record::{SessionRecord, TimeoutClass};
use crate::fingerprint::{FiveTuple, TcpFlags};

/// Result of tracking a hit: the class before and after the update, so the
/// orchestrator can decide whether a timer restart (LRU move) is needed.
pub struct TrackResult {
    pub old_class: TimeoutClass,
    pub new_class: TimeoutClass,
}

/// A packet on an existing session is always permitted at this layer; the
/// only question this answers is which aging queue it now belongs to.
pub fn track(sess: &SessionRecord, fingerprint: &FiveTuple, reversed: bool, now: u64) -> TrackResult {
    let old_class = sess.timeout_class();

    sess.touch(reversed, now);
    if fingerprint.tcp_flags_valid {
        sess.accumulate_flags(reversed, fingerprint.tcp_flags);
    }
    sess.bump_packet_count(reversed);

    let new_class = reclassify(sess, fingerprint);
    sess.set_timeout_class(new_class);

    TrackResult { old_class, new_class }
}

fn reclassify(sess: &SessionRecord, fingerprint: &FiveTuple) -> TimeoutClass {
    if fingerprint.proto.is_tcp() {
        let fwd = sess.accumulated_flags(false);
        let rev = sess.accumulated_flags(true);

        let both_fin = fwd.contains(TcpFlags::FIN) && rev.contains(TcpFlags::FIN);
        let either_rst = fwd.contains(TcpFlags::RST) || rev.contains(TcpFlags::RST);
        if both_fin || either_rst {
            return TimeoutClass::TcpTransient;
        }

        let seen_both_directions = sess.packet_count(false) >= 1 && sess.packet_count(true) >= 1;
        let ack_seen = fwd.contains(TcpFlags::ACK) || rev.contains(TcpFlags::ACK);
        if seen_both_directions && ack_seen {
            return TimeoutClass::TcpEstablished;
        }

        return TimeoutClass::Transient;
    }

    // UDP/ICMP: established once either direction has seen a second packet.
    if sess.packet_count(false) >= 2 || sess.packet_count(true) >= 2 {
        TimeoutClass::Established
    } else {
        TimeoutClass::Transient
    }
}
