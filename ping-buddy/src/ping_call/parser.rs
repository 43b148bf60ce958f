//! Interprets whatever a single ping invocation printed on stdout.
//!
//! This is not a general ICMP parser. It knows the reply line formats of the two ping
//! families we drive (see [super::Platform]) and a handful of keywords, nothing more.
//! Rules are tried top to bottom, first match wins.
//!
//! Reply lines are matched case-insensitively, but the timeout/unreachable keywords
//! are matched case-sensitively. The asymmetry is long-standing behaviour and is kept
//! as is, e.g. `request timed out` (lowercase) ends up as [ProbeResult::Unknown].

use lazy_static::lazy_static;
use log::trace;
use regex::{Captures, Regex};

use crate::model::ProbeResult;

lazy_static! {
    // Reply from 192.168.1.1: bytes=32 time=15ms TTL=64
    // Reply from 192.168.1.1: bytes=32 time<1ms TTL=64
    static ref REPLY_FROM_RE: Regex = Regex::new(
        r"(?i)Reply from (?P<ip>[0-9a-f.:]+?): bytes=(?P<bytes>\d+) time[=<](?P<time>\d+) ?ms TTL=(?P<ttl>\d+)"
    ).expect("Unable to compile reply-from regex");

    // 64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=23.441 ms
    // 64 bytes from example.com (93.184.216.34): icmp_seq=1 ttl=56 time=23.4 ms
    static ref BYTES_FROM_RE: Regex = Regex::new(
        r"(?i)(?P<bytes>\d+) bytes from (?:\S+ \()?(?P<ip>[0-9a-f.:]+?)\)?: icmp_seq=(?P<seq>\d+) ttl=(?P<ttl>\d+) time=(?P<time>\d+(?:\.\d+)?) ms"
    ).expect("Unable to compile bytes-from regex");
}

const TIMEOUT_MARKERS: [&str; 3] = ["Request timed out", "Request timeout", "no answer"];
const UNREACHABLE_MARKERS: [&str; 2] = ["Destination host unreachable", "Host unreachable"];

type ReplyRule = (&'static Regex, fn(&Captures) -> Option<ProbeResult>);

fn reply_rules() -> [ReplyRule; 2] {
    [
        (&*REPLY_FROM_RE, from_reply_from),
        (&*BYTES_FROM_RE, from_bytes_from),
    ]
}

/// Never fails: anything not recognised degrades to [ProbeResult::Unknown].
/// `target` is only used for tracing.
pub fn parse(raw: &str, target: &str) -> ProbeResult {
    let rules = reply_rules();
    for line in raw.lines() {
        for (regex, to_result) in rules.iter() {
            if let Some(result) = regex.captures(line).and_then(|caps| to_result(&caps)) {
                trace!("Reply line for {}: {}", target, line);
                return result;
            }
        }
    }

    if contains_any(raw, &TIMEOUT_MARKERS) {
        ProbeResult::Timeout
    } else if contains_any(raw, &UNREACHABLE_MARKERS) {
        ProbeResult::Unreachable
    } else {
        trace!("Unrecognised output for {}: {:?}", target, raw);
        ProbeResult::Unknown {
            raw_output: raw.to_string(),
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn from_reply_from(caps: &Captures) -> Option<ProbeResult> {
    Some(ProbeResult::Success {
        ip: caps["ip"].to_string(),
        bytes_returned: caps["bytes"].parse().ok()?,
        round_trip_ms: caps["time"].parse().ok()?,
        ttl: caps["ttl"].parse().ok()?,
        sequence: None,
    })
}

fn from_bytes_from(caps: &Captures) -> Option<ProbeResult> {
    let time_ms: f64 = caps["time"].parse().ok()?;
    // f64::round() rounds half away from zero, i.e. half-up for a duration
    let rounded = time_ms.round();
    if rounded > u32::MAX as f64 {
        return None;
    }
    Some(ProbeResult::Success {
        ip: caps["ip"].to_string(),
        bytes_returned: caps["bytes"].parse().ok()?,
        round_trip_ms: rounded as u32,
        ttl: caps["ttl"].parse().ok()?,
        sequence: Some(caps["seq"].parse().ok()?),
    })
}
