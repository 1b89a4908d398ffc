//! Duration parsing and formatting for thresholds and messages.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("valid regex")
});

/// Parse `"7d"`, `"12h"`, `"30m"`, `"45s"` or compound forms like `"1d12h"`.
///
/// A bare integer is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let caps = DURATION_RE.captures(s).ok_or_else(|| format!("invalid duration {s:?}"))?;
    let mut total = 0u64;
    for (idx, unit) in [(1, DAY), (2, HOUR), (3, MINUTE), (4, 1)] {
        if let Some(m) = caps.get(idx) {
            let n: u64 = m.as_str().parse().map_err(|e| format!("invalid duration {s:?}: {e}"))?;
            total = n
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(|| format!("duration {s:?} overflows"))?;
        }
    }
    Ok(Duration::from_secs(total))
}

/// Exact round-trippable form used when serializing configuration.
pub fn format_exact(d: Duration) -> String {
    let mut secs = d.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    for (unit, suffix) in [(DAY, 'd'), (HOUR, 'h'), (MINUTE, 'm'), (1, 's')] {
        let n = secs / unit;
        if n > 0 {
            out.push_str(&n.to_string());
            out.push(suffix);
            secs -= n * unit;
        }
    }
    out
}

/// Short human form for messages: whole days, else whole hours, else minutes.
pub fn format_age(d: chrono::Duration) -> String {
    let secs = d.num_seconds().max(0) as u64;
    if secs >= DAY {
        format!("{}d", secs / DAY)
    } else if secs >= HOUR {
        format!("{}h", (secs + HOUR / 2) / HOUR)
    } else if secs >= MINUTE {
        format!("{}m", secs / MINUTE)
    } else {
        format!("{secs}s")
    }
}
