//! Textual durations shared by the markdown and JSON formats.
//!
//! The format is the `1h30m0s` style: an optional sign followed by decimal
//! numbers with a unit suffix. Parsing is lenient and falls back to a few
//! human spellings ("2 hours 15 minutes") before giving up with zero.

use std::fmt::Write;
use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::Serializer;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

static HOURS_MINUTES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*hours?\s*(\d+)\s*minutes?").ok());
static HOURS_ONLY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*hours?").ok());
static MINUTES_ONLY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*minutes?").ok());

/// Signed nanosecond count, the representation stored in the database.
#[must_use]
pub fn to_nanos(d: TimeDelta) -> i64 {
    d.num_nanoseconds().unwrap_or(if d < TimeDelta::zero() {
        i64::MIN
    } else {
        i64::MAX
    })
}

#[must_use]
pub fn from_nanos(nanos: i64) -> TimeDelta {
    TimeDelta::nanoseconds(nanos)
}

/// Render a duration as `1h30m0s`, `45m0s`, `1.5s`, `250ms` or `0s`.
#[must_use]
pub fn format_duration(d: TimeDelta) -> String {
    let nanos = i128::from(to_nanos(d));
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let abs = nanos.unsigned_abs();

    if abs < NANOS_PER_SECOND {
        let (unit, scale, digits) = if abs < NANOS_PER_MICRO {
            ("ns", 1, 0)
        } else if abs < NANOS_PER_MILLI {
            ("µs", NANOS_PER_MICRO, 3)
        } else {
            ("ms", NANOS_PER_MILLI, 6)
        };
        write_fraction(&mut out, abs / scale, abs % scale, digits);
        out.push_str(unit);
        return out;
    }

    let hours = abs / NANOS_PER_HOUR;
    let minutes = (abs % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let rest = abs % NANOS_PER_MINUTE;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    write_fraction(
        &mut out,
        rest / NANOS_PER_SECOND,
        rest % NANOS_PER_SECOND,
        9,
    );
    out.push('s');
    out
}

fn write_fraction(out: &mut String, whole: u128, frac: u128, digits: usize) {
    let _ = write!(out, "{whole}");
    if frac > 0 {
        let padded = format!("{frac:0digits$}");
        out.push('.');
        out.push_str(padded.trim_end_matches('0'));
    }
}

/// Parse a duration written by [`format_duration`] or by a person.
///
/// Never fails: empty, `N/A` and unrecognised input give zero.
#[must_use]
pub fn parse_duration(input: &str) -> TimeDelta {
    let s = input.trim().to_lowercase();
    if s.is_empty() || s == "n/a" {
        return TimeDelta::zero();
    }
    if let Some(d) = parse_unit_sequence(&s) {
        return d;
    }

    parse_human(&s).unwrap_or_else(TimeDelta::zero)
}

fn parse_human(s: &str) -> Option<TimeDelta> {
    if let (Some(h), Some(m)) = (
        capture_number(HOURS_MINUTES.as_ref(), s, 1),
        capture_number(HOURS_MINUTES.as_ref(), s, 2),
    ) {
        return TimeDelta::try_hours(h)?.checked_add(&TimeDelta::try_minutes(m)?);
    }
    if let Some(h) = capture_number(HOURS_ONLY.as_ref(), s, 1) {
        return TimeDelta::try_hours(h);
    }
    TimeDelta::try_minutes(capture_number(MINUTES_ONLY.as_ref(), s, 1)?)
}

fn capture_number(re: Option<&Regex>, s: &str, group: usize) -> Option<i64> {
    let caps = re?.captures(s)?;
    caps.get(group)?.as_str().parse().ok()
}

/// Strict `[-+]?(number unit)+` grammar; `None` when the input does not fit.
fn parse_unit_sequence(s: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            _ => return None,
        };
        rest = &rest[unit_end..];

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        let mut value = whole.checked_mul(scale)?;
        if !frac_part.is_empty() {
            let digits = u32::try_from(frac_part.len().min(18)).ok()?;
            let frac: u128 = frac_part[..digits as usize].parse().ok()?;
            value = value.checked_add(frac * scale / 10u128.pow(digits))?;
        }
        total = total.checked_add(value)?;
    }

    let nanos = i64::try_from(total).ok()?;
    Some(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

/// `serialize_with` helper so durations appear as text in JSON output.
pub fn serialize<S>(d: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
