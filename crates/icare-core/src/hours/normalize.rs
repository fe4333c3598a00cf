//! Cleanup of raw operating-hour strings.
//!
//! Vendor feeds mix annotations like `"09:00(접수마감)"` or `"18시30분"` into
//! time fields and occasionally publish impossible hours. Everything here is
//! infallible; callers that need a real clock value use [`parse_clock`] and
//! treat `None` as "no usable window".

use chrono::NaiveTime;

const MIDNIGHT: &str = "00:00";

/// Substituted for `30:xx` values seen in the hospital feed. A guess, not a
/// parse of the literal value.
const CORRUPT_HOUR_FALLBACK: &str = "18:00";

/// Canonicalizes a raw time string into `HH:MM`-ish text.
///
/// - Hangul characters and surrounding whitespace are removed.
/// - `24:..` becomes `00:00` with no day rollover.
/// - `30:..` becomes `18:00`.
/// - Blank input becomes `00:00`.
///
/// Anything else is returned cleaned but otherwise untouched; strict parsing
/// happens in [`parse_clock`].
#[must_use]
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !is_hangul(*c)).collect();
    let cleaned = stripped.trim();

    if cleaned.is_empty() || cleaned.starts_with("24:") {
        return MIDNIGHT.to_string();
    }
    if cleaned.starts_with("30:") {
        return CORRUPT_HOUR_FALLBACK.to_string();
    }
    cleaned.to_string()
}

/// Normalizes `raw` and parses it as a 24-hour `HH:MM` clock time.
#[must_use]
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(&normalize(raw), "%H:%M").ok()
}

/// Converts compact vendor times (`"0930"`) into `"09:30"`.
///
/// Values that already contain a colon pass through trimmed. Returns `None`
/// for blank or non-numeric input so callers can treat the slot as absent.
#[must_use]
pub fn canonical_hhmm(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(':') {
        return Some(trimmed.to_string());
    }
    if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Some(format!("{}:{}", &trimmed[..2], &trimmed[2..]));
    }
    None
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'   // syllables
        | '\u{1100}'..='\u{11FF}' // jamo
        | '\u{3130}'..='\u{318F}' // compatibility jamo
    )
}
