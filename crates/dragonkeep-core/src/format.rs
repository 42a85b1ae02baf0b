//! Human-readable durations.
//!
//! Catalog build times are written as `"1d 5h 10s"`; remaining timer time
//! is shown to players in the same shape.

/// Errors from parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A number was not followed by a unit.
    #[error("missing unit after {0}")]
    MissingUnit(String),

    /// A unit was not one of the recognized names.
    #[error("unknown duration unit: {0}")]
    UnknownUnit(String),

    /// Text that is neither a number nor a unit.
    #[error("unexpected text in duration: {0}")]
    Unexpected(String),

    /// The total does not fit in 64 bits.
    #[error("duration is too large")]
    Overflow,
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

fn unit_seconds(unit: &str) -> Option<u64> {
    Some(match unit {
        "s" | "sec" | "second" | "seconds" => 1,
        "m" | "min" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        _ => return None,
    })
}

/// Parse a duration such as `"1d 5h 10s"` or `"90 minutes"` into seconds.
///
/// Whitespace between parts is optional. An empty string is zero.
///
/// # Errors
///
/// Returns a [`FormatError`] describing the first part that could not be
/// understood, or [`FormatError::Overflow`] if the total exceeds `u64`.
pub fn to_seconds(text: &str) -> Result<u64, FormatError> {
    let mut total: u64 = 0;
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(FormatError::Unexpected(rest.to_owned()));
        }
        let (digits, after) = rest.split_at(digits_end);
        // Only digits reach here, so a parse failure means the number is too big.
        let amount: u64 = digits.parse().ok().ok_or(FormatError::Overflow)?;

        let after = after.trim_start();
        let unit_end = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        if unit_end == 0 {
            return Err(FormatError::MissingUnit(digits.to_owned()));
        }
        let (unit, after) = after.split_at(unit_end);
        let scale = unit_seconds(&unit.to_ascii_lowercase())
            .ok_or_else(|| FormatError::UnknownUnit(unit.to_owned()))?;

        total = amount
            .checked_mul(scale)
            .and_then(|part| total.checked_add(part))
            .ok_or(FormatError::Overflow)?;
        rest = after.trim_start();
    }

    Ok(total)
}

/// Render seconds as `"1d 2h 3m 4s"`, omitting zero parts.
///
/// Zero renders as an empty string.
pub fn to_remaining_time(seconds: u64) -> String {
    let parts = [
        (seconds / DAY, 'd'),
        (seconds % DAY / HOUR, 'h'),
        (seconds % HOUR / MINUTE, 'm'),
        (seconds % MINUTE, 's'),
    ];
    parts
        .iter()
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, unit)| format!("{amount}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}
