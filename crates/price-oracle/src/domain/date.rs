//! # Date Validator
//!
//! Parses the proof's `Date` header (`"<wkday>, DD Mon YYYY HH:MM:SS <tz>"`)
//! into a comparable `YYYYMMDDHHMMSS` number and enforces freshness.
//!
//! Component ranges are checked individually with no calendar cross-check:
//! `"Fri, 30 Feb 2018 ..."` is accepted.

use super::errors::ProofError;

/// Oldest year a proof may carry.
pub const MIN_YEAR: u64 = 2018;
/// Latest year a proof may carry.
pub const MAX_YEAR: u64 = 3000;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Date components read from a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderDate {
    pub year: u64,
    pub month: u64,
    pub day: u64,
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
}

impl HeaderDate {
    /// `year·10^10 + month·10^8 + day·10^6 + hour·10^4 + minute·10^2 + second`
    pub fn timestamp(&self) -> u64 {
        self.year * 10_000_000_000
            + self.month * 100_000_000
            + self.day * 1_000_000
            + self.hour * 10_000
            + self.minute * 100
            + self.second
    }
}

/// Parse and range-check a date header value.
pub fn parse_date(raw: &[u8]) -> Result<HeaderDate, ProofError> {
    let text = std::str::from_utf8(raw).map_err(|_| invalid("not UTF-8"))?;

    let (_weekday, rest) = text
        .trim_start()
        .split_once(',')
        .ok_or_else(|| invalid("missing weekday separator"))?;

    let mut fields = rest.split_ascii_whitespace();
    let day = number(fields.next(), "day")?;
    let month = month_number(fields.next())?;
    let year = number(fields.next(), "year")?;
    let time = fields.next().ok_or_else(|| invalid("missing time"))?;
    fields.next().ok_or_else(|| invalid("missing time zone"))?;
    if fields.next().is_some() {
        return Err(invalid("trailing fields"));
    }

    let mut clock = time.split(':');
    let hour = number(clock.next(), "hour")?;
    let minute = number(clock.next(), "minute")?;
    let second = number(clock.next(), "second")?;
    if clock.next().is_some() {
        return Err(invalid("too many time components"));
    }

    check_range("day", day, 1, 31)?;
    check_range("month", month, 1, 12)?;
    check_range("year", year, MIN_YEAR, MAX_YEAR)?;
    check_range("hour", hour, 0, 23)?;
    check_range("minute", minute, 0, 59)?;
    check_range("second", second, 0, 59)?;

    Ok(HeaderDate {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Timestamp of `raw` if it is strictly newer than `last_update`.
pub fn validate_date(raw: &[u8], last_update: u64) -> Result<u64, ProofError> {
    let timestamp = parse_date(raw)?.timestamp();
    if timestamp <= last_update {
        return Err(ProofError::StaleDate {
            timestamp,
            last_update,
        });
    }
    Ok(timestamp)
}

fn number(field: Option<&str>, name: &str) -> Result<u64, ProofError> {
    let field = field.ok_or_else(|| invalid(format!("missing {name}")))?;
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("{name} is not numeric: {field:?}")));
    }
    field
        .parse()
        .map_err(|_| invalid(format!("{name} out of range: {field}")))
}

fn month_number(field: Option<&str>) -> Result<u64, ProofError> {
    let field = field.ok_or_else(|| invalid("missing month"))?;
    MONTHS
        .iter()
        .position(|m| *m == field)
        .map(|index| index as u64 + 1)
        .ok_or_else(|| invalid(format!("unknown month: {field:?}")))
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<(), ProofError> {
    if value < min || value > max {
        return Err(invalid(format!("{name} {value} outside {min}..={max}")));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ProofError {
    ProofError::InvalidDate(reason.into())
}
