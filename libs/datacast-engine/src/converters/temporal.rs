use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

use datacast_api::config::CoercionOptions;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

use super::text_of;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{1,2}):([0-9]{1,2})(?:\.([0-9]+))?$").unwrap());
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-)?([0-9]{1,3}):([0-9]{1,2}):([0-9]{1,2})(?:\.([0-9]+))?$").unwrap());

/// Naive ISO-8601 forms without an offset.
const ISO_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// ISO-8601 forms with a compact `+hhmm` offset, which RFC 3339 rejects.
const ISO_OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %d %b %Y",
];

const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %I:%M %p",
    "%d %B %Y %H:%M",
];

// ---------------------------------------------------------------------------
// Date / DateTime
// ---------------------------------------------------------------------------

/// Calendar date. Datetimes are truncated to their date part.
pub fn date(raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Date(_) => Ok(raw.clone()),
        Value::DateTime(dt) => Ok(Value::Date(dt.date())),
        _ => {
            let s = text_of(raw).ok_or_else(|| {
                ConversionError::invalid_datetime(format!(
                    "cannot convert {} to date",
                    raw.type_name()
                ))
            })?;
            parse_date(s.trim(), options).map(Value::Date)
        }
    }
}

/// Date and time, naive. Dates become midnight; offsets are normalised to UTC.
pub fn datetime(raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::DateTime(_) => Ok(raw.clone()),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::default()))),
        _ => {
            let s = text_of(raw).ok_or_else(|| {
                ConversionError::invalid_datetime(format!(
                    "cannot convert {} to datetime",
                    raw.type_name()
                ))
            })?;
            parse_datetime(s.trim(), options).map(Value::DateTime)
        }
    }
}

/// Fast fixed format, then ISO-8601, then the flexible format list.
fn parse_date(s: &str, options: &CoercionOptions) -> Result<NaiveDate, ConversionError> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Some(dt) = parse_iso_datetime(s) {
        return Ok(dt.date());
    }
    if let Some(d) = parse_flexible_date(s, options) {
        return Ok(d);
    }
    if let Some(dt) = parse_flexible_datetime(s, options) {
        return Ok(dt.date());
    }
    Err(ConversionError::invalid_datetime(format!("unrecognised date '{s}'")))
}

fn parse_datetime(s: &str, options: &CoercionOptions) -> Result<NaiveDateTime, ConversionError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Some(dt) = parse_iso_datetime(s) {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::default()));
    }
    if let Some(dt) = parse_flexible_datetime(s, options) {
        return Ok(dt);
    }
    if let Some(d) = parse_flexible_date(s, options) {
        return Ok(d.and_time(NaiveTime::default()));
    }
    Err(ConversionError::invalid_datetime(format!("unrecognised datetime '{s}'")))
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = ISO_OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.naive_utc());
    }
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

fn parse_flexible_date(s: &str, options: &CoercionOptions) -> Option<NaiveDate> {
    FLEXIBLE_DATE_FORMATS
        .iter()
        .copied()
        .chain(options.date_formats.iter().map(String::as_str))
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

fn parse_flexible_datetime(s: &str, options: &CoercionOptions) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .copied()
        .chain(options.date_formats.iter().map(String::as_str))
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

// ---------------------------------------------------------------------------
// Time / Duration
// ---------------------------------------------------------------------------

/// Time of day from `H:M:S[.fraction]` text. Datetimes yield their time part.
pub fn time(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Time(_) => Ok(raw.clone()),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        _ => {
            let s = text_of(raw).ok_or_else(|| {
                ConversionError::invalid_datetime(format!(
                    "cannot convert {} to time",
                    raw.type_name()
                ))
            })?;
            parse_time(s.trim()).map(Value::Time)
        }
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, ConversionError> {
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Ok(t);
    }
    let caps = TIME_RE
        .captures(s)
        .ok_or_else(|| ConversionError::invalid_datetime(format!("unrecognised time '{s}'")))?;
    let invalid = || ConversionError::invalid_datetime(format!("unrecognised time '{s}'"));
    let hour = number(&caps[1]).ok_or_else(invalid)?;
    let minute = number(&caps[2]).ok_or_else(invalid)?;
    let second = number(&caps[3]).ok_or_else(invalid)?;
    let micros = match caps.get(4) {
        Some(m) => fraction_micros(m.as_str()).ok_or_else(invalid)?,
        None => 0,
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
        .ok_or_else(|| ConversionError::invalid_datetime(format!("time out of range '{s}'")))
}

/// Signed `H:M:S[.fraction]` span; a leading `-` negates the whole duration.
pub fn duration(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Duration(_) => Ok(raw.clone()),
        _ => {
            let s = text_of(raw).ok_or_else(|| {
                ConversionError::invalid_timedelta(format!(
                    "cannot convert {} to duration",
                    raw.type_name()
                ))
            })?;
            parse_duration(s.trim()).map(Value::Duration)
        }
    }
}

fn parse_duration(s: &str) -> Result<TimeDelta, ConversionError> {
    let caps = DURATION_RE.captures(s).ok_or_else(|| {
        ConversionError::invalid_timedelta(format!("unrecognised duration '{s}'"))
    })?;
    let invalid = || ConversionError::invalid_timedelta(format!("unrecognised duration '{s}'"));
    let hours = number(&caps[2]).ok_or_else(invalid)?;
    let minutes = number(&caps[3]).ok_or_else(invalid)?;
    let seconds = number(&caps[4]).ok_or_else(invalid)?;
    let micros = match caps.get(5) {
        Some(m) => fraction_micros(m.as_str()).ok_or_else(invalid)?,
        None => 0,
    };
    let span = TimeDelta::hours(hours.into())
        + TimeDelta::minutes(minutes.into())
        + TimeDelta::seconds(seconds.into())
        + TimeDelta::microseconds(micros.into());
    Ok(if caps.get(1).is_some() { -span } else { span })
}

fn number(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

/// Fraction digits right-padded with zeros and truncated to microseconds.
fn fraction_micros(digits: &str) -> Option<u32> {
    let padded = format!("{digits:0<6}");
    padded.get(..6)?.parse().ok()
}
