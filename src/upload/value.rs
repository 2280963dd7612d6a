//! Cell value coercion
//!
//! `coerce` validates one cell given its canonical field name. `category` and
//! `startdate` get dedicated handling; every other field is normalized by the
//! runtime type of the value it was handed, not by the field's meaning. Cells
//! read from a file are text unless the reader infers types, so in practice
//! that branch sanitizes text.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::field::FieldValue;
use crate::core::store::RecordStore;
use crate::upload::error::CoerceError;

/// A coerced cell
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Value(FieldValue),
    Category(CategoryRef),
}

/// How a row names its category
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryRef {
    /// An existing category id
    Id(i64),
    /// Category names from the top of the tree down
    Path(Vec<String>),
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+)\s*(second|sec|minute|min|hour|day|week)s?$").unwrap()
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

/// Validate and normalize one cell
pub fn coerce(
    value: FieldValue,
    field: &str,
    store: &dyn RecordStore,
) -> Result<Coerced, CoerceError> {
    match field {
        "category" => coerce_category(value, store).map(Coerced::Category),
        "startdate" => coerce_startdate(value).map(Coerced::Value),
        _ => Ok(Coerced::Value(match value {
            FieldValue::Bool(b) => FieldValue::Bool(clean_bool(b)),
            FieldValue::Int(i) => FieldValue::Int(clean_int(i)),
            FieldValue::Float(f) => FieldValue::Float(clean_float(f)),
            FieldValue::Text(s) => FieldValue::Text(clean_text(&s)),
        })),
    }
}

fn coerce_category(value: FieldValue, store: &dyn RecordStore) -> Result<CategoryRef, CoerceError> {
    match value {
        FieldValue::Int(id) => {
            if store.category_exists(id)? {
                Ok(CategoryRef::Id(id))
            } else {
                Err(CoerceError::UnknownCategory(id))
            }
        }
        FieldValue::Text(path) => Ok(CategoryRef::Path(split_category_path(&path))),
        other => Err(CoerceError::InvalidCategory(other.type_name())),
    }
}

/// A blank cell stays empty so the run default applies
fn coerce_startdate(value: FieldValue) -> Result<FieldValue, CoerceError> {
    match value {
        FieldValue::Int(ts) => Ok(FieldValue::Int(ts)),
        FieldValue::Text(s) if s.trim().is_empty() => Ok(FieldValue::Text(String::new())),
        FieldValue::Text(s) => parse_date_expression(&s, Utc::now())
            .map(FieldValue::Int)
            .ok_or(CoerceError::InvalidDate(s)),
        other => Err(CoerceError::InvalidDateType(other.type_name())),
    }
}

/// Split a category path into trimmed segment names
///
/// The path is cleaned first: backslashes become slashes, `.` and `..`
/// segments are dropped and empty segments disappear.
pub fn split_category_path(path: &str) -> Vec<String> {
    clean_text(&path.replace('\\', "/"))
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(String::from)
        .collect()
}

fn clean_bool(b: bool) -> bool {
    b
}

fn clean_int(i: i64) -> i64 {
    i
}

fn clean_float(f: f64) -> f64 {
    if f.is_finite() {
        f
    } else {
        0.0
    }
}

/// Strip markup and control characters from text
pub fn clean_text(s: &str) -> String {
    TAG_RE
        .replace_all(s, "")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Give a raw cell a runtime type when it looks like a number or boolean
pub fn infer(cell: String) -> FieldValue {
    let trimmed = cell.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if trimmed.contains('.') {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return FieldValue::Float(f);
            }
        }
    }
    match trimmed.to_lowercase().as_str() {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Text(cell),
    }
}

/// Parse a free-form date/time expression into a Unix timestamp (UTC)
///
/// Accepts `@<timestamp>`, the keywords now/today/midnight/tomorrow/yesterday,
/// relative offsets such as `+2 weeks`, RFC 3339 and RFC 2822 strings, and a
/// set of common numeric and month-name layouts. Slash dates are month first.
pub fn parse_date_expression(input: &str, now: DateTime<Utc>) -> Option<i64> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();

    if let Some(ts) = lower.strip_prefix('@') {
        return ts.trim().parse().ok();
    }

    let midnight = |date: NaiveDate| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp();
    match lower.as_str() {
        "now" => return Some(now.timestamp()),
        "today" | "midnight" => return Some(midnight(now.date_naive())),
        "tomorrow" => return Some(midnight(now.date_naive() + Duration::days(1))),
        "yesterday" => return Some(midnight(now.date_naive() - Duration::days(1))),
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&lower) {
        let amount: i64 = caps[1].parse().ok()?;
        let offset = match &caps[2] {
            "second" | "sec" => Duration::try_seconds(amount)?,
            "minute" | "min" => Duration::try_minutes(amount)?,
            "hour" => Duration::try_hours(amount)?,
            "day" => Duration::try_days(amount)?,
            _ => Duration::try_weeks(amount)?,
        };
        return now.checked_add_signed(offset).map(|dt| dt.timestamp());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(midnight(date));
        }
    }

    None
}
