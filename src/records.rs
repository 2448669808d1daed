use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

/// One row of list data. Field order is the order the front end sent.
pub type Record = Map<String, Value>;

/// Cell text for a column key the record does not carry.
pub const PLACEHOLDER: &str = "-";

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// String form of a field, the way search and select filters see it.
/// Missing and null fields have no text.
pub fn field_text(value: Option<&Value>) -> Option<String> {
    let v = value?;
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| field_text(Some(item)))
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(v.to_string()),
    }
}

/// Display text for one cell of a column projection.
pub fn cell_text(record: &Record, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        some => field_text(some).unwrap_or_default(),
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, and naive `date time` forms.
/// Date-only input lands on midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date())
}

/// Dates only come from string fields; numbers are never read as timestamps.
pub fn field_datetime(value: Option<&Value>) -> Option<NaiveDateTime> {
    value.and_then(|v| v.as_str()).and_then(parse_datetime)
}

pub fn field_date(value: Option<&Value>) -> Option<NaiveDate> {
    field_datetime(value).map(|dt| dt.date())
}

/// `HH:MM` or `HH:MM:SS` clock text.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let t = raw.trim();
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}
