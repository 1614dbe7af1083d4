use chrono::NaiveDate;
use crate::core::types::FieldValue;

/// Date patterns tried in priority order; first match wins.
pub const DATE_PATTERNS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Classify one lowercase field string into a typed value.
///
/// Detection order is a hard contract: empty, integer, float, date, text.
/// A token that parses as an integer never reaches the date patterns.
pub fn detect_value(raw: &str) -> FieldValue {
    if raw.is_empty() {
        return FieldValue::Empty;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if let Some(date) = parse_date(raw) {
        return FieldValue::Date(date);
    }
    FieldValue::Text(raw.to_string())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, pattern) {
            return Some(date);
        }
    }
    None
}
