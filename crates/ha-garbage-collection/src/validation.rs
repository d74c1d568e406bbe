//! Date and list helpers for configuration values

use chrono::NaiveDate;
use serde_json::Value;

/// Year used to check month/day pairs. Not a leap year, so `02/29` fails.
const MONTH_DAY_REFERENCE_YEAR: i32 = 1900;

/// True iff `date` is a valid `MM/DD`
pub fn is_month_day(date: &str) -> bool {
    NaiveDate::parse_from_str(
        &format!("{MONTH_DAY_REFERENCE_YEAR}/{date}"),
        "%Y/%m/%d",
    )
    .is_ok()
}

/// True iff `date` is empty or a valid `YYYY-MM-DD`
pub fn is_date(date: &str) -> bool {
    date.is_empty() || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// True iff every element satisfies [`is_date`]
pub fn is_dates<S: AsRef<str>>(dates: &[S]) -> bool {
    dates.iter().all(|d| is_date(d.as_ref()))
}

/// Convert comma separated text to a list.
///
/// Lists pass through unchanged, nothing or an empty string gives an empty
/// list, and each comma separated element loses surrounding quotes and
/// spaces. Any other scalar becomes a one element list.
pub fn string_to_list(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Array(_)) => value.cloned().unwrap_or_default(),
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(Value::String(s)) if s.is_empty() => Value::Array(Vec::new()),
        Some(Value::String(s)) => Value::Array(
            split_list(s)
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
        Some(other) => Value::Array(vec![other.clone()]),
    }
}

/// Split `s` on commas, stripping `'`, `"` and spaces around each element
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim_matches(|c| matches!(c, '\'' | '"' | ' ')).to_string())
        .collect()
}
