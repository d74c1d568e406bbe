//! Validators for icon and time values
//!
//! The flow checks icons and `expire_after` through [`ConfigValidator`] so
//! the rules can be swapped out, e.g. for a stub in tests.

use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A value failed validation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Invalid(pub String);

pub trait ConfigValidator: Send + Sync {
    /// Accept icons written as `prefix:name`; only the `:` is required
    fn icon(&self, value: &str) -> Result<(), Invalid>;

    /// Accept a time of day; the empty string means unset
    fn time(&self, value: &str) -> Result<(), Invalid>;
}

static TIME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn time_pattern() -> &'static Regex {
    TIME_PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("valid time regex")
    })
}

/// The platform's own icon and time rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl ConfigValidator for DefaultValidator {
    fn icon(&self, value: &str) -> Result<(), Invalid> {
        if value.contains(':') {
            Ok(())
        } else {
            Err(Invalid(format!(
                "Icons should be specified in the form \"prefix:name\", got {value:?}"
            )))
        }
    }

    fn time(&self, value: &str) -> Result<(), Invalid> {
        if value.is_empty() {
            return Ok(());
        }
        let invalid = || Invalid(format!("Invalid time specified: {value}"));
        let caps = time_pattern().captures(value).ok_or_else(invalid)?;
        let part = |i: usize| {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse::<u32>())
                .map_err(|_| invalid())
        };
        NaiveTime::from_hms_opt(part(1)?, part(2)?, part(3)?)
            .map(|_| ())
            .ok_or_else(invalid)
    }
}
