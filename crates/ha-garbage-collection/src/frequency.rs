//! Collection frequency
//!
//! The frequency picked in step 1 decides which fields step 2 asks for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown frequency: {0}")]
pub struct UnknownFrequency(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    Weekly,
    EvenWeeks,
    OddWeeks,
    EveryNWeeks,
    EveryNDays,
    Monthly,
    Annual,
    /// Derived from a group of other garbage collection entities
    Group,
    /// No schedule; dates are set manually
    Blank,
}

impl Frequency {
    /// All frequencies in the order the form offers them
    pub const ALL: [Frequency; 9] = [
        Frequency::Weekly,
        Frequency::EvenWeeks,
        Frequency::OddWeeks,
        Frequency::EveryNWeeks,
        Frequency::EveryNDays,
        Frequency::Monthly,
        Frequency::Annual,
        Frequency::Group,
        Frequency::Blank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::EvenWeeks => "even-weeks",
            Frequency::OddWeeks => "odd-weeks",
            Frequency::EveryNWeeks => "every-n-weeks",
            Frequency::EveryNDays => "every-n-days",
            Frequency::Monthly => "monthly",
            Frequency::Annual => "annual",
            Frequency::Group => "group",
            Frequency::Blank => "blank",
        }
    }

    /// Option list for the frequency select field
    pub fn options() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }

    pub fn is_annual(&self) -> bool {
        matches!(self, Frequency::Annual)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Frequency::Group)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Frequency::Blank)
    }

    /// Scheduled on weekdays within a month range
    pub fn is_day_based(&self) -> bool {
        !(self.is_annual() || self.is_group() || self.is_blank())
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, Frequency::Monthly)
    }

    /// Repeats every `period` weeks, days or months
    pub fn has_period(&self) -> bool {
        matches!(
            self,
            Frequency::EveryNWeeks | Frequency::EveryNDays | Frequency::Monthly
        )
    }

    pub fn is_every_n_weeks(&self) -> bool {
        matches!(self, Frequency::EveryNWeeks)
    }

    pub fn is_daily(&self) -> bool {
        matches!(self, Frequency::EveryNDays)
    }
}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFrequency(s.to_string()))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
