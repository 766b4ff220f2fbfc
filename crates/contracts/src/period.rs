//! Period - aggregation window selector for reports and graphs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::ContractError;

/// Date format used by custom range tokens (`2024-01-01|2024-01-31`)
const CUSTOM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Aggregation window used by reports and graphs
///
/// Defaults to [`Period::Day`] when the request does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
    /// Inclusive custom date range
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Fixed periods, in display order
    pub const FIXED: [Period; 5] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::All,
    ];

    /// Request parameter token for this period
    pub fn token(&self) -> String {
        match self {
            Self::Day => "day".to_string(),
            Self::Week => "week".to_string(),
            Self::Month => "month".to_string(),
            Self::Year => "year".to_string(),
            Self::All => "all".to_string(),
            Self::Custom { start, end } => format!(
                "{}|{}",
                start.format(CUSTOM_DATE_FORMAT),
                end.format(CUSTOM_DATE_FORMAT)
            ),
        }
    }

    /// Length of the window in days (`None` for [`Period::All`])
    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Self::Day => Some(1),
            Self::Week => Some(7),
            Self::Month => Some(31),
            Self::Year => Some(366),
            Self::All => None,
            Self::Custom { start, end } => Some((*end - *start).num_days() + 1),
        }
    }

    /// Whether `at` falls inside this window when it ends at `now`
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => at <= now,
            Self::Custom { start, end } => {
                let day = at.date_naive();
                *start <= day && day <= *end
            }
            fixed => fixed
                .duration_days()
                .is_some_and(|days| at <= now && now - at <= Duration::days(days)),
        }
    }

    fn parse_custom(value: &str) -> Option<Self> {
        let (start, end) = value.split_once('|')?;
        let start = NaiveDate::parse_from_str(start.trim(), CUSTOM_DATE_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(end.trim(), CUSTOM_DATE_FORMAT).ok()?;
        (start <= end).then_some(Self::Custom { start, end })
    }
}

impl FromStr for Period {
    type Err = ContractError;

    /// Case-insensitive parse of a period token
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let period = match value.to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            "all" => Some(Self::All),
            other => Self::parse_custom(other),
        };
        period.ok_or_else(|| ContractError::UnknownPeriod {
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}
