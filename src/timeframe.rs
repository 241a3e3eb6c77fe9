// src/timeframe.rs
//! Day-count → trend provider timeframe vocabulary.

use serde::Serialize;
use std::fmt;

/// Relative windows understood by the trend provider, finest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Timeframe {
    LastHour,
    Last7Days,
    Last1Month,
    Last3Months,
    Last12Months,
}

impl Timeframe {
    /// Inclusive upper bounds: 1, 7, 30, 90 days; anything above is a year.
    pub fn from_days(days: i64) -> Self {
        if days <= 1 {
            Timeframe::LastHour
        } else if days <= 7 {
            Timeframe::Last7Days
        } else if days <= 30 {
            Timeframe::Last1Month
        } else if days <= 90 {
            Timeframe::Last3Months
        } else {
            Timeframe::Last12Months
        }
    }

    /// Human-readable token, e.g. "last 7 days".
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::LastHour => "last hour",
            Timeframe::Last7Days => "last 7 days",
            Timeframe::Last1Month => "last 1 month",
            Timeframe::Last3Months => "last 3 months",
            Timeframe::Last12Months => "last 12 months",
        }
    }

    /// Token sent on the wire to Google Trends.
    pub fn provider_token(self) -> &'static str {
        match self {
            Timeframe::LastHour => "now 1-H",
            Timeframe::Last7Days => "now 7-d",
            Timeframe::Last1Month => "today 1-m",
            Timeframe::Last3Months => "today 3-m",
            Timeframe::Last12Months => "today 12-m",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shorthand used by the orchestrator.
pub fn convert(days: i64) -> Timeframe {
    Timeframe::from_days(days)
}
