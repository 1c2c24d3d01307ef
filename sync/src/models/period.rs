use chrono::{Datelike, Months, NaiveDate};
use std::fmt;

/// One calendar month's worth of source data. Ordering is chronological so a
/// period can be compared against the availability bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourcePeriod {
    pub year: i32,
    pub month: u32,
}

impl SourcePeriod {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The most recent period guaranteed to have a complete source file.
    /// Staff upload a month's report during the following month, so the
    /// prior calendar month is the newest file that can exist.
    pub fn latest_available(today: NaiveDate) -> Self {
        let shifted = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        Self::from_date(shifted)
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// File drop convention: /<root>/<year>/TripReport-<MM><YYYY>.csv
    pub fn source_path(&self, root: &str) -> String {
        format!(
            "/{}/{}/TripReport-{:02}{}.csv",
            root, self.year, self.month, self.year
        )
    }
}

impl fmt::Display for SourcePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
