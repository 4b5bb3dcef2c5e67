//! Analysis windows
//!
//! Two boundary conventions are in use and each analytic keeps its own:
//!
//! ```text
//! inclusive(N):  [today - (N-1), today]   N calendar days  (trends, sleep)
//! trailing(N):   [today - N,     today]   N+1 calendar days (correlations, triggers)
//! ```

use crate::store::RangeQuery;
use chrono::{Days, NaiveDate};

/// Contiguous span of calendar days ending on `end` (both bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Requested window size in days
    pub days: u32,
}

impl DateWindow {
    /// Exactly `days` calendar days ending on `today`
    ///
    /// A zero-day window starts after it ends and therefore holds nothing.
    pub fn inclusive(days: u32, today: NaiveDate) -> Self {
        let start = match days {
            0 => today.succ_opt().unwrap_or(today),
            n => today
                .checked_sub_days(Days::new(u64::from(n - 1)))
                .unwrap_or(NaiveDate::MIN),
        };
        Self {
            start,
            end: today,
            days,
        }
    }

    /// From `days` days before `today` up to `today`
    pub fn trailing(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: today,
            days,
        }
    }

    /// Ascending range read over the window
    pub fn query(&self) -> RangeQuery {
        RangeQuery::new(self.start, self.end)
    }

    /// The most recent `days` records of the window, newest first
    pub fn latest(&self) -> RangeQuery {
        self.query().descending().limit(self.days as usize)
    }

    /// Same window widened to include the day before `start`
    pub fn with_antecedent_day(&self) -> RangeQuery {
        RangeQuery::new(
            self.start.pred_opt().unwrap_or(self.start),
            self.end,
        )
    }
}

/// The calendar day immediately preceding `date`
pub fn antecedent_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}
