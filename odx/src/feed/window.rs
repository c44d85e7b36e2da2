//! Time window filtering.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::Transaction;

/// Error returned when a window ends before it starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid window: end {end} is before start {start}")]
pub struct InvalidWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// An inclusive period of the feed to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Whole calendar days, `start` to `end` inclusive.
    Days { start: NaiveDate, end: NaiveDate },
    /// From `start` to `end` inclusive.
    Between {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl TimeWindow {
    /// Keep whole days from `start` to `end`.
    pub fn days(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidWindow> {
        if end < start {
            return Err(InvalidWindow {
                start: start.and_time(NaiveTime::MIN),
                end: end.and_time(NaiveTime::MIN),
            });
        }
        Ok(TimeWindow::Days { start, end })
    }

    /// Keep taps from `start_date` at `start_time` until `end_date` at
    /// `end_time`.
    ///
    /// # Examples
    ///
    /// ```
    /// use odx::feed::TimeWindow;
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let oct = |d| NaiveDate::from_ymd_opt(2019, 10, d).unwrap();
    /// let window = TimeWindow::between(
    ///     oct(1),
    ///     NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    ///     oct(1),
    ///     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    /// )
    /// .unwrap();
    ///
    /// assert!(window.contains(oct(1).and_hms_opt(10, 0, 0).unwrap()));
    /// assert!(!window.contains(oct(1).and_hms_opt(10, 0, 1).unwrap()));
    /// ```
    pub fn between(
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_date: NaiveDate,
        end_time: NaiveTime,
    ) -> Result<Self, InvalidWindow> {
        let start = start_date.and_time(start_time);
        let end = end_date.and_time(end_time);
        if end < start {
            return Err(InvalidWindow { start, end });
        }
        Ok(TimeWindow::Between { start, end })
    }

    /// Returns true if a tap at `ts` falls within the window.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        match *self {
            TimeWindow::Days { start, end } => (start..=end).contains(&ts.date()),
            TimeWindow::Between { start, end } => (start..=end).contains(&ts),
        }
    }

    /// Keep only the transactions within the window, preserving order.
    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        transactions
            .into_iter()
            .filter(|tx| self.contains(tx.timestamp))
            .collect()
    }
}
