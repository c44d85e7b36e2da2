//! Service day assignment.
//!
//! Transit operating days do not end at midnight: a tap at 01:30 usually
//! belongs to the previous evening's travel. Each tap is therefore assigned
//! to a logical service day that starts at a configurable cutoff time.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Returns the service day of a tap made at `timestamp`.
///
/// Taps strictly before `cutoff` belong to the previous calendar day.
///
/// # Examples
///
/// ```
/// use odx::stages::service_day;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let cutoff = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
/// let ts = NaiveDate::from_ymd_opt(2019, 10, 5).unwrap().and_hms_opt(3, 59, 59).unwrap();
/// assert_eq!(service_day(ts, cutoff), NaiveDate::from_ymd_opt(2019, 10, 4).unwrap());
/// ```
pub fn service_day(timestamp: NaiveDateTime, cutoff: NaiveTime) -> NaiveDate {
    let date = timestamp.date();
    if timestamp.time() < cutoff {
        // Only fails for NaiveDate::MIN, which no feed contains
        date.checked_sub_days(Days::new(1)).unwrap_or(date)
    } else {
        date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn four_am() -> NaiveTime {
        NaiveTime::from_hms_opt(4, 0, 0).unwrap()
    }

    #[test]
    fn just_before_cutoff_is_previous_day() {
        assert_eq!(
            service_day(at(2019, 10, 5, 3, 59, 59), four_am()),
            date(2019, 10, 4)
        );
    }

    #[test]
    fn at_cutoff_is_same_day() {
        assert_eq!(
            service_day(at(2019, 10, 5, 4, 0, 0), four_am()),
            date(2019, 10, 5)
        );
    }

    #[test]
    fn midnight_belongs_to_previous_day() {
        assert_eq!(
            service_day(at(2019, 10, 1, 0, 0, 0), four_am()),
            date(2019, 9, 30)
        );
    }

    #[test]
    fn crosses_year_boundary() {
        assert_eq!(
            service_day(at(2020, 1, 1, 1, 15, 0), four_am()),
            date(2019, 12, 31)
        );
    }

    #[test]
    fn midnight_cutoff_is_calendar_day() {
        assert_eq!(
            service_day(at(2019, 10, 5, 0, 0, 0), NaiveTime::MIN),
            date(2019, 10, 5)
        );
    }
}
