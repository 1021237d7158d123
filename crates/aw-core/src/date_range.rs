//! Report date ranges: a `yyyyMMdd,yyyyMMdd` pair or a named range.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use orion_error::prelude::*;

use crate::error::{CoreError, CoreReason, CoreResult};

const DATE_FORMAT: &str = "%Y%m%d";

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse against the local calendar date.
    pub fn parse(value: &str) -> CoreResult<Self> {
        Self::parse_at(value, Local::now().date_naive())
    }

    /// Parse with an explicit "today".
    pub fn parse_at(value: &str, today: NaiveDate) -> CoreResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid("date range cannot be empty"));
        }
        if value.contains(',') {
            parse_custom(value)
        } else {
            parse_named(value, today)
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Start date as `yyyyMMdd`.
    pub fn start_date(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// End date as `yyyyMMdd`.
    pub fn end_date(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_custom(value: &str) -> CoreResult<DateRange> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return Err(invalid(format!(
            "unknown date range format: {value}"
        )));
    }
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| invalid(format!("invalid date {:?} in range {value}: {e}", s.trim())))
    };
    Ok(DateRange::new(parse(parts[0])?, parse(parts[1])?))
}

fn parse_named(value: &str, today: NaiveDate) -> CoreResult<DateRange> {
    let days_ago = |n: u64| today - Days::new(n);
    let weeks_ago = |n: u64| today - Days::new(7 * n);

    let (start, end) = match value {
        "TODAY" => (today, today),
        "YESTERDAY" => (days_ago(1), days_ago(1)),
        "LAST_7_DAYS" => (days_ago(7), days_ago(1)),
        "LAST_14_DAYS" => (days_ago(14), days_ago(1)),
        "LAST_30_DAYS" => (days_ago(30), days_ago(1)),
        "LAST_WEEK" => {
            let last = weeks_ago(1);
            (monday_of(last), sunday_of(last))
        }
        "THIS_MONTH" => (first_of_month(today), last_of_month(today)),
        "LAST_MONTH" => {
            let last = today - Months::new(1);
            (first_of_month(last), last_of_month(last))
        }
        // ISO weeks run Monday..Sunday, so "this week from Sunday" starts on
        // the Sunday closing the previous ISO week.
        "THIS_WEEK_SUN_TODAY" => (sunday_of(weeks_ago(1)), today),
        "THIS_WEEK_MON_TODAY" => (monday_of(today), today),
        "LAST_WEEK_SUN_SAT" => (
            sunday_of(weeks_ago(2)),
            sunday_of(weeks_ago(1)) - Days::new(1),
        ),
        "LAST_BUSINESS_WEEK" | "ALL_TIME" | "CUSTOM_DATE" => {
            return Err(invalid(format!(
                "unsupported date range type: {value}"
            )));
        }
        _ => {
            return Err(invalid(format!(
                "unknown date range type: {value}"
            )));
        }
    };
    Ok(DateRange::new(start, end))
}

fn invalid(detail: impl Into<String>) -> CoreError {
    CoreError::from(CoreReason::InvalidArgument).with_detail(detail.into())
}

fn monday_of(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}

fn sunday_of(day: NaiveDate) -> NaiveDate {
    monday_of(day) + Days::new(6)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    let first = first_of_month(day);
    (first + Months::new(1)) - Days::new(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreReason;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Wednesday
    fn today() -> NaiveDate {
        date(2016, 3, 16)
    }

    fn range(value: &str) -> (String, String) {
        let r = DateRange::parse_at(value, today()).unwrap();
        (r.start_date(), r.end_date())
    }

    #[test]
    fn contains_is_inclusive() {
        let r = DateRange::parse_at("20160301,20160331", today()).unwrap();
        assert!(r.contains(date(2016, 3, 1)));
        assert!(r.contains(date(2016, 3, 31)));
        assert!(!r.contains(date(2016, 4, 1)));
    }

    #[test]
    fn custom_pair() {
        assert_eq!(range("20160301, 20160315"), ("20160301".into(), "20160315".into()));
    }

    #[test]
    fn relative_day_ranges() {
        assert_eq!(range("TODAY"), ("20160316".into(), "20160316".into()));
        assert_eq!(range("YESTERDAY"), ("20160315".into(), "20160315".into()));
        assert_eq!(range("LAST_7_DAYS"), ("20160309".into(), "20160315".into()));
        assert_eq!(range("LAST_30_DAYS"), ("20160215".into(), "20160315".into()));
    }

    #[test]
    fn week_ranges() {
        assert_eq!(range("LAST_WEEK"), ("20160307".into(), "20160313".into()));
        assert_eq!(range("THIS_WEEK_MON_TODAY"), ("20160314".into(), "20160316".into()));
        assert_eq!(range("THIS_WEEK_SUN_TODAY"), ("20160313".into(), "20160316".into()));
        assert_eq!(range("LAST_WEEK_SUN_SAT"), ("20160306".into(), "20160312".into()));
    }

    #[test]
    fn month_ranges() {
        assert_eq!(range("THIS_MONTH"), ("20160301".into(), "20160331".into()));
        assert_eq!(range("LAST_MONTH"), ("20160201".into(), "20160229".into()));
    }

    #[test]
    fn bad_values_are_invalid_argument() {
        for bad in ["", "ALL_TIME", "NEXT_WEEK", "20160301", "2016-03-01,20160302", "1,2,3"] {
            let err = DateRange::parse_at(bad, today()).unwrap_err();
            assert_eq!(err.reason(), &CoreReason::InvalidArgument, "{bad}");
        }
    }
}
