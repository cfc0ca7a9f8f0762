//! Default Swedish calendar patterns
//!
//! Active periods that only apply on working days reference `weekdays` and
//! exclude `holidays`. Tariff documents that never declare their own
//! patterns get these three, with public holidays computed for the year the
//! tariff starts.

use crate::tariff::CalendarPattern;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Reference of the Monday-Friday pattern
pub const WEEKDAYS: &str = "weekdays";

/// Reference of the Saturday-Sunday pattern
pub const WEEKENDS: &str = "weekends";

/// Reference of the public holiday pattern
pub const HOLIDAYS: &str = "holidays";

/// Easter Sunday for a Gregorian year (anonymous Gregorian algorithm)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// First Saturday on or after the given date
fn saturday_from(start: NaiveDate) -> NaiveDate {
    let offset = (Weekday::Sat.num_days_from_monday() + 7
        - start.weekday().num_days_from_monday())
        % 7;
    start + Duration::days(offset as i64)
}

/// Swedish public holidays for a year, sorted
///
/// New Year's Day, Epiphany, Good Friday, Easter Monday, May Day,
/// Ascension Day, National Day, Midsummer Day, All Saints' Day, Christmas
/// Day and Boxing Day.
pub fn swedish_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = [(1, 1), (1, 6), (5, 1), (6, 6), (12, 25), (12, 26)];
    let mut dates: Vec<NaiveDate> = fixed
        .iter()
        .filter_map(|(m, d)| NaiveDate::from_ymd_opt(year, *m, *d))
        .collect();

    if let Some(easter) = easter_sunday(year) {
        dates.push(easter - Duration::days(2));
        dates.push(easter + Duration::days(1));
        dates.push(easter + Duration::days(39));
    }
    if let Some(june_20) = NaiveDate::from_ymd_opt(year, 6, 20) {
        dates.push(saturday_from(june_20));
    }
    if let Some(october_31) = NaiveDate::from_ymd_opt(year, 10, 31) {
        dates.push(saturday_from(october_31));
    }

    dates.sort();
    dates
}

/// The default `weekdays`, `weekends` and `holidays` patterns
pub fn default_patterns(year: i32) -> Vec<CalendarPattern> {
    vec![
        CalendarPattern {
            reference: WEEKDAYS.to_string(),
            frequency: "P1W".to_string(),
            days: Some(vec![1, 2, 3, 4, 5]),
            dates: None,
        },
        CalendarPattern {
            reference: WEEKENDS.to_string(),
            frequency: "P1W".to_string(),
            days: Some(vec![6, 7]),
            dates: None,
        },
        CalendarPattern {
            reference: HOLIDAYS.to_string(),
            frequency: "P1Y".to_string(),
            days: None,
            dates: Some(swedish_holidays(year)),
        },
    ]
}
