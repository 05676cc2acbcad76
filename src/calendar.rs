use thiserror::Error;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

/// Anything that falls on a calendar day.  Equality and formatting of days
/// go through this projection, so time-of-day never matters.
pub trait CalendarDay {
    fn calendar_date(&self) -> Date;
}

impl CalendarDay for Date {
    fn calendar_date(&self) -> Date {
        *self
    }
}

impl CalendarDay for PrimitiveDateTime {
    fn calendar_date(&self) -> Date {
        self.date()
    }
}

impl CalendarDay for OffsetDateTime {
    fn calendar_date(&self) -> Date {
        self.date()
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub struct OutOfTimeError;

/// Shift `date` by `days` whole days, which may be negative.
///
/// Fails only when the result lies outside the range of [`Date`].
pub fn add_days(date: Date, days: i64) -> Result<Date, OutOfTimeError> {
    i64::from(date.to_julian_day())
        .checked_add(days)
        .and_then(|jd| i32::try_from(jd).ok())
        .and_then(|jd| Date::from_julian_day(jd).ok())
        .ok_or(OutOfTimeError)
}

pub fn is_same_day<A: CalendarDay, B: CalendarDay>(a: &A, b: &B) -> bool {
    let (a, b) = (a.calendar_date(), b.calendar_date());
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// Gregorian Easter Sunday of `year`, computed with the anonymous
/// Gregorian algorithm (Meeus/Jones/Butcher).  Results match the published
/// tables for 1583 through 9999.
pub fn easter_date(year: i32) -> Result<Date, OutOfTimeError> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c.div_euclid(4);
    let k = c.rem_euclid(4);
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l).div_euclid(451);
    let n = h + l - 7 * m + 114;
    let month = if n.div_euclid(31) == 3 {
        Month::March
    } else {
        Month::April
    };
    let day = u8::try_from(n.rem_euclid(31) + 1).map_err(|_| OutOfTimeError)?;
    Date::from_calendar_date(year, month, day).map_err(|_| OutOfTimeError)
}

/// Zero-based month index, 0 = January
pub fn month0(date: Date) -> u8 {
    u8::from(date.month()) - 1
}

/// Weekday index, 0 = Sunday .. 6 = Saturday
pub fn weekday_index(date: Date) -> u8 {
    date.weekday().number_days_from_sunday()
}

/// Key under which a day's data is stored: `"{year}-{month}-{day}"` with a
/// one-based month and no zero padding, e.g. `2024-1-8`.
pub fn date_key(date: Date) -> String {
    format!("{}-{}-{}", date.year(), month0(date) + 1, date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::{date, datetime};
    use time::Weekday;

    #[test]
    fn test_add_days_rolls_over_month_and_year() {
        assert_eq!(add_days(date!(2023 - 12 - 30), 3), Ok(date!(2024 - 01 - 02)));
        assert_eq!(add_days(date!(2024 - 02 - 28), 1), Ok(date!(2024 - 02 - 29)));
        assert_eq!(add_days(date!(2023 - 02 - 28), 1), Ok(date!(2023 - 03 - 01)));
        assert_eq!(add_days(date!(2024 - 03 - 01), -1), Ok(date!(2024 - 02 - 29)));
        assert_eq!(add_days(date!(1900 - 03 - 01), -1), Ok(date!(1900 - 02 - 28)));
    }

    #[test]
    fn test_add_days_past_the_end() {
        assert_eq!(add_days(Date::MAX, 1), Err(OutOfTimeError));
        assert_eq!(add_days(Date::MIN, -1), Err(OutOfTimeError));
        assert_eq!(add_days(Date::MIN, i64::MIN), Err(OutOfTimeError));
    }

    #[test]
    fn test_is_same_day_ignores_time() {
        assert!(is_same_day(
            &datetime!(2024-05-01 0:00),
            &datetime!(2024-05-01 23:59:59)
        ));
        assert!(is_same_day(&date!(2024 - 05 - 01), &datetime!(2024-05-01 12:00)));
        assert!(!is_same_day(
            &datetime!(2024-05-01 23:59),
            &datetime!(2024-05-02 0:00)
        ));
    }

    #[test]
    fn test_easter_known_years() {
        for (year, expected) in [
            (1583, date!(1583 - 04 - 10)),
            (1818, date!(1818 - 03 - 22)),
            (1943, date!(1943 - 04 - 25)),
            (1961, date!(1961 - 04 - 02)),
            (2000, date!(2000 - 04 - 23)),
            (2008, date!(2008 - 03 - 23)),
            (2011, date!(2011 - 04 - 24)),
            (2019, date!(2019 - 04 - 21)),
            (2023, date!(2023 - 04 - 09)),
            (2024, date!(2024 - 03 - 31)),
            (2025, date!(2025 - 04 - 20)),
            (2038, date!(2038 - 04 - 25)),
            (2285, date!(2285 - 03 - 22)),
            (9999, date!(9999 - 03 - 28)),
        ] {
            assert_eq!(easter_date(year), Ok(expected), "Easter {year}");
        }
    }

    #[test]
    fn test_date_key_is_unpadded() {
        assert_eq!(date_key(date!(2024 - 01 - 08)), "2024-1-8");
        assert_eq!(date_key(date!(2024 - 12 - 31)), "2024-12-31");
    }

    #[test]
    fn test_indices() {
        assert_eq!(month0(date!(2024 - 01 - 15)), 0);
        assert_eq!(month0(date!(2024 - 12 - 15)), 11);
        // 2024-01-07 is a Sunday
        assert_eq!(weekday_index(date!(2024 - 01 - 07)), 0);
        assert_eq!(weekday_index(date!(2024 - 01 - 13)), 6);
    }

    fn any_date() -> impl Strategy<Value = Date> {
        (Date::MIN.to_julian_day()..=Date::MAX.to_julian_day())
            .prop_map(|jd| Date::from_julian_day(jd).unwrap())
    }

    proptest! {
        #[test]
        fn easter_is_a_sunday_in_range(year in 1900i32..=2100) {
            let easter = easter_date(year).unwrap();
            prop_assert_eq!(easter.weekday(), Weekday::Sunday);
            prop_assert!(easter >= Date::from_calendar_date(year, Month::March, 22).unwrap());
            prop_assert!(easter <= Date::from_calendar_date(year, Month::April, 25).unwrap());
        }

        #[test]
        fn add_zero_days_is_same_day(d in any_date()) {
            prop_assert!(is_same_day(&d, &add_days(d, 0).unwrap()));
        }

        #[test]
        fn add_days_round_trips(d in any_date(), n in -1_000_000i64..1_000_000) {
            if let Ok(shifted) = add_days(d, n) {
                prop_assert_eq!(add_days(shifted, -n), Ok(d));
            }
        }
    }
}
