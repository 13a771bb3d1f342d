//! Date generation and the `YY/MM/DD` wire format.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Serialize, Serializer};
use time::{Date, Month, OffsetDateTime};

use crate::error::GenError;

/// Parses a `YY/MM/DD` date string. Two-digit years pivot at 69: `00`-`68`
/// resolve to 2000-2068, `69`-`99` to 1969-1999.
pub fn parse_yymmdd(s: &str) -> Result<Date, GenError> {
    let invalid = || GenError::InvalidDate(s.to_string());

    let parts: Vec<&str> = s.split('/').collect();
    let [yy, mm, dd] = parts.as_slice() else {
        return Err(invalid());
    };

    let yy: i32 = yy.parse().map_err(|_| invalid())?;
    let mm: u8 = mm.parse().map_err(|_| invalid())?;
    let dd: u8 = dd.parse().map_err(|_| invalid())?;

    let year = if (0..=68).contains(&yy) {
        2000 + yy
    } else if (69..=99).contains(&yy) {
        1900 + yy
    } else {
        return Err(invalid());
    };

    let month = Month::try_from(mm).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, dd).map_err(|_| invalid())
}

/// Formats a date as `YY/MM/DD`.
pub fn format_yymmdd(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:02}",
        date.year().rem_euclid(100),
        u8::from(date.month()),
        date.day()
    )
}

/// Serde adapter for date-of-birth fields.
pub mod yymmdd {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_yymmdd(*date))
    }
}

/// Generates a dependent's birth date from a reference date, a mean age gap,
/// and a standard deviation (both in years).
///
/// The year offset is normally distributed; month and day are uniform within
/// the chosen year, respecting month lengths and leap years. A draw that
/// would land on or before the reference date, or in the future, falls
/// closed to the mean-gap year clamped into the valid range.
pub fn relative_birth_date(
    reference: Date,
    mean_gap_years: f64,
    std_dev_years: f64,
    rng: &mut impl Rng,
) -> Date {
    let today = OffsetDateTime::now_utc().date();
    let base_year = reference.year() + mean_gap_years.round() as i32;

    let variation = if std_dev_years.is_finite() && std_dev_years > 0.0 {
        Normal::new(0.0, std_dev_years).unwrap().sample(rng)
    } else {
        0.0
    };

    let mut year = (base_year as f64 + variation) as i32;
    if year <= reference.year() || year > today.year() {
        year = base_year.max(reference.year() + 1).min(today.year());
    }

    let month = Month::try_from(rng.gen_range(1..=12u8)).unwrap();
    let day = rng.gen_range(1..=month.length(year));
    let date = Date::from_calendar_date(year, month, day).unwrap();

    date.min(today)
}

/// A card expiry month, serialized as `MM/YY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardExpiry {
    pub month: u8,
    pub year: i32,
}

impl CardExpiry {
    /// True when the expiry is strictly later than the given date's month.
    pub fn is_after(&self, date: Date) -> bool {
        (self.year, self.month) > (date.year(), u8::from(date.month()))
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year.rem_euclid(100))
    }
}

impl Serialize for CardExpiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Draws a card expiry strictly in the future relative to now.
pub fn card_expiry(rng: &mut impl Rng) -> CardExpiry {
    card_expiry_after(OffsetDateTime::now_utc().date(), rng)
}

/// Draws a card expiry strictly later than `today`'s month. A draw landing in
/// the past or the current month is clamped forward; a December `today` rolls
/// into January of the next year.
pub fn card_expiry_after(today: Date, rng: &mut impl Rng) -> CardExpiry {
    let current_year = today.year();
    let current_month = u8::from(today.month());

    let start_year = current_year - rng.gen_range(1..=3);
    let span = rng.gen_range(3..=5);
    let mut year = rng.gen_range(start_year..=start_year + span);

    let month = if year <= current_year {
        year = current_year;
        if current_month == 12 {
            year += 1;
            rng.gen_range(1..=12)
        } else {
            rng.gen_range(current_month + 1..=12)
        }
    } else {
        rng.gen_range(1..=12)
    };

    CardExpiry { month, year }
}

/// The same calendar day `years` earlier; Feb 29 lands on Feb 28 when the
/// target year is not a leap year.
pub fn years_ago(date: Date, years: i32) -> Date {
    let year = date.year() - years;
    Date::from_calendar_date(year, date.month(), date.day())
        .unwrap_or_else(|_| Date::from_calendar_date(year, date.month(), 28).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_round_trip() {
        let date = parse_yymmdd("74/04/10").unwrap();
        assert_eq!(date.year(), 1974);
        assert_eq!(u8::from(date.month()), 4);
        assert_eq!(date.day(), 10);
        assert_eq!(format_yymmdd(date), "74/04/10");

        let date = parse_yymmdd("05/12/31").unwrap();
        assert_eq!(date.year(), 2005);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_yymmdd("1974/04/10").is_err());
        assert!(parse_yymmdd("74-04-10").is_err());
        assert!(parse_yymmdd("74/13/10").is_err());
        assert!(parse_yymmdd("74/02/30").is_err());
        assert!(parse_yymmdd("").is_err());
    }

    #[test]
    fn test_zero_deviation_fixes_the_year() {
        let reference = parse_yymmdd("74/04/10").unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let date = relative_birth_date(reference, 18.0, 0.0, &mut rng);
            assert_eq!(date.year(), 1992);
        }
    }

    #[test]
    fn test_relative_date_stays_after_reference() {
        let reference = parse_yymmdd("98/06/15").unwrap();
        let today = OffsetDateTime::now_utc().date();
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let date = relative_birth_date(reference, 18.0, 6.0, &mut rng);
            assert!(date > reference, "{date} not after {reference}");
            assert!(date <= today, "{date} is in the future");
        }
    }

    #[test]
    fn test_expiry_is_strictly_future() {
        let mut rng = rand::thread_rng();
        let today = OffsetDateTime::now_utc().date();

        for _ in 0..500 {
            let expiry = card_expiry(&mut rng);
            assert!(expiry.is_after(today), "{expiry} is not after {today}");
        }
    }

    #[test]
    fn test_expiry_rolls_over_december() {
        let december = Date::from_calendar_date(2025, Month::December, 15).unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let expiry = card_expiry_after(december, &mut rng);
            assert!(expiry.is_after(december));
            assert!(expiry.year >= 2026);
        }
    }

    #[test]
    fn test_expiry_formats_mm_yy() {
        let expiry = CardExpiry {
            month: 3,
            year: 2027,
        };
        assert_eq!(expiry.to_string(), "03/27");
    }

    #[test]
    fn test_years_ago_handles_leap_day() {
        let leap = Date::from_calendar_date(2024, Month::February, 29).unwrap();
        let earlier = years_ago(leap, 1);
        assert_eq!(earlier.year(), 2023);
        assert_eq!(earlier.day(), 28);
    }
}
