//! Publication date of a book.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use library_core::{Clock, DomainError, DomainResult, ValueObject};

const FIELD: &str = "Published date";

/// A calendar date no later than today.
///
/// "Today" is the clock's local date, so a book published today is accepted
/// regardless of the time of day it was recorded at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishedDate(NaiveDate);

impl ValueObject for PublishedDate {}

impl PublishedDate {
    /// Truncates `value` to its date before validating.
    pub fn create(value: NaiveDateTime, clock: &dyn Clock) -> DomainResult<Self> {
        Self::create_date(value.date(), clock)
    }

    pub fn create_date(value: NaiveDate, clock: &dyn Clock) -> DomainResult<Self> {
        if value > clock.today() {
            return Err(DomainError::future_date(FIELD));
        }
        Ok(Self(value))
    }

    /// Rebuild a date read back from storage. No clock check: a stored date
    /// was valid when it was written.
    pub fn from_stored(value: NaiveDate) -> Self {
        Self(value)
    }

    pub fn value(&self) -> NaiveDate {
        self.0
    }
}

impl core::fmt::Display for PublishedDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for PublishedDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_core::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_and_earlier_are_accepted() {
        let clock = FixedClock::on(date(2024, 5, 10));
        assert!(PublishedDate::create_date(date(2024, 5, 10), &clock).is_ok());
        assert!(PublishedDate::create_date(date(1999, 1, 1), &clock).is_ok());
    }

    #[test]
    fn tomorrow_is_rejected() {
        let clock = FixedClock::on(date(2024, 5, 10));
        let err = PublishedDate::create_date(date(2024, 5, 11), &clock).unwrap_err();
        assert_eq!(err, DomainError::future_date("Published date"));
        assert_eq!(err.to_string(), "Published date shouldn't exceed today's date.");
    }

    #[test]
    fn time_of_day_is_dropped() {
        let clock = FixedClock::on(date(2024, 5, 10));
        let late = date(2024, 5, 10).and_hms_opt(23, 59, 59).unwrap();
        let published = PublishedDate::create(late, &clock).unwrap();
        assert_eq!(published.value(), date(2024, 5, 10));
        assert_eq!(published.to_string(), "2024-05-10");
    }

    #[test]
    fn serializes_as_iso_date() {
        let published = PublishedDate::from_stored(date(2001, 9, 3));
        assert_eq!(serde_json::to_string(&published).unwrap(), "\"2001-09-03\"");
    }
}
