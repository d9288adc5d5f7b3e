//! The calendar used to decide which month a transaction falls in.

use std::fmt::{Debug, Display};

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// The timezone in which calendar days and months are evaluated.
///
/// A transaction recorded just after midnight on the 1st in Bangkok is still
/// in the previous month in UTC, so month filtering and form dates must agree
/// on one zone.
#[derive(Clone, Copy, Default)]
pub enum CalendarZone {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// A canonical IANA timezone, e.g. "Asia/Bangkok".
    Named(&'static Tz),
}

impl CalendarZone {
    /// Look up a timezone by its canonical name, e.g. "Pacific/Auckland".
    ///
    /// "UTC" (any case) selects [CalendarZone::Utc].
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a
    /// known timezone.
    pub fn from_name(canonical_timezone: &str) -> Result<Self, Error> {
        if canonical_timezone.eq_ignore_ascii_case("utc") {
            return Ok(CalendarZone::Utc);
        }

        time_tz::timezones::get_by_name(canonical_timezone)
            .map(CalendarZone::Named)
            .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
    }

    /// The UTC offset of this zone at the instant `date_time`.
    pub fn offset_at(&self, date_time: OffsetDateTime) -> UtcOffset {
        match self {
            CalendarZone::Utc => UtcOffset::UTC,
            CalendarZone::Named(tz) => tz.get_offset_utc(&date_time).to_utc(),
        }
    }

    /// Express `date_time` as a wall-clock time in this zone.
    pub fn to_local(&self, date_time: OffsetDateTime) -> OffsetDateTime {
        date_time.to_offset(self.offset_at(date_time))
    }

    /// The calendar date in this zone right now.
    pub fn today(&self) -> Date {
        self.to_local(OffsetDateTime::now_utc()).date()
    }

    /// The first instant of `date` in this zone.
    ///
    /// This is local midnight, unless a daylight saving change skips midnight
    /// on `date`, in which case it is the first wall-clock time after the gap.
    pub fn start_of_day(&self, date: Date) -> OffsetDateTime {
        let naive = PrimitiveDateTime::new(date, Time::MIDNIGHT);
        let guess = naive.assume_utc();

        // Any offset in effect near `date` is a candidate. Keep the earliest
        // instant that still falls on `date` locally.
        [guess - Duration::DAY, guess, guess + Duration::DAY]
            .into_iter()
            .map(|instant| naive.assume_offset(self.offset_at(instant)))
            .filter(|candidate| self.to_local(*candidate).date() == date)
            .min()
            .unwrap_or_else(|| naive.assume_offset(self.offset_at(guess)))
    }
}

impl Display for CalendarZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarZone::Utc => write!(f, "UTC"),
            CalendarZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl Debug for CalendarZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CalendarZone({self})")
    }
}

impl PartialEq for CalendarZone {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
