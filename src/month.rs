//! Calendar months and the month filter applied to a user's transactions.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Month, OffsetDateTime};

use crate::{Error, locale::Locale, timezone::CalendarZone, transaction::Transaction};

/// The number of months listed in the month selector, counting the current one.
const SELECTABLE_MONTHS: usize = 12;

/// A calendar month, written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// The month `month` of `year`.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month containing the instant `date` in `zone`.
    pub fn of(date: OffsetDateTime, zone: &CalendarZone) -> Self {
        let local = zone.to_local(date);

        Self::new(local.year(), local.month())
    }

    /// The current month in `zone`.
    pub fn current(zone: &CalendarZone) -> Self {
        let today = zone.today();

        Self::new(today.year(), today.month())
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// The Gregorian year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The month name and year as shown to the user, e.g. "October 2026".
    ///
    /// Thai labels use the Buddhist-era year, e.g. "ตุลาคม 2569".
    pub fn label(&self, locale: Locale) -> String {
        format!(
            "{} {}",
            locale.month_name(self.month),
            locale.display_year(self.year)
        )
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, u8::from(self.month)).cmp(&(other.year, u8::from(other.month)))
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    /// Parse a key of the exact form `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonthKey(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;

        if year.len() != 4
            || month.len() != 2
            || !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Which transactions the dashboard shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MonthFilter {
    /// Every transaction, regardless of date.
    #[default]
    All,
    /// Only transactions dated within the month.
    Month(MonthKey),
}

impl MonthFilter {
    /// Whether a transaction dated `date` passes the filter, evaluating the
    /// calendar month in `zone`.
    pub fn matches(&self, date: OffsetDateTime, zone: &CalendarZone) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(key) => MonthKey::of(date, zone) == *key,
        }
    }

    /// The label shown in the month selector.
    pub fn label(&self, locale: Locale) -> String {
        match self {
            MonthFilter::All => locale.all_months().to_owned(),
            MonthFilter::Month(key) => key.label(locale),
        }
    }
}

impl From<MonthKey> for MonthFilter {
    fn from(key: MonthKey) -> Self {
        MonthFilter::Month(key)
    }
}

impl Display for MonthFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthFilter::All => write!(f, "all"),
            MonthFilter::Month(key) => key.fmt(f),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(MonthFilter::All);
        }

        s.parse().map(MonthFilter::Month)
    }
}

impl TryFrom<String> for MonthFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthFilter> for String {
    fn from(filter: MonthFilter) -> Self {
        filter.to_string()
    }
}

/// Keep the transactions that pass `filter`, in their original order.
///
/// Filtering with [MonthFilter::All] returns the list unchanged.
pub fn filter_by_month(
    transactions: &[Transaction],
    filter: &MonthFilter,
    zone: &CalendarZone,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction.date, zone))
        .cloned()
        .collect()
}

/// An entry in the month selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    /// The filter applied when this option is chosen.
    pub filter: MonthFilter,
    /// The text shown for this option.
    pub label: String,
}

/// The options of the month selector: "all" first, then `current` and the
/// months before it, newest first.
pub fn month_options(current: MonthKey, locale: Locale) -> Vec<MonthOption> {
    let months = std::iter::successors(Some(current), |key| Some(key.previous()))
        .take(SELECTABLE_MONTHS)
        .map(MonthFilter::Month);

    std::iter::once(MonthFilter::All)
        .chain(months)
        .map(|filter| MonthOption {
            filter,
            label: filter.label(locale),
        })
        .collect()
}
