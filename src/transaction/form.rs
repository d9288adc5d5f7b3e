//! Validation of the add and edit transaction forms.
//!
//! Form fields arrive as raw strings. They are checked before anything is
//! sent to the gateway, so an invalid form never results in a write.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    locale::Locale,
    timezone::CalendarZone,
    transaction::core::{Amount, NewTransaction, Transaction, TransactionPatch, TransactionType},
};

/// Why a transaction form was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The name, amount or date was left empty.
    #[error("the name, amount and date are required")]
    MissingFields,
    /// The amount is not a number.
    #[error("\"{0}\" is not a number")]
    InvalidAmount(String),
    /// The amount is less than zero.
    #[error("\"{0}\" is negative")]
    NegativeAmount(String),
    /// The amount is more than [Amount::MAX].
    #[error("\"{0}\" is larger than the maximum amount")]
    AmountTooLarge(String),
    /// The date is not a calendar date in the format YYYY-MM-DD.
    #[error("\"{0}\" is not a date in the format YYYY-MM-DD")]
    InvalidDate(String),
}

impl FormError {
    /// The message to show the user.
    pub fn message(&self, locale: Locale) -> &'static str {
        match self {
            FormError::MissingFields => locale.missing_fields(),
            FormError::InvalidAmount(_) => locale.invalid_amount(),
            FormError::NegativeAmount(_) => locale.negative_amount(),
            FormError::AmountTooLarge(_) => locale.amount_too_large(),
            FormError::InvalidDate(_) => locale.invalid_date(),
        }
    }
}

/// The raw fields of the add or edit transaction form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// What the transaction was for.
    pub name: String,
    /// The amount as typed, e.g. "1234.50".
    pub amount: String,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// The date as typed, in the format YYYY-MM-DD.
    pub date: String,
}

impl TransactionForm {
    /// An empty form for a new transaction dated `today`.
    pub fn new(today: Date) -> Self {
        Self {
            name: String::new(),
            amount: String::new(),
            type_: TransactionType::Income,
            date: format_date(today),
        }
    }

    /// A form pre-filled with the values of `transaction`, for editing.
    ///
    /// The date is shown as the calendar day in `zone`.
    pub fn from_transaction(transaction: &Transaction, zone: &CalendarZone) -> Self {
        Self {
            name: transaction.name.clone(),
            amount: transaction.amount.to_string(),
            type_: transaction.type_,
            date: format_date(zone.to_local(transaction.date).date()),
        }
    }

    /// The form after a successful submission.
    ///
    /// The fields are cleared, the date goes back to `today` and the type is
    /// set to expense since most entries after the first are expenses.
    pub fn reset(&mut self, today: Date) {
        self.name.clear();
        self.amount.clear();
        self.type_ = TransactionType::Expense;
        self.date = format_date(today);
    }

    /// Check the form and convert it into a new transaction.
    ///
    /// The date is midnight at the start of that day in `zone`.
    ///
    /// # Errors
    /// Returns the first [FormError] found, checking for missing fields first,
    /// then the amount and then the date.
    pub fn validate(&self, zone: &CalendarZone) -> Result<NewTransaction, FormError> {
        let name = self.name.trim();
        let amount = self.amount.trim();
        let date = self.date.trim();

        if name.is_empty() || amount.is_empty() || date.is_empty() {
            return Err(FormError::MissingFields);
        }

        let amount = parse_amount(amount)?;
        let date = parse_date(date)?;

        Ok(Transaction::build(
            name,
            amount,
            self.type_,
            zone.start_of_day(date),
        ))
    }

    /// Check the form and convert it into an update that replaces every field.
    ///
    /// # Errors
    /// Returns the same errors as [TransactionForm::validate].
    pub fn validate_patch(&self, zone: &CalendarZone) -> Result<TransactionPatch, FormError> {
        let new_transaction = self.validate(zone)?;

        Ok(TransactionPatch::default()
            .name(&new_transaction.name)
            .amount(new_transaction.amount)
            .type_(new_transaction.type_)
            .date(new_transaction.date))
    }
}

fn parse_amount(raw_amount: &str) -> Result<Amount, FormError> {
    let value = Decimal::from_str(raw_amount)
        .or_else(|_| Decimal::from_scientific(raw_amount))
        .map_err(|_| FormError::InvalidAmount(raw_amount.to_owned()))?;

    if value < Decimal::ZERO {
        return Err(FormError::NegativeAmount(raw_amount.to_owned()));
    }

    Amount::new(value).map_err(|_| FormError::AmountTooLarge(raw_amount.to_owned()))
}

fn parse_date(raw_date: &str) -> Result<Date, FormError> {
    Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| FormError::InvalidDate(raw_date.to_owned()))
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
