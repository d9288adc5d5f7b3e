//! Pocketbook is a personal finance tracker for recording income and expenses.
//!
//! Users record transactions, filter them by month and see the totals for the
//! selected month as summary figures and a bar chart. Persistence and realtime
//! updates sit behind the [TransactionGateway] trait; [SQLiteGateway] is the
//! implementation used by the command-line tools.

#![warn(missing_docs)]

use rust_decimal::Decimal;

mod app_state;
mod auth;
mod currency;
mod dashboard;
mod db;
mod email;
mod gateway;
mod locale;
mod logging;
mod month;
mod password;
mod session;
mod timezone;
mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{FederatedIdentity, log_in, register_user, sign_in_with_identity};
pub use currency::format_currency;
pub use dashboard::{
    ChartBar, DashboardView, Summary, income_expense_bars, income_expense_chart, summarize,
};
pub use db::initialize as initialize_db;
pub use email::Email;
pub use gateway::{SQLiteGateway, SnapshotListener, Subscription, TransactionGateway};
pub use locale::{Locale, Operation};
pub use logging::setup_logging;
pub use month::{MonthFilter, MonthKey, MonthOption, filter_by_month, month_options};
pub use password::{MIN_PASSWORD_LENGTH, PasswordHash, PasswordStrength, ValidatedPassword};
pub use session::Session;
pub use timezone::CalendarZone;
pub use transaction::{
    Amount, FormError, NewTransaction, Transaction, TransactionForm, TransactionId,
    TransactionPatch, TransactionType,
};
pub use user::{
    User, UserID, count_users, create_user, get_user_by_email, get_user_by_id, set_password_hash,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination does not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user provided a password shorter than [MIN_PASSWORD_LENGTH].
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    PasswordTooShort,

    /// The password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging. When
    /// communicating with the user this error should be replaced with a
    /// generic error message.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The email address already belongs to a registered user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The transaction form failed validation and was not submitted.
    #[error("invalid transaction form: {0}")]
    InvalidForm(#[from] FormError),

    /// The string is not a month key of the form `YYYY-MM` or "all".
    #[error("\"{0}\" is not a valid month, expected YYYY-MM or \"all\"")]
    InvalidMonthKey(String),

    /// A transaction amount was negative.
    ///
    /// Amounts are always non-negative, the transaction type decides whether
    /// the money came in or went out.
    #[error("{0} is negative, amounts must be zero or more")]
    NegativeAmount(Decimal),

    /// A transaction amount was larger than [Amount::MAX].
    #[error("{0} is larger than the maximum amount of {max}", max = Amount::MAX)]
    AmountTooLarge(Decimal),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A timezone name that is not a valid, canonical timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the dashboard state
    #[error("could not acquire the dashboard lock")]
    DashboardLockError,

    /// Tried to update a transaction that does not exist for the owner
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist for the owner
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The message to show a user when `operation` failed with this error.
    ///
    /// Validation and sign-in errors get a specific message. Anything else is
    /// not meant for the user and is replaced with the generic failure message
    /// for `operation`.
    pub fn user_message(&self, operation: Operation, locale: Locale) -> String {
        match self {
            Error::InvalidForm(form_error) => form_error.message(locale).to_owned(),
            Error::InvalidCredentials => locale.invalid_credentials().to_owned(),
            Error::PasswordTooShort => locale.password_too_short().to_owned(),
            Error::PasswordMismatch => locale.password_mismatch().to_owned(),
            Error::InvalidEmail(_) => locale.invalid_email().to_owned(),
            Error::DuplicateEmail => locale.duplicate_email().to_owned(),
            Error::InvalidMonthKey(key) => locale.invalid_month(key),
            Error::NegativeAmount(_) => locale.negative_amount().to_owned(),
            Error::AmountTooLarge(_) => locale.amount_too_large().to_owned(),
            Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                locale.missing_transaction().to_owned()
            }
            _ => locale.operation_failed(operation).to_owned(),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use crate::{Error, FormError, Locale, Operation};

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn form_errors_keep_their_own_message() {
        let error = Error::from(FormError::MissingFields);

        assert_eq!(
            error.user_message(Operation::Add, Locale::Thai),
            "กรุณากรอกข้อมูลให้ครบทุกช่อง"
        );
    }

    #[test]
    fn amount_errors_keep_their_own_message() {
        let error = Error::AmountTooLarge(rust_decimal::Decimal::MAX);

        assert_eq!(
            error.user_message(Operation::Add, Locale::English),
            "The amount cannot be more than 999,999,999,999.99."
        );
    }

    #[test]
    fn unexpected_errors_get_generic_message() {
        let error = Error::DatabaseLockError;

        assert_eq!(
            error.user_message(Operation::Update, Locale::Thai),
            "ไม่สามารถอัปเดตรายการได้ กรุณาลองใหม่อีกครั้ง"
        );
        assert_eq!(
            error.user_message(Operation::Delete, Locale::English),
            "Could not delete the transaction. Please try again."
        );
    }
}
