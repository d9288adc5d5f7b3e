//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::{Error, locale::Locale, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The unique identifier of a transaction.
///
/// Identifiers are random UUIDs, so they are unique across all users and can
/// be created before the record is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new random ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An amount of money between zero and [Amount::MAX].
///
/// Whether the money was earned or spent is recorded by [TransactionType].
/// Amounts are stored as decimal strings so no precision is lost. The upper
/// bound keeps totals over any realistic number of transactions far below
/// the range of [Decimal].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// An amount of zero.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The largest amount a transaction may have, 999,999,999,999.99.
    pub const MAX: Amount = Amount(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    /// Returns [Error::NegativeAmount] if `value` is less than zero, or
    /// [Error::AmountTooLarge] if it is more than [Amount::MAX].
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value < Decimal::ZERO {
            return Err(Error::NegativeAmount(value));
        }

        if value > Self::MAX.0 {
            return Err(Error::AmountTooLarge(value));
        }

        Ok(Self(value))
    }

    /// The decimal value of the amount.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let decimal = match value {
            ValueRef::Text(_) => Decimal::from_str(value.as_str()?)
                .map_err(|error| FromSqlError::Other(Box::new(error)))?,
            ValueRef::Integer(integer) => Decimal::from(integer),
            ValueRef::Real(real) => {
                Decimal::try_from(real).map_err(|error| FromSqlError::Other(Box::new(error)))?
            }
            _ => return Err(FromSqlError::InvalidType),
        };

        Amount::new(decimal).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The name used when storing and parsing the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The localized name of the type.
    pub fn label(&self, locale: Locale) -> &'static str {
        match self {
            TransactionType::Income => locale.income(),
            TransactionType::Expense => locale.expense(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!(
                "unknown transaction type \"{other}\", expected \"income\" or \"expense\""
            )),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description of what the transaction was for.
    pub name: String,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        name: &str,
        amount: Amount,
        type_: TransactionType,
        date: OffsetDateTime,
    ) -> NewTransaction {
        NewTransaction {
            name: name.to_owned(),
            amount,
            type_,
            date,
        }
    }

    /// The amount with a sign: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Decimal {
        match self.type_ {
            TransactionType::Income => self.amount.value(),
            TransactionType::Expense => -self.amount.value(),
        }
    }
}

/// The data needed to create a [Transaction].
///
/// The ID is assigned when the transaction is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A short description of what the transaction was for.
    pub name: String,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// Whether the money was earned or spent.
    pub type_: TransactionType,
    /// When the transaction happened.
    pub date: OffsetDateTime,
}

/// A partial update of a [Transaction].
///
/// Fields set to `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// The new name.
    pub name: Option<String>,
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new type.
    pub type_: Option<TransactionType>,
    /// The new date.
    pub date: Option<OffsetDateTime>,
}

impl TransactionPatch {
    /// Set the name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Set the amount.
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the type.
    pub fn type_(mut self, type_: TransactionType) -> Self {
        self.type_ = Some(type_);
        self
    }

    /// Set the date.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether the patch leaves every field unchanged.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.amount.is_none() && self.type_.is_none() && self.date.is_none()
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Dates are stored in UTC so that text ordering matches time ordering.
fn storage_date(date: OffsetDateTime) -> OffsetDateTime {
    date.to_offset(UtcOffset::UTC)
}

/// Create a new transaction owned by `owner` in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `owner` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    owner: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (id, owner_id, name, amount, \"type\", date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, amount, \"type\", date",
        )?
        .query_row(
            (
                TransactionId::new(),
                owner.as_i64(),
                new_transaction.name,
                new_transaction.amount,
                new_transaction.type_,
                storage_date(new_transaction.date),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve the transaction `id` owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, name, amount, \"type\", date FROM \"transaction\"
             WHERE id = ?1 AND owner_id = ?2",
        )?
        .query_row((id, owner.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Get every transaction owned by `owner`, newest first.
///
/// Transactions on the same date are ordered most recently created first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_owner(
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, name, amount, \"type\", date FROM \"transaction\"
             WHERE owner_id = ?1
             ORDER BY date DESC, rowid DESC",
        )?
        .query_map((owner.as_i64(),), map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Apply `patch` to the transaction `id` owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by `owner`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    owner: UserID,
    id: TransactionId,
    patch: &TransactionPatch,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET name = COALESCE(?1, name),
             amount = COALESCE(?2, amount),
             \"type\" = COALESCE(?3, \"type\"),
             date = COALESCE(?4, date)
         WHERE id = ?5 AND owner_id = ?6",
        (
            patch.name.as_deref(),
            patch.amount,
            patch.type_,
            patch.date.map(storage_date),
            id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete the transaction `id` owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `owner`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2",
        (id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the number of transactions owned by `owner`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(owner: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE owner_id = ?1;",
            (owner.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                owner_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount TEXT NOT NULL,
                \"type\" TEXT NOT NULL CHECK (\"type\" IN ('income', 'expense')),
                date TEXT NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Snapshots are always loaded per owner in date order.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let amount = row.get(2)?;
    let type_ = row.get(3)?;
    let date = row.get(4)?;

    Ok(Transaction {
        id,
        name,
        amount,
        type_,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        transaction::{
            Amount, Transaction, TransactionId, TransactionPatch, TransactionType,
            count_transactions, create_transaction, delete_transaction, get_transaction,
            get_transactions_for_owner, update_transaction,
        },
        user::{UserID, create_user},
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            &"test@example.com".parse().unwrap(),
            Some(PasswordHash::new_unchecked("hunter2")),
            None,
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (conn, owner) = get_test_connection();

        let result = create_transaction(
            owner,
            Transaction::build(
                "Salary",
                amount(dec!(12.30)),
                TransactionType::Income,
                datetime!(2025-10-05 0:00 UTC),
            ),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount.value(), dec!(12.30));
                assert_eq!(transaction.name, "Salary");
                assert_eq!(transaction.type_, TransactionType::Income);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_for_unknown_owner() {
        let (conn, _) = get_test_connection();

        let result = create_transaction(
            UserID::new(42),
            Transaction::build(
                "",
                amount(dec!(1)),
                TransactionType::Expense,
                datetime!(2025-10-05 0:00 UTC),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn stored_date_is_the_same_instant() {
        let (conn, owner) = get_test_connection();
        let date = datetime!(2024-01-05 00:00 +7);

        let created = create_transaction(
            owner,
            Transaction::build("Lunch", amount(dec!(80)), TransactionType::Expense, date),
            &conn,
        )
        .unwrap();

        let fetched = get_transaction(owner, created.id, &conn).unwrap();
        assert_eq!(fetched.date, date);
    }

    #[test]
    fn lists_newest_first() {
        let (conn, owner) = get_test_connection();
        for (name, date) in [
            ("middle", datetime!(2024-02-10 0:00 UTC)),
            ("oldest", datetime!(2024-01-05 0:00 UTC)),
            ("newest", datetime!(2024-03-01 0:00 UTC)),
        ] {
            create_transaction(
                owner,
                Transaction::build(name, amount(dec!(1)), TransactionType::Expense, date),
                &conn,
            )
            .unwrap();
        }

        let names: Vec<String> = get_transactions_for_owner(owner, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.name)
            .collect();

        assert_eq!(names, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn same_date_lists_latest_created_first() {
        let (conn, owner) = get_test_connection();
        let date = datetime!(2024-02-10 0:00 UTC);
        for name in ["first", "second"] {
            create_transaction(
                owner,
                Transaction::build(name, amount(dec!(1)), TransactionType::Expense, date),
                &conn,
            )
            .unwrap();
        }

        let transactions = get_transactions_for_owner(owner, &conn).unwrap();

        assert_eq!(transactions[0].name, "second");
        assert_eq!(transactions[1].name, "first");
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let (conn, owner) = get_test_connection();
        let created = create_transaction(
            owner,
            Transaction::build(
                "Rent",
                amount(dec!(100)),
                TransactionType::Expense,
                datetime!(2024-01-01 0:00 UTC),
            ),
            &conn,
        )
        .unwrap();

        update_transaction(
            owner,
            created.id,
            &TransactionPatch::default().amount(amount(dec!(120.50))),
            &conn,
        )
        .unwrap();

        let updated = get_transaction(owner, created.id, &conn).unwrap();
        assert_eq!(updated.amount.value(), dec!(120.50));
        assert_eq!(updated.name, "Rent");
        assert_eq!(updated.type_, TransactionType::Expense);
        assert_eq!(updated.date, created.date);
    }

    #[test]
    fn update_fails_for_missing_transaction() {
        let (conn, owner) = get_test_connection();

        let result = update_transaction(
            owner,
            TransactionId::new(),
            &TransactionPatch::default().name("Nothing"),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let (conn, owner) = get_test_connection();
        let created = create_transaction(
            owner,
            Transaction::build(
                "Coffee",
                amount(dec!(4.5)),
                TransactionType::Expense,
                datetime!(2024-01-01 0:00 UTC),
            ),
            &conn,
        )
        .unwrap();

        delete_transaction(owner, created.id, &conn).unwrap();

        assert_eq!(count_transactions(owner, &conn), Ok(0));
        assert_eq!(
            delete_transaction(owner, created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn other_owners_cannot_touch_records() {
        let (conn, owner) = get_test_connection();
        let intruder = create_user(&"other@example.com".parse().unwrap(), None, None, &conn)
            .unwrap()
            .id;
        let created = create_transaction(
            owner,
            Transaction::build(
                "Savings",
                amount(dec!(500)),
                TransactionType::Income,
                datetime!(2024-01-01 0:00 UTC),
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(intruder, created.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_transaction(
                intruder,
                created.id,
                &TransactionPatch::default().name("Mine now"),
                &conn
            ),
            Err(Error::UpdateMissingTransaction)
        );
        assert_eq!(
            delete_transaction(intruder, created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
        assert_eq!(count_transactions(owner, &conn), Ok(1));
    }
}
