//! Registered users and the queries on the user table.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, email::Email, locale::Locale, password::PasswordHash};

/// The row ID of a user, which also identifies the owner of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Users who only ever signed in through a federated identity have no
/// password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user signs in with.
    pub email: Email,
    /// The user's password hash.
    pub password_hash: Option<PasswordHash>,
    /// The name shown in the dashboard header.
    pub display_name: Option<String>,
}

impl User {
    /// The name to greet the user with.
    ///
    /// Falls back to the email address, then to a generic label.
    pub fn greeting_name(&self, locale: Locale) -> &str {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.email.as_str().is_empty() => self.email.as_str(),
            _ => locale.anonymous_user(),
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT,
                display_name TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if `email` already belongs to a user,
/// - or [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: &Email,
    password_hash: Option<PasswordHash>,
    display_name: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let display_name = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    connection.execute(
        "INSERT INTO user (email, password, display_name) VALUES (?1, ?2, ?3)",
        (
            email.to_string(),
            password_hash.as_ref().map(|hash| hash.to_string()),
            display_name.as_deref(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.clone(),
        password_hash,
        display_name,
    })
}

/// Replace the password hash of the user `user_id`.
///
/// # Errors
///
/// Returns a [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn set_password_hash(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let raw_password_hash: Option<String> = row.get(2)?;
    let display_name = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        email: Email::new_unchecked(&raw_email),
        password_hash: raw_password_hash
            .as_deref()
            .map(PasswordHash::new_unchecked),
        display_name,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, password, display_name FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &Email, db_connection: &Connection) -> Result<User, Error> {
    let email = email.as_str();

    db_connection
        .prepare("SELECT id, email, password, display_name FROM user WHERE email = :email")?
        .query_row(&[(":email", email)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    // COUNT is never negative.
    Ok(count as usize)
}
