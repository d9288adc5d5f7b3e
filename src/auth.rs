//! Registering users and signing them in.
//!
//! Users sign in either with an email and password or through a federated
//! identity provider. A federated identity is linked to the user with the
//! same email address, or to a new password-less user if there is none.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    email::Email,
    password::{PasswordHash, ValidatedPassword},
    user::{User, UserID, create_user, get_user_by_email, get_user_by_id},
};

/// A user as vouched for by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedIdentity {
    /// The name of the provider, e.g. "google".
    pub provider: String,
    /// The provider's stable ID for the user.
    pub subject: String,
    /// The email address the provider has verified.
    pub email: String,
    /// The user's name as given by the provider.
    pub display_name: Option<String>,
}

/// Create the table that links federated identities to users.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_identity_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS identity (
                provider TEXT NOT NULL,
                subject TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY(provider, subject),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create an account that signs in with an email and password.
///
/// `cost` is the bcrypt cost, use [PasswordHash::DEFAULT_COST] outside of tests.
///
/// # Errors
///
/// Checks are made in this order and the first failure is returned:
/// - [Error::InvalidEmail] if `email` is not an email address,
/// - [Error::PasswordTooShort] if `password` is too short,
/// - [Error::PasswordMismatch] if `confirm_password` differs from `password`,
/// - [Error::DuplicateEmail] if `email` is already registered.
pub fn register_user(
    email: &str,
    password: &str,
    confirm_password: &str,
    display_name: Option<&str>,
    cost: u32,
    connection: &Connection,
) -> Result<User, Error> {
    let email = Email::new(email)?;
    let validated_password = ValidatedPassword::new_confirmed(password, confirm_password)?;

    match get_user_by_email(&email, connection) {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let password_hash = PasswordHash::new(validated_password, cost).inspect_err(|error| {
        tracing::error!("An error occurred while hashing a password: {error}");
    })?;

    let user = create_user(&email, Some(password_hash), display_name, connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok(user)
}

/// Sign in with an email and password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered, the
/// password is wrong, or the account has no password because it was created
/// through a federated identity.
pub fn log_in(email: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let email = Email::new(email)?;

    let user = match get_user_by_email(&email, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::warn!("Rejected sign-in for an unregistered email");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let Some(password_hash) = &user.password_hash else {
        tracing::warn!("Rejected password sign-in for user {}, who has no password", user.id);
        return Err(Error::InvalidCredentials);
    };

    let is_password_valid = password_hash.verify(password).map_err(|error| {
        tracing::error!("Unhandled error while verifying credentials: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        tracing::warn!("Rejected sign-in for user {} with a wrong password", user.id);
        return Err(Error::InvalidCredentials);
    }

    tracing::info!("User {} signed in", user.id);

    Ok(user)
}

/// Sign in with an identity from an external provider.
///
/// The user already linked to the identity is returned. Otherwise the
/// identity is linked to the user registered with the same email, or to a new
/// user without a password.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if the provider's email is not valid, or an
/// [Error::SqlError] if the database could not be read or written.
pub fn sign_in_with_identity(
    identity: &FederatedIdentity,
    connection: &Connection,
) -> Result<User, Error> {
    if let Some(user_id) = find_linked_user(identity, connection)? {
        let user = get_user_by_id(user_id, connection)?;
        tracing::info!("User {} signed in with {}", user.id, identity.provider);

        return Ok(user);
    }

    let email = Email::new(&identity.email)?;
    let transaction = connection.unchecked_transaction()?;

    let user = match get_user_by_email(&email, &transaction) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            let user = create_user(&email, None, identity.display_name.as_deref(), &transaction)?;
            tracing::info!("Registered user {} through {}", user.id, identity.provider);

            user
        }
        Err(error) => return Err(error),
    };

    transaction.execute(
        "INSERT INTO identity (provider, subject, user_id) VALUES (?1, ?2, ?3)",
        (&identity.provider, &identity.subject, user.id.as_i64()),
    )?;
    transaction.commit()?;

    tracing::info!("Linked a {} identity to user {}", identity.provider, user.id);

    Ok(user)
}

fn find_linked_user(
    identity: &FederatedIdentity,
    connection: &Connection,
) -> Result<Option<UserID>, Error> {
    connection
        .query_row(
            "SELECT user_id FROM identity WHERE provider = ?1 AND subject = ?2",
            (&identity.provider, &identity.subject),
            |row| row.get(0).map(UserID::new),
        )
        .optional()
        .map_err(|error| error.into())
}
