//! Implements a struct that holds the state shared by the command-line tools.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, db::initialize, gateway::SQLiteGateway, locale::Locale, timezone::CalendarZone,
};

/// The configuration and database handles of the application.
#[derive(Clone)]
pub struct AppState {
    /// The timezone in which calendar days and months are evaluated.
    pub calendar_zone: CalendarZone,

    /// The language of messages and labels.
    pub locale: Locale,

    /// The connection shared by the gateway and the account queries.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The gateway that reads and writes transactions.
    pub gateway: SQLiteGateway,
}

impl AppState {
    /// Open the application on `db_connection`, creating any missing tables.
    ///
    /// `local_timezone` should be "UTC" or a valid, canonical timezone name, e.g. "Asia/Bangkok".
    ///
    /// # Errors
    /// Returns an error if the timezone is not valid or the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        locale: Locale,
    ) -> Result<Self, Error> {
        let calendar_zone = CalendarZone::from_name(local_timezone)?;

        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            calendar_zone,
            locale,
            gateway: SQLiteGateway::new(connection.clone()),
            db_connection: connection,
        })
    }

    /// Run `query` with the database connection.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the connection lock is poisoned,
    /// otherwise whatever `query` returns.
    pub fn with_connection<T>(
        &self,
        query: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        query(&connection)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, locale::Locale, timezone::CalendarZone, user::count_users};

    use super::AppState;

    #[test]
    fn new_initializes_database() {
        let state =
            AppState::new(Connection::open_in_memory().unwrap(), "UTC", Locale::Thai).unwrap();

        assert_eq!(state.with_connection(count_users), Ok(0));
        assert_eq!(state.calendar_zone, CalendarZone::Utc);
    }

    #[test]
    fn new_fails_on_unknown_timezone() {
        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Nowhere/Special",
            Locale::English,
        );

        assert!(matches!(result, Err(Error::InvalidTimezoneError(_))));
    }
}
