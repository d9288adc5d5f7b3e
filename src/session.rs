//! A signed-in user's dashboard and the actions they can take on it.

use std::sync::{Arc, Mutex};

use crate::{
    Error,
    dashboard::DashboardView,
    gateway::{Subscription, TransactionGateway},
    month::MonthFilter,
    timezone::CalendarZone,
    transaction::{Transaction, TransactionForm, TransactionId},
    user::User,
};

/// The state kept while a user is signed in.
///
/// Starting a session subscribes to the user's transactions, and every
/// snapshot is fed into the [DashboardView]. The subscription ends when the
/// session is signed out or dropped.
pub struct Session<G: TransactionGateway> {
    user: User,
    gateway: G,
    zone: CalendarZone,
    dashboard: Arc<Mutex<DashboardView>>,
    subscription: Subscription,
}

impl<G: TransactionGateway> Session<G> {
    /// Sign `user` in and subscribe to their transactions.
    ///
    /// # Errors
    /// Returns an error if the gateway could not subscribe.
    pub fn start(user: User, gateway: G, zone: CalendarZone) -> Result<Self, Error> {
        let dashboard = Arc::new(Mutex::new(DashboardView::new(zone)));
        let sink = dashboard.clone();
        let owner = user.id;

        let subscription = gateway.subscribe(
            owner,
            Box::new(move |snapshot: &[Transaction]| match sink.lock() {
                Ok(mut dashboard) => dashboard.apply_snapshot(snapshot),
                Err(_) => {
                    tracing::error!("Dropped a snapshot for user {owner}, dashboard lock poisoned")
                }
            }),
        )?;

        tracing::info!("Started session for user {owner}");

        Ok(Self {
            user,
            gateway,
            zone,
            dashboard,
            subscription,
        })
    }

    /// The signed-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The calendar zone used for form dates and month boundaries.
    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    /// Read the dashboard.
    ///
    /// # Errors
    /// Returns [Error::DashboardLockError] if a listener panicked while
    /// updating the dashboard.
    pub fn with_dashboard<T>(&self, read: impl FnOnce(&DashboardView) -> T) -> Result<T, Error> {
        let dashboard = self
            .dashboard
            .lock()
            .map_err(|_| Error::DashboardLockError)?;

        Ok(read(&dashboard))
    }

    /// Show only the transactions that pass `filter`.
    ///
    /// # Errors
    /// Returns [Error::DashboardLockError] if the dashboard lock is poisoned.
    pub fn set_month_filter(&self, filter: MonthFilter) -> Result<(), Error> {
        self.dashboard
            .lock()
            .map_err(|_| Error::DashboardLockError)?
            .set_filter(filter);

        Ok(())
    }

    /// Validate `form` and store it as a new transaction.
    ///
    /// # Errors
    /// Returns [Error::InvalidForm] without calling the gateway if the form is
    /// invalid, or the gateway's error if the write failed.
    pub fn add_transaction(&self, form: &TransactionForm) -> Result<TransactionId, Error> {
        let owner = self.user.id;
        let new_transaction = form.validate(&self.zone).inspect_err(|error| {
            tracing::warn!("Rejected new transaction from user {owner}: {error}");
        })?;

        self.gateway
            .create_record(owner, new_transaction)
            .inspect_err(|error| {
                tracing::error!("Could not add transaction for user {owner}: {error}");
            })
    }

    /// Validate `form` and replace the fields of transaction `id` with it.
    ///
    /// # Errors
    /// Returns [Error::InvalidForm] without calling the gateway if the form is
    /// invalid, or the gateway's error if the write failed.
    pub fn edit_transaction(&self, id: TransactionId, form: &TransactionForm) -> Result<(), Error> {
        let owner = self.user.id;
        let patch = form.validate_patch(&self.zone).inspect_err(|error| {
            tracing::warn!("Rejected edit of transaction {id} from user {owner}: {error}");
        })?;

        self.gateway
            .update_record(owner, id, patch)
            .inspect_err(|error| {
                tracing::error!("Could not update transaction {id} for user {owner}: {error}");
            })
    }

    /// Delete transaction `id`.
    ///
    /// # Errors
    /// Returns the gateway's error if the write failed.
    pub fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        let owner = self.user.id;

        self.gateway
            .delete_record(owner, id)
            .inspect_err(|error| {
                tracing::error!("Could not delete transaction {id} for user {owner}: {error}");
            })
    }

    /// End the session and stop listening for changes.
    pub fn sign_out(self) {
        let Self {
            user, subscription, ..
        } = self;

        subscription.unsubscribe();
        tracing::info!("User {} signed out", user.id);
    }
}
