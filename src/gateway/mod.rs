//! Defines the gateway to the store of transactions.
//!
//! The dashboard never reads the store directly. It subscribes to a feed of
//! snapshots and sends its writes through the gateway, which may fail.

mod sqlite;

use std::fmt::Debug;

use crate::{
    Error,
    transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
    user::UserID,
};

pub use sqlite::SQLiteGateway;

/// Called with the full list of an owner's transactions, newest first,
/// whenever it changes.
///
/// A listener must not write through the gateway from inside the callback.
pub type SnapshotListener = Box<dyn FnMut(&[Transaction]) + Send>;

/// Handles writes to and change notifications from the transaction store.
///
/// Every record belongs to an owner. Updating or deleting a record of another
/// owner fails the same way as for a record that does not exist.
pub trait TransactionGateway {
    /// Store a new transaction for `owner` and return its ID.
    fn create_record(
        &self,
        owner: UserID,
        transaction: NewTransaction,
    ) -> Result<TransactionId, Error>;

    /// Change the fields of transaction `id` that are set in `patch`.
    ///
    /// # Errors
    /// Returns [Error::UpdateMissingTransaction] if `owner` has no transaction `id`.
    fn update_record(
        &self,
        owner: UserID,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), Error>;

    /// Remove transaction `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if `owner` has no transaction `id`.
    fn delete_record(&self, owner: UserID, id: TransactionId) -> Result<(), Error>;

    /// Listen for changes to the transactions of `owner`.
    ///
    /// The listener is called with the current snapshot straight away and
    /// again after every successful write for `owner`, until the returned
    /// [Subscription] is dropped.
    fn subscribe(&self, owner: UserID, listener: SnapshotListener)
    -> Result<Subscription, Error>;
}

/// A live subscription to a snapshot feed.
///
/// The listener is removed when the subscription is dropped or
/// [Subscription::unsubscribe] is called, whichever happens first.
#[must_use = "dropping a subscription unsubscribes straight away"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that calls `cancel` once when it ends.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving snapshots.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
