//! Implements a SQLite backed transaction gateway.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use rusqlite::Connection;

use crate::{
    Error,
    gateway::{SnapshotListener, Subscription, TransactionGateway},
    transaction::{
        NewTransaction, Transaction, TransactionId, TransactionPatch, create_transaction,
        delete_transaction, get_transactions_for_owner, update_transaction,
    },
    user::UserID,
};

/// A listener and the version of the newest snapshot it has been given.
struct ListenerSlot {
    listener: SnapshotListener,
    delivered: u64,
}

type SharedListener = Arc<Mutex<ListenerSlot>>;

/// Call the listener in `slot` with `snapshot`, unless it already has a newer one.
///
/// Snapshots are loaded in version order but may reach a listener out of
/// order when several threads write at once, so stale ones are dropped here.
fn deliver(slot: &SharedListener, version: u64, snapshot: &[Transaction]) -> Result<(), Error> {
    let mut guard = slot.lock().map_err(|_| Error::DatabaseLockError)?;
    let slot = &mut *guard;

    if version <= slot.delivered {
        tracing::debug!(
            "Dropped snapshot {version}, listener already has {}",
            slot.delivered
        );
        return Ok(());
    }

    slot.delivered = version;
    (slot.listener)(snapshot);

    Ok(())
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<u64, (UserID, SharedListener)>,
}

impl ListenerRegistry {
    fn insert(&mut self, owner: UserID, listener: SharedListener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, (owner, listener));

        id
    }

    fn listeners_for(&self, owner: UserID) -> Vec<SharedListener> {
        self.listeners
            .values()
            .filter(|(listener_owner, _)| *listener_owner == owner)
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

/// Stores transactions in a SQLite database and notifies subscribers after
/// every successful write.
///
/// Clones share the same connection and subscribers. Each snapshot is given
/// a version while the connection is locked, so a later version never
/// reflects fewer writes than an earlier one. Listeners only ever move
/// forward through the versions.
#[derive(Clone)]
pub struct SQLiteGateway {
    connection: Arc<Mutex<Connection>>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    snapshot_version: Arc<AtomicU64>,
}

impl SQLiteGateway {
    /// Create a new gateway for the SQLite `connection`.
    ///
    /// The database must already be initialized with
    /// [initialize_db](crate::initialize_db).
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection,
            listeners: Arc::default(),
            snapshot_version: Arc::default(),
        }
    }

    /// Load the transactions of `owner` and the version of the load.
    fn load_snapshot(&self, owner: UserID) -> Result<(u64, Vec<Transaction>), Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let snapshot = get_transactions_for_owner(owner, &connection)?;
        let version = self.snapshot_version.fetch_add(1, Ordering::SeqCst) + 1;

        Ok((version, snapshot))
    }

    /// Send the latest snapshot of `owner` to their listeners.
    ///
    /// Neither the connection nor the registry lock is held while a listener runs.
    fn notify(&self, owner: UserID) {
        let (version, snapshot) = match self.load_snapshot(owner) {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::error!(
                    "Could not load the transactions of user {owner} after a write: {error}"
                );
                return;
            }
        };

        let listeners = match self.listeners.lock() {
            Ok(registry) => registry.listeners_for(owner),
            Err(_) => {
                tracing::error!("Could not acquire the listener lock for user {owner}");
                return;
            }
        };

        tracing::debug!(
            "Sending snapshot {version} with {} transactions to {} listener(s) of user {owner}",
            snapshot.len(),
            listeners.len()
        );

        for listener in listeners {
            if deliver(&listener, version, &snapshot).is_err() {
                tracing::error!("Skipping a listener of user {owner} that panicked");
            }
        }
    }
}

impl TransactionGateway for SQLiteGateway {
    fn create_record(
        &self,
        owner: UserID,
        transaction: NewTransaction,
    ) -> Result<TransactionId, Error> {
        let created = {
            let connection = self
                .connection
                .lock()
                .map_err(|_| Error::DatabaseLockError)?;

            create_transaction(owner, transaction, &connection)?
        };

        tracing::info!("Created transaction {} for user {owner}", created.id);
        self.notify(owner);

        Ok(created.id)
    }

    fn update_record(
        &self,
        owner: UserID,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), Error> {
        {
            let connection = self
                .connection
                .lock()
                .map_err(|_| Error::DatabaseLockError)?;

            update_transaction(owner, id, &patch, &connection)?;
        }

        tracing::info!("Updated transaction {id} for user {owner}");
        self.notify(owner);

        Ok(())
    }

    fn delete_record(&self, owner: UserID, id: TransactionId) -> Result<(), Error> {
        {
            let connection = self
                .connection
                .lock()
                .map_err(|_| Error::DatabaseLockError)?;

            delete_transaction(owner, id, &connection)?;
        }

        tracing::info!("Deleted transaction {id} for user {owner}");
        self.notify(owner);

        Ok(())
    }

    fn subscribe(
        &self,
        owner: UserID,
        listener: SnapshotListener,
    ) -> Result<Subscription, Error> {
        let listener: SharedListener = Arc::new(Mutex::new(ListenerSlot {
            listener,
            delivered: 0,
        }));

        // Register before loading so that a write landing in between is
        // either in this snapshot or delivered by its own notification.
        let id = self
            .listeners
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .insert(owner, listener.clone());

        let registry: Weak<Mutex<ListenerRegistry>> = Arc::downgrade(&self.listeners);
        let subscription = Subscription::new(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };

            match registry.lock() {
                Ok(mut registry) => {
                    registry.listeners.remove(&id);
                    tracing::debug!("User {owner} unsubscribed listener {id}");
                }
                Err(_) => tracing::error!("Could not remove listener {id} of user {owner}"),
            }
        });

        // On error the subscription is dropped, which unregisters the listener.
        let (version, snapshot) = self.load_snapshot(owner)?;
        deliver(&listener, version, &snapshot)?;

        tracing::debug!("User {owner} subscribed with listener {id}");

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        gateway::{SnapshotListener, TransactionGateway},
        transaction::{Amount, Transaction, TransactionPatch, TransactionType},
        user::{UserID, create_user},
    };

    use super::{ListenerSlot, SQLiteGateway, deliver};

    type Received = Arc<Mutex<Vec<Vec<Transaction>>>>;

    fn get_test_gateway() -> (SQLiteGateway, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let owner = create_user(
            &"owner@example.com".parse().unwrap(),
            Some(PasswordHash::new_unchecked("hunter2")),
            None,
            &conn,
        )
        .unwrap();
        let other = create_user(&"other@example.com".parse().unwrap(), None, None, &conn).unwrap();

        (
            SQLiteGateway::new(Arc::new(Mutex::new(conn))),
            owner.id,
            other.id,
        )
    }

    fn recording_listener() -> (SnapshotListener, Received) {
        let received: Received = Arc::default();
        let sink = received.clone();
        let listener: SnapshotListener = Box::new(move |snapshot: &[Transaction]| {
            sink.lock().unwrap().push(snapshot.to_vec());
        });

        (listener, received)
    }

    fn salary() -> crate::NewTransaction {
        Transaction::build(
            "Salary",
            Amount::new(dec!(30000)).unwrap(),
            TransactionType::Income,
            datetime!(2024-01-25 0:00 UTC),
        )
    }

    fn rent() -> crate::NewTransaction {
        Transaction::build(
            "Rent",
            Amount::new(dec!(9000)).unwrap(),
            TransactionType::Expense,
            datetime!(2024-02-01 0:00 UTC),
        )
    }

    #[test]
    fn subscribe_delivers_initial_snapshot() {
        let (gateway, owner, _) = get_test_gateway();
        gateway.create_record(owner, salary()).unwrap();
        let (listener, received) = recording_listener();

        let _subscription = gateway.subscribe(owner, listener).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].len(), 1);
        assert_eq!(received[0][0].name, "Salary");
    }

    #[test]
    fn each_write_delivers_an_ordered_snapshot() {
        let (gateway, owner, _) = get_test_gateway();
        let (listener, received) = recording_listener();
        let _subscription = gateway.subscribe(owner, listener).unwrap();

        let salary_id = gateway.create_record(owner, salary()).unwrap();
        let rent_id = gateway.create_record(owner, rent()).unwrap();
        gateway
            .update_record(
                owner,
                salary_id,
                TransactionPatch::default().amount(Amount::new(dec!(32000)).unwrap()),
            )
            .unwrap();
        gateway.delete_record(owner, rent_id).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 5, "want initial snapshot plus one per write");
        assert!(received[0].is_empty());
        let names: Vec<&str> = received[2].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Rent", "Salary"], "want newest date first");
        assert_eq!(received[3][1].amount.value(), dec!(32000));
        assert_eq!(received[4].len(), 1);
        assert_eq!(received[4][0].id, salary_id);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let (gateway, owner, _) = get_test_gateway();
        let (listener, received) = recording_listener();
        let subscription = gateway.subscribe(owner, listener).unwrap();

        drop(subscription);
        gateway.create_record(owner, salary()).unwrap();

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (gateway, owner, _) = get_test_gateway();
        let (listener, received) = recording_listener();
        let subscription = gateway.subscribe(owner, listener).unwrap();

        subscription.unsubscribe();
        gateway.create_record(owner, salary()).unwrap();

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn other_owners_writes_are_not_delivered() {
        let (gateway, owner, other) = get_test_gateway();
        let (listener, received) = recording_listener();
        let _subscription = gateway.subscribe(owner, listener).unwrap();

        gateway.create_record(other, rent()).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].is_empty());
    }

    #[test]
    fn failed_writes_do_not_notify() {
        let (gateway, owner, other) = get_test_gateway();
        let others_record = gateway.create_record(other, rent()).unwrap();
        let (listener, received) = recording_listener();
        let _subscription = gateway.subscribe(owner, listener).unwrap();

        let update = gateway.update_record(
            owner,
            others_record,
            TransactionPatch::default().name("Stolen"),
        );
        let delete = gateway.delete_record(owner, others_record);

        assert_eq!(update, Err(Error::UpdateMissingTransaction));
        assert_eq!(delete, Err(Error::DeleteMissingTransaction));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn create_for_unknown_owner_fails() {
        let (gateway, _, _) = get_test_gateway();

        let result = gateway.create_record(UserID::new(999), salary());

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn several_listeners_each_receive_snapshots() {
        let (gateway, owner, _) = get_test_gateway();
        let (first, first_received) = recording_listener();
        let (second, second_received) = recording_listener();
        let _first = gateway.subscribe(owner, first).unwrap();
        let second_subscription = gateway.subscribe(owner, second).unwrap();

        gateway.create_record(owner, salary()).unwrap();
        drop(second_subscription);
        gateway.create_record(owner, rent()).unwrap();

        assert_eq!(first_received.lock().unwrap().len(), 3);
        assert_eq!(second_received.lock().unwrap().len(), 2);
    }

    #[test]
    fn older_snapshot_is_dropped_after_a_newer_one() {
        let (listener, received) = recording_listener();
        let slot = Arc::new(Mutex::new(ListenerSlot {
            listener,
            delivered: 0,
        }));
        let newer = vec![Transaction {
            id: crate::TransactionId::new(),
            name: "Newer".to_owned(),
            amount: Amount::new(dec!(1)).unwrap(),
            type_: TransactionType::Income,
            date: datetime!(2024-01-01 0:00 UTC),
        }];

        deliver(&slot, 2, &newer).unwrap();
        deliver(&slot, 1, &[]).unwrap();
        deliver(&slot, 2, &[]).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], newer);
    }

    #[test]
    fn concurrent_writers_leave_listener_with_the_final_snapshot() {
        const WRITERS: usize = 4;
        const WRITES_PER_THREAD: usize = 25;

        let (gateway, owner, _) = get_test_gateway();
        let (listener, received) = recording_listener();
        let _subscription = gateway.subscribe(owner, listener).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..WRITERS {
                let gateway = gateway.clone();
                scope.spawn(move || {
                    for _ in 0..WRITES_PER_THREAD {
                        gateway.create_record(owner, salary()).unwrap();
                    }
                });
            }
        });

        let received = received.lock().unwrap();
        let lengths: Vec<usize> = received.iter().map(Vec::len).collect();
        assert_eq!(
            lengths.last(),
            Some(&(WRITERS * WRITES_PER_THREAD)),
            "want the last snapshot to hold every write"
        );
        assert!(
            lengths.windows(2).all(|pair| pair[0] <= pair[1]),
            "want snapshots in the order they were loaded, got {lengths:?}"
        );
    }
}
