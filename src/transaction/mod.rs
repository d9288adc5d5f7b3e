//! Transactions: the income and expense records a user keeps.
//!
//! This module contains:
//! - The `Transaction` model and the types it is built from
//! - Database functions for storing and querying a user's transactions
//! - Validation of the add and edit transaction forms

mod core;
mod form;

pub use core::{
    Amount, NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionType,
    create_transaction_table,
};
pub use form::{FormError, TransactionForm};

pub(crate) use core::{
    create_transaction, delete_transaction, get_transactions_for_owner, update_transaction,
};

#[cfg(test)]
pub(crate) use core::{count_transactions, get_transaction};
