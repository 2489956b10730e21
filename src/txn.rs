//! Transaction context.
//!
//! Modeled as an explicit value threaded through calls rather than bound to
//! thread-local storage, per the source design notes: explicit
//! transaction-passing is the idiomatic substitute where the language
//! discourages hidden state.
//!
//! `sled`'s transactional trees support only point reads/writes — no range
//! scans — so `Txn` exposes point operations on all four tables. Range scans
//! (the query engine, and bulk-delete's candidate-gathering pass) read
//! directly against the tables' latest committed state; the deletions
//! themselves are then applied in one shared `Txn`, so a bulk delete commits
//! or aborts as a single unit.

use sled::transaction::{ConflictableTransactionError, TransactionalTree};

use crate::env::Environment;
use crate::error::{Result, StoreError};

pub struct Txn<'a> {
    pub(crate) rows: &'a TransactionalTree,
    pub(crate) ip: &'a TransactionalTree,
    pub(crate) pvt: &'a TransactionalTree,
    pub(crate) pt: &'a TransactionalTree,
}

pub(crate) type TxResult<T> = std::result::Result<T, ConflictableTransactionError<StoreError>>;

impl<'a> Txn<'a> {
    pub(crate) fn put_row(&self, key: &[u8], value: &[u8]) -> TxResult<()> {
        self.rows.insert(key, value)?;
        Ok(())
    }

    pub(crate) fn get_row(&self, key: &[u8]) -> TxResult<Option<sled::IVec>> { Ok(self.rows.get(key)?) }

    pub(crate) fn remove_row(&self, key: &[u8]) -> TxResult<Option<sled::IVec>> { Ok(self.rows.remove(key)?) }

    pub(crate) fn put_ip(&self, key: &[u8], value: &[u8]) -> TxResult<()> {
        self.ip.insert(key, value)?;
        Ok(())
    }
    pub(crate) fn remove_ip(&self, key: &[u8]) -> TxResult<Option<sled::IVec>> { Ok(self.ip.remove(key)?) }

    pub(crate) fn put_pvt(&self, key: &[u8], value: &[u8]) -> TxResult<()> {
        self.pvt.insert(key, value)?;
        Ok(())
    }
    pub(crate) fn remove_pvt(&self, key: &[u8]) -> TxResult<Option<sled::IVec>> { Ok(self.pvt.remove(key)?) }

    pub(crate) fn put_pt(&self, key: &[u8], value: &[u8]) -> TxResult<()> {
        self.pt.insert(key, value)?;
        Ok(())
    }
    pub(crate) fn remove_pt(&self, key: &[u8]) -> TxResult<Option<sled::IVec>> { Ok(self.pt.remove(key)?) }
}

/// Runs `f` inside one atomic write transaction spanning all four tables.
/// Any `StoreError` returned by `f` aborts the transaction and is propagated;
/// sled's internal conflict retries are transparent to the caller.
pub(crate) fn with_write_txn<T>(env: &Environment, f: impl Fn(&Txn) -> TxResult<T>) -> Result<T> {
    use sled::Transactional;
    (&env.rows, &env.ip, &env.pvt, &env.pt)
        .transaction(|(rows, ip, pvt, pt)| {
            let txn = Txn { rows, ip, pvt, pt };
            f(&txn)
        })
        .map_err(|e| match e {
            sled::transaction::TransactionError::Abort(err) => err,
            sled::transaction::TransactionError::Storage(err) => StoreError::Engine(err),
        })
}
