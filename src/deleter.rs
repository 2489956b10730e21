//! Row & Index Deleter: single-row removal plus the bulk deletion
//! operations built on top of it.
//!
//! Bulk deletion scans the live, non-transactional index tree directly —
//! `sled`'s transactions support only point reads/writes, not range scans —
//! to gather the candidate primary keys, then removes every matched row
//! through one shared transaction spanning the whole batch, so the bulk
//! operation commits or aborts as a single atomic unit.

use tracing::{debug, trace};

use crate::codec::{decode_pk_key, decode_pk_value, decode_row_payload, encode_iden, encode_pk_key, encode_prop, encode_timestamp, encode_value_key, Iden, Value};
use crate::env::Environment;
use crate::error::{Result, StoreError, Table};
use crate::txn::{with_write_txn, Txn, TxResult};

/// Removes the row at `pk` and all three index entries pointing to it,
/// within an already-open transaction.
///
/// If `only_if_value` is given and the row's actual value differs, nothing
/// is removed and `Ok(false)` is returned — used by callers that matched a
/// row through a hashed index key and must confirm the real value before
/// deleting.
fn delete_row_and_indices_in_txn(txn: &Txn, pk: u64, only_if_value: Option<&Value>) -> TxResult<bool> {
    let pk_key = encode_pk_key(pk);

    let payload = match txn.get_row(&pk_key)? {
        Some(p) => p,
        None => return Err(sled::transaction::ConflictableTransactionError::Abort(StoreError::MissingRow { pk })),
    };
    let row = decode_row_payload(&payload);

    if let Some(expected) = only_if_value {
        if &row.value != expected {
            return Ok(false);
        }
    }

    txn.remove_row(&pk_key)?;

    let prop_enc = encode_prop(&row.prop).map_err(sled::transaction::ConflictableTransactionError::Abort)?;

    let mut ip_key = Vec::new();
    ip_key.extend_from_slice(&encode_iden(&row.iden));
    ip_key.extend_from_slice(&prop_enc);
    ip_key.extend_from_slice(&pk_key);
    if txn.remove_ip(&ip_key)?.is_none() {
        return Err(sled::transaction::ConflictableTransactionError::Abort(StoreError::MissingIndexEntry { table: Table::Ip, pk }));
    }

    let mut pvt_key = Vec::new();
    pvt_key.extend_from_slice(&prop_enc);
    pvt_key.extend_from_slice(&encode_value_key(&row.value));
    pvt_key.extend_from_slice(&encode_timestamp(row.timestamp));
    pvt_key.extend_from_slice(&pk_key);
    if txn.remove_pvt(&pvt_key)?.is_none() {
        return Err(sled::transaction::ConflictableTransactionError::Abort(StoreError::MissingIndexEntry { table: Table::Pvt, pk }));
    }

    let mut pt_key = Vec::new();
    pt_key.extend_from_slice(&prop_enc);
    pt_key.extend_from_slice(&encode_timestamp(row.timestamp));
    pt_key.extend_from_slice(&pk_key);
    if txn.remove_pt(&pt_key)?.is_none() {
        return Err(sled::transaction::ConflictableTransactionError::Abort(StoreError::MissingIndexEntry { table: Table::Pt, pk }));
    }

    Ok(true)
}

fn pk_from_ip_key(key: &[u8]) -> u64 { decode_pk_key(key[key.len() - 8..].try_into().unwrap()) }

/// Deletes every row with the given `iden`, across all properties, as one
/// atomic transaction.
pub fn delete_by_iden(env: &Environment, iden: &Iden) -> Result<u64> {
    let prefix = encode_iden(iden);
    let mut pks = Vec::new();
    for entry in env.ip.scan_prefix(prefix) {
        let (key, value) = entry?;
        let pk = decode_pk_value(&value);
        debug_assert_eq!(pk, pk_from_ip_key(&key));
        pks.push(pk);
    }

    let count = with_write_txn(env, |txn| {
        let mut count = 0u64;
        for &pk in &pks {
            trace!(pk, "deleting row by iden");
            if delete_row_and_indices_in_txn(txn, pk, None)? {
                count += 1;
            }
        }
        Ok(count)
    })?;
    debug!(iden = %iden.to_hex(), count, "delete_by_iden complete");
    Ok(count)
}

/// Deletes rows matching `(iden, prop)`, optionally filtered to an exact
/// `value`, as one atomic transaction.
pub fn delete_by_iden_prop(env: &Environment, iden: &Iden, prop: &[u8], value: Option<&Value>) -> Result<u64> {
    let mut prefix = Vec::new();
    prefix.extend_from_slice(&encode_iden(iden));
    prefix.extend_from_slice(&encode_prop(prop)?);

    let mut pks = Vec::new();
    for entry in env.ip.scan_prefix(&prefix) {
        let (_key, raw_pk) = entry?;
        pks.push(decode_pk_value(&raw_pk));
    }

    with_write_txn(env, |txn| {
        let mut count = 0u64;
        for &pk in &pks {
            if delete_row_and_indices_in_txn(txn, pk, value)? {
                count += 1;
            }
        }
        Ok(count)
    })
}

/// Deletes rows matching `prop`, optionally filtered to an exact `value` and
/// to a timestamp window, as one atomic transaction. Scans `pvt` when
/// `value` is given (to localize the scan to that value's region), else
/// `pt`.
pub fn delete_by_prop(env: &Environment, prop: &[u8], value: Option<&Value>, min_time: Option<i64>, max_time: Option<i64>) -> Result<u64> {
    let mut candidates: Vec<(u64, bool)> = Vec::new();
    crate::query::scan_prop(env, prop, value, min_time, max_time, None, |pk, hashed| {
        candidates.push((pk, hashed));
        Ok(true)
    })?;

    with_write_txn(env, |txn| {
        let mut count = 0u64;
        for &(pk, hashed) in &candidates {
            let check = if hashed { value } else { None };
            if delete_row_and_indices_in_txn(txn, pk, check)? {
                count += 1;
            }
        }
        Ok(count)
    })
}
