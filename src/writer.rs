//! Row & Index Writer: atomic batch append.

use tracing::debug;

use crate::codec::{
    check_int_range, encode_iden, encode_pk_key, encode_pk_value, encode_prop, encode_row_payload, encode_timestamp, encode_value_key, Row, Value,
};
use crate::env::Environment;
use crate::error::Result;
use crate::txn::with_write_txn;

/// Appends `rows` atomically, assigning each a strictly increasing primary
/// key. Either every row is durably visible afterward, or none are.
pub fn append(env: &Environment, rows: &[Row]) -> Result<Vec<u64>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    for row in rows {
        if let Value::Int(n) = row.value {
            check_int_range(n)?;
        }
        check_int_range(row.timestamp)?;
    }

    let start_pk = env.reserve_pks(rows.len() as u64)?;

    let result = with_write_txn(env, |txn| {
        let mut assigned = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let pk = start_pk + i as u64;
            let pk_key = encode_pk_key(pk);
            let pk_val = encode_pk_value(pk);

            let payload = encode_row_payload(row).map_err(sled::transaction::ConflictableTransactionError::Abort)?;
            txn.put_row(&pk_key, &payload)?;

            let prop_enc = encode_prop(&row.prop).map_err(sled::transaction::ConflictableTransactionError::Abort)?;

            let mut ip_key = Vec::new();
            ip_key.extend_from_slice(&encode_iden(&row.iden));
            ip_key.extend_from_slice(&prop_enc);
            ip_key.extend_from_slice(&pk_key);
            txn.put_ip(&ip_key, &pk_val)?;

            let mut pvt_key = Vec::new();
            pvt_key.extend_from_slice(&prop_enc);
            pvt_key.extend_from_slice(&encode_value_key(&row.value));
            pvt_key.extend_from_slice(&encode_timestamp(row.timestamp));
            pvt_key.extend_from_slice(&pk_key);
            txn.put_pvt(&pvt_key, &pk_val)?;

            let mut pt_key = Vec::new();
            pt_key.extend_from_slice(&prop_enc);
            pt_key.extend_from_slice(&encode_timestamp(row.timestamp));
            pt_key.extend_from_slice(&pk_key);
            txn.put_pt(&pt_key, &pk_val)?;

            assigned.push(pk);
        }
        Ok(assigned)
    });

    match &result {
        Ok(pks) => debug!(count = pks.len(), start_pk, "appended rows"),
        Err(_) => {
            // Restore the counter so the failed batch doesn't burn pk space,
            // but only if nobody has reserved past our range in the
            // meantime — otherwise we'd clobber a concurrent reservation
            // and a later append could reissue already-assigned pks.
            let expected = start_pk + rows.len() as u64;
            let _ = env.next_pk.compare_exchange(expected, start_pk, std::sync::atomic::Ordering::SeqCst, std::sync::atomic::Ordering::SeqCst);
        }
    }
    result
}
