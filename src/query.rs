//! Query Engine: point/equality lookups by iden or property, and the
//! split-range algorithm for integer-valued properties.

use std::ops::Bound;

use crate::codec::{
    decode_pk_value, decode_row_payload, encode_pk_key, encode_prop, encode_timestamp, encode_value_key, value_key_is_hashed, Iden, Row, Value, MAX_INT_VAL, MIN_INT_VAL,
};
use crate::env::Environment;
use crate::error::{Result, StoreError};

/// True bytewise successor of `key`: increments with carry. `None` if every
/// byte is already `0xFF` (no successor exists).
fn lex_successor(mut key: Vec<u8>) -> Option<Vec<u8>> {
    for i in (0..key.len()).rev() {
        if key[i] != 0xFF {
            key[i] += 1;
            for b in &mut key[i + 1..] {
                *b = 0;
            }
            return Some(key);
        }
    }
    None
}

fn prefix_bound_excluded(prefix: Vec<u8>) -> Bound<Vec<u8>> {
    match lex_successor(prefix) {
        Some(s) => Bound::Excluded(s),
        None => Bound::Unbounded,
    }
}

pub(crate) fn get_row_by_pk(env: &Environment, pk: u64) -> Result<Row> {
    let key = encode_pk_key(pk);
    match env.rows.get(key)? {
        Some(bytes) => Ok(decode_row_payload(&bytes)),
        None => Err(StoreError::MissingRow { pk }),
    }
}

/// Scans `ip` for every row with the given `iden`.
pub fn get_by_iden(env: &Environment, iden: &Iden) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for entry in env.ip.scan_prefix(iden.0) {
        let (_key, raw_pk) = entry?;
        out.push(get_row_by_pk(env, decode_pk_value(&raw_pk))?);
    }
    Ok(out)
}

/// Scans `ip` for rows matching `(iden, prop)`, optionally filtered by an
/// exact value.
pub fn get_by_iden_prop(env: &Environment, iden: &Iden, prop: &[u8], value: Option<&Value>) -> Result<Vec<Row>> {
    let mut prefix = Vec::new();
    prefix.extend_from_slice(&iden.0);
    prefix.extend_from_slice(&encode_prop(prop)?);

    let mut out = Vec::new();
    for entry in env.ip.scan_prefix(&prefix) {
        let (_key, raw_pk) = entry?;
        let row = get_row_by_pk(env, decode_pk_value(&raw_pk))?;
        if let Some(v) = value {
            if &row.value != v {
                continue;
            }
        }
        out.push(row);
    }
    Ok(out)
}

/// Shared equality-by-property scan over `pvt` (value given) or `pt` (value
/// omitted). `on_match(pk, hashed)` is called once per candidate pk that
/// falls in the timestamp window; it returns whether the match should count
/// toward `limit` (a `false` lets the scan keep going without consuming the
/// budget, used when the caller still needs to reject false hash matches).
pub(crate) fn scan_prop(
    env: &Environment,
    prop: &[u8],
    value: Option<&Value>,
    min_time: Option<i64>,
    max_time: Option<i64>,
    limit: Option<usize>,
    mut on_match: impl FnMut(u64, bool) -> Result<bool>,
) -> Result<usize> {
    let prop_enc = encode_prop(prop)?;
    let min_t = min_time.unwrap_or(MIN_INT_VAL);
    let max_t = max_time.unwrap_or(MAX_INT_VAL);

    let mut lo = prop_enc.clone();
    let mut hi = prop_enc.clone();
    let hashed = if let Some(v) = value {
        let vkey = encode_value_key(v);
        let h = value_key_is_hashed(&vkey);
        lo.extend_from_slice(&vkey);
        hi.extend_from_slice(&vkey);
        h
    } else {
        false
    };
    lo.extend_from_slice(&encode_timestamp(min_t));
    hi.extend_from_slice(&encode_timestamp(max_t));
    let upper = prefix_bound_excluded(hi);

    let tree = if value.is_some() { &env.pvt } else { &env.pt };

    let mut accepted = 0usize;
    for entry in tree.range((Bound::Included(lo), upper)) {
        let (_key, raw_pk) = entry?;
        let pk = decode_pk_value(&raw_pk);
        if on_match(pk, hashed)? {
            accepted += 1;
            if let Some(l) = limit {
                if accepted >= l {
                    break;
                }
            }
        }
    }
    Ok(accepted)
}

pub fn get_by_prop(env: &Environment, prop: &[u8], value: Option<&Value>, limit: Option<usize>, min_time: Option<i64>, max_time: Option<i64>) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    scan_prop(env, prop, value, min_time, max_time, limit, |pk, hashed| {
        let row = get_row_by_pk(env, pk)?;
        if hashed && &row.value != value.unwrap() {
            return Ok(false);
        }
        out.push(row);
        Ok(true)
    })?;
    Ok(out)
}

pub fn size_by_prop(env: &Environment, prop: &[u8], value: Option<&Value>, min_time: Option<i64>, max_time: Option<i64>) -> Result<u64> {
    let count = scan_prop(env, prop, value, min_time, max_time, None, |pk, hashed| {
        if hashed {
            let row = get_row_by_pk(env, pk)?;
            if &row.value != value.unwrap() {
                return Ok(false);
            }
        }
        Ok(true)
    })?;
    Ok(count as u64)
}

struct Subrange {
    first_val: i64,
    last_val: i64,
    right_closed: bool,
    backward: bool,
    limit: Option<usize>,
}

/// One monotone half of a min/max integer range: `[first_val, last_val]`
/// traversed forward (non-negative region, ascending) or backward (negative
/// region, where ascending numeric order runs opposite to encoded-key
/// order).
fn subrange_pks(env: &Environment, prop_enc: &[u8], range: Subrange, out: &mut Vec<u64>) -> Result<()> {
    let Subrange { first_val, last_val, right_closed, backward, limit } = range;
    let (lo_val, hi_val) = if backward { (last_val, first_val) } else { (first_val, last_val) };
    let mut lo_prefix = prop_enc.to_vec();
    lo_prefix.extend_from_slice(&encode_value_key(&Value::Int(lo_val)));
    let mut hi_prefix = prop_enc.to_vec();
    hi_prefix.extend_from_slice(&encode_value_key(&Value::Int(hi_val)));

    let (lower, upper) = if backward {
        // lo_val (last_val) is the numeric upper bound of this half and sits
        // at the *small-magnitude* end of the key range; right_closed governs
        // whether it is included. A real key is always `lo_prefix` plus a
        // timestamp and pk suffix, hence strictly greater than the bare
        // prefix — so `Bound::Excluded(lo_prefix)` never actually excludes
        // an entry whose value equals lo_val. Skip the whole prefix region
        // via its lexicographic successor instead.
        let lower = if right_closed { Bound::Included(lo_prefix) } else { prefix_bound_excluded(lo_prefix) };
        let upper = prefix_bound_excluded(hi_prefix);
        (lower, upper)
    } else {
        let lower = Bound::Included(lo_prefix);
        let upper = if right_closed { prefix_bound_excluded(hi_prefix) } else { Bound::Excluded(hi_prefix) };
        (lower, upper)
    };

    let range = env.pvt.range((lower, upper));
    if backward {
        for entry in range.rev() {
            let (_key, raw_pk) = entry?;
            out.push(decode_pk_value(&raw_pk));
            if limit.is_some_and(|l| out.len() >= l) {
                return Ok(());
            }
        }
    } else {
        for entry in range {
            let (_key, raw_pk) = entry?;
            out.push(decode_pk_value(&raw_pk));
            if limit.is_some_and(|l| out.len() >= l) {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Queries rows with an integer-valued property in `[minval, maxval]`
/// (`right_closed` governs the upper bound). Spans a split scan across the
/// negative and non-negative value regions when the range crosses zero, so
/// results are always returned in ascending numeric order.
pub fn rows_by_minmax(env: &Environment, prop: &[u8], minval: i64, maxval: i64, limit: Option<usize>, right_closed: bool) -> Result<Vec<Row>> {
    if minval > maxval {
        return Ok(Vec::new());
    }
    let prop_enc = encode_prop(prop)?;
    let mut pks = Vec::new();

    let do_neg = minval < 0;
    let do_pos = maxval >= 0;

    if do_neg {
        let this_right_closed = do_pos || right_closed;
        let last_val = std::cmp::min(-1, maxval);
        subrange_pks(env, &prop_enc, Subrange { first_val: minval, last_val, right_closed: this_right_closed, backward: true, limit }, &mut pks)?;
    }
    if do_pos {
        let remaining = limit.map(|l| l.saturating_sub(pks.len()));
        if remaining != Some(0) {
            let first_val = std::cmp::max(0, minval);
            subrange_pks(env, &prop_enc, Subrange { first_val, last_val: maxval, right_closed, backward: false, limit: remaining }, &mut pks)?;
        }
    }

    pks.into_iter().map(|pk| get_row_by_pk(env, pk)).collect()
}

pub fn size_by_minmax(env: &Environment, prop: &[u8], minval: i64, maxval: i64, right_closed: bool) -> Result<u64> {
    Ok(rows_by_minmax(env, prop, minval, maxval, None, right_closed)?.len() as u64)
}

pub fn rows_by_range(env: &Environment, prop: &[u8], lo: i64, hi: i64, limit: Option<usize>) -> Result<Vec<Row>> { rows_by_minmax(env, prop, lo, hi, limit, true) }
pub fn size_by_range(env: &Environment, prop: &[u8], lo: i64, hi: i64) -> Result<u64> { size_by_minmax(env, prop, lo, hi, true) }

pub fn rows_by_ge(env: &Environment, prop: &[u8], v: i64, limit: Option<usize>) -> Result<Vec<Row>> { rows_by_minmax(env, prop, v, MAX_INT_VAL, limit, true) }
pub fn size_by_ge(env: &Environment, prop: &[u8], v: i64) -> Result<u64> { size_by_minmax(env, prop, v, MAX_INT_VAL, true) }

pub fn rows_by_le(env: &Environment, prop: &[u8], v: i64, limit: Option<usize>) -> Result<Vec<Row>> { rows_by_minmax(env, prop, MIN_INT_VAL, v, limit, true) }
pub fn size_by_le(env: &Environment, prop: &[u8], v: i64) -> Result<u64> { size_by_minmax(env, prop, MIN_INT_VAL, v, true) }

pub fn rows_by_lt(env: &Environment, prop: &[u8], v: i64, limit: Option<usize>) -> Result<Vec<Row>> { rows_by_minmax(env, prop, MIN_INT_VAL, v, limit, false) }
pub fn size_by_lt(env: &Environment, prop: &[u8], v: i64) -> Result<u64> { size_by_minmax(env, prop, MIN_INT_VAL, v, false) }
