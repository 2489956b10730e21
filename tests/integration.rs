mod common;

use common::{next_iden, row, store};
use tuplestore::Value;

#[test]
fn append_and_get_by_prop() {
    let s = store();
    let a = next_iden();
    let b = next_iden();

    s.append(&[row(a, "foo", Value::Int(1), 10), row(a, "foo", Value::Int(-5), 20), row(b, "foo", Value::Int(1), 30)]).unwrap();

    let by_value = s.get_by_prop(b"foo", Some(&Value::Int(1)), None, None, None).unwrap();
    assert_eq!(by_value.len(), 2);

    let by_range = s.get_by_range(b"foo", -10, 0, None).unwrap();
    assert_eq!(by_range.len(), 1);
    assert_eq!(by_range[0].value, Value::Int(-5));

    assert_eq!(s.get_by_iden(&a).unwrap().len(), 2);
    assert_eq!(s.size_by_prop(b"foo", None, None, None).unwrap(), 3);
}

#[test]
fn large_string_equality_is_exact_despite_hashing() {
    let s = store();
    let a = next_iden();
    let needle = vec![b'x'; 200];

    s.append(&[row(a, "blob", Value::Bytes(needle.clone()), 1), row(a, "blob", Value::Bytes(vec![b'y'; 200]), 2)]).unwrap();

    let found = s.get_by_prop(b"blob", Some(&Value::Bytes(needle.clone())), None, None, None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, Value::Bytes(needle));
}

#[test]
fn delete_by_iden_prop_removes_exactly_one_row() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "foo", Value::Int(1), 10), row(a, "foo", Value::Int(-5), 20)]).unwrap();

    let removed = s.delete_by_iden_prop(&a, b"foo", Some(&Value::Int(1))).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(s.size_by_prop(b"foo", None, None, None).unwrap(), 1);

    let remaining = s.get_by_iden(&a).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].value, Value::Int(-5));
}

#[test]
fn range_spanning_zero_has_no_duplicate_at_boundary() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "n", Value::Int(-5), 1), row(a, "n", Value::Int(-1), 2), row(a, "n", Value::Int(0), 3), row(a, "n", Value::Int(1), 4)]).unwrap();

    let rows = s.get_by_range(b"n", -1, 1, None).unwrap();
    let mut values: Vec<i64> = rows.iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    values.sort();
    assert_eq!(values, vec![-1, 0, 1]);
}

#[test]
fn range_by_integer_is_total_across_the_zero_boundary() {
    let s = store();
    let a = next_iden();
    let values = [-100, -50, -1, 0, 1, 50, 100];
    for (i, v) in values.iter().enumerate() {
        s.append(&[row(a, "n", Value::Int(*v), i as i64)]).unwrap();
    }

    let got = s.get_by_range(b"n", -50, 50, None).unwrap();
    let mut got_values: Vec<i64> = got.iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    got_values.sort();
    assert_eq!(got_values, vec![-50, -1, 0, 1, 50]);
}

#[test]
fn get_by_lt_excludes_the_boundary_value_in_the_negative_region() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "n", Value::Int(-5), 1), row(a, "n", Value::Int(-1), 2)]).unwrap();

    let got = s.get_by_lt(b"n", -1, None).unwrap();
    let values: Vec<i64> = got.iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    assert_eq!(values, vec![-5]);
    assert_eq!(s.size_by_lt(b"n", -1).unwrap(), 1);
}

#[test]
fn get_by_lt_excludes_the_boundary_value_in_the_non_negative_region() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "n", Value::Int(3), 1), row(a, "n", Value::Int(5), 2), row(a, "n", Value::Int(7), 3)]).unwrap();

    let got = s.get_by_lt(b"n", 5, None).unwrap();
    let values: Vec<i64> = got.iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    assert_eq!(values, vec![3]);
    assert_eq!(s.size_by_lt(b"n", 5).unwrap(), 1);
}

#[test]
fn get_by_le_includes_the_boundary_value() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "n", Value::Int(-5), 1), row(a, "n", Value::Int(-1), 2), row(a, "n", Value::Int(1), 3)]).unwrap();

    let mut values: Vec<i64> = s.get_by_le(b"n", -1, None).unwrap().iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    values.sort();
    assert_eq!(values, vec![-5, -1]);
    assert_eq!(s.size_by_le(b"n", -1).unwrap(), 2);
}

#[test]
fn get_by_ge_includes_the_boundary_value() {
    let s = store();
    let a = next_iden();
    s.append(&[row(a, "n", Value::Int(-1), 1), row(a, "n", Value::Int(1), 2), row(a, "n", Value::Int(5), 3)]).unwrap();

    let mut values: Vec<i64> = s.get_by_ge(b"n", 1, None).unwrap().iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
    values.sort();
    assert_eq!(values, vec![1, 5]);
    assert_eq!(s.size_by_ge(b"n", 1).unwrap(), 2);
}

#[test]
fn single_reader_config_forces_lock_off() {
    let mut cfg = tuplestore::EnvConfig::new(tempfile::tempdir().unwrap().path());
    cfg.max_readers = 1;
    cfg.lock = false;
    let s = tuplestore::Store::open(cfg).unwrap();
    let a = next_iden();
    s.append(&[row(a, "foo", Value::Int(1), 10)]).unwrap();
    assert_eq!(s.get_by_iden(&a).unwrap().len(), 1);
}

#[test]
fn durability_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let a = next_iden();
    {
        let s = tuplestore::Store::open(tuplestore::EnvConfig::new(dir.path())).unwrap();
        s.append(&[row(a, "foo", Value::Int(7), 1)]).unwrap();
        s.flush().unwrap();
    }
    let s2 = tuplestore::Store::open(tuplestore::EnvConfig::new(dir.path())).unwrap();
    let rows = s2.get_by_iden(&a).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(s2.next_pk(), 2);
}
