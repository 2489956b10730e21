mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;
use tuplestore::{Row, Value};

fn iden_for(n: u8) -> tuplestore::Iden {
    let mut bytes = [0u8; 16];
    bytes[15] = n;
    tuplestore::Iden(bytes)
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        proptest::collection::vec(any::<u8>(), 0..300).prop_map(Value::Bytes),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every appended row round-trips byte-for-byte through `get_by_iden_prop`.
    #[test]
    fn round_trip_row(iden_n in 0u8..8, prop in "[a-z]{1,12}", value in arb_value(), ts in any::<i64>()) {
        let s = common::store();
        let iden = iden_for(iden_n);
        let r = Row { iden, prop: prop.as_bytes().to_vec(), value: value.clone(), timestamp: ts };
        s.append(std::slice::from_ref(&r)).unwrap();

        let got = s.get_by_iden_prop(&iden, prop.as_bytes(), None).unwrap();
        prop_assert_eq!(got.len(), 1);
        prop_assert_eq!(&got[0], &r);
    }

    /// Primary keys assigned across a batch of appends are strictly
    /// increasing and never repeat.
    #[test]
    fn monotone_pks(batches in proptest::collection::vec(proptest::collection::vec(arb_value(), 1..5), 1..8)) {
        let s = common::store();
        let mut all_pks: Vec<u64> = Vec::new();
        for (i, batch) in batches.iter().enumerate() {
            let rows: Vec<Row> = batch.iter().enumerate().map(|(j, v)| Row {
                iden: iden_for(0),
                prop: b"p".to_vec(),
                value: v.clone(),
                timestamp: (i * 100 + j) as i64,
            }).collect();
            let pks = s.append(&rows).unwrap();
            all_pks.extend(pks);
        }
        for w in all_pks.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
        let unique: BTreeSet<u64> = all_pks.iter().copied().collect();
        prop_assert_eq!(unique.len(), all_pks.len());
    }

    /// `get_by_range` returns exactly the rows whose value falls in
    /// `[lo, hi]`, regardless of whether the range straddles zero.
    #[test]
    fn range_totality(values in proptest::collection::vec(any::<i32>(), 0..40), lo in any::<i32>(), hi in any::<i32>()) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let s = common::store();
        let iden = iden_for(0);
        let rows: Vec<Row> = values.iter().enumerate().map(|(i, v)| Row {
            iden,
            prop: b"n".to_vec(),
            value: Value::Int(*v as i64),
            timestamp: i as i64,
        }).collect();
        s.append(&rows).unwrap();

        let got = s.get_by_range(b"n", lo as i64, hi as i64, None).unwrap();
        let got_values: BTreeSet<i64> = got.iter().map(|r| if let Value::Int(n) = r.value { n } else { unreachable!() }).collect();
        let expected: BTreeSet<i64> = values.iter().map(|v| *v as i64).filter(|v| *v >= lo as i64 && *v <= hi as i64).collect();
        prop_assert_eq!(got_values, expected);
    }

    /// A row reachable via `get_by_iden` is also reachable via `get_by_prop`
    /// for the same property, and the two never disagree on count.
    #[test]
    fn index_consistency_across_lookup_paths(value in arb_value(), ts in any::<i64>()) {
        let s = common::store();
        let iden = iden_for(3);
        s.append(&[Row { iden, prop: b"x".to_vec(), value: value.clone(), timestamp: ts }]).unwrap();

        let by_iden = s.get_by_iden(&iden).unwrap();
        let by_prop = s.get_by_prop(b"x", None, None, None, None).unwrap();
        prop_assert_eq!(by_iden.len(), 1);
        prop_assert_eq!(by_prop.len(), 1);
        prop_assert_eq!(&by_iden[0], &by_prop[0]);
    }
}
