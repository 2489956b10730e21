#![allow(dead_code)]

use std::sync::atomic::{AtomicU8, Ordering};

use tuplestore::{Iden, Store, Value};

#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level: tracing::Level = level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

static IDEN_COUNTER: AtomicU8 = AtomicU8::new(1);

pub fn next_iden() -> Iden {
    let n = IDEN_COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut bytes = [0u8; 16];
    bytes[15] = n;
    Iden(bytes)
}

pub fn store() -> Store { Store::open_test().expect("open test store") }

pub fn row(iden: Iden, prop: &str, value: Value, ts: i64) -> tuplestore::Row { tuplestore::Row { iden, prop: prop.as_bytes().to_vec(), value, timestamp: ts } }
