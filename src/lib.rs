//! An embedded, transactional, multi-index tuple store.
//!
//! Rows are quadruples `(iden, prop, value, timestamp)`, kept in a primary
//! table keyed by a monotonic primary key plus three secondary indices
//! (`ip`, `pvt`, `pt`) that are always updated in lockstep with the primary
//! table. See [`Store`] for the public surface.

mod codec;
mod deleter;
mod env;
mod error;
mod query;
mod txn;
mod writer;

pub use codec::{Iden, Row, Value, LARGE_STRING_SIZE, MAX_INT_VAL, MAX_PROP_LEN, MIN_INT_VAL, PK_MAX};
pub use env::EnvConfig;
pub use error::{StoreError, Table};

use env::Environment;

/// A handle to an open tuple store.
pub struct Store {
    env: Environment,
}

impl Store {
    pub fn open(config: EnvConfig) -> error::Result<Self> { Ok(Self { env: Environment::open(config)? }) }

    /// Opens an ephemeral, non-durable store for tests.
    pub fn open_test() -> error::Result<Self> { Ok(Self { env: Environment::open_test()? }) }

    /// Forces a durability sync independent of any in-flight write.
    pub fn flush(&self) -> error::Result<()> { self.env.flush() }

    /// Flushes and releases the underlying storage handle. Consuming `self`
    /// makes the close point explicit rather than relying on `Drop`;
    /// afterward `self` is gone and the backing database is closed.
    pub fn close(self) -> error::Result<()> { self.env.flush() }

    /// The primary key that will be assigned to the next appended row.
    pub fn next_pk(&self) -> u64 { self.env.peek_next_pk() }

    /// Appends `rows` atomically, returning the primary keys assigned, in
    /// order.
    pub fn append(&self, rows: &[Row]) -> error::Result<Vec<u64>> { writer::append(&self.env, rows) }

    pub fn get_by_iden(&self, iden: &Iden) -> error::Result<Vec<Row>> { query::get_by_iden(&self.env, iden) }

    pub fn get_by_iden_prop(&self, iden: &Iden, prop: &[u8], value: Option<&Value>) -> error::Result<Vec<Row>> { query::get_by_iden_prop(&self.env, iden, prop, value) }

    pub fn get_by_prop(&self, prop: &[u8], value: Option<&Value>, limit: Option<usize>, min_time: Option<i64>, max_time: Option<i64>) -> error::Result<Vec<Row>> {
        query::get_by_prop(&self.env, prop, value, limit, min_time, max_time)
    }

    pub fn size_by_prop(&self, prop: &[u8], value: Option<&Value>, min_time: Option<i64>, max_time: Option<i64>) -> error::Result<u64> {
        query::size_by_prop(&self.env, prop, value, min_time, max_time)
    }

    pub fn get_by_range(&self, prop: &[u8], lo: i64, hi: i64, limit: Option<usize>) -> error::Result<Vec<Row>> { query::rows_by_range(&self.env, prop, lo, hi, limit) }
    pub fn size_by_range(&self, prop: &[u8], lo: i64, hi: i64) -> error::Result<u64> { query::size_by_range(&self.env, prop, lo, hi) }

    pub fn get_by_ge(&self, prop: &[u8], v: i64, limit: Option<usize>) -> error::Result<Vec<Row>> { query::rows_by_ge(&self.env, prop, v, limit) }
    pub fn size_by_ge(&self, prop: &[u8], v: i64) -> error::Result<u64> { query::size_by_ge(&self.env, prop, v) }

    pub fn get_by_le(&self, prop: &[u8], v: i64, limit: Option<usize>) -> error::Result<Vec<Row>> { query::rows_by_le(&self.env, prop, v, limit) }
    pub fn size_by_le(&self, prop: &[u8], v: i64) -> error::Result<u64> { query::size_by_le(&self.env, prop, v) }

    pub fn get_by_lt(&self, prop: &[u8], v: i64, limit: Option<usize>) -> error::Result<Vec<Row>> { query::rows_by_lt(&self.env, prop, v, limit) }
    pub fn size_by_lt(&self, prop: &[u8], v: i64) -> error::Result<u64> { query::size_by_lt(&self.env, prop, v) }

    pub fn delete_by_iden(&self, iden: &Iden) -> error::Result<u64> { deleter::delete_by_iden(&self.env, iden) }

    pub fn delete_by_iden_prop(&self, iden: &Iden, prop: &[u8], value: Option<&Value>) -> error::Result<u64> { deleter::delete_by_iden_prop(&self.env, iden, prop, value) }

    pub fn delete_by_prop(&self, prop: &[u8], value: Option<&Value>, min_time: Option<i64>, max_time: Option<i64>) -> error::Result<u64> {
        deleter::delete_by_prop(&self.env, prop, value, min_time, max_time)
    }
}
