//! Storage environment: owns the backing `sled` database, the four named
//! tables, and the in-memory next-PK counter.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use sled::{Config, Db, Tree};
use tracing::{debug, info};

use crate::codec::{decode_pk_key, PK_MAX};
use crate::error::{Result, StoreError};

/// Configuration knobs. Several describe characteristics an LMDB-style
/// engine manages explicitly (`mapsize`, `writemap`, `subdir`); `sled` has
/// no equivalent so they are accepted and recorded for interface fidelity
/// but otherwise unused. `max_readers` and `lock` are retained because they
/// gate real `sled` behavior.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub path: PathBuf,
    pub mapsize: u64,
    pub durable_metadata: bool,
    pub durable_data: bool,
    pub lock: bool,
    pub max_readers: u32,
    pub subdir: bool,
    pub writemap: bool,
}

impl EnvConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let default_mapsize = if usize::MAX as u64 > u32::MAX as u64 { 1 << 40 } else { 1 << 30 };
        let mut cfg = Self {
            path: path.into(),
            mapsize: default_mapsize,
            durable_metadata: false,
            durable_data: true,
            lock: true,
            max_readers: 4,
            subdir: false,
            writemap: true,
        };
        if cfg.max_readers == 1 {
            cfg.lock = false;
        }
        cfg
    }
}

pub(crate) const ROWS: &str = "rows";
pub(crate) const IP: &str = "ip";
pub(crate) const PVT: &str = "pvt";
pub(crate) const PT: &str = "pt";

/// The four named tables plus the shared next-PK counter.
pub struct Environment {
    pub(crate) db: Db,
    pub(crate) rows: Tree,
    pub(crate) ip: Tree,
    pub(crate) pvt: Tree,
    pub(crate) pt: Tree,
    pub(crate) next_pk: AtomicU64,
}

impl Environment {
    pub fn open(config: EnvConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.path)?;
        let sled_cfg = Config::new()
            .path(config.path.join("tuplestore.sled"))
            .flush_every_ms(if config.durable_data { Some(200) } else { None });
        let db = sled_cfg.open()?;
        info!(path = %config.path.display(), max_readers = config.max_readers, "opened storage environment");
        Self::from_db(db)
    }

    /// Opens an ephemeral, non-durable environment for tests.
    pub fn open_test() -> Result<Self> {
        let db = Config::new().temporary(true).flush_every_ms(None).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let rows = db.open_tree(ROWS)?;
        let ip = db.open_tree(IP)?;
        let pvt = db.open_tree(PVT)?;
        let pt = db.open_tree(PT)?;

        let next_pk = match rows.last()? {
            Some((key, _)) => {
                let pk: u64 = decode_pk_key(key.as_ref().try_into().map_err(|_| StoreError::BadRange)?);
                if pk >= PK_MAX {
                    return Err(StoreError::PkExhausted { max: PK_MAX });
                }
                pk + 1
            }
            None => 1,
        };
        debug!(next_pk, "computed initial next-pk");

        Ok(Self { db, rows, ip, pvt, pt, next_pk: AtomicU64::new(next_pk) })
    }

    /// Forces a durability sync independent of any in-flight transaction.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn peek_next_pk(&self) -> u64 { self.next_pk.load(Ordering::SeqCst) }

    pub(crate) fn reserve_pks(&self, count: u64) -> Result<u64> {
        let start = self.next_pk.fetch_add(count, Ordering::SeqCst);
        if start.saturating_add(count) > PK_MAX {
            self.next_pk.fetch_sub(count, Ordering::SeqCst);
            return Err(StoreError::PkExhausted { max: PK_MAX });
        }
        Ok(start)
    }
}
