//! Error taxonomy: limit violations, on-disk invariant breaks, bad caller
//! input, and transient engine failures.

use thiserror::Error;

/// The table a [`StoreError::Corruption`] was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Rows,
    Ip,
    Pvt,
    Pt,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Table::Rows => "rows",
            Table::Ip => "ip",
            Table::Pvt => "pvt",
            Table::Pt => "pt",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("primary key exhausted: next pk would exceed {max}")]
    PkExhausted { max: u64 },

    #[error("property name exceeds maximum length of {max} bytes (got {got})")]
    PropTooLong { max: usize, got: usize },

    #[error("integer value {0} is outside the representable range")]
    IntOutOfRange(i128),

    #[error("missing index entry for pk {pk} in table {table}")]
    MissingIndexEntry { table: Table, pk: u64 },

    #[error("row referenced by index entry (pk {pk}) is absent from the primary table")]
    MissingRow { pk: u64 },

    #[error("append inserted {inserted} rows but {expected} were requested")]
    AppendMismatch { expected: usize, inserted: usize },

    #[error("malformed iden: {0}")]
    BadIden(String),

    #[error("range bounds reversed or otherwise invalid")]
    BadRange,

    #[error(transparent)]
    Engine(#[from] sled::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
