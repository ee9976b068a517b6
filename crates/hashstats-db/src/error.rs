//! Error types for reading hash databases.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or loading a hash database.
///
/// Any of these means no index is handed to the reporting engine.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database file could not be opened.
    #[error("Cannot open hash database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Generic SQLite error while reading.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A required table does not exist.
    #[error("Not a hash database: table '{table}' is missing")]
    MissingTable { table: &'static str },

    /// A required header key is absent.
    #[error("Hash database header is missing '{key}'")]
    MissingConfig { key: &'static str },

    /// The database was written by an incompatible format version.
    #[error("Unsupported hash database version {major}.{minor} (expected major version {expected})")]
    UnsupportedVersion { major: u32, minor: u32, expected: u32 },

    /// A hashed block references a file that has no record.
    #[error("Block at offset {loff} references unknown file (inode {ino}, subvolume {subvol})")]
    DanglingBlock { ino: u64, subvol: u64, loff: u64 },

    /// Digests of different lengths were found.
    #[error("Digest length mismatch: expected {expected} bytes, found {found}")]
    DigestLength { expected: usize, found: usize },

    /// A stored value is out of range for its field.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl DbError {
    /// Create an invalid value error.
    pub fn invalid_value(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
        }
    }
}
