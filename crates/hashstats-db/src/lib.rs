//! Reader for deduplication hash databases.
//!
//! A hash database is a SQLite file written by a block deduplication tool.
//! It records every file that was hashed and one digest per file block.
//! This crate opens such a file read-only and loads it into the
//! [`HashIndex`] and [`FileRegistry`] types from `hashstats-core`.
//!
//! # Example
//!
//! ```rust,no_run
//! use hashstats_db::HashDb;
//!
//! let db = HashDb::open("hashes.db").unwrap();
//! let header = db.header().unwrap();
//! let loaded = db.load().unwrap();
//!
//! println!("block size: {}", header.block_size);
//! println!("{} blocks in {} buckets", loaded.num_blocks(), loaded.num_hashes());
//! ```
//!
//! # Layout
//!
//! The reader expects three tables:
//!
//! - `config(keyname, keyval)` holding the header values
//! - `files(filename, ino, subvol, size, ...)` with one row per file
//! - `hashes(digest, ino, subvol, loff, flags)` with one row per block

mod error;
mod reader;

pub use error::DbError;
pub use reader::{HashDb, LoadedHashes, SUPPORTED_MAJOR};

// Re-export core types for convenience
pub use hashstats_core::{DbHeader, FileRegistry, HashIndex};
