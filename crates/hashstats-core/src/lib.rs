//! Core types for hashstats.
//!
//! This crate provides the data model shared by the database reader and the
//! reporting engine: content hashes, hashed file blocks, file records, and the
//! hash buckets that group every block sharing one content hash.

mod block;
mod bucket;
mod config;
mod error;
mod file;
mod hash;
mod header;

pub use block::{Block, BlockFlag, BlockFlags};
pub use bucket::{Bucket, HashIndex};
pub use config::{Limit, ReportConfig, ReportConfigBuilder};
pub use error::ReportError;
pub use file::{FileId, FileRecord, FileRegistry};
pub use hash::ContentHash;
pub use header::DbHeader;
