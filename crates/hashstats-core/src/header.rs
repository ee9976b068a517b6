//! Hash database header metadata.

use serde::Serialize;

/// Global metadata stored in a hash database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbHeader {
    /// Format major version.
    pub version_major: u32,
    /// Format minor version.
    pub version_minor: u32,
    /// Block size the hashes were computed with, in bytes.
    pub block_size: u32,
    /// File count stored in the header.
    pub num_files: u64,
    /// Hash count stored in the header.
    pub num_hashes: u64,
    /// Name of the hash algorithm, when recorded.
    pub hash_type: Option<String>,
}

impl DbHeader {
    /// Format version as `major.minor`.
    pub fn version(&self) -> String {
        format!("{}.{}", self.version_major, self.version_minor)
    }
}
