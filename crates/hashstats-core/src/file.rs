//! File records and the registry that owns them.

use std::collections::HashMap;

use compact_str::CompactString;
use serde::Serialize;

/// Dense handle of a file record within a [`FileRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position in the registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A file known to the hash database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path of the file as it was recorded.
    pub name: CompactString,
    /// Inode number.
    pub ino: u64,
    /// Subvolume id (0 on filesystems without subvolumes).
    pub subvol: u64,
    /// File size in bytes at hashing time.
    pub size: u64,
    /// Number of hashed blocks loaded for this file.
    pub num_blocks: u64,
}

impl FileRecord {
    /// Create a file record with no blocks counted yet.
    pub fn new(name: impl Into<CompactString>, ino: u64, subvol: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            ino,
            subvol,
            size,
            num_blocks: 0,
        }
    }
}

/// All file records, in load order, addressable by [`FileId`] or by
/// `(inode, subvolume)` identity.
#[derive(Debug, Default, Clone)]
pub struct FileRegistry {
    records: Vec<FileRecord>,
    by_identity: HashMap<(u64, u64), FileId>,
}

impl FileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record and return its handle.
    ///
    /// A record whose `(ino, subvol)` is already registered is not added
    /// again; the existing handle is returned instead.
    pub fn insert(&mut self, record: FileRecord) -> FileId {
        let key = (record.ino, record.subvol);
        if let Some(&id) = self.by_identity.get(&key) {
            tracing::warn!(
                ino = record.ino,
                subvol = record.subvol,
                name = %record.name,
                "duplicate file record ignored"
            );
            return id;
        }

        let id = FileId::new(self.records.len() as u32);
        self.records.push(record);
        self.by_identity.insert(key, id);
        id
    }

    /// Look up a file by inode and subvolume.
    pub fn lookup(&self, ino: u64, subvol: u64) -> Option<FileId> {
        self.by_identity.get(&(ino, subvol)).copied()
    }

    /// Get a record by handle.
    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(id.index())
    }

    /// Display name of a file, if the handle is known.
    pub fn name(&self, id: FileId) -> Option<&str> {
        self.get(id).map(|r| r.name.as_str())
    }

    /// Count one more loaded block against a file.
    pub fn record_block(&mut self, id: FileId) {
        if let Some(record) = self.records.get_mut(id.index()) {
            record.num_blocks += 1;
        }
    }

    /// Iterate records in load order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records are loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
