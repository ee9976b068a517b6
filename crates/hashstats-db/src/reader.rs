//! SQLite-backed hash database reader.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use hashstats_core::{
    Block, BlockFlags, ContentHash, DbHeader, FileRecord, FileRegistry, HashIndex,
};

use crate::error::DbError;

/// Database format major version this reader understands.
pub const SUPPORTED_MAJOR: u32 = 2;

const REQUIRED_TABLES: [&str; 3] = ["config", "files", "hashes"];

const KEY_VERSION_MAJOR: &str = "version_major";
const KEY_VERSION_MINOR: &str = "version_minor";
const KEY_BLOCK_SIZE: &str = "block_size";
const KEY_NUM_FILES: &str = "num_files";
const KEY_NUM_HASHES: &str = "num_hashes";
const KEY_HASH_TYPE: &str = "hash_type";

/// An open, read-only hash database.
pub struct HashDb {
    conn: Connection,
    path: PathBuf,
}

impl HashDb {
    /// Open a hash database.
    ///
    /// Fails if the file cannot be opened, is missing one of the expected
    /// tables, or was written with an unsupported major version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| DbError::Open {
            path: path.clone(),
            source,
        })?;

        let db = Self { conn, path };
        db.check_tables()?;

        let major = db.config_u32(KEY_VERSION_MAJOR)?;
        let minor = db.config_u32(KEY_VERSION_MINOR)?;
        if major != SUPPORTED_MAJOR {
            return Err(DbError::UnsupportedVersion {
                major,
                minor,
                expected: SUPPORTED_MAJOR,
            });
        }

        tracing::debug!(path = %db.path.display(), major, minor, "opened hash database");
        Ok(db)
    }

    /// Path the database was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the global header values.
    pub fn header(&self) -> Result<DbHeader, DbError> {
        Ok(DbHeader {
            version_major: self.config_u32(KEY_VERSION_MAJOR)?,
            version_minor: self.config_u32(KEY_VERSION_MINOR)?,
            block_size: self.config_u32(KEY_BLOCK_SIZE)?,
            num_files: self.config_u64(KEY_NUM_FILES)?,
            num_hashes: self.config_u64(KEY_NUM_HASHES)?,
            hash_type: self.config_text(KEY_HASH_TYPE)?,
        })
    }

    /// Load every file record and every hashed block.
    ///
    /// Files are loaded first, in row order, then blocks in row order so
    /// bucket members keep the order they were recorded in. Any bad row
    /// fails the whole load.
    pub fn load(&self) -> Result<LoadedHashes, DbError> {
        let start = Instant::now();
        let mut registry = self.load_files()?;
        let index = self.load_hashes(&mut registry)?;

        tracing::debug!(
            files = registry.len(),
            blocks = index.num_blocks(),
            hashes = index.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded hash database"
        );

        Ok(LoadedHashes { index, registry })
    }

    fn load_files(&self) -> Result<FileRegistry, DbError> {
        let mut registry = FileRegistry::new();
        let mut stmt = self
            .conn
            .prepare("SELECT filename, ino, subvol, size FROM files ORDER BY rowid")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let ino = to_u64("files.ino", row.get(1)?)?;
            let subvol = to_u64("files.subvol", row.get(2)?)?;
            let size = match row.get::<_, Option<i64>>(3)? {
                Some(size) => to_u64("files.size", size)?,
                None => 0,
            };
            registry.insert(FileRecord::new(name, ino, subvol, size));
        }

        Ok(registry)
    }

    fn load_hashes(&self, registry: &mut FileRegistry) -> Result<HashIndex, DbError> {
        let mut index = HashIndex::new();
        let mut digest_len: Option<usize> = None;
        let mut stmt = self
            .conn
            .prepare("SELECT digest, ino, subvol, loff, flags FROM hashes ORDER BY rowid")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let digest: Vec<u8> = row.get(0)?;
            let ino = to_u64("hashes.ino", row.get(1)?)?;
            let subvol = to_u64("hashes.subvol", row.get(2)?)?;
            let loff = to_u64("hashes.loff", row.get(3)?)?;
            let flags = row.get::<_, Option<i64>>(4)?.unwrap_or(0);
            let flags = u32::try_from(flags)
                .map_err(|_| DbError::invalid_value("hashes.flags", flags))?;

            match digest_len {
                None => digest_len = Some(digest.len()),
                Some(expected) if expected != digest.len() => {
                    return Err(DbError::DigestLength {
                        expected,
                        found: digest.len(),
                    });
                }
                Some(_) => {}
            }

            let file = registry
                .lookup(ino, subvol)
                .ok_or(DbError::DanglingBlock { ino, subvol, loff })?;
            registry.record_block(file);
            index.insert_block(
                ContentHash::from(digest),
                Block::new(file, loff, BlockFlags::from_bits(flags)),
            );
        }

        Ok(index)
    }

    fn check_tables(&self) -> Result<(), DbError> {
        for table in REQUIRED_TABLES {
            let found: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get(0),
                )
                .optional()?;
            if found.is_none() {
                return Err(DbError::MissingTable { table });
            }
        }
        Ok(())
    }

    fn config_value(&self, key: &'static str) -> Result<Option<Value>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT keyval FROM config WHERE keyname = ?1",
                params![key],
                |row| row.get::<_, Value>(0),
            )
            .optional()?
            .filter(|value| !matches!(value, Value::Null)))
    }

    fn config_int(&self, key: &'static str) -> Result<i64, DbError> {
        match self.config_value(key)? {
            None => Err(DbError::MissingConfig { key }),
            Some(Value::Integer(n)) => Ok(n),
            Some(Value::Text(text)) => text
                .trim()
                .parse()
                .map_err(|_| DbError::invalid_value(key, text)),
            Some(Value::Blob(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                text.trim()
                    .parse()
                    .map_err(|_| DbError::invalid_value(key, text))
            }
            Some(Value::Real(r)) => Err(DbError::invalid_value(key, r)),
            Some(Value::Null) => Err(DbError::MissingConfig { key }),
        }
    }

    fn config_u64(&self, key: &'static str) -> Result<u64, DbError> {
        to_u64(key, self.config_int(key)?)
    }

    fn config_u32(&self, key: &'static str) -> Result<u32, DbError> {
        let n = self.config_int(key)?;
        u32::try_from(n).map_err(|_| DbError::invalid_value(key, n))
    }

    fn config_text(&self, key: &'static str) -> Result<Option<String>, DbError> {
        Ok(match self.config_value(key)? {
            Some(Value::Text(text)) => Some(text),
            Some(Value::Blob(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Some(Value::Integer(n)) => Some(n.to_string()),
            Some(Value::Real(r)) => Some(r.to_string()),
            Some(Value::Null) | None => None,
        })
    }
}

fn to_u64(field: &'static str, value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::invalid_value(field, value))
}

/// Everything loaded from a hash database.
#[derive(Debug, Clone)]
pub struct LoadedHashes {
    /// Buckets keyed by content hash.
    pub index: HashIndex,
    /// File records referenced by the blocks.
    pub registry: FileRegistry,
}

impl LoadedHashes {
    /// Total number of blocks loaded.
    pub fn num_blocks(&self) -> u64 {
        self.index.num_blocks()
    }

    /// Number of distinct hashes loaded.
    pub fn num_hashes(&self) -> usize {
        self.index.len()
    }

    /// Number of file records loaded.
    pub fn num_files(&self) -> usize {
        self.registry.len()
    }

    /// Log a warning for each header count that disagrees with what was
    /// actually loaded. Returns `true` when everything matches.
    pub fn check_against(&self, header: &DbHeader) -> bool {
        let mut consistent = true;
        if header.num_hashes != self.num_blocks() {
            tracing::warn!(
                stored = header.num_hashes,
                loaded = self.num_blocks(),
                "header hash count differs from loaded blocks"
            );
            consistent = false;
        }
        if header.num_files != self.num_files() as u64 {
            tracing::warn!(
                stored = header.num_files,
                loaded = self.num_files(),
                "header file count differs from loaded files"
            );
            consistent = false;
        }
        consistent
    }
}
