use std::path::{Path, PathBuf};

use hashstats_core::{BlockFlag, ContentHash};
use hashstats_db::{DbError, HashDb};
use rusqlite::{Connection, params};
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE config(keyname TEXT PRIMARY KEY NOT NULL, keyval BLOB, UNIQUE(keyname));
    CREATE TABLE files(filename TEXT PRIMARY KEY NOT NULL, ino INTEGER, subvol INTEGER,
        size INTEGER, blocks INTEGER, mtime INTEGER, dedupe_seq INTEGER, UNIQUE(ino, subvol));
    CREATE TABLE hashes(digest BLOB NOT NULL, ino INTEGER, subvol INTEGER,
        loff INTEGER, flags INTEGER);
";

fn create_db(dir: &Path, major: i64) -> (PathBuf, Connection) {
    let path = dir.join("hashes.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let config: [(&str, i64); 5] = [
        ("version_major", major),
        ("version_minor", 0),
        ("block_size", 4096),
        ("num_files", 2),
        ("num_hashes", 4),
    ];
    for (key, value) in config {
        conn.execute(
            "INSERT INTO config VALUES (?1, ?2)",
            params![key, value],
        )
        .unwrap();
    }
    conn.execute(
        "INSERT INTO config VALUES ('hash_type', 'murmur3')",
        [],
    )
    .unwrap();

    conn.execute(
        "INSERT INTO files(filename, ino, subvol, size) VALUES ('/mnt/a', 257, 5, 8192)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO files(filename, ino, subvol, size) VALUES ('/mnt/b', 258, 5, 8192)",
        [],
    )
    .unwrap();

    (path, conn)
}

fn insert_hash(conn: &Connection, digest: &[u8], ino: i64, loff: i64, flags: i64) {
    conn.execute(
        "INSERT INTO hashes VALUES (?1, ?2, 5, ?3, ?4)",
        params![digest, ino, loff, flags],
    )
    .unwrap();
}

#[test]
fn test_header() {
    let temp = TempDir::new().unwrap();
    let (path, _conn) = create_db(temp.path(), 2);

    let db = HashDb::open(&path).unwrap();
    let header = db.header().unwrap();

    assert_eq!(header.version(), "2.0");
    assert_eq!(header.block_size, 4096);
    assert_eq!(header.num_files, 2);
    assert_eq!(header.num_hashes, 4);
    assert_eq!(header.hash_type.as_deref(), Some("murmur3"));
}

#[test]
fn test_load_groups_blocks_by_hash() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    insert_hash(&conn, &[0xaa; 16], 257, 0, 0);
    insert_hash(&conn, &[0xbb; 16], 257, 4096, 0);
    insert_hash(&conn, &[0xaa; 16], 258, 4096, 0x2 | 0x4);
    insert_hash(&conn, &[0xaa; 16], 258, 0, 0x2);

    let db = HashDb::open(&path).unwrap();
    let header = db.header().unwrap();
    let loaded = db.load().unwrap();

    assert_eq!(loaded.num_blocks(), 4);
    assert_eq!(loaded.num_hashes(), 2);
    assert_eq!(loaded.num_files(), 2);
    assert!(loaded.check_against(&header));

    let bucket = loaded.index.get(&ContentHash::from(&[0xaa; 16][..])).unwrap();
    assert_eq!(bucket.member_count(), 3);
    assert_eq!(bucket.file_count(), 2);

    // Row order is kept
    let offsets: Vec<u64> = bucket.members().iter().map(|b| b.loff).collect();
    assert_eq!(offsets, vec![0, 4096, 0]);

    let flags: Vec<BlockFlag> = bucket.members()[1].flags.iter().collect();
    assert_eq!(flags, vec![BlockFlag::Deduped, BlockFlag::Hole]);

    let a = loaded.registry.lookup(257, 5).unwrap();
    let b = loaded.registry.lookup(258, 5).unwrap();
    assert_eq!(loaded.registry.get(a).unwrap().num_blocks, 2);
    assert_eq!(loaded.registry.get(b).unwrap().num_blocks, 2);
    assert_eq!(loaded.registry.name(b), Some("/mnt/b"));
}

#[test]
fn test_header_count_mismatch_is_reported() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    insert_hash(&conn, &[0x01; 16], 257, 0, 0);

    let db = HashDb::open(&path).unwrap();
    let header = db.header().unwrap();
    let loaded = db.load().unwrap();

    assert!(!loaded.check_against(&header));
}

#[test]
fn test_unsupported_version() {
    let temp = TempDir::new().unwrap();
    let (path, _conn) = create_db(temp.path(), 1);

    let err = HashDb::open(&path).err().unwrap();
    assert!(matches!(
        err,
        DbError::UnsupportedVersion { major: 1, expected: 2, .. }
    ));
}

#[test]
fn test_missing_table() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE config(keyname TEXT, keyval BLOB);")
        .unwrap();

    let err = HashDb::open(&path).err().unwrap();
    assert!(matches!(err, DbError::MissingTable { table: "files" }));
}

#[test]
fn test_missing_header_key() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    conn.execute("DELETE FROM config WHERE keyname = 'block_size'", [])
        .unwrap();

    let db = HashDb::open(&path).unwrap();
    let err = db.header().unwrap_err();
    assert!(matches!(err, DbError::MissingConfig { key: "block_size" }));
}

#[test]
fn test_text_header_values_are_parsed() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    conn.execute(
        "UPDATE config SET keyval = '131072' WHERE keyname = 'block_size'",
        [],
    )
    .unwrap();

    let db = HashDb::open(&path).unwrap();
    assert_eq!(db.header().unwrap().block_size, 131072);
}

#[test]
fn test_dangling_block_fails_load() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    insert_hash(&conn, &[0x01; 16], 257, 0, 0);
    insert_hash(&conn, &[0x01; 16], 999, 8192, 0);

    let db = HashDb::open(&path).unwrap();
    let err = db.load().unwrap_err();
    assert!(matches!(
        err,
        DbError::DanglingBlock { ino: 999, subvol: 5, loff: 8192 }
    ));
}

#[test]
fn test_digest_length_mismatch_fails_load() {
    let temp = TempDir::new().unwrap();
    let (path, conn) = create_db(temp.path(), 2);
    insert_hash(&conn, &[0x01; 16], 257, 0, 0);
    insert_hash(&conn, &[0x01; 32], 258, 0, 0);

    let db = HashDb::open(&path).unwrap();
    let err = db.load().unwrap_err();
    assert!(matches!(
        err,
        DbError::DigestLength { expected: 16, found: 32 }
    ));
}
