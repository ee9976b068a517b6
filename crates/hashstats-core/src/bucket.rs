//! Hash buckets and the by-hash index that owns them.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::block::Block;
use crate::file::FileId;
use crate::hash::ContentHash;

/// Every block sharing one content hash.
#[derive(Debug, Clone)]
pub struct Bucket {
    hash: ContentHash,
    /// Members in discovery order.
    members: Vec<Block>,
    files: HashSet<FileId>,
}

impl Bucket {
    /// Create an empty bucket.
    pub fn new(hash: ContentHash) -> Self {
        Self {
            hash,
            members: Vec::new(),
            files: HashSet::new(),
        }
    }

    /// Create a bucket holding the given blocks, in order.
    pub fn from_members(hash: ContentHash, members: impl IntoIterator<Item = Block>) -> Self {
        let mut bucket = Self::new(hash);
        for block in members {
            bucket.push(block);
        }
        bucket
    }

    /// Append a block.
    pub fn push(&mut self, block: Block) {
        self.files.insert(block.file);
        self.members.push(block);
    }

    /// The shared content hash.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Member blocks in discovery order.
    pub fn members(&self) -> &[Block] {
        &self.members
    }

    /// Number of member blocks.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Number of distinct files contributing at least one block.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Buckets keyed by content hash, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct HashIndex {
    buckets: IndexMap<ContentHash, Bucket>,
    num_blocks: u64,
}

impl HashIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the bucket for `hash`, creating the bucket if needed.
    pub fn insert_block(&mut self, hash: ContentHash, block: Block) {
        self.buckets
            .entry(hash)
            .or_insert_with_key(|hash| Bucket::new(hash.clone()))
            .push(block);
        self.num_blocks += 1;
    }

    /// Get the bucket for a hash.
    pub fn get(&self, hash: &ContentHash) -> Option<&Bucket> {
        self.buckets.get(hash)
    }

    /// Iterate buckets in first-seen order.
    pub fn buckets(&self) -> impl ExactSizeIterator<Item = &Bucket> {
        self.buckets.values()
    }

    /// Number of buckets (distinct hashes).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the index holds no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of blocks across all buckets.
    pub fn num_blocks(&self) -> u64 {
        self.num_blocks
    }
}
