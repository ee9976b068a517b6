//! Report rows for ranked buckets.

use std::path::PathBuf;

use serde::Serialize;

use hashstats_core::{
    Block, BlockFlag, Bucket, ContentHash, DbHeader, FileId, FileRecord, FileRegistry,
    HashIndex, Limit, ReportConfig, ReportError,
};

use crate::ranking::RankingIndex;

/// Summary of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketRow {
    /// Shared content hash.
    pub hash: ContentHash,
    /// Number of member blocks.
    pub blocks: usize,
    /// Number of distinct files among the members.
    pub files: usize,
}

/// One member block of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRow {
    /// Owning file.
    pub file: FileId,
    /// Display name of the owning file, if it is registered.
    pub file_name: Option<String>,
    /// Byte offset within the file.
    pub loff: u64,
    /// Offset divided by the block size.
    pub lblock: u64,
    /// Raw flag word.
    pub flags_raw: u32,
    /// Known flags that are set, in declaration order.
    pub flags: Vec<BlockFlag>,
}

/// A ranked bucket with its optional block detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    /// Position in the ranking, starting at 1.
    pub rank: usize,
    #[serde(flatten)]
    pub bucket: BucketRow,
    /// Member blocks; empty unless block detail was requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<BlockRow>,
}

/// Turns ranked buckets into report rows.
#[derive(Debug, Clone, Copy)]
pub struct RankedReporter<'a> {
    config: &'a ReportConfig,
    registry: &'a FileRegistry,
}

impl<'a> RankedReporter<'a> {
    /// Create a reporter resolving file names through `registry`.
    pub fn new(config: &'a ReportConfig, registry: &'a FileRegistry) -> Self {
        Self { config, registry }
    }

    /// Summary row for a bucket.
    pub fn summarize(&self, bucket: &Bucket) -> BucketRow {
        BucketRow {
            hash: bucket.hash().clone(),
            blocks: bucket.member_count(),
            files: bucket.file_count(),
        }
    }

    /// One row per member block, in the bucket's stored order.
    pub fn detail(&self, bucket: &Bucket) -> Vec<BlockRow> {
        bucket
            .members()
            .iter()
            .map(|block| self.block_row(block))
            .collect()
    }

    fn block_row(&self, block: &Block) -> BlockRow {
        BlockRow {
            file: block.file,
            file_name: self.registry.name(block.file).map(str::to_owned),
            loff: block.loff,
            lblock: block.lblock(self.config.block_size),
            flags_raw: block.flags.bits(),
            flags: block.flags.iter().collect(),
        }
    }

    /// Ranked rows in rank order, honoring the configured limit and
    /// expanding members when block detail is enabled.
    pub fn rows<'r, 'b>(
        &'r self,
        ranking: &'r RankingIndex<'b>,
    ) -> impl Iterator<Item = RankedRow> + 'r {
        ranking
            .iter(self.config.limit)
            .enumerate()
            .map(move |(i, bucket)| RankedRow {
                rank: i + 1,
                bucket: self.summarize(bucket),
                members: if self.config.print_blocks {
                    self.detail(bucket)
                } else {
                    Vec::new()
                },
            })
    }
}

/// Block and bucket counts actually loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Blocks loaded.
    pub blocks: u64,
    /// Distinct hashes loaded.
    pub hashes: usize,
    /// File records loaded.
    pub files: usize,
}

impl LoadSummary {
    /// Count what is held in an index and registry.
    pub fn of(index: &HashIndex, registry: &FileRegistry) -> Self {
        Self {
            blocks: index.num_blocks(),
            hashes: index.len(),
            files: registry.len(),
        }
    }
}

/// A complete report, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Database the report was generated from.
    pub source: PathBuf,
    /// Header stored in the database.
    pub header: DbHeader,
    /// Counts actually loaded.
    pub loaded: LoadSummary,
    /// Requested bucket limit.
    pub limit: Limit,
    /// Ranked buckets; `None` when the limit selects no buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked: Option<Vec<RankedRow>>,
    /// All file records, when the listing was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileRecord>>,
}

impl Report {
    /// Build the whole report in memory.
    ///
    /// Fails before producing any rows if the index is corrupt.
    pub fn build(
        source: impl Into<PathBuf>,
        header: DbHeader,
        index: &HashIndex,
        registry: &FileRegistry,
        config: &ReportConfig,
    ) -> Result<Self, ReportError> {
        let ranked = if config.ranks_buckets() {
            let ranking = RankingIndex::build(index.buckets())?;
            let reporter = RankedReporter::new(config, registry);
            Some(reporter.rows(&ranking).collect())
        } else {
            None
        };

        let files = config
            .print_file_list
            .then(|| registry.iter().cloned().collect());

        Ok(Self {
            source: source.into(),
            header,
            loaded: LoadSummary::of(index, registry),
            limit: config.limit,
            ranked,
            files,
        })
    }
}
