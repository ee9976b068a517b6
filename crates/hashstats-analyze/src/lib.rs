//! Bucket ranking and reporting for hashstats.
//!
//! Given the buckets loaded from a hash database, this crate orders them by
//! how many blocks share each hash and turns the top of that order into
//! report rows:
//!
//! - **Ranking** - buckets by descending member count, ties broken by
//!   ascending hash
//! - **Reporting** - per-bucket summaries, optional per-block detail with
//!   decoded flags, and whole-report assembly for serialization
//!
//! ```rust,ignore
//! use hashstats_analyze::{RankedReporter, RankingIndex};
//! use hashstats_core::{Limit, ReportConfig};
//!
//! let config = ReportConfig::builder()
//!     .block_size(header.block_size)
//!     .limit(Limit::Top(10))
//!     .build()?;
//!
//! let ranking = RankingIndex::build(index.buckets())?;
//! let reporter = RankedReporter::new(&config, &registry);
//!
//! for row in reporter.rows(&ranking) {
//!     println!("{}, {}, {}", row.bucket.hash, row.bucket.blocks, row.bucket.files);
//! }
//! ```

mod ranking;
mod reporter;

pub use ranking::{RankingIndex, rank_order};
pub use reporter::{BlockRow, BucketRow, LoadSummary, RankedReporter, RankedRow, Report};

// Re-export core types
pub use hashstats_core::{Bucket, ContentHash, HashIndex, Limit, ReportConfig, ReportError};
