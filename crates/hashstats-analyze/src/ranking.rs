//! Size ranking over hash buckets.
//!
//! Buckets are ordered by member count, largest first. Buckets with the same
//! member count are ordered by ascending content hash, so the order is total
//! and identical across runs over the same database.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashSet};

use hashstats_core::{Bucket, ContentHash, Limit, ReportError};

/// Rank order of two buckets: larger member count first, then smaller hash.
pub fn rank_order(a: &Bucket, b: &Bucket) -> Ordering {
    b.member_count()
        .cmp(&a.member_count())
        .then_with(|| a.hash().cmp(b.hash()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey<'a> {
    count: Reverse<usize>,
    hash: &'a ContentHash,
}

impl<'a> RankKey<'a> {
    fn of(bucket: &'a Bucket) -> Self {
        Self {
            count: Reverse(bucket.member_count()),
            hash: bucket.hash(),
        }
    }
}

/// Buckets in rank order.
///
/// Holds only references into the buckets it was built from, so it cannot
/// outlive the index that owns them. The ranking is a snapshot: member counts
/// are read once, at build time.
#[derive(Debug, Clone, Default)]
pub struct RankingIndex<'a> {
    by_size: BTreeMap<RankKey<'a>, &'a Bucket>,
}

impl<'a> RankingIndex<'a> {
    /// Rank every given bucket.
    ///
    /// Two buckets with the same content hash mean the source index is
    /// corrupt; this is reported instead of dropping either bucket.
    pub fn build(buckets: impl IntoIterator<Item = &'a Bucket>) -> Result<Self, ReportError> {
        let mut seen: HashSet<&'a ContentHash> = HashSet::new();
        let mut by_size = BTreeMap::new();

        for bucket in buckets {
            if !seen.insert(bucket.hash()) {
                return Err(ReportError::CorruptIndex {
                    hash: bucket.hash().clone(),
                });
            }
            by_size.insert(RankKey::of(bucket), bucket);
        }

        tracing::debug!(buckets = by_size.len(), "built size ranking");
        Ok(Self { by_size })
    }

    /// Walk buckets in rank order, stopping after `limit` buckets.
    pub fn iter(&self, limit: Limit) -> impl Iterator<Item = &'a Bucket> + '_ {
        let take = limit.count().unwrap_or(usize::MAX);
        self.by_size.values().copied().take(take)
    }

    /// Number of ranked buckets.
    pub fn len(&self) -> usize {
        self.by_size.len()
    }

    /// Check if nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.by_size.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashstats_core::{Block, BlockFlags, FileId};

    fn bucket(hash: u8, members: usize) -> Bucket {
        Bucket::from_members(
            ContentHash::from(vec![hash]),
            (0..members).map(|i| Block::new(FileId::new(0), i as u64 * 4096, BlockFlags::EMPTY)),
        )
    }

    fn hashes<'a>(iter: impl Iterator<Item = &'a Bucket>) -> Vec<u8> {
        iter.map(|b| b.hash().as_bytes()[0]).collect()
    }

    #[test]
    fn test_ties_broken_by_hash() {
        let buckets = [bucket(0x00, 2), bucket(0x02, 5), bucket(0x01, 5)];
        let ranking = RankingIndex::build(&buckets).unwrap();

        assert_eq!(hashes(ranking.iter(Limit::All)), vec![0x01, 0x02, 0x00]);
    }

    #[test]
    fn test_limit_truncates() {
        let buckets = [bucket(0x00, 2), bucket(0x02, 5), bucket(0x01, 5)];
        let ranking = RankingIndex::build(&buckets).unwrap();

        assert_eq!(hashes(ranking.iter(Limit::Top(2))), vec![0x01, 0x02]);
        assert_eq!(hashes(ranking.iter(Limit::Top(10))), vec![0x01, 0x02, 0x00]);
        assert!(ranking.iter(Limit::Top(0)).next().is_none());
    }

    #[test]
    fn test_duplicate_hash_is_corrupt() {
        let buckets = [bucket(0x07, 3), bucket(0x07, 3)];
        let err = RankingIndex::build(&buckets).unwrap_err();
        assert!(matches!(err, ReportError::CorruptIndex { .. }));
    }

    #[test]
    fn test_duplicate_hash_with_different_counts_is_corrupt() {
        let buckets = [bucket(0x07, 3), bucket(0x01, 1), bucket(0x07, 4)];
        let err = RankingIndex::build(&buckets).unwrap_err();
        assert!(matches!(err, ReportError::CorruptIndex { .. }));
    }

    #[test]
    fn test_empty() {
        let ranking = RankingIndex::build(std::iter::empty::<&Bucket>()).unwrap();
        assert!(ranking.is_empty());
        assert_eq!(ranking.iter(Limit::All).count(), 0);
    }

    #[test]
    fn test_rank_order() {
        assert_eq!(rank_order(&bucket(9, 3), &bucket(1, 2)), Ordering::Less);
        assert_eq!(rank_order(&bucket(1, 2), &bucket(2, 2)), Ordering::Less);
        assert_eq!(rank_order(&bucket(2, 2), &bucket(2, 2)), Ordering::Equal);
    }
}
