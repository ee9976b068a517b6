//! Hashed file blocks and their handling flags.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::file::FileId;

/// A single handling flag a block may carry.
///
/// Declaration order is the order flags are decoded and displayed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlockFlag {
    /// Block is excluded from byte comparison.
    SkipCompare,
    /// Block has already been deduplicated.
    Deduped,
    /// Block lies in a hole of the file.
    Hole,
}

impl BlockFlag {
    /// Bit this flag occupies in the stored flag word.
    pub const fn bit(self) -> u32 {
        match self {
            Self::SkipCompare => 0x1,
            Self::Deduped => 0x2,
            Self::Hole => 0x4,
        }
    }
}

/// Flag word of a block as stored in the database.
///
/// Bits outside the known [`BlockFlag`] set are kept so the raw value can
/// be shown unchanged, but they never decode to a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BlockFlags(u32);

impl BlockFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);

    /// Wrap a raw flag word.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw flag word, unknown bits included.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether no bits at all are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check whether a flag is set.
    pub const fn contains(self, flag: BlockFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Set a flag.
    pub fn insert(&mut self, flag: BlockFlag) {
        self.0 |= flag.bit();
    }

    /// Iterate the known flags that are set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = BlockFlag> {
        BlockFlag::iter().filter(move |flag| self.contains(*flag))
    }

    /// Display names of the known flags that are set.
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(<&'static str>::from).collect()
    }
}

impl FromIterator<BlockFlag> for BlockFlags {
    fn from_iter<I: IntoIterator<Item = BlockFlag>>(iter: I) -> Self {
        let mut flags = Self::EMPTY;
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Display for BlockFlags {
    /// Space separated flag names; nothing for an empty set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(" "))
    }
}

/// One hashed region of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Block {
    /// File this block belongs to.
    pub file: FileId,
    /// Byte offset of the block within its file.
    pub loff: u64,
    /// Handling flags.
    pub flags: BlockFlags,
}

impl Block {
    /// Create a new block.
    pub fn new(file: FileId, loff: u64, flags: BlockFlags) -> Self {
        Self { file, loff, flags }
    }

    /// Logical block number for the given block size.
    ///
    /// `block_size` must be non-zero; report configuration rejects zero
    /// before any block is looked at.
    pub fn lblock(&self, block_size: u32) -> u64 {
        self.loff / u64::from(block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_in_declaration_order() {
        let flags = BlockFlags::from_bits(0x4 | 0x1);
        assert_eq!(
            flags.iter().collect::<Vec<_>>(),
            vec![BlockFlag::SkipCompare, BlockFlag::Hole]
        );
        assert_eq!(flags.to_string(), "skip_compare hole");
    }

    #[test]
    fn test_empty_flags() {
        let flags = BlockFlags::EMPTY;
        assert!(flags.is_empty());
        assert!(flags.names().is_empty());
        assert_eq!(flags.to_string(), "");
    }

    #[test]
    fn test_unknown_bits_are_kept_but_not_named() {
        let flags = BlockFlags::from_bits(0x8 | 0x2);
        assert_eq!(flags.bits(), 0xa);
        assert_eq!(flags.names(), vec!["deduped"]);
    }

    #[test]
    fn test_lblock() {
        let block = Block::new(FileId::new(0), 262144, BlockFlags::EMPTY);
        assert_eq!(block.lblock(131072), 2);
        assert_eq!(block.lblock(4096), 64);

        let unaligned = Block::new(FileId::new(0), 4097, BlockFlags::EMPTY);
        assert_eq!(unaligned.lblock(4096), 1);
    }
}
