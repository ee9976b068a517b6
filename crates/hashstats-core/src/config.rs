//! Report configuration types.

use derive_builder::Builder;
use serde::Serialize;

use crate::error::ReportError;

/// How many ranked buckets to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// Every bucket.
    All,
    /// At most this many buckets.
    Top(usize),
}

impl Default for Limit {
    fn default() -> Self {
        Self::Top(10)
    }
}

impl Limit {
    /// Resolve a requested count and the "all" switch into a limit.
    ///
    /// `all` overrides `top`. A negative `top` is rejected.
    pub fn from_request(top: i64, all: bool) -> Result<Self, ReportError> {
        if all {
            return Ok(Self::All);
        }
        usize::try_from(top).map(Self::Top).map_err(|_| {
            ReportError::invalid_config(format!("hash count must not be negative, got {top}"))
        })
    }

    /// Maximum number of buckets, or `None` for all of them.
    pub fn count(self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Top(n) => Some(n),
        }
    }

    /// Check whether this limit selects no buckets at all.
    pub fn is_zero(self) -> bool {
        self == Self::Top(0)
    }
}

/// Configuration for one report run.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "ReportError"))]
pub struct ReportConfig {
    /// Block size used for offset to block number conversion.
    pub block_size: u32,

    /// Number of ranked buckets to report.
    #[builder(default)]
    pub limit: Limit,

    /// Expand each ranked bucket into its member blocks.
    #[builder(default = "false")]
    pub print_blocks: bool,

    /// Append a listing of every file record.
    #[builder(default = "false")]
    pub print_file_list: bool,
}

impl ReportConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.block_size {
            Some(0) => Err("block size must be non-zero".to_string()),
            Some(_) => Ok(()),
            None => Err("block size is required".to_string()),
        }
    }
}

impl ReportConfig {
    /// Create a new report config builder.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Config with default options for the given block size.
    pub fn new(block_size: u32) -> Result<Self, ReportError> {
        Self::builder().block_size(block_size).build()
    }

    /// Check whether the ranked section is produced at all.
    pub fn ranks_buckets(&self) -> bool {
        !self.limit.is_zero()
    }
}
