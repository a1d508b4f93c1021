//! Error types for table construction, insertion, growth and removal.

use std::collections::TryReserveError;
use thiserror::Error;

/// Rejected table configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("growfactor must be at least 1")]
    ZeroGrowFactor,
    #[error("logsize {logsize} exceeds the configured maximum {max}")]
    LogSizeTooLarge { logsize: u32, max: u32 },
    #[error("max_logsize {max_logsize} exceeds the platform limit {limit}")]
    MaxLogSizeTooLarge { max_logsize: u32, limit: u32 },
}

/// A bucket array could not be reserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to allocate {buckets} buckets")]
pub struct AllocError {
    pub buckets: usize,
    #[source]
    pub source: TryReserveError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Growth did not happen; the table is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrowError {
    #[error("cannot grow past logsize {max_logsize} (currently {logsize})")]
    CapacityExceeded { logsize: u32, max_logsize: u32 },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// A live entry already holds this key; nothing was written.
    #[error("key {key} is already present")]
    DuplicateKey { key: i32 },
    /// The entry was stored but the growth it triggered failed.
    #[error("entry stored but growth failed: {0}")]
    Grow(#[from] GrowError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemoveError {
    /// The reference predates a lookup swap, an insertion or a growth.
    #[error("entry reference is stale")]
    Stale,
    #[error("entry was already removed")]
    AlreadyRemoved,
}
