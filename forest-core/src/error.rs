//! Error types for forest operations and configuration loading.

use thiserror::Error;

/// Errors reported by tree and forest operations.
///
/// The numeric algorithms themselves never fail; these variants cover
/// misuse of the two-phase growth protocol and bad tree indices.
#[derive(Debug, Error)]
pub enum Error {
    /// A growth tick was started while another one is still in flight.
    #[error("a growth tick is already in flight")]
    GrowthInProgress,

    /// A batch was applied or cancelled with no tick in flight.
    #[error("no growth tick is in flight")]
    NoGrowthInProgress,

    /// The batch does not belong to the tick currently in flight.
    #[error("growth batch for tick {batch} does not match in-flight tick {in_flight}")]
    StaleBatch { batch: u64, in_flight: u64 },

    /// The plan was scanned from a tree with a different node count.
    #[error("growth plan expects {expected} nodes, tree has {found}")]
    StalePlan { expected: usize, found: usize },

    /// Incremental growth was requested on a one-shot tree.
    #[error("one-shot trees cannot grow incrementally")]
    FrozenTree,

    /// No tree exists at this index.
    #[error("no tree at index {0}")]
    TreeIndex(usize),
}

/// Errors produced while loading or validating a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
