//! Tuning knobs for a [`ShardTable`](crate::ShardTable).

use crate::error::{Error, Result};

/// Buckets a table starts out with unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 8;

/// Entries per bucket a table tolerates before it doubles.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// How big a table starts and how full it may get before it grows.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde_config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TableConfig {
    /// Number of buckets allocated up front. Must be at least 1.
    pub initial_capacity: usize,

    /// Once `len / capacity` goes above this after a `set`, the table keeps
    /// doubling its bucket count until it is back under, then rehashes
    /// everything once. Must be finite and above 0.
    pub max_load_factor: f64,
}

impl TableConfig {
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Checks the values make sense before a table is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(Error::InvalidConfig(
                "initial capacity must be at least 1",
            ));
        }

        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(Error::InvalidConfig(
                "max load factor must be a finite number above 0",
            ));
        }

        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}
