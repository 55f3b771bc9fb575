//! Growth settings for `ChainedHashTable`.
//!
//! Every table carries its own `TableConfig`; there are no process-wide
//! thresholds. The defaults are a chain depth of 2, a load factor of 0.7 and
//! a capacity cap of 32768 buckets.

use crate::error::ConfigError;

pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 2;
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.7;
pub const DEFAULT_MAX_CAPACITY: usize = 32_768;

/// Thresholds that decide when a table rehashes.
///
/// - `max_chain_depth`: a rehash fires once the chain of the bucket touched
///   by an insertion holds more than this many entries.
/// - `max_load_factor`: a rehash fires once `len / capacity` exceeds this.
/// - `max_capacity`: capacity doubles up to this value and then stops. A
///   capped table keeps accepting entries; its chains just get longer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    max_chain_depth: usize,
    max_load_factor: f32,
    max_capacity: usize,
}

impl TableConfig {
    pub fn new(
        max_chain_depth: usize,
        max_load_factor: f32,
        max_capacity: usize,
    ) -> Result<Self, ConfigError> {
        Self::default()
            .with_max_chain_depth(max_chain_depth)
            .with_max_load_factor(max_load_factor)?
            .with_max_capacity(max_capacity)
    }

    pub fn with_max_chain_depth(self, max_chain_depth: usize) -> Self {
        Self {
            max_chain_depth,
            ..self
        }
    }

    pub fn with_max_load_factor(self, max_load_factor: f32) -> Result<Self, ConfigError> {
        if !max_load_factor.is_finite() || max_load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(max_load_factor));
        }
        Ok(Self {
            max_load_factor,
            ..self
        })
    }

    pub fn with_max_capacity(self, max_capacity: usize) -> Result<Self, ConfigError> {
        if max_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            max_capacity,
            ..self
        })
    }

    pub fn max_chain_depth(&self) -> usize {
        self.max_chain_depth
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Capacity the next rehash would allocate. Equal to `current` once the
    /// cap is reached, which tells the caller to skip the rehash.
    pub(crate) fn next_capacity(&self, current: usize) -> usize {
        if current == 0 {
            return 1;
        }
        current.saturating_mul(2).min(self.max_capacity).max(current)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}
