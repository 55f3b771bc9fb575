//! Error types surfaced by the table and its cursors.

use thiserror::Error;

/// Returned when a cursor positioned at the end sentinel is dereferenced.
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
#[error("cursor is out of range: dereferenced the end sentinel")]
pub struct OutOfRange;

/// Rejected `TableConfig` values.
#[derive(Copy, Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_capacity must be at least 1")]
    ZeroCapacity,
    #[error("max_load_factor must be finite and greater than zero, got {0}")]
    InvalidLoadFactor(f32),
}
