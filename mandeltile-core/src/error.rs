//! Error taxonomy shared by every mandeltile crate.

use crate::TileKey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MandelError>;

#[derive(Debug, Error)]
pub enum MandelError {
    /// Non-positive zoom, iteration budget, escape radius or fanout.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Malformed input caught at the boundary (zero sizes, zero pixel density, bad keys).
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("tile {} not found in cache", .0.label())]
    NotFound(TileKey),

    /// A persisted tile exists but cannot be trusted.
    #[error("tile {} is corrupt: {reason}", .key.label())]
    Corruption { key: TileKey, reason: String },

    #[error("computation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MandelError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corruption(key: &TileKey, reason: impl Into<String>) -> Self {
        Self::Corruption {
            key: key.clone(),
            reason: reason.into(),
        }
    }

    /// Whether regenerating the tile is the expected recovery.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}
