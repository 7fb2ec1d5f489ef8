//! Cache configuration, loadable from JSON.

use crate::StoreLayout;
use mandeltile_core::{EscapeParams, MandelError, PlaneWindow, Result, TileKey, XyInt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a tile's axes are divided among its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Children split the parent's samples; concatenated in index order they
    /// reproduce the parent's axes exactly.
    #[default]
    Partition,
    /// Each parent axis is first resampled at `fanout` times its sample count,
    /// then split, so every child keeps the parent's resolution over a
    /// `1 / fanout` sub-window.
    Refine,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory holding the tile files.
    pub root: PathBuf,
    /// Partitions per axis at every level.
    pub fanout: u32,
    /// Sample counts of the root tile.
    pub samples: XyInt,
    pub max_iterations: u32,
    pub escape_radius: f64,
    pub split: SplitMode,
    /// Window used when the root tile has to be derived without a caller-supplied window.
    pub root_window: PlaneWindow,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tiles"),
            fanout: 2,
            samples: XyInt { x: 100, y: 50 },
            max_iterations: 200,
            escape_radius: 2.0,
            split: SplitMode::Partition,
            root_window: PlaneWindow {
                x_min: -2.5,
                x_max: 2.5,
                y_min: -1.25,
                y_max: 1.25,
            },
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        TileKey::root(self.fanout)?;
        if self.samples.x == 0 || self.samples.y == 0 {
            return Err(MandelError::configuration(format!(
                "root tile needs at least one sample per axis, got {}x{}",
                self.samples.x, self.samples.y
            )));
        }
        let w = self.root_window;
        PlaneWindow::new(w.x_min, w.x_max, w.y_min, w.y_max)?;
        self.escape().map(|_| ())
    }

    /// Store layout implied by this configuration.
    pub fn layout(&self) -> StoreLayout {
        StoreLayout {
            fanout: self.fanout,
            split: self.split,
            samples: self.samples,
        }
    }

    pub fn escape(&self) -> Result<EscapeParams> {
        EscapeParams::new(self.max_iterations, self.escape_radius)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MandelError::configuration(format!("unreadable cache config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
