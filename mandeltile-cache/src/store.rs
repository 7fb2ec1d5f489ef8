//! On-disk tile store.
//!
//! One file per tile key, `L_<key>.tile`, inside the cache directory. Each file
//! is a versioned JSON record compressed with Deflate. Writes go to a temporary
//! file in the same directory that is renamed over the target, so readers see
//! either the complete previous tile, the complete new tile, or no tile.
//!
//! `manifest.json` records the [`StoreLayout`] the tiles were built with.
//! Opening the directory with a different layout discards every tile.

use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use crate::SplitMode;
use mandeltile_core::{
    ColorGrid, EscapeParams, IterationGrid, MandelError, Result, SampleAxes, Tile, TileKey, XyInt,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const TILE_EXTENSION: &str = "tile";
const MANIFEST_FILE: &str = "manifest.json";

/// Parameters that fix the axes of every tile below the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreLayout {
    pub fanout: u32,
    pub split: SplitMode,
    /// Sample counts of the root tile.
    pub samples: XyInt,
}

/// Serialized form of a tile. Every field is required.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedTile {
    version: u32,
    key: String,
    max_iterations: u32,
    escape_radius: f64,
    /// Counts truncated to 8 bits; lossy when `max_iterations > 255`.
    count_grid: Vec<u8>,
    x_line: Vec<f64>,
    y_line: Vec<f64>,
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
}

impl PersistedTile {
    const CURRENT_VERSION: u32 = 1;

    fn from_tile(tile: &Tile) -> Self {
        let escape = tile.escape();
        Self {
            version: Self::CURRENT_VERSION,
            key: tile.key().to_string(),
            max_iterations: escape.max_iterations,
            escape_radius: escape.escape_radius,
            count_grid: tile.counts().as_slice().iter().map(|&c| c as u8).collect(),
            x_line: tile.axes().x_line().to_vec(),
            y_line: tile.axes().y_line().to_vec(),
            red: tile.colors().red().to_vec(),
            green: tile.colors().green().to_vec(),
            blue: tile.colors().blue().to_vec(),
        }
    }

    fn into_tile(self, key: &TileKey) -> Result<Tile> {
        let corrupt = |reason: String| MandelError::corruption(key, reason);

        if self.version != Self::CURRENT_VERSION {
            return Err(corrupt(format!(
                "schema version {} (expected {})",
                self.version,
                Self::CURRENT_VERSION
            )));
        }
        if self.key != key.to_string() {
            return Err(corrupt(format!("file holds tile {:?}", self.key)));
        }

        let width = self.x_line.len();
        let height = self.y_line.len();
        let escape = EscapeParams::new(self.max_iterations, self.escape_radius)
            .map_err(|e| corrupt(e.to_string()))?;
        let axes = SampleAxes::new(self.x_line, self.y_line).map_err(|e| corrupt(e.to_string()))?;
        let counts = IterationGrid::new(
            width,
            height,
            self.count_grid.into_iter().map(u32::from).collect(),
        )
        .map_err(|e| corrupt(e.to_string()))?;
        let colors = ColorGrid::new(width, height, self.red, self.green, self.blue)
            .map_err(|e| corrupt(e.to_string()))?;

        Tile::new(key.clone(), axes, counts, colors, escape).map_err(|e| corrupt(e.to_string()))
    }
}

fn encode(tile: &Tile) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&PersistedTile::from_tile(tile))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

fn decode(key: &TileKey, bytes: &[u8]) -> Result<Tile> {
    let mut json = Vec::new();
    DeflateDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| MandelError::corruption(key, format!("decompression failed: {e}")))?;
    let persisted: PersistedTile = serde_json::from_slice(&json)
        .map_err(|e| MandelError::corruption(key, format!("malformed record: {e}")))?;
    persisted.into_tile(key)
}

/// Directory of persisted tiles sharing one layout.
#[derive(Debug)]
pub struct TileStore {
    dir: PathBuf,
    layout: StoreLayout,
}

impl TileStore {
    /// Open (creating if needed) the store at `dir`.
    ///
    /// Tiles written under another layout, or under no recorded layout, are
    /// deleted before the manifest for `layout` is written.
    pub fn open(dir: impl Into<PathBuf>, layout: StoreLayout) -> Result<Self> {
        TileKey::root(layout.fanout)?;
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let store = Self { dir, layout };

        match store.recorded_layout()? {
            Some(recorded) if recorded == layout => {}
            recorded => {
                if let Some(recorded) = recorded {
                    log::warn!(
                        "tile store {} was built with {:?}; discarding its tiles",
                        store.dir.display(),
                        recorded
                    );
                }
                store.clear()?;
                let manifest = serde_json::to_vec_pretty(&layout)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                store.write_atomic(&store.dir.join(MANIFEST_FILE), &manifest)?;
            }
        }

        log::info!(
            "opened tile store at {} (fanout {}, {:?} split)",
            store.dir.display(),
            layout.fanout,
            layout.split
        );
        Ok(store)
    }

    /// Layout in the manifest; `None` when it is missing or unreadable.
    fn recorded_layout(&self) -> Result<Option<StoreLayout>> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(layout) => Ok(Some(layout)),
            Err(e) => {
                log::warn!("ignoring unreadable manifest {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| MandelError::Io(e.error))?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    pub fn fanout(&self) -> u32 {
        self.layout.fanout
    }

    pub fn path_for(&self, key: &TileKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.storage_name(), TILE_EXTENSION))
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Persist `tile`, replacing any stored tile with the same key.
    pub fn write(&self, tile: &Tile) -> Result<()> {
        if tile.key().fanout() != self.fanout() {
            return Err(MandelError::configuration(format!(
                "tile {} has fanout {}, store uses {}",
                tile.key().label(),
                tile.key().fanout(),
                self.fanout()
            )));
        }
        if tile.escape().max_iterations > u8::MAX as u32 {
            log::warn!(
                "tile {}: counts above 255 are stored truncated",
                tile.key().label()
            );
        }

        let bytes = encode(tile)?;
        self.write_atomic(&self.path_for(tile.key()), &bytes)
    }

    pub fn read(&self, key: &TileKey) -> Result<Tile> {
        if key.fanout() != self.fanout() {
            return Err(MandelError::validation(format!(
                "key {} has fanout {}, store uses {}",
                key.label(),
                key.fanout(),
                self.fanout()
            )));
        }
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MandelError::NotFound(key.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        decode(key, &bytes)
    }

    /// Delete a tile. Returns whether one was stored.
    pub fn remove(&self, key: &TileKey) -> Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Keys of every stored tile, shallowest first.
    pub fn keys(&self) -> Result<Vec<TileKey>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match TileKey::from_storage_name(stem, self.fanout()) {
                Ok(key) => keys.push(key),
                Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
            }
        }
        keys.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| a.groups().cmp(b.groups()))
        });
        Ok(keys)
    }

    /// Delete every tile file, including ones whose names do not parse under
    /// this store's fanout. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TILE_EXTENSION) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        log::info!("cleared {} tiles from {}", removed, self.dir.display());
        Ok(removed)
    }
}
