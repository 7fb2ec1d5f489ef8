//! Hierarchical tile cache.
//!
//! The root tile samples a window of the plane. Expanding a tile splits its
//! axes `fanout` ways along x and y and renders each of the `fanout²`
//! children independently. Every tile is persisted under its level-path key.
//!
//! A key moves from absent to generating (claimed in [`InFlight`]) to
//! persisted. Persisted tiles are never modified; regeneration replaces a
//! stored tile as a whole.

use crate::split::{child_axes, child_axes_at};
use crate::{CacheConfig, InFlight, SplitMode, TileStore};
use mandeltile_compute::{render_tile, AtomicBoolChecker, CancellationChecker};
use mandeltile_core::{EscapeParams, MandelError, PlaneWindow, Result, SampleAxes, Tile, TileKey};
use rayon::prelude::*;
use std::ops::AddAssign;

/// Tiles touched by [`TileCache::build_to_depth`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Tiles rendered and persisted.
    pub generated: usize,
    /// Tiles already present, readable and matching their parent, left untouched.
    pub reused: usize,
}

impl BuildReport {
    pub fn total(&self) -> usize {
        self.generated + self.reused
    }
}

impl AddAssign for BuildReport {
    fn add_assign(&mut self, other: Self) {
        self.generated += other.generated;
        self.reused += other.reused;
    }
}

pub struct TileCache {
    config: CacheConfig,
    root: TileKey,
    escape: EscapeParams,
    store: TileStore,
    in_flight: InFlight,
    cancel: AtomicBoolChecker,
}

impl TileCache {
    pub fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let escape = config.escape()?;
        if escape.max_iterations > u8::MAX as u32 {
            log::warn!(
                "max_iterations {} exceeds 255; persisted counts will be truncated",
                escape.max_iterations
            );
        }
        let root = TileKey::root(config.fanout)?;
        let store = TileStore::open(&config.root, config.layout())?;
        Ok(Self {
            config,
            root,
            escape,
            store,
            in_flight: InFlight::new(),
            cancel: AtomicBoolChecker::new(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Handle that aborts in-progress generation when cancelled.
    ///
    /// Cancellation is sticky: once cancelled, every later generation fails
    /// with [`MandelError::Cancelled`].
    pub fn cancel_handle(&self) -> AtomicBoolChecker {
        self.cancel.clone()
    }

    pub fn root_key(&self) -> TileKey {
        self.root.clone()
    }

    fn check_fanout(&self, fanout: u32) -> Result<()> {
        if fanout != self.config.fanout {
            return Err(MandelError::configuration(format!(
                "fanout {} requested from a cache built with fanout {}",
                fanout, self.config.fanout
            )));
        }
        Ok(())
    }

    /// Fail unless every tile down to `depth` keeps at least one sample per axis.
    fn check_depth(&self, depth: usize) -> Result<()> {
        let samples = self.config.samples;
        let smallest = u64::from(samples.x.min(samples.y));
        let feasible = match self.config.split {
            SplitMode::Partition => u32::try_from(depth)
                .ok()
                .and_then(|d| u64::from(self.config.fanout).checked_pow(d))
                .is_some_and(|runs| runs <= smallest),
            // Refined children keep their parent's sample counts.
            SplitMode::Refine => depth == 0 || smallest >= 2,
        };
        if !feasible {
            return Err(MandelError::configuration(format!(
                "a {}x{} root cannot be split {} levels deep with fanout {} in {:?} mode",
                samples.x, samples.y, depth, self.config.fanout, self.config.split
            )));
        }
        Ok(())
    }

    fn root_axes(&self, window: &PlaneWindow) -> Result<SampleAxes> {
        let window = PlaneWindow::new(window.x_min, window.x_max, window.y_min, window.y_max)?;
        SampleAxes::from_window(
            &window,
            self.config.samples.x as usize,
            self.config.samples.y as usize,
        )
    }

    /// Render `axes` as `key` and persist it, unless another caller is
    /// already doing so, in which case their result is returned.
    fn generate(&self, key: TileKey, axes: SampleAxes) -> Result<Tile> {
        loop {
            if let Some(_claim) = self.in_flight.try_claim(&key) {
                let tile = render_tile(key, axes, self.escape, &self.cancel)?;
                self.store.write(&tile)?;
                return Ok(tile);
            }

            self.in_flight.wait(&key);
            match self.store.read(&key) {
                Err(MandelError::NotFound(_)) => continue,
                other => return other,
            }
        }
    }

    /// Render and persist the depth-0 tile for `window`.
    pub fn generate_root(&self, window: &PlaneWindow) -> Result<Tile> {
        let axes = self.root_axes(window)?;
        self.generate(self.root_key(), axes)
    }

    /// Render and persist every child of `parent`, in child-index order.
    ///
    /// `fanout` must be the fanout this cache was opened with.
    pub fn expand(&self, parent: &Tile, fanout: u32) -> Result<Vec<Tile>> {
        self.check_fanout(fanout)?;
        let children: Vec<(TileKey, SampleAxes)> = parent
            .key()
            .children()
            .zip(child_axes(parent.axes(), fanout, self.config.split)?)
            .collect();

        children
            .into_par_iter()
            .map(|(key, axes)| self.generate(key, axes))
            .collect()
    }

    /// Like [`expand`](Self::expand) but keeps children that are already
    /// stored, readable and sampled on the expected axes. Missing, corrupt or
    /// mismatched children are rendered again.
    fn expand_missing(&self, parent: &Tile) -> Result<BuildReport> {
        let children: Vec<(TileKey, SampleAxes)> = parent
            .key()
            .children()
            .zip(child_axes(parent.axes(), self.config.fanout, self.config.split)?)
            .collect();

        let generated: Vec<bool> = children
            .into_par_iter()
            .map(|(key, axes)| match self.store.read(&key) {
                Ok(tile) if tile.axes() == &axes && tile.escape() == self.escape => Ok(false),
                Ok(_) => {
                    log::warn!("tile {} does not match its parent; regenerating", key.label());
                    self.generate(key, axes).map(|_| true)
                }
                Err(MandelError::NotFound(_)) => self.generate(key, axes).map(|_| true),
                Err(err) if err.is_corruption() => {
                    log::warn!("{err}; regenerating");
                    self.generate(key, axes).map(|_| true)
                }
                Err(err) => Err(err),
            })
            .collect::<Result<_>>()?;

        let fresh = generated.iter().filter(|&&g| g).count();
        Ok(BuildReport {
            generated: fresh,
            reused: generated.len() - fresh,
        })
    }

    /// Populate every key down to `depth` levels below the root.
    ///
    /// `fanout` must be the fanout this cache was opened with, and the root's
    /// sample counts must allow `depth` splits; both are checked before any
    /// tile is written.
    ///
    /// If the stored root already matches `root_window` the build resumes:
    /// stored tiles that read back intact on the expected axes are kept and
    /// everything else is rendered. Otherwise existing tiles are discarded
    /// and the root and every descendant are regenerated.
    pub fn build_to_depth(
        &self,
        root_window: &PlaneWindow,
        depth: usize,
        fanout: u32,
    ) -> Result<BuildReport> {
        self.check_fanout(fanout)?;
        self.check_depth(depth)?;
        let root_key = self.root_key();
        let axes = self.root_axes(root_window)?;

        let resume = matches!(
            self.store.read(&root_key),
            Ok(ref tile) if tile.axes() == &axes && tile.escape() == self.escape
        );
        let mut report = BuildReport::default();
        if resume {
            log::info!("resuming cache build from stored root");
            report.reused += 1;
        } else {
            if self.store.contains(&root_key) {
                log::info!("stored root differs from the requested build; discarding existing tiles");
                self.store.clear()?;
            }
            self.generate(root_key.clone(), axes)?;
            report.generated += 1;
        }

        let mut level = vec![root_key];
        for current_depth in 1..=depth {
            self.cancel.check()?;
            let mut next = Vec::with_capacity(level.len() * level[0].children_per_tile() as usize);
            for parent_key in &level {
                let parent = self.read_or_regenerate(parent_key)?;
                if resume {
                    report += self.expand_missing(&parent)?;
                } else {
                    report.generated += self.expand(&parent, fanout)?.len();
                }
                next.extend(parent_key.children());
            }
            log::info!("cache level {} complete: {} tiles", current_depth, next.len());
            level = next;
        }

        log::info!(
            "cache built to depth {}: {} generated, {} reused",
            depth,
            report.generated,
            report.reused
        );
        Ok(report)
    }

    /// Stored tile for `key`.
    pub fn read(&self, key: &TileKey) -> Result<Tile> {
        self.store.read(key)
    }

    /// Read `key`, regenerating it if the stored copy is corrupt.
    ///
    /// Missing tiles still fail with [`MandelError::NotFound`].
    pub fn read_or_regenerate(&self, key: &TileKey) -> Result<Tile> {
        match self.read(key) {
            Err(err) if err.is_corruption() => {
                log::warn!("{err}; regenerating");
                self.regenerate(key)
            }
            other => other,
        }
    }

    /// Read `key`, generating it on demand if it is missing or corrupt.
    pub fn read_or_generate(&self, key: &TileKey) -> Result<Tile> {
        match self.read(key) {
            Err(MandelError::NotFound(_)) => {
                log::debug!("tile {} not cached; generating", key.label());
                self.regenerate(key)
            }
            Err(err) if err.is_corruption() => {
                log::warn!("{err}; regenerating");
                self.regenerate(key)
            }
            other => other,
        }
    }

    /// Render `key` again; the stored copy, if any, is replaced atomically.
    fn regenerate(&self, key: &TileKey) -> Result<Tile> {
        let axes = self.axes_for_key(key)?;
        self.generate(key.clone(), axes)
    }

    /// Sample axes of `key`, derived from its nearest readable ancestor.
    ///
    /// When no ancestor can be read the path is replayed from the configured
    /// root window.
    pub fn axes_for_key(&self, key: &TileKey) -> Result<SampleAxes> {
        let mut ancestor = key.parent();
        let (start_depth, mut axes) = loop {
            match ancestor {
                Some(candidate) => match self.read(&candidate) {
                    Ok(tile) => break (candidate.depth(), tile.axes().clone()),
                    Err(MandelError::NotFound(_)) => ancestor = candidate.parent(),
                    Err(err) if err.is_corruption() => ancestor = candidate.parent(),
                    Err(err) => return Err(err),
                },
                None => break (0, self.root_axes(&self.config.root_window)?),
            }
        };

        for &index in &key.groups()[start_depth..] {
            axes = child_axes_at(&axes, key.fanout(), self.config.split, index)?;
        }
        Ok(axes)
    }

    /// Keys stored at `depth` levels below the root.
    pub fn keys_at_depth(&self, depth: usize) -> Result<Vec<TileKey>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.depth() == depth)
            .collect())
    }

    /// Delete `key` so it can be regenerated.
    pub fn remove(&self, key: &TileKey) -> Result<bool> {
        self.store.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandeltile_core::XyInt;
    use tempfile::TempDir;

    fn small_cache(dir: &TempDir) -> TileCache {
        TileCache::open(CacheConfig {
            root: dir.path().to_path_buf(),
            samples: XyInt { x: 6, y: 4 },
            max_iterations: 30,
            split: SplitMode::Partition,
            ..CacheConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn reports_accumulate() {
        let mut report = BuildReport {
            generated: 2,
            reused: 1,
        };
        report += BuildReport {
            generated: 3,
            reused: 4,
        };
        assert_eq!(report.total(), 10);
    }

    #[test]
    fn axes_without_ancestors_replay_from_root_window() {
        let dir = TempDir::new().unwrap();
        let cache = small_cache(&dir);
        let key = TileKey::parse("3", 2).unwrap();

        let axes = cache.axes_for_key(&key).unwrap();
        let root = cache.root_axes(&cache.config().root_window).unwrap();
        assert_eq!(axes.x_line(), &root.x_line()[3..]);
        assert_eq!(axes.y_line(), &root.y_line()[2..]);
    }

    #[test]
    fn invalid_window_is_rejected_before_rendering() {
        let dir = TempDir::new().unwrap();
        let cache = small_cache(&dir);
        let inverted = PlaneWindow {
            x_min: 1.0,
            x_max: -1.0,
            y_min: -1.0,
            y_max: 1.0,
        };
        assert!(matches!(
            cache.generate_root(&inverted),
            Err(MandelError::Configuration(_))
        ));
        assert!(cache.store().keys().unwrap().is_empty());
    }

    #[test]
    fn depth_limit_follows_root_samples() {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::open(CacheConfig {
            root: dir.path().to_path_buf(),
            ..CacheConfig::default()
        })
        .unwrap();
        // 100x50 root halves down to 50 / 32 = 1 row at depth 5.
        assert!(cache.check_depth(5).is_ok());
        assert!(matches!(
            cache.check_depth(6),
            Err(MandelError::Configuration(_))
        ));
        assert!(cache.check_depth(usize::MAX).is_err());
    }

    #[test]
    fn refine_depth_is_unbounded() {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::open(CacheConfig {
            root: dir.path().to_path_buf(),
            samples: XyInt { x: 2, y: 2 },
            split: SplitMode::Refine,
            ..CacheConfig::default()
        })
        .unwrap();
        assert!(cache.check_depth(40).is_ok());
    }

    #[test]
    fn open_rejects_bad_fanout() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig {
            root: dir.path().to_path_buf(),
            fanout: 1,
            ..CacheConfig::default()
        };
        assert!(TileCache::open(config).is_err());
    }
}
