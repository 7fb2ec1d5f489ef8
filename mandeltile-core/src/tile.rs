//! Tiles of the subdivision tree and the level-path keys that address them.

use crate::{
    AxesPayload, ColorGrid, ColorPayload, EscapeParams, IterationGrid, MandelError,
    MandelResponse, Result, SampleAxes,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a tile in the subdivision tree.
///
/// Each level contributes one child index in `0..fanout²`, rendered as a
/// zero-padded digit group of width `len(str(fanout² - 1))`. The root has no
/// groups and renders as the empty string, so the string length of a key is
/// `depth * group_width`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    fanout: u32,
    groups: Vec<u32>,
}

impl TileKey {
    /// Storage prefix prepended to the rendered key.
    pub const PREFIX: &'static str = "L_";

    pub fn root(fanout: u32) -> Result<Self> {
        if fanout < 2 {
            return Err(MandelError::configuration(format!(
                "fanout must be at least 2, got {fanout}"
            )));
        }
        if fanout.checked_mul(fanout).is_none() {
            return Err(MandelError::configuration(format!(
                "fanout {fanout} is too large"
            )));
        }
        Ok(Self {
            fanout,
            groups: Vec::new(),
        })
    }

    pub fn fanout(&self) -> u32 {
        self.fanout
    }

    /// Children per tile (`fanout²`).
    pub fn children_per_tile(&self) -> u32 {
        self.fanout * self.fanout
    }

    /// Digits per level group.
    pub fn group_width(&self) -> usize {
        (self.children_per_tile() - 1).to_string().len()
    }

    pub fn depth(&self) -> usize {
        self.groups.len()
    }

    pub fn is_root(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[u32] {
        &self.groups
    }

    /// Child index of this tile within its parent.
    pub fn last_index(&self) -> Option<u32> {
        self.groups.last().copied()
    }

    pub fn child(&self, index: u32) -> Result<Self> {
        if index >= self.children_per_tile() {
            return Err(MandelError::validation(format!(
                "child index {index} out of range for fanout {}",
                self.fanout
            )));
        }
        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        groups.extend_from_slice(&self.groups);
        groups.push(index);
        Ok(Self {
            fanout: self.fanout,
            groups,
        })
    }

    /// All children in index order.
    pub fn children(&self) -> impl Iterator<Item = TileKey> + '_ {
        (0..self.children_per_tile()).map(move |index| {
            let mut groups = self.groups.clone();
            groups.push(index);
            TileKey {
                fanout: self.fanout,
                groups,
            }
        })
    }

    /// The key with its last group removed; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.groups.split_last()?;
        Some(Self {
            fanout: self.fanout,
            groups: rest.to_vec(),
        })
    }

    /// Parse a rendered key (without prefix).
    pub fn parse(text: &str, fanout: u32) -> Result<Self> {
        let root = Self::root(fanout)?;
        let width = root.group_width();
        if !text.is_ascii() || text.len() % width != 0 {
            return Err(MandelError::validation(format!(
                "key {text:?} is not a whole number of {width}-digit groups"
            )));
        }

        let mut groups = Vec::with_capacity(text.len() / width);
        for chunk in text.as_bytes().chunks(width) {
            // Chunks of an ASCII string are valid UTF-8.
            let digits = std::str::from_utf8(chunk).unwrap_or_default();
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(MandelError::validation(format!(
                    "key {text:?} contains non-digit group {digits:?}"
                )));
            }
            let index: u32 = digits.parse().map_err(|_| {
                MandelError::validation(format!("key {text:?} has unreadable group {digits:?}"))
            })?;
            if index >= root.children_per_tile() {
                return Err(MandelError::validation(format!(
                    "key {text:?} has group {index} outside 0..{}",
                    root.children_per_tile()
                )));
            }
            groups.push(index);
        }

        Ok(Self { fanout, groups })
    }

    /// Parse a prefixed storage name such as `L_0312`.
    pub fn from_storage_name(name: &str, fanout: u32) -> Result<Self> {
        let body = name.strip_prefix(Self::PREFIX).ok_or_else(|| {
            MandelError::validation(format!(
                "storage name {name:?} lacks the {:?} prefix",
                Self::PREFIX
            ))
        })?;
        Self::parse(body, fanout)
    }

    pub fn storage_name(&self) -> String {
        format!("{}{}", Self::PREFIX, self)
    }

    /// Rendered key for messages; the root, which renders empty, reads `<root>`.
    pub fn label(&self) -> String {
        if self.is_root() {
            "<root>".to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.group_width();
        for group in &self.groups {
            write!(f, "{group:0width$}")?;
        }
        Ok(())
    }
}

/// One computed, colorized unit of the subdivision tree.
///
/// Tiles are built once and never modified; regenerating a key produces a new
/// tile that replaces the stored one wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    key: TileKey,
    axes: SampleAxes,
    counts: IterationGrid,
    colors: ColorGrid,
    escape: EscapeParams,
}

impl Tile {
    pub fn new(
        key: TileKey,
        axes: SampleAxes,
        counts: IterationGrid,
        colors: ColorGrid,
        escape: EscapeParams,
    ) -> Result<Self> {
        escape.validate()?;
        let axes_shape = (axes.height(), axes.width());
        if counts.shape() != axes_shape {
            return Err(MandelError::validation(format!(
                "tile {}: count grid shape {:?} does not match axes {:?}",
                key.label(),
                counts.shape(),
                axes_shape
            )));
        }
        if colors.shape() != axes_shape {
            return Err(MandelError::validation(format!(
                "tile {}: color grid shape {:?} does not match axes {:?}",
                key.label(),
                colors.shape(),
                axes_shape
            )));
        }
        if let Some(&bad) = counts
            .as_slice()
            .iter()
            .find(|&&c| c > escape.max_iterations)
        {
            return Err(MandelError::validation(format!(
                "tile {}: count {bad} exceeds max_iterations {}",
                key.label(),
                escape.max_iterations
            )));
        }
        Ok(Self {
            key,
            axes,
            counts,
            colors,
            escape,
        })
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    pub fn axes(&self) -> &SampleAxes {
        &self.axes
    }

    pub fn counts(&self) -> &IterationGrid {
        &self.counts
    }

    pub fn colors(&self) -> &ColorGrid {
        &self.colors
    }

    pub fn escape(&self) -> EscapeParams {
        self.escape
    }

    /// Response payload with per-channel colors, as served for cache hits.
    pub fn to_response(&self) -> MandelResponse {
        let [red, green, blue] = self.colors.to_nested();
        MandelResponse {
            count_grid: self.counts.to_nested(),
            axes: AxesPayload::from(&self.axes),
            complex_grid: None,
            color: Some(ColorPayload::Channels { red, green, blue }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_key_is_empty() {
        let root = TileKey::root(2).unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");
        assert_eq!(root.storage_name(), "L_");
        assert_eq!(root.label(), "<root>");
        assert_eq!(root.child(1).unwrap().label(), "1");
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn root_rejects_small_fanout() {
        assert!(matches!(
            TileKey::root(1),
            Err(MandelError::Configuration(_))
        ));
        assert!(TileKey::root(0).is_err());
    }

    #[test]
    fn group_width_follows_child_count() {
        assert_eq!(TileKey::root(2).unwrap().group_width(), 1);
        assert_eq!(TileKey::root(3).unwrap().group_width(), 1);
        assert_eq!(TileKey::root(4).unwrap().group_width(), 2);
        assert_eq!(TileKey::root(10).unwrap().group_width(), 2);
        assert_eq!(TileKey::root(11).unwrap().group_width(), 3);
    }

    #[test]
    fn child_keys_are_zero_padded() {
        let root = TileKey::root(4).unwrap();
        let child = root.child(3).unwrap().child(15).unwrap();
        assert_eq!(child.to_string(), "0315");
        assert_eq!(child.depth(), 2);
        assert_eq!(child.parent().unwrap().to_string(), "03");
        assert!(root.child(16).is_err());
    }

    #[test]
    fn key_length_encodes_depth() {
        let mut key = TileKey::root(4).unwrap();
        for depth in 1..5 {
            key = key.child(1).unwrap();
            assert_eq!(key.to_string().len(), depth * 2);
        }
    }

    #[test]
    fn children_in_index_order() {
        let root = TileKey::root(2).unwrap();
        let names: Vec<String> = root.children().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn parse_round_trips_display() {
        let key = TileKey::root(4)
            .unwrap()
            .child(9)
            .unwrap()
            .child(0)
            .unwrap();
        assert_eq!(TileKey::parse(&key.to_string(), 4).unwrap(), key);
        assert_eq!(
            TileKey::from_storage_name(&key.storage_name(), 4).unwrap(),
            key
        );
        assert_eq!(TileKey::parse("", 2).unwrap(), TileKey::root(2).unwrap());
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(TileKey::parse("012", 4).is_err()); // partial group
        assert!(TileKey::parse("0a", 4).is_err()); // non-digit
        assert!(TileKey::parse("16", 4).is_err()); // index out of range
        assert!(TileKey::parse("4", 2).is_err());
        assert!(TileKey::from_storage_name("X_01", 2).is_err());
    }

    fn small_tile(max_iterations: u32, counts: Vec<u32>) -> Result<Tile> {
        let axes = SampleAxes::new(vec![-1.0, 0.0], vec![0.5]).unwrap();
        Tile::new(
            TileKey::root(2).unwrap(),
            axes,
            IterationGrid::new(2, 1, counts).unwrap(),
            ColorGrid::new(2, 1, vec![0, 255], vec![1, 2], vec![3, 4]).unwrap(),
            EscapeParams {
                max_iterations,
                escape_radius: 2.0,
            },
        )
    }

    #[test]
    fn tile_rejects_counts_above_budget() {
        assert!(small_tile(10, vec![0, 10]).is_ok());
        assert!(small_tile(10, vec![0, 11]).is_err());
    }

    #[test]
    fn tile_rejects_mismatched_shapes() {
        let axes = SampleAxes::new(vec![-1.0, 0.0, 1.0], vec![0.5]).unwrap();
        let result = Tile::new(
            TileKey::root(2).unwrap(),
            axes,
            IterationGrid::new(2, 1, vec![0, 1]).unwrap(),
            ColorGrid::new(2, 1, vec![0, 0], vec![0, 0], vec![0, 0]).unwrap(),
            EscapeParams {
                max_iterations: 10,
                escape_radius: 2.0,
            },
        );
        assert!(matches!(result, Err(MandelError::Validation(_))));
    }

    #[test]
    fn tile_response_carries_channels() {
        let tile = small_tile(10, vec![0, 10]).unwrap();
        let response = tile.to_response();
        assert_eq!(response.count_grid, vec![vec![0, 10]]);
        assert_eq!(response.axes.x_line, vec![-1.0, 0.0]);
        match response.color {
            Some(ColorPayload::Channels { red, .. }) => assert_eq!(red, vec![vec![0, 255]]),
            other => panic!("expected channel colors, got {other:?}"),
        }
    }
}
