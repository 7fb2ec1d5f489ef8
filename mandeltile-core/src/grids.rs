// mandeltile-core/src/grids.rs

use crate::{MandelError, Result};
use serde::{Deserialize, Serialize};

/// Escape counts for every sample point, row-major with row 0 at the top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationGrid {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

impl IterationGrid {
    pub fn new(width: usize, height: usize, counts: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MandelError::validation("iteration grid must not be empty"));
        }
        if counts.len() != width * height {
            return Err(MandelError::validation(format!(
                "iteration grid of {}x{} needs {} counts, got {}",
                width,
                height,
                width * height,
                counts.len()
            )));
        }
        Ok(Self {
            width,
            height,
            counts,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.height && col < self.width {
            Some(self.counts[row * self.width + col])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.counts.chunks(self.width)
    }

    pub fn to_nested(&self) -> Vec<Vec<u32>> {
        self.rows().map(<[u32]>::to_vec).collect()
    }
}

/// Red, green and blue byte planes of identical shape, row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGrid {
    width: usize,
    height: usize,
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
}

impl ColorGrid {
    pub fn new(
        width: usize,
        height: usize,
        red: Vec<u8>,
        green: Vec<u8>,
        blue: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MandelError::validation("color grid must not be empty"));
        }
        let expected = width * height;
        for (name, channel) in [("red", &red), ("green", &green), ("blue", &blue)] {
            if channel.len() != expected {
                return Err(MandelError::validation(format!(
                    "{name} channel of {width}x{height} grid needs {expected} values, got {}",
                    channel.len()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            red,
            green,
            blue,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn red(&self) -> &[u8] {
        &self.red
    }

    pub fn green(&self) -> &[u8] {
        &self.green
    }

    pub fn blue(&self) -> &[u8] {
        &self.blue
    }

    /// `[r, g, b]` at a pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        if row < self.height && col < self.width {
            let i = row * self.width + col;
            Some([self.red[i], self.green[i], self.blue[i]])
        } else {
            None
        }
    }

    /// Channels as nested rows, in `[red, green, blue]` order.
    pub fn to_nested(&self) -> [Vec<Vec<u8>>; 3] {
        let nest = |channel: &[u8]| -> Vec<Vec<u8>> {
            channel.chunks(self.width).map(<[u8]>::to_vec).collect()
        };
        [nest(&self.red), nest(&self.green), nest(&self.blue)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_grid_checks_length() {
        assert!(IterationGrid::new(3, 2, vec![0; 6]).is_ok());
        assert!(matches!(
            IterationGrid::new(3, 2, vec![0; 5]),
            Err(MandelError::Validation(_))
        ));
        assert!(IterationGrid::new(0, 0, vec![]).is_err());
    }

    #[test]
    fn iteration_grid_indexing_is_row_major() {
        let grid = IterationGrid::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.get(0, 2), Some(3));
        assert_eq!(grid.get(1, 0), Some(4));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.to_nested(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn color_grid_checks_every_channel() {
        let ok = ColorGrid::new(2, 1, vec![1, 2], vec![3, 4], vec![5, 6]).unwrap();
        assert_eq!(ok.pixel(0, 1), Some([2, 4, 6]));
        assert!(ColorGrid::new(2, 1, vec![1, 2], vec![3], vec![5, 6]).is_err());
    }

    #[test]
    fn color_grid_nested_channels() {
        let grid = ColorGrid::new(1, 2, vec![1, 2], vec![3, 4], vec![5, 6]).unwrap();
        let [r, g, b] = grid.to_nested();
        assert_eq!(r, vec![vec![1], vec![2]]);
        assert_eq!(g, vec![vec![3], vec![4]]);
        assert_eq!(b, vec![vec![5], vec![6]]);
    }
}
