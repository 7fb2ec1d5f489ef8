//! Mapping between image requests and the complex plane.

use crate::{MandelError, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned window of the complex plane.
///
/// Built once per request (or per tile) and never adjusted afterwards;
/// derived windows are new values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneWindow {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlaneWindow {
    /// Create a window, rejecting empty, inverted or non-finite bounds.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        let bounds = [x_min, x_max, y_min, y_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(MandelError::configuration(format!(
                "window bounds must be finite, got {bounds:?}"
            )));
        }
        if x_min >= x_max || y_min >= y_max {
            return Err(MandelError::configuration(format!(
                "window must satisfy x_min < x_max and y_min < y_max, got \
                 x=[{x_min}, {x_max}] y=[{y_min}, {y_max}]"
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

/// Pixel aspect ratio `width / height`. A zero height never reaches the mapper.
pub fn aspect_ratio(width: u32, height: u32) -> Result<f64> {
    if height == 0 {
        return Err(MandelError::validation(
            "image height must be positive to compute an aspect ratio",
        ));
    }
    if width == 0 {
        return Err(MandelError::validation("image width must be positive"));
    }
    Ok(width as f64 / height as f64)
}

/// Zoom and re-center `defaults`, then correct for the pixel aspect ratio.
///
/// Each bound becomes `default / zoom + center`. For wide images
/// (`aspect_ratio > 1`) the y bounds are divided by the ratio; for tall images
/// (`aspect_ratio < 1`) the x bounds are multiplied by it. The correction is
/// applied after the center offset, so the offset is scaled along with the span.
pub fn rescale(
    defaults: &PlaneWindow,
    aspect_ratio: f64,
    zoom: f64,
    center: (f64, f64),
) -> Result<PlaneWindow> {
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(MandelError::configuration(format!(
            "zoom must be a positive finite number, got {zoom}"
        )));
    }
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return Err(MandelError::validation(format!(
            "aspect ratio must be a positive finite number, got {aspect_ratio}"
        )));
    }

    let (cx, cy) = center;
    let x_bound = |b: f64| {
        let shifted = b / zoom + cx;
        if aspect_ratio < 1.0 {
            shifted * aspect_ratio
        } else {
            shifted
        }
    };
    let y_bound = |b: f64| {
        let shifted = b / zoom + cy;
        if aspect_ratio > 1.0 {
            shifted / aspect_ratio
        } else {
            shifted
        }
    };

    PlaneWindow::new(
        x_bound(defaults.x_min),
        x_bound(defaults.x_max),
        y_bound(defaults.y_min),
        y_bound(defaults.y_max),
    )
}

/// `num` evenly spaced values from `start` towards `stop`.
///
/// With `endpoint` the last value is exactly `stop`; without it the spacing is
/// `(stop - start) / num` and `stop` is excluded.
pub fn linspace(start: f64, stop: f64, num: usize, endpoint: bool) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let divisor = if endpoint { num - 1 } else { num };
            let step = (stop - start) / divisor as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            if endpoint {
                values[num - 1] = stop;
            }
            values
        }
    }
}

/// Real (`x_line`) and imaginary (`y_line`) sample coordinates.
///
/// `y_line` is stored high-to-low so row 0 of every derived grid is the top
/// of the image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleAxes {
    x_line: Vec<f64>,
    y_line: Vec<f64>,
}

impl SampleAxes {
    pub fn new(x_line: Vec<f64>, y_line: Vec<f64>) -> Result<Self> {
        if x_line.is_empty() || y_line.is_empty() {
            return Err(MandelError::validation(format!(
                "sample axes must be non-empty, got {} x {}",
                x_line.len(),
                y_line.len()
            )));
        }
        if x_line.iter().chain(&y_line).any(|v| !v.is_finite()) {
            return Err(MandelError::validation("sample coordinates must be finite"));
        }
        Ok(Self { x_line, y_line })
    }

    /// Sample `window` on an `nx` by `ny` lattice anchored at its top-left corner.
    pub fn from_window(window: &PlaneWindow, nx: usize, ny: usize) -> Result<Self> {
        Self::new(
            linspace(window.x_min, window.x_max, nx, false),
            linspace(window.y_max, window.y_min, ny, false),
        )
    }

    pub fn x_line(&self) -> &[f64] {
        &self.x_line
    }

    pub fn y_line(&self) -> &[f64] {
        &self.y_line
    }

    /// Number of samples along x.
    pub fn width(&self) -> usize {
        self.x_line.len()
    }

    /// Number of samples along y.
    pub fn height(&self) -> usize {
        self.y_line.len()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.x_line, self.y_line)
    }

    /// Cartesian product of the axes, one row per `y_line` entry.
    pub fn complex_grid(&self) -> ComplexGrid {
        ComplexGrid {
            real: self.y_line.iter().map(|_| self.x_line.clone()).collect(),
            imag: self
                .y_line
                .iter()
                .map(|&y| vec![y; self.x_line.len()])
                .collect(),
        }
    }
}

/// Per-sample real and imaginary parts, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplexGrid {
    pub real: Vec<Vec<f64>>,
    pub imag: Vec<Vec<f64>>,
}
