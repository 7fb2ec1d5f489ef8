//! Request and response shapes exchanged with the API layer.
//!
//! The request is validated once, here, and turned into a [`GridSpec`]; the
//! compute layer never sees unvalidated input.

use crate::{ComplexGrid, EscapeParams, GridSpec, Result, SampleAxes, REQUEST_DEFAULTS};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XyInt {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XyFloat {
    pub x: f64,
    pub y: f64,
}

fn default_max_iter() -> u32 {
    REQUEST_DEFAULTS.max_iter
}

fn default_iteration_limit() -> f64 {
    REQUEST_DEFAULTS.iteration_limit
}

fn default_is_canvas() -> bool {
    REQUEST_DEFAULTS.is_canvas
}

fn default_is_image() -> bool {
    REQUEST_DEFAULTS.is_image
}

/// Inbound render request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MandelRequest {
    /// Image size in pixels.
    pub size: XyInt,
    pub zoom_level: f64,
    /// Pixels per computed sample along each axis.
    pub pixel_per_point: u32,
    pub central_point: XyFloat,
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    /// Escape radius.
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: f64,
    #[serde(default = "default_is_canvas")]
    pub is_canvas: bool,
    #[serde(default = "default_is_image")]
    pub is_image: bool,
    /// Also return the per-sample complex grid.
    #[serde(default)]
    pub include_complex_grid: bool,
}

/// How the color payload of a response is shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputShape {
    /// Flat `[r, g, b, 255]` buffer for a draw surface.
    Canvas,
    /// Separate red/green/blue grids.
    Channels,
    /// Counts and axes only.
    CountsOnly,
}

impl MandelRequest {
    /// Validate every field and produce the grid description.
    pub fn grid_spec(&self) -> Result<GridSpec> {
        let spec = GridSpec {
            width: self.size.x,
            height: self.size.y,
            pixel_density: self.pixel_per_point,
            zoom: self.zoom_level,
            center: (self.central_point.x, self.central_point.y),
            escape: EscapeParams {
                max_iterations: self.max_iter,
                escape_radius: self.iteration_limit,
            },
        };
        spec.validate()?;
        Ok(spec)
    }

    /// `is_canvas` wins over `is_image`; neither affects the computation.
    pub fn output_shape(&self) -> OutputShape {
        if self.is_canvas {
            OutputShape::Canvas
        } else if self.is_image {
            OutputShape::Channels
        } else {
            OutputShape::CountsOnly
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxesPayload {
    pub x_line: Vec<f64>,
    pub y_line: Vec<f64>,
}

impl From<&SampleAxes> for AxesPayload {
    fn from(axes: &SampleAxes) -> Self {
        Self {
            x_line: axes.x_line().to_vec(),
            y_line: axes.y_line().to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorPayload {
    Channels {
        red: Vec<Vec<u8>>,
        green: Vec<Vec<u8>>,
        blue: Vec<Vec<u8>>,
    },
    Canvas(Vec<u8>),
}

/// Outbound render result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MandelResponse {
    pub count_grid: Vec<Vec<u32>>,
    pub axes: AxesPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex_grid: Option<ComplexGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorPayload>,
}
