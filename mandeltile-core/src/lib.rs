pub mod config;
pub mod error;
pub mod grid_spec;
pub mod grids;
pub mod messages;
pub mod plane;
pub mod tile;

pub use config::{RequestDefaults, DEFAULT_PLANE, REQUEST_DEFAULTS};
pub use error::{MandelError, Result};
pub use grid_spec::{EscapeParams, GridSpec};
pub use grids::{ColorGrid, IterationGrid};
pub use messages::{
    AxesPayload, ColorPayload, MandelRequest, MandelResponse, OutputShape, XyFloat, XyInt,
};
pub use plane::{aspect_ratio, linspace, rescale, ComplexGrid, PlaneWindow, SampleAxes};
pub use tile::{Tile, TileKey};
