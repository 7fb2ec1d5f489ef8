pub mod cancellation;
pub mod colorize;
pub mod escape_time;
pub mod pipeline;
pub mod tile_render;

pub use cancellation::{AtomicBoolChecker, CancellationChecker, NeverCancel};
pub use colorize::{channel_values, colorize, colorize_canvas, colorize_grid, ColorMode, ColorOutput};
pub use escape_time::{compute, compute_cancellable, escape_count};
pub use pipeline::{render, render_cancellable, render_grid};
pub use tile_render::render_tile;

// Re-export core types for convenience
pub use mandeltile_core::*;
