//! Fixed trigonometric coloring of iteration counts.
//!
//! Colors depend only on the count grid and the iteration budget:
//!
//! - red   = ⌊count / max_iterations · 255⌋
//! - green = ⌊(cos(count) + 1) / 2 · 255⌋
//! - blue  = ⌊(sin(count) + 1) / 2 · 255⌋
//!
//! `libm` supplies cos/sin so the output is identical on every target.

use mandeltile_core::{ColorGrid, ColorPayload, IterationGrid, MandelError, Result};

const COLOR_MAX: f64 = 255.0;
const OPAQUE: u8 = 255;

/// Output layout of [`colorize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Three separate channel grids.
    Channels,
    /// One interleaved `[r, g, b, a]` buffer, pixels in row-major order.
    Canvas,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorOutput {
    Channels(ColorGrid),
    Canvas(Vec<u8>),
}

impl From<ColorOutput> for ColorPayload {
    fn from(output: ColorOutput) -> Self {
        match output {
            ColorOutput::Channels(grid) => {
                let [red, green, blue] = grid.to_nested();
                ColorPayload::Channels { red, green, blue }
            }
            ColorOutput::Canvas(buffer) => ColorPayload::Canvas(buffer),
        }
    }
}

/// `[red, green, blue]` for one count.
#[inline]
pub fn channel_values(count: u32, max_iterations: u32) -> [u8; 3] {
    let n = count as f64;
    let red = n / max_iterations as f64 * COLOR_MAX;
    let green = (libm::cos(n) + 1.0) / 2.0 * COLOR_MAX;
    let blue = (libm::sin(n) + 1.0) / 2.0 * COLOR_MAX;
    // Float-to-int `as` truncates and saturates, which is floor on [0, 255].
    [red as u8, green as u8, blue as u8]
}

fn check_inputs(max_iterations: u32, pixel_density: u32) -> Result<()> {
    if max_iterations == 0 {
        return Err(MandelError::configuration("max_iterations must be positive"));
    }
    if pixel_density == 0 {
        return Err(MandelError::validation("pixel density must be positive"));
    }
    Ok(())
}

/// Per-sample colors replicated `pixel_density` times along both axes.
fn upsampled_pixels(
    counts: &IterationGrid,
    max_iterations: u32,
    pixel_density: u32,
) -> impl Iterator<Item = [u8; 3]> + '_ {
    let density = pixel_density as usize;
    counts.rows().flat_map(move |row| {
        let colored: Vec<[u8; 3]> = row
            .iter()
            .flat_map(|&count| {
                std::iter::repeat(channel_values(count, max_iterations)).take(density)
            })
            .collect();
        std::iter::repeat(colored).take(density).flatten()
    })
}

/// Channel grids at pixel resolution.
pub fn colorize_grid(
    counts: &IterationGrid,
    max_iterations: u32,
    pixel_density: u32,
) -> Result<ColorGrid> {
    check_inputs(max_iterations, pixel_density)?;
    let density = pixel_density as usize;
    let width = counts.width() * density;
    let height = counts.height() * density;

    let mut red = Vec::with_capacity(width * height);
    let mut green = Vec::with_capacity(width * height);
    let mut blue = Vec::with_capacity(width * height);
    for [r, g, b] in upsampled_pixels(counts, max_iterations, pixel_density) {
        red.push(r);
        green.push(g);
        blue.push(b);
    }

    ColorGrid::new(width, height, red, green, blue)
}

/// Draw-ready RGBA buffer at pixel resolution, alpha fixed at 255.
pub fn colorize_canvas(
    counts: &IterationGrid,
    max_iterations: u32,
    pixel_density: u32,
) -> Result<Vec<u8>> {
    check_inputs(max_iterations, pixel_density)?;
    let density = pixel_density as usize;
    let pixels = counts.width() * counts.height() * density * density;

    let mut buffer = Vec::with_capacity(pixels * 4);
    for [r, g, b] in upsampled_pixels(counts, max_iterations, pixel_density) {
        buffer.extend_from_slice(&[r, g, b, OPAQUE]);
    }
    Ok(buffer)
}

pub fn colorize(
    counts: &IterationGrid,
    max_iterations: u32,
    pixel_density: u32,
    mode: ColorMode,
) -> Result<ColorOutput> {
    match mode {
        ColorMode::Channels => {
            colorize_grid(counts, max_iterations, pixel_density).map(ColorOutput::Channels)
        }
        ColorMode::Canvas => {
            colorize_canvas(counts, max_iterations, pixel_density).map(ColorOutput::Canvas)
        }
    }
}
