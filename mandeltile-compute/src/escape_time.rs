//! Escape-time iteration over a whole sample grid at once.
//!
//! Every point carries its own orbit state and an active flag. Each pass of
//! the main loop advances all active points by one iteration in parallel, so
//! the grid is evaluated as one batch rather than point by point.
//!
//! Count convention: a point's count is the number of completed iterations
//! after which `|z|` was still within the escape radius. A point that first
//! exceeds the radius on iteration `i` (zero-based) therefore stores `i`, and a
//! point that never escapes stores `max_iterations`.

use crate::CancellationChecker;
use crate::NeverCancel;
use mandeltile_core::{EscapeParams, IterationGrid, Result, SampleAxes};
use rayon::prelude::*;

/// Points advanced per rayon task.
const CHUNK_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug)]
struct Orbit {
    c_re: f64,
    c_im: f64,
    z_re: f64,
    z_im: f64,
    active: bool,
    count: u32,
}

impl Orbit {
    fn new(c_re: f64, c_im: f64) -> Self {
        Self {
            c_re,
            c_im,
            z_re: 0.0,
            z_im: 0.0,
            active: true,
            count: 0,
        }
    }

    /// Advance by one iteration if still active. Returns the active flag.
    #[inline]
    fn step(&mut self, radius_sq: f64) -> bool {
        if self.active {
            // z = z^2 + c
            let re = self.z_re * self.z_re - self.z_im * self.z_im + self.c_re;
            let im = 2.0 * self.z_re * self.z_im + self.c_im;
            self.z_re = re;
            self.z_im = im;

            if re * re + im * im > radius_sq {
                self.active = false;
            } else {
                self.count += 1;
            }
        }
        self.active
    }
}

/// Escape count of a single point `c = c_re + i·c_im`.
pub fn escape_count(c_re: f64, c_im: f64, max_iterations: u32, escape_radius: f64) -> u32 {
    let radius_sq = escape_radius * escape_radius;
    let mut orbit = Orbit::new(c_re, c_im);
    for _ in 0..max_iterations {
        if !orbit.step(radius_sq) {
            break;
        }
    }
    orbit.count
}

/// Iteration counts for every point of `axes`.
pub fn compute(axes: &SampleAxes, max_iterations: u32, escape_radius: f64) -> Result<IterationGrid> {
    compute_cancellable(axes, max_iterations, escape_radius, &NeverCancel)
}

/// Like [`compute`], polling `cancel` before every iteration.
pub fn compute_cancellable<C: CancellationChecker>(
    axes: &SampleAxes,
    max_iterations: u32,
    escape_radius: f64,
    cancel: &C,
) -> Result<IterationGrid> {
    EscapeParams::new(max_iterations, escape_radius)?;
    let radius_sq = escape_radius * escape_radius;

    // Row-major in stored y order, so row 0 is the top of the image.
    let mut orbits: Vec<Orbit> = axes
        .y_line()
        .iter()
        .flat_map(|&c_im| axes.x_line().iter().map(move |&c_re| Orbit::new(c_re, c_im)))
        .collect();

    let mut iterations_run = 0;
    for _ in 0..max_iterations {
        cancel.check()?;

        let still_active: usize = orbits
            .par_chunks_mut(CHUNK_SIZE)
            .map(|chunk| chunk.iter_mut().map(|o| o.step(radius_sq) as usize).sum::<usize>())
            .sum();
        iterations_run += 1;

        // Counts of escaped points are final.
        if still_active == 0 {
            break;
        }
    }

    log::debug!(
        "escape-time grid {}x{}: {} of {} iterations run",
        axes.width(),
        axes.height(),
        iterations_run,
        max_iterations
    );

    IterationGrid::new(
        axes.width(),
        axes.height(),
        orbits.iter().map(|o| o.count).collect(),
    )
}
