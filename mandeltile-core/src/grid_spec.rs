use crate::{aspect_ratio, rescale, MandelError, PlaneWindow, Result, SampleAxes};
use serde::{Deserialize, Serialize};

/// Iteration budget and escape threshold for escape-time evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscapeParams {
    pub max_iterations: u32,
    pub escape_radius: f64,
}

impl EscapeParams {
    pub fn new(max_iterations: u32, escape_radius: f64) -> Result<Self> {
        let params = Self {
            max_iterations,
            escape_radius,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(MandelError::configuration(
                "max_iterations must be positive",
            ));
        }
        if !(self.escape_radius.is_finite() && self.escape_radius > 0.0) {
            return Err(MandelError::configuration(format!(
                "escape_radius must be a positive finite number, got {}",
                self.escape_radius
            )));
        }
        Ok(())
    }
}

/// Fully validated description of one rendered image.
///
/// Sample counts are `width / pixel_density` and `height / pixel_density`,
/// truncated; trailing pixels that do not fill a whole sample are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub width: u32,
    pub height: u32,
    pub pixel_density: u32,
    pub zoom: f64,
    pub center: (f64, f64),
    pub escape: EscapeParams,
}

impl GridSpec {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MandelError::validation(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.pixel_density == 0 {
            return Err(MandelError::validation("pixel density must be positive"));
        }
        if self.pixel_density > self.width || self.pixel_density > self.height {
            return Err(MandelError::validation(format!(
                "pixel density {} leaves no samples in a {}x{} image",
                self.pixel_density, self.width, self.height
            )));
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(MandelError::configuration(format!(
                "zoom must be a positive finite number, got {}",
                self.zoom
            )));
        }
        if !(self.center.0.is_finite() && self.center.1.is_finite()) {
            return Err(MandelError::validation(format!(
                "center must be finite, got {:?}",
                self.center
            )));
        }
        self.escape.validate()
    }

    /// Number of samples along (x, y).
    pub fn sample_counts(&self) -> (usize, usize) {
        (
            (self.width / self.pixel_density) as usize,
            (self.height / self.pixel_density) as usize,
        )
    }

    pub fn window(&self, defaults: &PlaneWindow) -> Result<PlaneWindow> {
        self.validate()?;
        let ratio = aspect_ratio(self.width, self.height)?;
        rescale(defaults, ratio, self.zoom, self.center)
    }

    pub fn axes(&self, defaults: &PlaneWindow) -> Result<SampleAxes> {
        let window = self.window(defaults)?;
        let (nx, ny) = self.sample_counts();
        SampleAxes::from_window(&window, nx, ny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PLANE;

    fn spec(width: u32, height: u32, pixel_density: u32) -> GridSpec {
        GridSpec {
            width,
            height,
            pixel_density,
            zoom: 1.0,
            center: (0.0, 0.0),
            escape: EscapeParams {
                max_iterations: 50,
                escape_radius: 2.0,
            },
        }
    }

    #[test]
    fn sample_counts_truncate() {
        assert_eq!(spec(10, 10, 1).sample_counts(), (10, 10));
        assert_eq!(spec(20, 10, 2).sample_counts(), (10, 5));
        assert_eq!(spec(10, 7, 3).sample_counts(), (3, 2));
    }

    #[test]
    fn zero_sizes_are_validation_errors() {
        for s in [spec(0, 10, 1), spec(10, 0, 1), spec(10, 10, 0), spec(4, 10, 5)] {
            assert!(matches!(s.validate(), Err(MandelError::Validation(_))));
        }
    }

    #[test]
    fn bad_escape_params_are_configuration_errors() {
        let mut s = spec(10, 10, 1);
        s.escape.max_iterations = 0;
        assert!(matches!(s.validate(), Err(MandelError::Configuration(_))));

        let mut s = spec(10, 10, 1);
        s.escape.escape_radius = -2.0;
        assert!(matches!(s.validate(), Err(MandelError::Configuration(_))));

        let mut s = spec(10, 10, 1);
        s.zoom = 0.0;
        assert!(matches!(s.validate(), Err(MandelError::Configuration(_))));
    }

    #[test]
    fn axes_follow_window_and_density() {
        let axes = spec(20, 10, 2).axes(&DEFAULT_PLANE).unwrap();
        assert_eq!(axes.width(), 10);
        assert_eq!(axes.height(), 5);
        assert_eq!(axes.x_line()[0], -2.5);
        assert_eq!(axes.y_line()[0], 1.25);
    }

    #[test]
    fn escape_params_new_validates() {
        assert!(EscapeParams::new(100, 2.0).is_ok());
        assert!(EscapeParams::new(0, 2.0).is_err());
        assert!(EscapeParams::new(100, f64::NAN).is_err());
    }
}
