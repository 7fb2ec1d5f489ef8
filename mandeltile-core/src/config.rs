//! Fixed defaults shared by the mapper and the request schema.
//!
//! These values are immutable and handed out by reference; callers derive new
//! windows from them instead of adjusting them in place.

use crate::PlaneWindow;

/// Region of the complex plane visible at zoom 1, before aspect correction.
pub static DEFAULT_PLANE: PlaneWindow = PlaneWindow {
    x_min: -2.5,
    x_max: 2.5,
    y_min: -2.5,
    y_max: 2.5,
};

/// Defaults applied to optional request fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RequestDefaults {
    pub max_iter: u32,
    /// Escape radius; the request schema calls it `iteration_limit`.
    pub iteration_limit: f64,
    pub is_canvas: bool,
    pub is_image: bool,
}

pub static REQUEST_DEFAULTS: RequestDefaults = RequestDefaults {
    max_iter: 200,
    iteration_limit: 2.0,
    is_canvas: false,
    is_image: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plane_is_symmetric_square() {
        assert_eq!(DEFAULT_PLANE.width(), 5.0);
        assert_eq!(DEFAULT_PLANE.height(), 5.0);
        assert_eq!(DEFAULT_PLANE.center(), (0.0, 0.0));
    }

    #[test]
    fn request_defaults_values() {
        assert_eq!(REQUEST_DEFAULTS.max_iter, 200);
        assert_eq!(REQUEST_DEFAULTS.iteration_limit, 2.0);
        assert!(!REQUEST_DEFAULTS.is_canvas);
        assert!(REQUEST_DEFAULTS.is_image);
    }
}
