//! Request → window → counts → colors.

use crate::{colorize, compute_cancellable, CancellationChecker, ColorMode, NeverCancel};
use mandeltile_core::{
    AxesPayload, ColorPayload, GridSpec, IterationGrid, MandelRequest, MandelResponse,
    OutputShape, Result, SampleAxes, DEFAULT_PLANE,
};

/// Sample axes and counts for a validated grid description.
pub fn render_grid<C: CancellationChecker>(
    spec: &GridSpec,
    cancel: &C,
) -> Result<(SampleAxes, IterationGrid)> {
    let axes = spec.axes(&DEFAULT_PLANE)?;
    let counts = compute_cancellable(
        &axes,
        spec.escape.max_iterations,
        spec.escape.escape_radius,
        cancel,
    )?;
    Ok((axes, counts))
}

pub fn render(request: &MandelRequest) -> Result<MandelResponse> {
    render_cancellable(request, &NeverCancel)
}

pub fn render_cancellable<C: CancellationChecker>(
    request: &MandelRequest,
    cancel: &C,
) -> Result<MandelResponse> {
    let spec = request.grid_spec()?;
    let (axes, counts) = render_grid(&spec, cancel)?;
    log::debug!(
        "rendered {}x{} request at zoom {} as {:?}",
        spec.width,
        spec.height,
        spec.zoom,
        request.output_shape()
    );

    let mode = match request.output_shape() {
        OutputShape::CountsOnly => None,
        OutputShape::Channels => Some(ColorMode::Channels),
        OutputShape::Canvas => Some(ColorMode::Canvas),
    };
    let color = mode
        .map(|mode| colorize(&counts, spec.escape.max_iterations, spec.pixel_density, mode))
        .transpose()?
        .map(ColorPayload::from);

    Ok(MandelResponse {
        count_grid: counts.to_nested(),
        axes: AxesPayload::from(&axes),
        complex_grid: request.include_complex_grid.then(|| axes.complex_grid()),
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtomicBoolChecker;
    use mandeltile_core::MandelError;

    fn request(json: &str) -> MandelRequest {
        serde_json::from_str(json).unwrap()
    }

    const BASE: &str = r#"{
        "size": {"x": 8, "y": 4},
        "zoom_level": 1,
        "pixel_per_point": 2,
        "central_point": {"x": 0, "y": 0},
        "max_iter": 30
    }"#;

    #[test]
    fn channels_are_upsampled_to_pixels() {
        let response = render(&request(BASE)).unwrap();
        assert_eq!(response.count_grid.len(), 2);
        assert_eq!(response.count_grid[0].len(), 4);
        assert_eq!(response.axes.x_line.len(), 4);
        assert_eq!(response.axes.y_line.len(), 2);
        match response.color {
            Some(ColorPayload::Channels { red, green, blue }) => {
                for channel in [red, green, blue] {
                    assert_eq!(channel.len(), 4);
                    assert!(channel.iter().all(|row| row.len() == 8));
                }
            }
            other => panic!("expected channels, got {other:?}"),
        }
    }

    #[test]
    fn canvas_buffer_covers_every_pixel() {
        let mut req = request(BASE);
        req.is_canvas = true;
        let response = render(&req).unwrap();
        match response.color {
            Some(ColorPayload::Canvas(buffer)) => {
                assert_eq!(buffer.len(), 8 * 4 * 4);
                assert!(buffer.chunks(4).all(|px| px[3] == 255));
            }
            other => panic!("expected canvas, got {other:?}"),
        }
    }

    #[test]
    fn output_flags_do_not_change_counts() {
        let mut canvas = request(BASE);
        canvas.is_canvas = true;
        let mut bare = request(BASE);
        bare.is_image = false;
        bare.include_complex_grid = true;

        let a = render(&request(BASE)).unwrap();
        let b = render(&canvas).unwrap();
        let c = render(&bare).unwrap();
        assert_eq!(a.count_grid, b.count_grid);
        assert_eq!(a.count_grid, c.count_grid);
        assert_eq!(a.axes, c.axes);
        assert!(c.color.is_none());
        assert_eq!(c.complex_grid.map(|g| g.real.len()), Some(2));
        assert!(a.complex_grid.is_none());
    }

    #[test]
    fn invalid_requests_never_reach_the_engine() {
        let mut req = request(BASE);
        req.size.y = 0;
        assert!(matches!(render(&req), Err(MandelError::Validation(_))));

        let mut req = request(BASE);
        req.zoom_level = -1.0;
        assert!(matches!(render(&req), Err(MandelError::Configuration(_))));
    }

    #[test]
    fn cancelled_render_reports_cancellation() {
        let checker = AtomicBoolChecker::new();
        checker.cancel();
        assert!(matches!(
            render_cancellable(&request(BASE), &checker),
            Err(MandelError::Cancelled)
        ));
    }
}
