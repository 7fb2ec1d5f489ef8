//! Computing one cache tile from its sample axes.

use crate::{colorize_grid, compute_cancellable, CancellationChecker};
use mandeltile_core::{EscapeParams, Result, SampleAxes, Tile, TileKey};

/// Evaluate and colorize `axes` as the tile `key`.
///
/// Tiles are stored at sample resolution, so colors use a pixel density of 1.
/// The returned tile is complete; nothing about it is computed lazily.
pub fn render_tile<C: CancellationChecker>(
    key: TileKey,
    axes: SampleAxes,
    escape: EscapeParams,
    cancel: &C,
) -> Result<Tile> {
    let counts = compute_cancellable(
        &axes,
        escape.max_iterations,
        escape.escape_radius,
        cancel,
    )?;
    let colors = colorize_grid(&counts, escape.max_iterations, 1)?;
    log::debug!(
        "rendered tile {} ({}x{} samples)",
        key.label(),
        axes.width(),
        axes.height()
    );
    Tile::new(key, axes, counts, colors, escape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel_values, NeverCancel};

    #[test]
    fn tile_holds_counts_and_matching_colors() {
        let axes = SampleAxes::new(vec![-1.0, 0.0, 1.0], vec![0.5, -0.5]).unwrap();
        let escape = EscapeParams::new(40, 2.0).unwrap();
        let key = TileKey::root(2).unwrap().child(1).unwrap();

        let tile = render_tile(key.clone(), axes.clone(), escape, &NeverCancel).unwrap();

        assert_eq!(tile.key(), &key);
        assert_eq!(tile.axes(), &axes);
        assert_eq!(tile.counts().shape(), (2, 3));
        assert_eq!(tile.colors().shape(), (2, 3));
        for row in 0..2 {
            for col in 0..3 {
                let count = tile.counts().get(row, col).unwrap();
                assert_eq!(
                    tile.colors().pixel(row, col),
                    Some(channel_values(count, 40))
                );
            }
        }
    }
}
