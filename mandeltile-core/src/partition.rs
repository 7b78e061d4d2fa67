//! Splitting a top-level view into a square grid of equal tiles.

use tracing::debug;

use crate::error::CoreError;
use crate::view::View;

/// Side length `s` of the `s×s` grid for `count` tiles.
///
/// Fails with [`CoreError::InvalidPartition`] unless `count` is a non-zero
/// perfect square.
pub fn grid_side(count: u32) -> crate::Result<u32> {
    if count == 0 {
        return Err(CoreError::InvalidPartition { count });
    }
    let mut side = (count as f64).sqrt() as u32;
    // Correct for float rounding on large counts.
    while side as u64 * side as u64 > count as u64 {
        side -= 1;
    }
    while (side as u64 + 1) * (side as u64 + 1) <= count as u64 {
        side += 1;
    }
    if side as u64 * side as u64 != count as u64 {
        return Err(CoreError::InvalidPartition { count });
    }
    Ok(side)
}

/// Trim canvas dimensions down to the nearest multiples of the grid side, so
/// that `split(view, count)` tiles the canvas exactly.
pub fn fit_to_grid(width: u32, height: u32, count: u32) -> crate::Result<(u32, u32)> {
    let side = grid_side(count)?;
    let (w, h) = (width - width % side, height - height % side);
    if w == 0 || h == 0 {
        return Err(CoreError::InvalidView {
            reason: format!("{width}×{height} is too small for a {side}×{side} grid"),
        });
    }
    Ok((w, h))
}

/// Split a top-level view into `count` tiles laid out as a `s×s` grid, where
/// `s = √count`.
///
/// Tile `k = a·s + b` covers pixel columns `[a·W/s, (a+1)·W/s)` and rows
/// `[b·H/s, (b+1)·H/s)`. Its plane ranges are the parent's divided by `s`,
/// centered on the midpoint of its plane sub-rectangle.
///
/// The parent must pass [`View::validate`], and its width and height must be
/// multiples of `s`; otherwise the tiles could not cover it exactly and the
/// split is refused.
pub fn split(view: &View, count: u32) -> crate::Result<Vec<View>> {
    let side = grid_side(count)?;
    view.validate()?;
    if !view.is_top_level() {
        return Err(CoreError::NotTopLevel {
            i: view.i,
            j: view.j,
        });
    }
    if view.width % side != 0 || view.height % side != 0 {
        return Err(CoreError::IndivisibleSize {
            width: view.width,
            height: view.height,
            side,
        });
    }

    let (x_min, y_min) = view.bounds();
    let tile_w = view.width / side;
    let tile_h = view.height / side;
    let x_range = view.x_range / side as f64;
    let y_range = view.y_range / side as f64;

    let mut tiles = Vec::with_capacity(count as usize);
    for a in 0..side {
        for b in 0..side {
            tiles.push(View {
                x_center: x_min + (a as f64 + 0.5) * x_range,
                y_center: y_min + (b as f64 + 0.5) * y_range,
                x_range,
                y_range,
                i: a * tile_w,
                j: b * tile_h,
                width: tile_w,
                height: tile_h,
                max_iterations: view.max_iterations,
            });
        }
    }

    debug!(
        count,
        tile_width = tile_w,
        tile_height = tile_h,
        "Split view into tiles"
    );
    Ok(tiles)
}
