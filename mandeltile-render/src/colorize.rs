use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use mandeltile_core::{EscapeTimeBuffer, View};

use crate::error::RenderError;
use crate::histogram::Histogram;

/// Size of the packed color space: three base-255 digits.
pub const NUM_COLORS: u64 = 255 * 255 * 255;

/// How escape times become colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMapping {
    /// Color by how often an escape time occurs within the tile. Gives even
    /// gradients whatever the iteration budget.
    #[default]
    Histogram,
    /// Color by the escape time's share of the budget. Bands more harshly.
    Linear,
}

impl ColorMapping {
    pub fn label(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Linear => "linear",
        }
    }
}

/// Unpack a value in `[0, NUM_COLORS]` into base-255 RGB digits, least
/// significant first.
#[inline]
pub fn pack_rgb(value: u64) -> [u8; 3] {
    let mut v = value;
    let mut rgb = [0u8; 3];
    for channel in &mut rgb {
        *channel = (v % 255) as u8;
        v /= 255;
    }
    rgb
}

/// Packed color value of escape time `t` under the linear law.
#[inline]
fn linear_value(t: u32, max_iterations: u32) -> u64 {
    if max_iterations == 0 {
        return 0;
    }
    t.min(max_iterations) as u64 * NUM_COLORS / max_iterations as u64
}

/// Packed color value of escape time `t` under the histogram law.
#[inline]
fn histogram_value(t: u32, histogram: &Histogram) -> u64 {
    let total = histogram.total();
    if total == 0 {
        return 0;
    }
    histogram.count(t) as u64 * NUM_COLORS / total
}

/// Colorize one tile's escape times into opaque RGBA, 4 bytes per pixel.
///
/// Fails with [`RenderError::BufferSizeMismatch`] unless the buffer holds
/// exactly `tile.width × tile.height` values.
pub fn colorize(
    tile: &View,
    buffer: &EscapeTimeBuffer,
    mapping: ColorMapping,
) -> crate::Result<Vec<u8>> {
    let expected = tile.pixel_count();
    if buffer.data.len() != expected {
        return Err(RenderError::BufferSizeMismatch {
            expected,
            actual: buffer.data.len(),
        });
    }

    let histogram = match mapping {
        ColorMapping::Histogram => Some(Histogram::build(buffer)),
        ColorMapping::Linear => None,
    };
    let max_iterations = buffer.max_iterations;

    let mut pixels = vec![0u8; expected * 4];
    pixels
        .par_chunks_mut(4)
        .zip(buffer.data.par_iter())
        .for_each(|(pixel, &t)| {
            let value = match &histogram {
                Some(h) => histogram_value(t, h),
                None => linear_value(t, max_iterations),
            };
            let [r, g, b] = pack_rgb(value);
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
            pixel[3] = 255;
        });
    Ok(pixels)
}
