use tracing::trace;

use mandeltile_core::{EscapeTimeBuffer, View};

use crate::colorize::{colorize, ColorMapping};
use crate::error::RenderError;

/// The display surface: an RGBA pixel buffer covering the whole canvas.
///
/// Only tiles are ever written; a tile that fails to draw leaves its
/// rectangle as it was.
#[derive(Debug, Clone)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl Surface {
    /// Create a surface filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGBA value of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Colorize `buffer` and write it into `tile`'s rectangle.
    ///
    /// The buffer must hold exactly `tile.width × tile.height` escape times
    /// and the tile must lie inside the surface; otherwise nothing is written.
    pub fn draw(
        &mut self,
        tile: &View,
        buffer: &EscapeTimeBuffer,
        mapping: ColorMapping,
    ) -> crate::Result<()> {
        if buffer.data.len() != tile.pixel_count() {
            return Err(RenderError::BufferSizeMismatch {
                expected: tile.pixel_count(),
                actual: buffer.data.len(),
            });
        }
        if tile.i as u64 + tile.width as u64 > self.width as u64
            || tile.j as u64 + tile.height as u64 > self.height as u64
        {
            return Err(RenderError::TileOutOfBounds {
                i: tile.i,
                j: tile.j,
                width: tile.width,
                height: tile.height,
                surface_width: self.width,
                surface_height: self.height,
            });
        }

        let tile_pixels = colorize(tile, buffer, mapping)?;
        self.blit_tile(tile, &tile_pixels);
        trace!(i = tile.i, j = tile.j, mapping = mapping.label(), "Drew tile");
        Ok(())
    }

    /// Copy a tile's RGBA data into its position on the surface.
    fn blit_tile(&mut self, tile: &View, tile_pixels: &[u8]) {
        debug_assert_eq!(tile_pixels.len(), tile.pixel_count() * 4);
        let stride = self.width as usize * 4;
        let row_len = tile.width as usize * 4;
        for (row, src) in tile_pixels.chunks_exact(row_len).enumerate() {
            let dst_start = (tile.j as usize + row) * stride + tile.i as usize * 4;
            self.pixels[dst_start..dst_start + row_len].copy_from_slice(src);
        }
    }
}
