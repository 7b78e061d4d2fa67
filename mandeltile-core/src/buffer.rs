use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::view::View;

/// Per-pixel escape times of one view, row-major (`index = x + width·y`).
///
/// Every value lies in `[0, max_iterations]`; `max_iterations` marks a point
/// whose orbit stayed bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeTimeBuffer {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub data: Vec<u32>,
}

impl EscapeTimeBuffer {
    /// A zero-filled buffer.
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        Self {
            width,
            height,
            max_iterations,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.data[(x + self.width * y) as usize]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail unless this buffer holds exactly one value per pixel of `view`.
    pub fn check_shape(&self, view: &View) -> crate::Result<()> {
        let expected = view.pixel_count();
        if self.data.len() != expected
            || self.width != view.width
            || self.height != view.height
        {
            return Err(CoreError::BufferShape {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Copy a tile's escape times into this full-frame buffer at the tile's
    /// pixel origin.
    pub fn blit_tile(&mut self, tile: &View, tile_data: &EscapeTimeBuffer) -> crate::Result<()> {
        tile_data.check_shape(tile)?;
        let frame = View {
            i: 0,
            j: 0,
            width: self.width,
            height: self.height,
            ..*tile
        };
        if !frame.contains(tile) {
            return Err(CoreError::InvalidView {
                reason: format!(
                    "tile {}×{} at ({}, {}) lies outside the {}×{} frame",
                    tile.width, tile.height, tile.i, tile.j, self.width, self.height
                ),
            });
        }
        let tw = tile.width as usize;
        for (row, src) in tile_data.data.chunks_exact(tw).enumerate() {
            let dst_start = (tile.j as usize + row) * self.width as usize + tile.i as usize;
            self.data[dst_start..dst_start + tw].copy_from_slice(src);
        }
        Ok(())
    }
}
