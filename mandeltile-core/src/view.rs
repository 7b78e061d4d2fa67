use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// A rectangular region of the complex plane mapped onto a pixel rectangle.
///
/// A top-level view sits at pixel origin `(0, 0)` and covers the whole
/// canvas. Tiles produced by [`split`](crate::partition::split) are views too,
/// with `(i, j)` giving their offset inside the parent's pixel rectangle.
///
/// Views are plain values: tiles are copies with no back-reference, so a
/// worker can own one outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Real part of the plane point at the view's center.
    pub x_center: f64,
    /// Imaginary part of the plane point at the view's center.
    pub y_center: f64,
    /// Width of the viewed rectangle in plane units.
    pub x_range: f64,
    /// Height of the viewed rectangle in plane units.
    pub y_range: f64,
    /// Pixel column of this view's top-left corner within the full canvas.
    pub i: u32,
    /// Pixel row of this view's top-left corner within the full canvas.
    pub j: u32,
    pub width: u32,
    pub height: u32,
    /// Iteration budget shared by every pixel of the view.
    pub max_iterations: u32,
}

impl View {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;
    pub const DEFAULT_X_CENTER: f64 = -0.75;
    pub const DEFAULT_Y_CENTER: f64 = 0.0;
    pub const DEFAULT_X_RANGE: f64 = 3.5;
    pub const DEFAULT_Y_RANGE: f64 = 2.0;

    /// The "whole set" view: `[-2.5, 1.0] × [-1.0, 1.0]` on a `width×height`
    /// canvas.
    pub fn default_for(width: u32, height: u32) -> Self {
        Self {
            x_center: Self::DEFAULT_X_CENTER,
            y_center: Self::DEFAULT_Y_CENTER,
            x_range: Self::DEFAULT_X_RANGE,
            y_range: Self::DEFAULT_Y_RANGE,
            i: 0,
            j: 0,
            width,
            height,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Create a top-level view, validating every field.
    pub fn new(
        center: Complex,
        x_range: f64,
        y_range: f64,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> crate::Result<Self> {
        let view = Self {
            x_center: center.re,
            y_center: center.im,
            x_range,
            y_range,
            i: 0,
            j: 0,
            width,
            height,
            max_iterations,
        };
        view.validate()?;
        Ok(view)
    }

    /// Return a copy with a different iteration budget.
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Check the invariants every computable view must satisfy.
    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidView {
                reason: format!(
                    "dimensions must be > 0, got {}×{}",
                    self.width, self.height
                ),
            });
        }
        for (name, range) in [("x_range", self.x_range), ("y_range", self.y_range)] {
            if range <= 0.0 || !range.is_finite() {
                return Err(CoreError::InvalidView {
                    reason: format!("{name} must be positive and finite, got {range}"),
                });
            }
        }
        if !self.x_center.is_finite() || !self.y_center.is_finite() {
            return Err(CoreError::InvalidView {
                reason: format!(
                    "center must be finite, got {} + {}i",
                    self.x_center, self.y_center
                ),
            });
        }
        if self.max_iterations < 1 {
            return Err(CoreError::InvalidView {
                reason: "max_iterations must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// Plane coordinates of the view's top-left corner, `(x_min, y_min)`.
    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.x_center - self.x_range / 2.0,
            self.y_center - self.y_range / 2.0,
        )
    }

    /// Map a (possibly fractional) pixel coordinate, relative to this view,
    /// to a point on the complex plane.
    ///
    /// The imaginary part grows with the pixel row: row 0 maps to `y_min`.
    #[inline]
    pub fn pixel_to_point(&self, px: f64, py: f64) -> Complex {
        let (x_min, y_min) = self.bounds();
        Complex::new(
            x_min + self.x_range * px / self.width as f64,
            y_min + self.y_range * py / self.height as f64,
        )
    }

    /// Number of pixels, which is also the length of any escape-time buffer
    /// computed for this view.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_top_level(&self) -> bool {
        self.i == 0 && self.j == 0
    }

    /// `true` if `tile`'s pixel rectangle lies entirely inside this view's.
    pub fn contains(&self, tile: &View) -> bool {
        let right = self.i as u64 + self.width as u64;
        let bottom = self.j as u64 + self.height as u64;
        tile.i >= self.i
            && tile.j >= self.j
            && tile.i as u64 + tile.width as u64 <= right
            && tile.j as u64 + tile.height as u64 <= bottom
    }

    /// Recenter on the plane point under pixel `(px, py)` and divide both
    /// ranges by `factor`.
    ///
    /// `factor > 1` zooms in, `factor < 1` zooms out. Fails with
    /// [`CoreError::InvalidView`] once the ranges overflow or underflow.
    pub fn zoomed(&self, px: f64, py: f64, factor: f64) -> crate::Result<Self> {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(CoreError::InvalidZoomFactor(factor));
        }
        let center = self.pixel_to_point(px, py);
        let next = Self {
            x_center: center.re,
            y_center: center.im,
            x_range: self.x_range / factor,
            y_range: self.y_range / factor,
            ..*self
        };
        next.validate()?;
        Ok(next)
    }

    pub fn zoom_in(&self, px: f64, py: f64, factor: f64) -> crate::Result<Self> {
        self.zoomed(px, py, factor)
    }

    /// Zoom out around `(px, py)`: the same as zooming in by `1 / factor`.
    pub fn zoom_out(&self, px: f64, py: f64, factor: f64) -> crate::Result<Self> {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(CoreError::InvalidZoomFactor(factor));
        }
        self.zoomed(px, py, 1.0 / factor)
    }
}
