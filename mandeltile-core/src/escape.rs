use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::EscapeTimeBuffer;
use crate::complex::Complex;
use crate::error::CoreError;
use crate::view::View;

/// Parameters of the escape test that are not part of a [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeParams {
    /// An orbit has escaped once `|z|²` exceeds this value.
    ///
    /// `4.0` (`|z| > 2`) is sufficient. Larger values such as `256.0` push the
    /// escape boundary out, which smooths the color gradient.
    pub escape_modulus_sq: f64,
}

impl EscapeParams {
    pub const DEFAULT_ESCAPE_MODULUS_SQ: f64 = 4.0;

    pub fn new(escape_modulus_sq: f64) -> crate::Result<Self> {
        if escape_modulus_sq <= 0.0 || !escape_modulus_sq.is_finite() {
            return Err(CoreError::InvalidEscapeModulus(escape_modulus_sq));
        }
        Ok(Self { escape_modulus_sq })
    }
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            escape_modulus_sq: Self::DEFAULT_ESCAPE_MODULUS_SQ,
        }
    }
}

/// Escape time of a single point `c` under `z ← z² + c`, starting at `z = 0`.
///
/// Counts the iterations that stayed inside the escape modulus. Returns
/// `max_iterations` for points whose orbit never escaped.
#[inline]
pub fn escape_time(c: Complex, max_iterations: u32, escape_modulus_sq: f64) -> u32 {
    let (a, b) = (c.re, c.im);
    let (mut x, mut y) = (0.0f64, 0.0f64);
    let mut n = 0;
    while n < max_iterations {
        // (x + yi)² + (a + bi) = (x² − y² + a) + (2xy + b)i
        let x_next = x * x - y * y + a;
        y = 2.0 * x * y + b;
        x = x_next;
        if x * x + y * y > escape_modulus_sq {
            break;
        }
        n += 1;
    }
    n
}

/// Compute the escape time of every pixel of `view`.
///
/// Pure and deterministic: the result depends only on the arguments, so
/// disjoint tiles can be computed concurrently.
pub fn compute(view: &View, params: &EscapeParams) -> EscapeTimeBuffer {
    let mut buffer = EscapeTimeBuffer::new(view.width, view.height, view.max_iterations);
    if view.width == 0 {
        return buffer;
    }
    for (py, row) in buffer.data.chunks_exact_mut(view.width as usize).enumerate() {
        for (px, slot) in row.iter_mut().enumerate() {
            let c = view.pixel_to_point(px as f64, py as f64);
            *slot = escape_time(c, view.max_iterations, params.escape_modulus_sq);
        }
    }

    trace!(
        i = view.i,
        j = view.j,
        width = view.width,
        height = view.height,
        "Computed tile"
    );
    buffer
}
