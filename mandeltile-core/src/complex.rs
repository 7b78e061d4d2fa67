use serde::{Deserialize, Serialize};

/// A point on the complex plane, `re + im·i`.
///
/// Only used to carry coordinates around. The escape-time loop tracks the
/// real and imaginary parts as separate `f64` locals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}
