pub mod buffer;
pub mod complex;
pub mod error;
pub mod escape;
pub mod history;
pub mod partition;
pub mod view;

// Re-export primary types for convenience.
pub use buffer::EscapeTimeBuffer;
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{compute, escape_time, EscapeParams};
pub use history::ViewHistory;
pub use partition::{fit_to_grid, grid_side, split};
pub use view::View;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
