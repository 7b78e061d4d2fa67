pub mod colorize;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod histogram;
pub mod protocol;
pub mod renderer;
pub mod surface;

pub use colorize::{colorize, pack_rgb, ColorMapping, NUM_COLORS};
pub use dispatch::{DispatchReport, Dispatcher};
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use histogram::Histogram;
pub use protocol::{TileOutcome, TileResult, TileTask, PROTOCOL_VERSION};
pub use renderer::{render, RenderResult};
pub use surface::Surface;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
