use thiserror::Error;

/// Errors originating from the view model and the escape-time engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("cannot split a view into {count} tiles: count must be a perfect square")]
    InvalidPartition { count: u32 },

    #[error("cannot split a tile at pixel origin ({i}, {j}): only top-level views can be split")]
    NotTopLevel { i: u32, j: u32 },

    #[error("view of {width}×{height} pixels cannot be split into a {side}×{side} grid")]
    IndivisibleSize { width: u32, height: u32, side: u32 },

    #[error("invalid view: {reason}")]
    InvalidView { reason: String },

    #[error("invalid escape modulus: {0} (must be positive and finite)")]
    InvalidEscapeModulus(f64),

    #[error("invalid zoom factor: {0} (must be positive and finite)")]
    InvalidZoomFactor(f64),

    #[error("escape-time buffer holds {actual} values, view needs {expected}")]
    BufferShape { expected: usize, actual: usize },

    #[error("no previous view to return to")]
    EmptyHistory,
}
