use thiserror::Error;

/// Errors originating from the tile pipeline: dispatch, coloring and export.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("buffer holds {actual} escape times, tile needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("tile {width}×{height} at ({i}, {j}) lies outside the {surface_width}×{surface_height} surface")]
    TileOutOfBounds {
        i: u32,
        j: u32,
        width: u32,
        height: u32,
        surface_width: u32,
        surface_height: u32,
    },

    #[error("failed to spawn tile worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("tile protocol version {found} (expected {expected})")]
    ProtocolVersion { expected: u32, found: u32 },

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Core(#[from] mandeltile_core::CoreError),
}
