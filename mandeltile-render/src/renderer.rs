use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use mandeltile_core::{compute, split, EscapeParams, EscapeTimeBuffer, View};

/// The result of a blocking full-frame render.
///
/// Contains raw escape times; color them with [`colorize`](crate::colorize::colorize) or draw them
/// tile by tile onto a [`crate::Surface`].
pub struct RenderResult {
    pub buffer: EscapeTimeBuffer,
    pub elapsed: Duration,
    pub tiles: usize,
}

/// Render a top-level view by splitting it into `num_tiles` tiles and
/// computing them in parallel on the Rayon pool.
///
/// Fails under the same conditions as [`split`]. Used for one-shot renders
/// that do not need the long-lived worker pool.
pub fn render(view: &View, num_tiles: u32, params: &EscapeParams) -> crate::Result<RenderResult> {
    let start = Instant::now();
    let tiles = split(view, num_tiles)?;
    debug!(
        tiles = tiles.len(),
        width = view.width,
        height = view.height,
        "Starting tiled render"
    );

    let computed: Vec<(View, EscapeTimeBuffer)> = tiles
        .into_par_iter()
        .map(|tile| {
            let buffer = compute(&tile, params);
            (tile, buffer)
        })
        .collect();

    let mut buffer = EscapeTimeBuffer::new(view.width, view.height, view.max_iterations);
    for (tile, data) in &computed {
        buffer.blit_tile(tile, data)?;
    }

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        tiles = computed.len(),
        "Render complete"
    );
    Ok(RenderResult {
        buffer,
        elapsed,
        tiles: computed.len(),
    })
}
