use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use mandeltile_core::{View, ViewHistory};
use mandeltile_render::{
    export_png, ColorMapping, Dispatcher, ExportMetadata, Surface, TileOutcome, TileResult,
};

use crate::commands::UserEvent;
use crate::config::AppConfig;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Frame statistics
// ---------------------------------------------------------------------------

/// Outcome of the tiles received for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub generation: u64,
    pub drawn: usize,
    /// Results from superseded generations that were discarded.
    pub stale: usize,
    /// Tiles that arrived but could not be drawn.
    pub failed: usize,
    /// Tiles whose worker was gone at dispatch time or whose computation
    /// panicked.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the current view, its undo history and the worker pool.
///
/// Every transition goes from idle to idle: `reset`, `zoom_in`/`zoom_out`
/// (which push history) and `undo` (which pops it). Any transition that
/// changes the view starts a new generation and dispatches it; tiles from
/// older generations are discarded when they arrive. A transition whose
/// dispatch fails leaves view, history and generation as they were.
pub struct Controller {
    view: View,
    history: ViewHistory,
    generation: u64,
    dispatcher: Dispatcher,
    surface: Surface,
    mapping: ColorMapping,
    zoom_factor: f64,
    escape_modulus_sq: f64,
    /// Tiles of the current generation still expected.
    pending: usize,
    stats: FrameStats,
}

impl Controller {
    /// Spawn the worker pool and dispatch the default view.
    ///
    /// `config` should have been through [`AppConfig::validate`].
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let params = config.escape_params()?;
        let dispatcher = Dispatcher::spawn(config.num_workers, params)?;
        let view =
            View::default_for(config.width, config.height).with_max_iterations(config.max_iterations);
        view.validate()?;

        let mut controller = Self {
            view,
            history: ViewHistory::new(),
            generation: 0,
            dispatcher,
            surface: Surface::new(config.width, config.height),
            mapping: config.color_mapping,
            zoom_factor: config.zoom_factor,
            escape_modulus_sq: params.escape_modulus_sq,
            pending: 0,
            stats: FrameStats::default(),
        };
        controller.show(view)?;
        Ok(controller)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Apply one user event. Returns `true` if the view changed.
    pub fn handle(&mut self, event: UserEvent) -> Result<bool, AppError> {
        match event {
            UserEvent::ZoomIn { x, y } => self.zoom_in(x, y).map(|_| true),
            UserEvent::ZoomOut { x, y } => self.zoom_out(x, y).map(|_| true),
            UserEvent::Reset => self.reset().map(|_| true),
            UserEvent::Undo => self.undo(),
        }
    }

    /// Return to the default view and forget the history.
    pub fn reset(&mut self) -> Result<(), AppError> {
        let view = View::default_for(self.view.width, self.view.height)
            .with_max_iterations(self.view.max_iterations);
        self.show(view)?;
        self.history.clear();
        info!("View reset");
        Ok(())
    }

    /// Zoom in around canvas pixel `(x, y)`.
    pub fn zoom_in(&mut self, x: f64, y: f64) -> Result<(), AppError> {
        let next = self.view.zoom_in(x, y, self.zoom_factor)?;
        self.apply_zoom(next)
    }

    /// Zoom out around canvas pixel `(x, y)`.
    pub fn zoom_out(&mut self, x: f64, y: f64) -> Result<(), AppError> {
        let next = self.view.zoom_out(x, y, self.zoom_factor)?;
        self.apply_zoom(next)
    }

    fn apply_zoom(&mut self, next: View) -> Result<(), AppError> {
        let previous = self.view;
        self.show(next)?;
        self.history.push(previous);
        info!(
            x_center = self.view.x_center,
            y_center = self.view.y_center,
            x_range = self.view.x_range,
            "Zoomed"
        );
        Ok(())
    }

    /// Restore the previous view. With no history this is a no-op and
    /// returns `false`.
    pub fn undo(&mut self) -> Result<bool, AppError> {
        let Some(&previous) = self.history.peek() else {
            info!("Nothing to undo");
            return Ok(false);
        };
        self.show(previous)?;
        self.history.pop()?;
        debug!(remaining = self.history.len(), "Undo");
        Ok(true)
    }

    /// Hand `view` to the workers under a new generation and make it current.
    /// Nothing changes if the dispatch is refused.
    fn show(&mut self, view: View) -> Result<(), AppError> {
        let generation = self.generation + 1;
        let report = self.dispatcher.dispatch(&view, generation)?;
        self.view = view;
        self.generation = generation;
        self.pending = report.sent;
        self.stats = FrameStats {
            generation,
            dropped: report.dropped.len(),
            ..FrameStats::default()
        };
        Ok(())
    }

    /// Draw every result that has already arrived. Returns how many were
    /// received.
    pub fn pump(&mut self) -> usize {
        let mut received = 0;
        while let Some(outcome) = self.dispatcher.try_next() {
            self.handle_outcome(outcome);
            received += 1;
        }
        received
    }

    /// Block until every tile of the current generation has been drawn or
    /// failed, or until `timeout` elapses.
    pub fn wait_for_frame(&mut self, timeout: Duration) -> FrameStats {
        let deadline = Instant::now() + timeout;
        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.dispatcher.next_timeout(remaining) {
                Some(outcome) => self.handle_outcome(outcome),
                None => {
                    warn!(
                        generation = self.generation,
                        pending = self.pending,
                        "Frame incomplete, giving up on remaining tiles"
                    );
                    break;
                }
            }
        }
        self.stats
    }

    fn handle_outcome(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Computed(result) => self.handle_result(result),
            TileOutcome::Failed { generation, slot } if generation == self.generation => {
                warn!(slot, generation, "Tile lost to a failed computation");
                self.stats.dropped += 1;
                self.pending = self.pending.saturating_sub(1);
            }
            TileOutcome::Failed { generation, slot } => {
                debug!(slot, generation, "Ignoring failure of a stale tile");
                self.stats.stale += 1;
            }
        }
    }

    fn handle_result(&mut self, result: TileResult) {
        let current = result.generation == self.generation;

        if let Err(e) = result.validate() {
            error!(slot = result.slot, generation = result.generation, "Rejected tile: {e}");
            if current {
                self.stats.failed += 1;
                self.pending = self.pending.saturating_sub(1);
            }
            return;
        }

        if !current {
            debug!(
                slot = result.slot,
                generation = result.generation,
                current = self.generation,
                "Discarding stale tile"
            );
            self.stats.stale += 1;
            return;
        }

        match self.surface.draw(&result.tile, &result.buffer, self.mapping) {
            Ok(()) => self.stats.drawn += 1,
            Err(e) => {
                error!(slot = result.slot, "Failed to draw tile: {e}");
                self.stats.failed += 1;
            }
        }
        self.pending = self.pending.saturating_sub(1);
    }

    /// Write the surface, tagged with the current view, to a PNG file.
    pub fn export(&self, path: &Path) -> Result<(), AppError> {
        let metadata = ExportMetadata {
            view: self.view,
            color_mapping: self.mapping,
            escape_modulus_sq: self.escape_modulus_sq,
        };
        export_png(&self.surface, path, &metadata)?;
        info!("Saved frame to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandeltile_core::{compute, split, EscapeParams, EscapeTimeBuffer};
    use mandeltile_render::TileTask;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn config() -> AppConfig {
        AppConfig {
            width: 60,
            height: 40,
            num_workers: 4,
            max_iterations: 60,
            ..AppConfig::default()
        }
        .validate()
        .unwrap()
    }

    fn controller() -> Controller {
        let mut c = Controller::new(&config()).unwrap();
        let stats = c.wait_for_frame(TIMEOUT);
        assert_eq!(stats.drawn, 4);
        c
    }

    /// The surface a complete frame of `view` should produce.
    fn expected_surface(view: &View, mapping: ColorMapping) -> Surface {
        let mut surface = Surface::new(view.width, view.height);
        for tile in split(view, 4).unwrap() {
            let buffer = compute(&tile, &EscapeParams::default());
            surface.draw(&tile, &buffer, mapping).unwrap();
        }
        surface
    }

    #[test]
    fn initial_frame_is_default_view() {
        let c = controller();
        assert_eq!(c.generation(), 1);
        assert_eq!(c.pending(), 0);
        assert_eq!(c.view(), &View::default_for(60, 40).with_max_iterations(60));
        assert_eq!(
            c.surface().pixels,
            expected_surface(c.view(), ColorMapping::Histogram).pixels
        );
    }

    #[test]
    fn zoom_pushes_history_and_undo_restores() {
        let mut c = controller();
        let before = *c.view();

        c.zoom_in(15.0, 10.0).unwrap();
        assert_eq!(c.history_len(), 1);
        assert_ne!(c.view(), &before);
        assert!((c.view().x_range - before.x_range / 2.0).abs() < 1e-12);

        assert!(c.undo().unwrap());
        assert_eq!(c.view(), &before);
        assert_eq!(c.history_len(), 0);
        assert_eq!(c.generation(), 3);
    }

    #[test]
    fn undo_with_empty_history_is_noop() {
        let mut c = controller();
        let before = *c.view();
        let generation = c.generation();

        assert!(!c.handle(UserEvent::Undo).unwrap());
        assert_eq!(c.view(), &before);
        assert_eq!(c.generation(), generation, "no-op must not dispatch");
    }

    #[test]
    fn zoom_out_restores_ranges() {
        let mut c = controller();
        let before = *c.view();
        c.handle(UserEvent::ZoomIn { x: 3.0, y: 7.0 }).unwrap();
        c.handle(UserEvent::ZoomOut { x: 50.0, y: 30.0 }).unwrap();
        assert!((c.view().x_range - before.x_range).abs() < 1e-12);
        assert!((c.view().y_range - before.y_range).abs() < 1e-12);
        assert_eq!(c.history_len(), 2);
    }

    #[test]
    fn reset_clears_history() {
        let mut c = controller();
        c.zoom_in(10.0, 10.0).unwrap();
        c.zoom_in(20.0, 5.0).unwrap();
        c.reset().unwrap();
        assert_eq!(c.history_len(), 0);
        assert_eq!(c.view(), &View::default_for(60, 40).with_max_iterations(60));
        assert!(!c.undo().unwrap());
    }

    #[test]
    fn rapid_events_settle_on_latest_view() {
        let mut c = controller();
        c.zoom_in(30.0, 20.0).unwrap();
        c.zoom_in(5.0, 5.0).unwrap();
        c.zoom_out(40.0, 12.0).unwrap();

        let stats = c.wait_for_frame(TIMEOUT);
        assert_eq!(stats.generation, 4);
        assert_eq!(stats.drawn, 4);
        assert_eq!(
            c.surface().pixels,
            expected_surface(c.view(), ColorMapping::Histogram).pixels,
            "no stale tile may survive on the surface"
        );
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut c = controller();
        let old_view = *c.view();
        c.zoom_in(30.0, 20.0).unwrap();
        c.wait_for_frame(TIMEOUT);
        let drawn = c.surface().pixels.clone();

        // A late tile from generation 1 showing the pre-zoom view.
        let tile = split(&old_view, 4).unwrap()[0];
        let task = TileTask::new(1, 0, tile);
        let late = TileResult::new(&task, compute(&tile, &EscapeParams::default()));
        c.handle_result(late);

        assert_eq!(c.stats().stale, 1);
        assert_eq!(c.surface().pixels, drawn);
    }

    #[test]
    fn malformed_result_fails_only_its_tile() {
        let mut c = controller();
        let drawn = c.surface().pixels.clone();

        c.zoom_in(30.0, 20.0).unwrap();
        let generation = c.generation();
        let tile = split(c.view(), 4).unwrap()[1];
        let task = TileTask::new(generation, 1, tile);
        let bad = TileResult::new(&task, EscapeTimeBuffer::new(1, 1, 60));
        let pending = c.pending();
        c.handle_result(bad);

        assert_eq!(c.stats().failed, 1);
        assert_eq!(c.pending(), pending - 1);
        assert_eq!(c.surface().pixels, drawn, "rejected tile must not touch the surface");
    }

    #[test]
    fn failed_tile_counts_as_dropped() {
        let mut c = controller();
        c.zoom_in(30.0, 20.0).unwrap();
        let generation = c.generation();
        let pending = c.pending();

        c.handle_outcome(TileOutcome::Failed {
            generation,
            slot: 2,
        });
        assert_eq!(c.stats().dropped, 1);
        assert_eq!(c.pending(), pending - 1);

        // A failure from an older generation does not touch the current frame.
        c.handle_outcome(TileOutcome::Failed {
            generation: generation - 1,
            slot: 0,
        });
        assert_eq!(c.stats().dropped, 1);
        assert_eq!(c.stats().stale, 1);
        assert_eq!(c.pending(), pending - 1);
    }

    #[test]
    fn refused_dispatch_leaves_state_untouched() {
        let mut c = controller();
        c.zoom_in(30.0, 20.0).unwrap();
        c.wait_for_frame(TIMEOUT);
        let view = *c.view();
        let generation = c.generation();
        let stats = c.stats();
        let drawn = c.surface().pixels.clone();

        let bad = View { width: 0, ..view };
        assert!(c.apply_zoom(bad).is_err());
        assert_eq!(c.history_len(), 1);

        c.history.push(bad);
        assert!(c.undo().is_err());
        assert_eq!(c.history_len(), 2, "failed undo must not pop");
        c.history.pop().unwrap();

        assert_eq!(c.view(), &view);
        assert_eq!(c.generation(), generation);
        assert_eq!(c.pending(), 0);
        assert_eq!(c.stats(), stats);
        assert_eq!(c.surface().pixels, drawn);
    }

    #[test]
    fn zoom_out_past_float_range_is_refused() {
        let config = AppConfig {
            zoom_factor: 1e100,
            ..config()
        };
        let mut c = Controller::new(&config).unwrap();
        let mut zooms = 0;
        while c.zoom_out(30.0, 20.0).is_ok() {
            zooms += 1;
            assert!(zooms < 10, "ranges should have overflowed by now");
        }
        assert_eq!(c.history_len(), zooms);
        assert_eq!(c.generation(), zooms as u64 + 1);
        assert!(c.view().x_range.is_finite());
        assert!(c.view().y_range.is_finite());
    }

    #[test]
    fn linear_mapping_is_honored() {
        let config = AppConfig {
            color_mapping: ColorMapping::Linear,
            ..config()
        };
        let mut c = Controller::new(&config).unwrap();
        c.wait_for_frame(TIMEOUT);
        assert_eq!(
            c.surface().pixels,
            expected_surface(c.view(), ColorMapping::Linear).pixels
        );
    }

    #[test]
    fn export_writes_png() {
        let c = controller();
        let dir = std::env::temp_dir().join("mandeltile_test_controller_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("frame.png");
        c.export(&path).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
