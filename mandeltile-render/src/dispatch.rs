use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use mandeltile_core::{compute, grid_side, split, EscapeParams, EscapeTimeBuffer, View};

use crate::error::RenderError;
use crate::protocol::{TileOutcome, TileResult, TileTask};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened when a view was handed to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub generation: u64,
    /// Number of tiles handed to a live worker.
    pub sent: usize,
    /// Slots whose worker is gone; their tiles will never arrive.
    pub dropped: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

struct WorkerHandle {
    tx: Option<mpsc::Sender<TileTask>>,
    thread: Option<JoinHandle<()>>,
}

/// A fixed pool of tile workers, one per tile slot.
///
/// Worker `k` always receives tile `k` of every split. Tasks go in over the
/// worker's own channel; outcomes come back over a completion channel that
/// only the dispatcher reads. Workers share no mutable state.
pub struct Dispatcher {
    workers: Vec<WorkerHandle>,
    rx_result: mpsc::Receiver<TileOutcome>,
}

impl Dispatcher {
    /// Spawn `num_workers` workers. The count must be a perfect square so
    /// that every view can be split into one tile per worker.
    pub fn spawn(num_workers: u32, params: EscapeParams) -> crate::Result<Self> {
        Self::spawn_with(num_workers, move |tile: &View| compute(tile, &params))
    }

    fn spawn_with<W>(num_workers: u32, work: W) -> crate::Result<Self>
    where
        W: Fn(&View) -> EscapeTimeBuffer + Clone + Send + 'static,
    {
        grid_side(num_workers)?;

        let (tx_result, rx_result) = mpsc::channel::<TileOutcome>();
        let mut workers = Vec::with_capacity(num_workers as usize);
        for slot in 0..num_workers as usize {
            let (tx_task, rx_task) = mpsc::channel::<TileTask>();
            let tx = tx_result.clone();
            let work = work.clone();
            let thread = thread::Builder::new()
                .name(format!("tile-worker-{slot}"))
                .spawn(move || tile_worker(slot, rx_task, tx, work))
                .map_err(RenderError::WorkerSpawn)?;
            workers.push(WorkerHandle {
                tx: Some(tx_task),
                thread: Some(thread),
            });
        }

        info!(num_workers, "Spawned tile workers");
        Ok(Self { workers, rx_result })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Split `view` and send tile `k` to worker `k`, tagged with
    /// `generation`. Never waits for a computation.
    ///
    /// Invalid views and split errors are returned before any tile is sent.
    pub fn dispatch(&self, view: &View, generation: u64) -> crate::Result<DispatchReport> {
        let tiles = split(view, self.workers.len() as u32)?;

        let mut sent = 0;
        let mut dropped = Vec::new();
        for (slot, (worker, tile)) in self.workers.iter().zip(tiles).enumerate() {
            let delivered = match &worker.tx {
                Some(tx) => tx.send(TileTask::new(generation, slot, tile)).is_ok(),
                None => false,
            };
            if delivered {
                sent += 1;
            } else {
                warn!(slot, generation, "Tile worker unavailable, dropping tile");
                dropped.push(slot);
            }
        }

        debug!(generation, sent, dropped = dropped.len(), "Dispatched view");
        Ok(DispatchReport {
            generation,
            sent,
            dropped,
        })
    }

    /// Next finished tile, if one is already waiting.
    pub fn try_next(&self) -> Option<TileOutcome> {
        self.rx_result.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished tile.
    pub fn next_timeout(&self, timeout: Duration) -> Option<TileOutcome> {
        self.rx_result.recv_timeout(timeout).ok()
    }

    /// Stop the worker bound to `slot` and wait for it to exit. From then on
    /// its tiles are reported as dropped.
    pub fn shutdown_worker(&mut self, slot: usize) {
        if let Some(worker) = self.workers.get_mut(slot) {
            worker.shutdown();
            debug!(slot, "Tile worker shut down");
        }
    }
}

impl WorkerHandle {
    fn shutdown(&mut self) {
        // Closing the inbound channel ends the worker's receive loop.
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Tile worker thread panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.tx.take();
        }
        for worker in &mut self.workers {
            worker.shutdown();
        }
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

/// Skip queued tasks that a newer dispatch has already replaced.
fn drain_latest(initial: TileTask, rx: &mpsc::Receiver<TileTask>) -> TileTask {
    let mut task = initial;
    while let Ok(newer) = rx.try_recv() {
        debug!(
            slot = task.slot,
            skipped = task.generation,
            "Superseded tile task skipped"
        );
        task = newer;
    }
    task
}

fn tile_worker<W>(
    slot: usize,
    rx: mpsc::Receiver<TileTask>,
    tx: mpsc::Sender<TileOutcome>,
    work: W,
) where
    W: Fn(&View) -> EscapeTimeBuffer,
{
    debug!(slot, "Tile worker started");
    while let Ok(initial) = rx.recv() {
        let task = drain_latest(initial, &rx);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(&task.tile))) {
            Ok(buffer) => TileOutcome::Computed(TileResult::new(&task, buffer)),
            Err(_) => {
                error!(slot, generation = task.generation, "Tile computation panicked");
                TileOutcome::failed(&task)
            }
        };

        if tx.send(outcome).is_err() {
            // The dispatcher is gone; nobody is listening.
            return;
        }
    }
    debug!(slot, "Tile worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandeltile_core::CoreError;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn collect(dispatcher: &Dispatcher, n: usize) -> Vec<TileOutcome> {
        (0..n)
            .map(|_| dispatcher.next_timeout(TIMEOUT).expect("tile should arrive"))
            .collect()
    }

    fn computed(outcome: TileOutcome) -> TileResult {
        match outcome {
            TileOutcome::Computed(result) => result,
            other => panic!("expected a computed tile, got {other:?}"),
        }
    }

    #[test]
    fn spawn_rejects_non_square_pool() {
        let err = Dispatcher::spawn(5, EscapeParams::default()).err();
        assert!(matches!(
            err,
            Some(RenderError::Core(CoreError::InvalidPartition { count: 5 }))
        ));
    }

    #[test]
    fn every_slot_returns_its_tile() {
        let dispatcher = Dispatcher::spawn(4, EscapeParams::default()).unwrap();
        let view = View::default_for(40, 20).with_max_iterations(50);
        let report = dispatcher.dispatch(&view, 1).unwrap();
        assert_eq!(report.sent, 4);
        assert!(report.dropped.is_empty());

        let mut results: Vec<_> = collect(&dispatcher, 4).into_iter().map(computed).collect();
        results.sort_by_key(|r| r.slot);
        let tiles = split(&view, 4).unwrap();
        for (result, tile) in results.iter().zip(&tiles) {
            assert_eq!(result.generation, 1);
            assert_eq!(&result.tile, tile);
            assert!(result.validate().is_ok());
            assert_eq!(result.buffer, compute(tile, &EscapeParams::default()));
        }
    }

    #[test]
    fn split_errors_prevent_dispatch() {
        let dispatcher = Dispatcher::spawn(9, EscapeParams::default()).unwrap();
        let view = View::default_for(10, 10);
        assert!(matches!(
            dispatcher.dispatch(&view, 1),
            Err(RenderError::Core(CoreError::IndivisibleSize { .. }))
        ));
        assert!(dispatcher
            .next_timeout(Duration::from_millis(50))
            .is_none());
    }

    #[test]
    fn empty_view_is_refused_and_pool_survives() {
        let dispatcher = Dispatcher::spawn(4, EscapeParams::default()).unwrap();
        assert!(matches!(
            dispatcher.dispatch(&View::default_for(0, 0), 1),
            Err(RenderError::Core(CoreError::InvalidView { .. }))
        ));
        assert!(dispatcher
            .next_timeout(Duration::from_millis(50))
            .is_none());

        let view = View::default_for(20, 20).with_max_iterations(20);
        let report = dispatcher.dispatch(&view, 2).unwrap();
        assert_eq!(report.sent, 4);
        assert!(report.dropped.is_empty());
        for outcome in collect(&dispatcher, 4) {
            assert_eq!(computed(outcome).generation, 2);
        }
    }

    #[test]
    fn panicking_tile_is_reported_and_worker_keeps_running() {
        let dispatcher = Dispatcher::spawn_with(4, |tile: &View| {
            if tile.max_iterations == 13 && tile.i == 0 && tile.j == 0 {
                panic!("tile computation failed");
            }
            compute(tile, &EscapeParams::default())
        })
        .unwrap();

        let view = View::default_for(20, 20).with_max_iterations(13);
        dispatcher.dispatch(&view, 1).unwrap();
        let outcomes = collect(&dispatcher, 4);
        let failed: Vec<_> = outcomes
            .iter()
            .filter(|o| matches!(o, TileOutcome::Failed { .. }))
            .collect();
        assert_eq!(
            failed,
            vec![&TileOutcome::Failed {
                generation: 1,
                slot: 0
            }]
        );

        let report = dispatcher
            .dispatch(&view.with_max_iterations(20), 2)
            .unwrap();
        assert_eq!(report.sent, 4);
        assert!(report.dropped.is_empty());
        for outcome in collect(&dispatcher, 4) {
            assert_eq!(computed(outcome).generation, 2);
        }
    }

    #[test]
    fn stopped_worker_drops_its_tile() {
        let mut dispatcher = Dispatcher::spawn(4, EscapeParams::default()).unwrap();
        dispatcher.shutdown_worker(2);

        let view = View::default_for(20, 20).with_max_iterations(20);
        let report = dispatcher.dispatch(&view, 3).unwrap();
        assert_eq!(report.sent, 3);
        assert_eq!(report.dropped, vec![2]);

        let outcomes = collect(&dispatcher, 3);
        assert!(outcomes.iter().all(|o| o.slot() != 2));
    }

    #[test]
    fn drain_latest_keeps_newest_task() {
        let (tx, rx) = mpsc::channel();
        let view = View::default_for(4, 4);
        for generation in 1..=3 {
            tx.send(TileTask::new(generation, 0, view)).unwrap();
        }
        let first = rx.recv().unwrap();
        assert_eq!(drain_latest(first, &rx).generation, 3);
    }
}
