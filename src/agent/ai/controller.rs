// Search controller - runs one root search at a time on a worker thread
//
// The controller owns the game position. `start` hands a copy of it to a
// named worker thread which runs `select_move` and reports back through a
// `SearchListener` and a channel. `stop` only raises the task's
// `CancellationSignal`; the worker notices it before its next root move.
//
// Only one task exists at a time. Starting a search or changing the position
// while a task is running first stops it and waits (bounded by
// `EngineConfig::stop_timeout`) for it to finish.

use super::evaluation::PieceSquareEvaluator;
use super::search::{select_move, CandidateReport, SearchResult};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::game_repr::{Move, Position};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Cooperative stop flag shared between the controller and one search task
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call any number of times from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of the most recent search task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No search has been started yet
    Idle,
    Running,
    /// Finished after searching every root move
    Completed,
    /// Finished early because the signal was raised
    Cancelled,
    /// Ended with an error, or the worker died
    Failed,
}

/// Receives events from the worker thread
///
/// Both methods run on the search thread, so implementations must only do
/// cheap, thread-safe work (typically writing a protocol line).
pub trait SearchListener: Send + Sync {
    /// A root move has been searched to completion
    fn on_candidate(&self, _depth: u8, _report: &CandidateReport<Move>) {}

    /// The task has finished, successfully or not
    fn on_complete(&self, result: &EngineResult<SearchResult>);
}

/// Listener that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl SearchListener for NullListener {
    fn on_complete(&self, _result: &EngineResult<SearchResult>) {}
}

struct SearchTask {
    signal: CancellationSignal,
    handle: JoinHandle<()>,
    done: Receiver<EngineResult<SearchResult>>,
}

pub struct SearchController {
    config: EngineConfig,
    position: Position,
    task: Option<SearchTask>,
    state: Arc<Mutex<SearchState>>,
    listener: Arc<dyn SearchListener>,
}

impl SearchController {
    /// Create a controller set to the initial position
    pub fn new(config: EngineConfig, listener: Arc<dyn SearchListener>) -> Self {
        Self {
            config,
            position: Position::default(),
            task: None,
            state: Arc::new(Mutex::new(SearchState::Idle)),
            listener,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Position the next search will start from
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Replace the position with `fen` (initial position if `None`) plus `moves`
    ///
    /// A running search is stopped and awaited first. On error the previous
    /// position is kept.
    pub fn set_position<S: AsRef<str>>(&mut self, fen: Option<&str>, moves: &[S]) -> EngineResult<()> {
        self.ensure_idle()?;
        self.position = Position::from_moves(fen, moves)?;
        debug!("position set: {}", self.position);
        Ok(())
    }

    /// Go back to the initial position
    pub fn reset_position(&mut self) -> EngineResult<()> {
        self.set_position::<&str>(None, &[])
    }

    /// Start a search of `depth` plies on a worker thread
    ///
    /// Returns as soon as the worker is running. A task that is still running
    /// is stopped first; if it does not finish within the stop timeout the new
    /// search is refused with [`EngineError::SearchInProgress`].
    pub fn start(&mut self, depth: u8) -> EngineResult<()> {
        if depth == 0 {
            return Err(EngineError::InvalidDepth(depth));
        }
        self.ensure_idle()?;

        let signal = CancellationSignal::new();
        let (tx, rx) = mpsc::channel();
        let mut position = self.position.clone();
        let worker_signal = signal.clone();
        let listener = Arc::clone(&self.listener);
        let state = Arc::clone(&self.state);

        *self.state.lock() = SearchState::Running;
        info!("starting search at depth {} from {}", depth, position);

        let spawned = thread::Builder::new()
            .name("search".to_string())
            .spawn(move || {
                let result = run_search(&mut position, depth, &worker_signal, listener.as_ref());
                listener.on_complete(&result);
                *state.lock() = final_state(&result);
                // The controller may have given up on this task already
                let _ = tx.send(result);
            });

        match spawned {
            Ok(handle) => {
                self.task = Some(SearchTask { signal, handle, done: rx });
                Ok(())
            }
            Err(err) => {
                *self.state.lock() = SearchState::Failed;
                Err(EngineError::WorkerSpawn(err))
            }
        }
    }

    /// Ask the running search to stop. Does not block; no-op when idle.
    pub fn stop(&self) {
        if let Some(task) = &self.task {
            debug!("cancelling running search");
            task.signal.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SearchState::Running
    }

    pub fn state(&self) -> SearchState {
        let state = *self.state.lock();
        match &self.task {
            // Finished without recording an outcome: the worker panicked
            Some(task) if state == SearchState::Running && task.handle.is_finished() => SearchState::Failed,
            _ => state,
        }
    }

    /// Wait up to `timeout` for the current task and collect its result
    ///
    /// Returns `Ok(None)` if there is no task to wait for. On timeout the task
    /// is left running and [`EngineError::AwaitTimeout`] is returned.
    pub fn await_completion(&mut self, timeout: Duration) -> EngineResult<Option<SearchResult>> {
        let Some(task) = &self.task else {
            return Ok(None);
        };

        let result = match task.done.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return Err(EngineError::AwaitTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::WorkerPanicked),
        };

        if let Some(task) = self.task.take() {
            if task.handle.join().is_err() {
                warn!("search worker panicked");
            }
        }
        *self.state.lock() = final_state(&result);

        result.map(Some)
    }

    /// Stop the running search and wait for it, up to the quit timeout
    ///
    /// A worker that does not finish in time is detached.
    pub fn shutdown(&mut self) {
        if self.task.is_none() {
            return;
        }
        self.stop();
        match self.await_completion(self.config.quit_timeout) {
            Ok(_) => {}
            Err(EngineError::AwaitTimeout(timeout)) => {
                warn!("search did not stop within {:?}, detaching it", timeout);
                self.task = None;
            }
            Err(err) => warn!("search ended with error during shutdown: {}", err),
        }
    }

    fn ensure_idle(&mut self) -> EngineResult<()> {
        if self.task.is_none() {
            return Ok(());
        }
        self.stop();
        match self.await_completion(self.config.stop_timeout) {
            Ok(_) => Ok(()),
            Err(EngineError::AwaitTimeout(_)) => Err(EngineError::SearchInProgress),
            // The failure was already reported to the listener
            Err(err) => {
                warn!("previous search ended with error: {}", err);
                Ok(())
            }
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn final_state(result: &EngineResult<SearchResult>) -> SearchState {
    match result {
        Ok(result) if result.is_cancelled() => SearchState::Cancelled,
        Ok(_) => SearchState::Completed,
        Err(_) => SearchState::Failed,
    }
}

/// Body of the worker thread
fn run_search(
    position: &mut Position,
    depth: u8,
    signal: &CancellationSignal,
    listener: &dyn SearchListener,
) -> EngineResult<SearchResult> {
    let root = position.clone();

    let result = select_move(position, &PieceSquareEvaluator, depth, signal, |report| {
        listener.on_candidate(depth, report)
    })?;

    if *position != root {
        return Err(EngineError::PositionCorrupted {
            expected: root.to_fen(),
            found: position.to_fen(),
        });
    }

    match result.best_move {
        Some(mv) => info!(
            "search {:?}: best {} score {:?} ({} root moves, {} nodes, {:?})",
            result.status, mv, result.score, result.candidates_explored, result.stats.nodes, result.elapsed
        ),
        None => info!("search {:?}: no move after {} nodes", result.status, result.stats.nodes),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ai::search::SearchStatus;
    use std::sync::atomic::AtomicUsize;

    const LONG: Duration = Duration::from_secs(60);

    #[derive(Default)]
    struct CountingListener {
        candidates: AtomicUsize,
        completions: AtomicUsize,
    }

    impl SearchListener for CountingListener {
        fn on_candidate(&self, _depth: u8, _report: &CandidateReport<Move>) {
            self.candidates.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, _result: &EngineResult<SearchResult>) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller() -> (SearchController, Arc<CountingListener>) {
        let listener = Arc::new(CountingListener::default());
        let controller = SearchController::new(EngineConfig::default(), listener.clone());
        (controller, listener)
    }

    #[test]
    fn test_signal_is_shared_between_clones() {
        let signal = CancellationSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_cancelled());
        signal.cancel();
        signal.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_idle_before_first_search() {
        let (mut controller, _) = controller();
        assert_eq!(controller.state(), SearchState::Idle);
        assert!(controller.await_completion(Duration::ZERO).unwrap().is_none());
        controller.stop();
        assert_eq!(controller.state(), SearchState::Idle);
    }

    #[test]
    fn test_start_and_await_completes() {
        let (mut controller, listener) = controller();
        controller.start(2).unwrap();

        let result = controller.await_completion(LONG).unwrap().expect("a task was running");
        assert_eq!(result.status, SearchStatus::Completed);
        assert_eq!(result.candidates_explored, 20);
        assert!(result.best_move.is_some());
        assert_eq!(controller.state(), SearchState::Completed);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 1);
        assert_eq!(listener.candidates.load(Ordering::SeqCst), 20);

        // Reaped: nothing left to wait for
        assert!(controller.await_completion(Duration::ZERO).unwrap().is_none());
        assert_eq!(controller.position(), &Position::default());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let (mut controller, listener) = controller();
        assert!(matches!(controller.start(0), Err(EngineError::InvalidDepth(0))));
        assert_eq!(controller.state(), SearchState::Idle);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_search_uses_position_set() {
        let (mut controller, _) = controller();
        controller.set_position::<&str>(Some("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"), &[]).unwrap();
        controller.start(2).unwrap();

        let result = controller.await_completion(LONG).unwrap().unwrap();
        assert_eq!(result.best_move.map(|m| m.to_string()), Some("a1a8".to_string()));
    }

    #[test]
    fn test_illegal_move_keeps_previous_position() {
        let (mut controller, _) = controller();
        controller.set_position(None, &["e2e4"]).unwrap();
        let before = controller.position().clone();

        let err = controller.set_position(None, &["e2e4", "e2e4"]).unwrap_err();
        assert!(matches!(err, EngineError::IllegalMove { .. }));
        assert_eq!(controller.position(), &before);

        let err = controller.set_position::<&str>(Some("not a fen"), &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFen { .. }));
        assert_eq!(controller.position(), &before);
    }

    #[test]
    fn test_stop_cancels_long_search() {
        let (mut controller, listener) = controller();
        controller.start(6).unwrap();
        assert_eq!(controller.state(), SearchState::Running);

        controller.stop();
        controller.stop();

        let result = controller.await_completion(LONG).unwrap().unwrap();
        assert_eq!(result.status, SearchStatus::Cancelled);
        assert!(result.candidates_explored < 20);
        assert_eq!(controller.state(), SearchState::Cancelled);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_await_times_out_while_running() {
        let (mut controller, _) = controller();
        controller.start(6).unwrap();

        let err = controller.await_completion(Duration::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::AwaitTimeout(_)));
        assert_eq!(controller.state(), SearchState::Running);

        controller.stop();
        assert!(controller.await_completion(LONG).unwrap().is_some());
    }

    #[test]
    fn test_start_refused_while_previous_search_will_not_stop() {
        let listener = Arc::new(CountingListener::default());
        let config = EngineConfig::default().with_stop_timeout(Duration::ZERO);
        let mut controller = SearchController::new(config, listener);

        controller.start(6).unwrap();
        assert!(matches!(controller.start(1), Err(EngineError::SearchInProgress)));

        // The first task was cancelled by the refused start
        let result = controller.await_completion(LONG).unwrap().unwrap();
        assert_eq!(result.depth, 6);
        assert!(result.is_cancelled());
    }

    #[test]
    fn test_restart_replaces_previous_task() {
        let (mut controller, listener) = controller();
        controller.start(1).unwrap();
        controller.start(1).unwrap();

        let result = controller.await_completion(LONG).unwrap().unwrap();
        assert_eq!(result.depth, 1);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shutdown_stops_search() {
        let listener = Arc::new(CountingListener::default());
        let config = EngineConfig::default().with_quit_timeout(LONG);
        let mut controller = SearchController::new(config, listener.clone());

        controller.start(6).unwrap();
        controller.shutdown();

        assert_eq!(controller.state(), SearchState::Cancelled);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 1);
    }
}
