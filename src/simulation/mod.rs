//! Replay clock
//!
//! Reveals one more row of the loaded history every interval. The phase is
//! an atomic token so status reads never block, and every run owns a
//! cancellation token derived from the process shutdown token: stopping a
//! run or shutting down interrupts the sleep immediately.

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::HistoryStore;

/// Lifecycle of the replay clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SimulationPhase {
    Idle = 0,
    Running = 1,
    /// Cursor reached the end of the dataset
    Completed = 2,
}

impl SimulationPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SimulationPhase::Running,
            2 => SimulationPhase::Completed,
            _ => SimulationPhase::Idle,
        }
    }
}

impl std::fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationPhase::Idle => write!(f, "idle"),
            SimulationPhase::Running => write!(f, "running"),
            SimulationPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Snapshot returned by `/api/simulation/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStatus {
    pub active: bool,
    pub current_index: usize,
    pub total_rows: usize,
    /// Percent of the dataset revealed
    pub progress: f64,
}

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the replay task and the only write path into the [`HistoryStore`].
pub struct SimulationController {
    history: Arc<HistoryStore>,
    interval: Duration,
    phase: Arc<AtomicU8>,
    shutdown: CancellationToken,
    run: Mutex<Option<RunHandle>>,
}

impl std::fmt::Debug for SimulationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationController")
            .field("interval", &self.interval)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl SimulationController {
    pub fn new(history: Arc<HistoryStore>, interval: Duration, shutdown: CancellationToken) -> Self {
        let initial = if history.snapshot().is_exhausted() && history.total_rows() > 0 {
            SimulationPhase::Completed
        } else {
            SimulationPhase::Idle
        };
        Self {
            history,
            interval,
            phase: Arc::new(AtomicU8::new(initial as u8)),
            shutdown,
            run: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        SimulationPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.phase() == SimulationPhase::Running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn status(&self) -> SimulationStatus {
        let window = self.history.snapshot();
        SimulationStatus {
            active: self.is_active(),
            current_index: window.current_index(),
            total_rows: window.total_rows(),
            progress: window.progress(),
        }
    }

    /// Start replaying. No-op when already running or completed.
    ///
    /// The phase and the run handle change together under the `run` lock,
    /// so a concurrent `stop` sees either both or neither.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> SimulationPhase {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);

        if self.history.snapshot().is_exhausted() {
            self.phase.store(SimulationPhase::Completed as u8, Ordering::Release);
            debug!("[Simulation] Start ignored, history exhausted");
            return SimulationPhase::Completed;
        }

        if let Err(current) = self.phase.compare_exchange(
            SimulationPhase::Idle as u8,
            SimulationPhase::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return SimulationPhase::from_u8(current);
        }

        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(replay(
            Arc::clone(&self.history),
            Arc::clone(&self.phase),
            self.interval,
            cancel.clone(),
        ));

        if let Some(previous) = run.replace(RunHandle { cancel, task }) {
            previous.cancel.cancel();
        }

        info!(interval = ?self.interval, "[Simulation] Started");
        SimulationPhase::Running
    }

    /// Stop replaying. The cursor stays where it is and a later start
    /// resumes from it.
    pub fn stop(&self) -> SimulationPhase {
        let run = self.run.lock().unwrap_or_else(PoisonError::into_inner);

        let _ = self.phase.compare_exchange(
            SimulationPhase::Running as u8,
            SimulationPhase::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        if let Some(handle) = run.as_ref() {
            if !handle.cancel.is_cancelled() {
                handle.cancel.cancel();
                info!(
                    current_index = self.history.snapshot().current_index(),
                    "[Simulation] Stopped"
                );
            }
        }
        self.phase()
    }

    /// Wait for the current replay task, if any, to exit.
    pub async fn join(&self) {
        let handle = self.run.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.task.await {
                warn!(error = %e, "[Simulation] Replay task ended abnormally");
            }
        }
    }

    /// Supervisor task body: optionally start, then hold until shutdown and
    /// wind down the replay.
    pub async fn run_until_shutdown(&self, autostart: bool) {
        if autostart {
            self.start();
        }
        self.shutdown.cancelled().await;
        self.stop();
        self.join().await;
        info!("[Simulation] Shutdown complete");
    }
}

async fn replay(
    history: Arc<HistoryStore>,
    phase: Arc<AtomicU8>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("[Simulation] Replay task cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let window = history.advance();
        debug!(current_index = window.current_index(), "[Simulation] Advanced");

        if window.is_exhausted() {
            let _ = phase.compare_exchange(
                SimulationPhase::Running as u8,
                SimulationPhase::Completed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            info!(total_rows = window.total_rows(), "[Simulation] Reached end of history");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticGenerator;
    use chrono::Utc;
    use std::time::Instant;

    fn controller(rows: usize, start: usize, interval: Duration) -> SimulationController {
        let rows = SyntheticGenerator::new(5).generate(rows, Utc::now().naive_utc());
        SimulationController::new(
            Arc::new(HistoryStore::new(rows, start)),
            interval,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_runs_to_completion() {
        let sim = controller(8, 5, Duration::from_millis(5));
        assert_eq!(sim.start(), SimulationPhase::Running);
        tokio::time::timeout(Duration::from_secs(5), sim.join())
            .await
            .expect("replay should finish");

        let status = sim.status();
        assert_eq!(sim.phase(), SimulationPhase::Completed);
        assert!(!status.active);
        assert_eq!(status.current_index, 8);
        assert_eq!(status.progress, 100.0);

        // completed runs cannot restart
        assert_eq!(sim.start(), SimulationPhase::Completed);
        assert!(!sim.is_active());
    }

    #[tokio::test]
    async fn test_stop_interrupts_sleep() {
        let interval = Duration::from_secs(30);
        let sim = controller(100, 10, interval);
        sim.start();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stopped_at = Instant::now();
        assert_eq!(sim.stop(), SimulationPhase::Idle);
        tokio::time::timeout(Duration::from_secs(2), sim.join())
            .await
            .expect("replay should exit promptly");
        assert!(stopped_at.elapsed() < interval);
        assert_eq!(sim.status().current_index, 10);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_resumable() {
        let sim = controller(100, 10, Duration::from_millis(10));
        assert_eq!(sim.start(), SimulationPhase::Running);
        assert_eq!(sim.start(), SimulationPhase::Running);
        tokio::time::sleep(Duration::from_millis(60)).await;
        sim.stop();
        sim.join().await;

        let paused_at = sim.status().current_index;
        assert!(paused_at > 10);
        assert!(paused_at <= 100);

        sim.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        sim.stop();
        sim.join().await;
        assert!(sim.status().current_index > paused_at);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_run() {
        let shutdown = CancellationToken::new();
        let rows = SyntheticGenerator::new(5).generate(50, Utc::now().naive_utc());
        let sim = Arc::new(SimulationController::new(
            Arc::new(HistoryStore::new(rows, 0)),
            Duration::from_secs(60),
            shutdown.clone(),
        ));

        let task = tokio::spawn({
            let sim = Arc::clone(&sim);
            async move { sim.run_until_shutdown(true).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sim.is_active());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("controller should shut down")
            .unwrap();
        assert!(!sim.is_active());
    }

    /// Phase and run handle read together under the `run` lock.
    fn phase_matches_run(sim: &SimulationController) -> bool {
        let run = sim.run.lock().unwrap();
        let live = run.as_ref().is_some_and(|h| !h.cancel.is_cancelled());
        sim.is_active() == live
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_stop_keeps_phase_and_run_in_step() {
        let sim = Arc::new(controller(1_000, 10, Duration::from_secs(30)));

        let starter = tokio::spawn({
            let sim = Arc::clone(&sim);
            async move {
                for _ in 0..500 {
                    sim.start();
                    tokio::task::yield_now().await;
                }
            }
        });
        let stopper = tokio::spawn({
            let sim = Arc::clone(&sim);
            async move {
                for _ in 0..500 {
                    sim.stop();
                    tokio::task::yield_now().await;
                }
            }
        });

        while !(starter.is_finished() && stopper.is_finished()) {
            assert!(phase_matches_run(&sim));
            tokio::task::yield_now().await;
        }
        starter.await.unwrap();
        stopper.await.unwrap();
        assert!(phase_matches_run(&sim));

        sim.stop();
        sim.join().await;
        assert!(!sim.is_active());
        assert_eq!(sim.status().current_index, 10);
    }

    #[tokio::test]
    async fn test_join_survives_panicked_replay() {
        let sim = controller(10, 2, Duration::from_secs(1));
        *sim.run.lock().unwrap() = Some(RunHandle {
            cancel: CancellationToken::new(),
            task: tokio::spawn(async { panic!("replay failed") }),
        });

        tokio::time::timeout(Duration::from_secs(2), sim.join())
            .await
            .expect("join should return");
        assert!(sim.run.lock().unwrap().is_none());
    }

    #[test]
    fn test_status_on_empty_history() {
        let sim = SimulationController::new(
            Arc::new(HistoryStore::empty()),
            Duration::from_secs(1),
            CancellationToken::new(),
        );
        let status = sim.status();
        assert_eq!(status.total_rows, 0);
        assert_eq!(status.progress, 0.0);
        assert!(!status.active);
    }
}
