//! Fixed-interval recovery sweeper for Bingohall.
//!
//! A room arms a countdown when enough players join, but nothing in the
//! request path is guaranteed to be around when that countdown ends. The
//! sweeper closes the gap: every interval it asks the engine to start each
//! room whose scheduled start has passed.
//!
//! The sweep itself ([`HallEngine::start_due_rooms`]) try-locks rows, so a
//! tick never queues behind an API call working on the same room; a room
//! it skips is picked up on the next tick.
//!
//! # Integration
//!
//! ```ignore
//! let handle = RecoverySweeper::new(engine.clone(), SweepConfig::default()).spawn();
//! // ... serve requests ...
//! let metrics = handle.shutdown().await;
//! ```

use std::time::Duration;

use bingohall_room::{HallEngine, RecoveryReport};
use rand::Rng;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the sweeper wakes up later than scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Forget the missed ticks and schedule the next one a full interval
    /// from now.
    #[default]
    Skip,
    /// Keep the original cadence. A late sweeper runs its next tick at the
    /// originally scheduled time, which may already have passed.
    Drop,
}

/// Configuration for the recovery sweeper.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Late-wakeup handling.
    pub policy: SweepPolicy,
    /// Random delay (0..max) added to the first sweep so that several
    /// processes started together don't sweep in lockstep.
    pub initial_jitter: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            policy: SweepPolicy::default(),
            initial_jitter: Duration::from_millis(250),
        }
    }
}

impl SweepConfig {
    /// Shortest interval the sweeper will run at.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// A config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Raises an interval below [`Self::MIN_INTERVAL`] to the minimum.
    /// Called by [`RecoverySweeper::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "sweep interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info and metrics
// ---------------------------------------------------------------------------

/// One sweeper wakeup, returned by [`RecoverySweeper::wait_for_sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepTick {
    /// Sweep number, starting at 1.
    pub tick: u64,
    /// Whole intervals that passed unswept because the wakeup was late.
    pub missed: u64,
}

/// Running totals for a sweeper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepMetrics {
    /// Sweeps run.
    pub total_sweeps: u64,
    /// Rooms started by the sweeper.
    pub rooms_started: u64,
    /// Room rows skipped because another task held them.
    pub rows_skipped: u64,
    /// Room starts that failed and were left for a later sweep.
    pub failures: u64,
    /// Ticks lost to late wakeups.
    pub missed_ticks: u64,
    /// Longest single sweep.
    pub max_sweep_time: Duration,
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

/// Periodically starts rooms whose countdown has run out.
pub struct RecoverySweeper {
    engine: HallEngine,
    config: SweepConfig,
    next_sweep: Instant,
    tick_count: u64,
    metrics: SweepMetrics,
}

impl RecoverySweeper {
    /// Creates a sweeper. The first sweep is one interval (plus jitter)
    /// from now.
    pub fn new(engine: HallEngine, config: SweepConfig) -> Self {
        let config = config.validated();
        let max_jitter_us = config.initial_jitter.as_micros() as u64;
        let jitter = if max_jitter_us == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rand::rng().random_range(0..max_jitter_us))
        };
        debug!(
            interval_secs = config.interval.as_secs_f64(),
            policy = ?config.policy,
            "recovery sweeper created"
        );
        Self {
            next_sweep: Instant::now() + config.interval + jitter,
            engine,
            config,
            tick_count: 0,
            metrics: SweepMetrics::default(),
        }
    }

    /// Waits until the next sweep is due and schedules the one after it.
    pub async fn wait_for_sweep(&mut self) -> SweepTick {
        let due = self.next_sweep;
        time::sleep_until(due).await;

        let now = Instant::now();
        let interval = self.config.interval;
        let late_by = now.saturating_duration_since(due);
        let missed = (late_by.as_nanos() / interval.as_nanos()) as u64;
        self.tick_count += 1;

        self.next_sweep = match self.config.policy {
            SweepPolicy::Skip => now + interval,
            SweepPolicy::Drop => due + interval,
        };
        if missed > 0 {
            warn!(
                tick = self.tick_count,
                missed,
                late_ms = late_by.as_millis() as u64,
                "sweeper woke up late"
            );
            self.metrics.missed_ticks += missed;
        }
        trace!(tick = self.tick_count, "sweep due");

        SweepTick {
            tick: self.tick_count,
            missed,
        }
    }

    /// Runs one sweep now and folds the result into the metrics.
    pub async fn sweep_once(&mut self) -> RecoveryReport {
        let started_at = Instant::now();
        let report = self.engine.start_due_rooms().await;
        let elapsed = started_at.elapsed();

        self.metrics.total_sweeps += 1;
        self.metrics.rooms_started += report.started.len() as u64;
        self.metrics.rows_skipped += report.skipped as u64;
        self.metrics.failures += report.failed.len() as u64;
        if elapsed > self.metrics.max_sweep_time {
            self.metrics.max_sweep_time = elapsed;
        }

        if !report.failed.is_empty() {
            error!(failed = report.failed.len(), "sweep left rooms unstarted, retrying next tick");
        }
        if !report.started.is_empty() {
            info!(started = report.started.len(), "sweep started rooms");
        } else {
            debug!(skipped = report.skipped, "sweep found nothing to start");
        }
        if elapsed > self.config.interval {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = self.config.interval.as_millis() as u64,
                "sweep took longer than its interval"
            );
        }
        report
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// Number of sweeps scheduled so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Runs the sweeper on its own task until the handle is shut down or
    /// dropped.
    pub fn spawn(mut self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (metrics_tx, metrics_rx) = watch::channel(SweepMetrics::default());

        let task = tokio::spawn(async move {
            info!(interval_secs = self.config.interval.as_secs_f64(), "recovery sweeper running");
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = self.wait_for_sweep() => {
                        self.sweep_once().await;
                        metrics_tx.send_replace(self.metrics.clone());
                    }
                }
            }
            info!(sweeps = self.metrics.total_sweeps, "recovery sweeper stopped");
        });

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            metrics: metrics_rx,
            task,
        }
    }
}

/// Control handle for a spawned [`RecoverySweeper`]. Dropping it stops the
/// sweeper after its current sweep.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    metrics: watch::Receiver<SweepMetrics>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Metrics as of the last completed sweep.
    pub fn metrics(&self) -> SweepMetrics {
        self.metrics.borrow().clone()
    }

    /// Stops the sweeper, waits for it to finish its current sweep, and
    /// returns the final metrics.
    pub async fn shutdown(mut self) -> SweepMetrics {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "recovery sweeper task failed");
        }
        self.metrics.borrow().clone()
    }
}
