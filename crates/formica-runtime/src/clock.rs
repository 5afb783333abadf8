//! Fixed-rate tick driver.
//!
//! Runs a [`Simulation`] at a steady cadence on a tokio runtime. Ticks are
//! CPU-bound, so each one runs on the blocking pool while the timer keeps
//! counting. When a period elapses while the previous tick is still
//! running, that trigger is dropped: at most one tick runs at a time and
//! missed triggers are never queued up.
//!
//! # Feature Flag
//!
//! This module requires the `async` feature (on by default):
//! ```toml
//! formica-runtime = { version = "0.1", features = ["async"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use formica_runtime::clock::SimulationDriver;
//! use formica_runtime::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ConfigError> {
//!     let sim = SimulationBuilder::new().desired_agents(50).build()?;
//!     let driver = SimulationDriver::spawn(sim, Duration::from_millis(100));
//!     tokio::time::sleep(Duration::from_secs(2)).await;
//!     let stats = driver.stop().await;
//!     println!("ran {} ticks, skipped {}", stats.ticks_run, stats.ticks_skipped);
//!     Ok(())
//! }
//! ```

#![cfg(feature = "async")]

use crate::config::{clamp_period, period_from_hz};
use crate::simulation::Simulation;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// A steady interval. Late ticks are skipped rather than bunched up.
pub struct TickTimer {
    interval: tokio::time::Interval,
}

impl TickTimer {
    /// `period` is clamped into `MIN_TICK_PERIOD..=MAX_TICK_PERIOD`.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(clamp_period(Some(period)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Create a timer from a rate in ticks per second.
    pub fn from_hz(hz: f64) -> Self {
        Self::new(clamp_period(period_from_hz(hz)))
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next tick. The first call completes immediately.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Counters reported when a driver stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub ticks_run: u64,
    /// Triggers dropped because a tick was still in progress.
    pub ticks_skipped: u64,
    /// Ticks that panicked before completing.
    pub ticks_failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    run: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Clears the in-flight flag when a tick ends, including by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives a shared simulation from a [`TickTimer`].
pub struct SimulationDriver {
    simulation: Arc<Mutex<Simulation>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl SimulationDriver {
    /// Start ticking `simulation` every `period`.
    pub fn spawn(simulation: Simulation, period: Duration) -> Self {
        Self::spawn_shared(Arc::new(Mutex::new(simulation)), period)
    }

    /// Start ticking a simulation that other tasks also hold.
    ///
    /// Readers should lock briefly; a held lock delays the running tick and
    /// so causes later triggers to be skipped.
    pub fn spawn_shared(simulation: Arc<Mutex<Simulation>>, period: Duration) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let counters = Arc::new(Counters::default());
        let busy = Arc::new(AtomicBool::new(false));
        let mut timer = TickTimer::new(period);

        info!(period_ms = timer.period().as_millis() as u64, "simulation driver started");

        let task = {
            let simulation = Arc::clone(&simulation);
            let counters = Arc::clone(&counters);
            tokio::spawn(async move {
                let mut in_flight: Option<JoinHandle<()>> = None;
                loop {
                    tokio::select! {
                        _ = &mut stop => break,
                        _ = timer.tick() => {}
                    }

                    if busy.swap(true, Ordering::AcqRel) {
                        counters.skipped.fetch_add(1, Ordering::Relaxed);
                        debug!("previous tick still running, skipping");
                        continue;
                    }
                    if let Some(previous) = in_flight.take() {
                        settle(previous, &counters).await;
                    }

                    let simulation = Arc::clone(&simulation);
                    let guard = BusyGuard(Arc::clone(&busy));
                    let counters = Arc::clone(&counters);
                    in_flight = Some(tokio::task::spawn_blocking(move || {
                        let _guard = guard;
                        simulation.blocking_lock().tick();
                        counters.run.fetch_add(1, Ordering::Relaxed);
                    }));
                }

                if let Some(handle) = in_flight {
                    settle(handle, &counters).await;
                }
            })
        };

        Self {
            simulation,
            shutdown: Some(shutdown),
            task,
            counters,
        }
    }

    /// Shared handle to the simulation being driven.
    pub fn simulation(&self) -> Arc<Mutex<Simulation>> {
        Arc::clone(&self.simulation)
    }

    /// Counters so far.
    pub fn stats(&self) -> DriverStats {
        DriverStats {
            ticks_run: self.counters.run.load(Ordering::Relaxed),
            ticks_skipped: self.counters.skipped.load(Ordering::Relaxed),
            ticks_failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop issuing ticks and wait for a running tick to finish.
    pub async fn stop(mut self) -> DriverStats {
        if let Some(shutdown) = self.shutdown.take() {
            // the loop may already be gone if the runtime is shutting down
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "driver task ended abnormally");
        }
        let stats = self.stats();
        info!(
            ticks = stats.ticks_run,
            skipped = stats.ticks_skipped,
            failed = stats.ticks_failed,
            "simulation driver stopped"
        );
        stats
    }
}

/// Wait for a finished tick task and record it if it panicked.
async fn settle(handle: JoinHandle<()>, counters: &Counters) {
    if let Err(e) = handle.await {
        counters.failed.fetch_add(1, Ordering::Relaxed);
        error!(error = %e, "simulation tick failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SimulationBuilder;

    #[tokio::test]
    async fn timer_waits_between_ticks() {
        let mut timer = TickTimer::new(Duration::from_millis(10));
        let start = tokio::time::Instant::now();
        for _ in 0..5 {
            timer.tick().await;
        }
        // first tick is immediate
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(timer.period(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn timer_periods_are_clamped() {
        use crate::config::{MAX_TICK_PERIOD, MIN_TICK_PERIOD};

        assert_eq!(TickTimer::new(Duration::ZERO).period(), MIN_TICK_PERIOD);
        assert_eq!(TickTimer::from_hz(1e10).period(), MIN_TICK_PERIOD);
        assert_eq!(TickTimer::from_hz(1e-30).period(), MAX_TICK_PERIOD);
        assert_eq!(TickTimer::from_hz(10.0).period(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn driver_runs_and_stops() {
        let sim = SimulationBuilder::new()
            .desired_agents(5)
            .seed(3)
            .build()
            .unwrap();
        let driver = SimulationDriver::spawn(sim, Duration::from_millis(5));
        let shared = driver.simulation();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let stats = driver.stop().await;

        assert!(stats.ticks_run >= 2, "{stats:?}");
        let sim = shared.lock().await;
        assert_eq!(sim.current_tick(), stats.ticks_run);
        assert_eq!(sim.agents().len(), 5);
    }
}
