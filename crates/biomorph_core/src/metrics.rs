//! Run metrics and logging setup.
//!
//! Counters are atomics so a shared `Metrics` can be read from a reporting
//! thread while the planet steps.

use biomorph_data::{EventKind, LifecycleEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub struct Metrics {
    steps: AtomicU64,
    births: AtomicU64,
    deaths: AtomicU64,
    migrations: AtomicU64,
    population: AtomicU64,
    report_every: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Metrics {
    /// Creates a collector that logs a summary every `report_every` steps.
    #[must_use]
    pub fn new(report_every: u64) -> Self {
        Self {
            steps: AtomicU64::new(0),
            births: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            migrations: AtomicU64::new(0),
            population: AtomicU64::new(0),
            report_every: report_every.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records one global step and the events it produced.
    pub fn record_step(&self, events: &[LifecycleEvent], population: usize, duration: Duration) {
        for event in events {
            let counter = match event.kind() {
                EventKind::Birth => &self.births,
                EventKind::Death => &self.deaths,
                EventKind::Migration => &self.migrations,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.population.store(population as u64, Ordering::Relaxed);
        let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;

        if step % self.report_every == 0 {
            tracing::info!(
                step,
                population,
                births = self.births(),
                deaths = self.deaths(),
                migrations = self.migrations(),
                duration_us = duration.as_micros() as u64,
                "Planet step"
            );
        }
    }

    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn births(&self) -> u64 {
        self.births.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn deaths(&self) -> u64 {
        self.deaths.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn migrations(&self) -> u64 {
        self.migrations.load(Ordering::Relaxed)
    }

    /// Planet-wide population after the last recorded step.
    #[must_use]
    pub fn population(&self) -> u64 {
        self.population.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Steps per second since creation.
    #[must_use]
    pub fn steps_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.steps() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Installs a global `tracing` subscriber. `RUST_LOG` overrides the
/// `info` default. A second call is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
