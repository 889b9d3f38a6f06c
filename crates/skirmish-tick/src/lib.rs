//! Fixed-timestep tick scheduler for Skirmish.
//!
//! Every running match owns one [`TickScheduler`]. The room actor awaits
//! [`TickScheduler::wait_for_tick`] next to its command channel and calls
//! `update(dt)` on the match each time a tick fires:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* participant events */ }
//!         info = scheduler.wait_for_tick() => {
//!             room.update(info.dt)?;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! `dt` is always the configured period, never wall-clock elapsed time, so
//! the simulation advances identically regardless of scheduling noise.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// What to do when the host falls behind the tick schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Drop the missed ticks and continue on the original cadence.
    #[default]
    Skip,
    /// Fire the missed ticks back to back until caught up.
    CatchUp,
    /// Fire once, then restart the cadence from now.
    Delay,
}

impl TickPolicy {
    fn missed_tick_behavior(self) -> MissedTickBehavior {
        match self {
            Self::Skip => MissedTickBehavior::Skip,
            Self::CatchUp => MissedTickBehavior::Burst,
            Self::Delay => MissedTickBehavior::Delay,
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. Clamped to `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick period (0.0–1.0) that a single tick's work may
    /// take before a warning is logged.
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) before the first tick, so matches created in
    /// the same instant do not tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 1,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.8,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Returns a copy with every field forced into its legal range.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                requested = self.tick_rate_hz,
                using = clamped,
                "tick rate out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

/// One fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1 and increases by one per fired tick.
    pub tick: u64,
    /// The fixed simulation step for this tick.
    pub dt: Duration,
    /// `true` if the tick fired more than 10% of a period late.
    pub late: bool,
}

/// Drives one match at a fixed rate.
pub struct TickScheduler {
    config: TickConfig,
    period: Duration,
    interval: Interval,
    tick_count: u64,
    late_ticks: u64,
    work_started: Option<Instant>,
}

impl TickScheduler {
    /// Creates a scheduler whose first tick fires one period (plus jitter)
    /// from now. Must be called inside a Tokio runtime.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        let mut interval = time::interval_at(time::Instant::now() + period + jitter, period);
        interval.set_missed_tick_behavior(config.policy.missed_tick_behavior());

        debug!(
            rate_hz = config.tick_rate_hz,
            period_ms = period.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            config,
            period,
            interval,
            tick_count: 0,
            late_ticks: 0,
            work_started: None,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next tick. Cancel-safe, so it can sit in `select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let scheduled = self.interval.tick().await;
        let late_by = time::Instant::now().saturating_duration_since(scheduled);
        let late = late_by > self.period / 10;

        self.tick_count += 1;
        self.work_started = Some(Instant::now());
        if late {
            self.late_ticks += 1;
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                policy = ?self.config.policy,
                "tick fired late"
            );
        }
        trace!(tick = self.tick_count, "tick");

        TickInfo {
            tick: self.tick_count,
            dt: self.period,
            late,
        }
    }

    /// Marks the end of the work for the current tick and returns how long
    /// it took. Logs a warning when the work ate most of the period.
    pub fn record_tick_end(&mut self) -> Option<Duration> {
        let elapsed = self.work_started.take()?.elapsed();
        let utilization = elapsed.as_secs_f64() / self.period.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.period.as_secs_f64() * 1000.0,
                "tick work approaching budget"
            );
        }
        Some(elapsed)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn late_ticks(&self) -> u64 {
        self.late_ticks
    }

    pub fn tick_duration(&self) -> Duration {
        self.period
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }
}
