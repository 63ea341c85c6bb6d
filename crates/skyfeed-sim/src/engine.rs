//! ---
//! sky_section: "02-telemetry-simulation"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Batch, delay, and cycle-reset logic for the telemetry feed."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use skyfeed_common::config::SimulationConfig;
use tracing::debug;

use crate::altitude::AltitudeProfile;
use crate::points::TelemetryPoint;
use crate::trajectory::{DataLoadError, Trajectory};

/// Tunable behaviour of the telemetry engine. Defaults reproduce the
/// production feed; tests narrow the ranges to force determinism.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound of the per-call batch size draw (uniform `1..=max_batch`).
    pub max_batch: usize,
    /// Chance for a generated point to be withheld for later delivery.
    pub delay_probability: f64,
    /// Chance for a call to drain part of the backlog first.
    pub release_probability: f64,
    /// Upper bound of backlog points released per call.
    pub max_release: usize,
    /// Synthetic clock step range in seconds, `[min_step_secs, max_step_secs)`.
    pub min_step_secs: f64,
    pub max_step_secs: f64,
    /// Half-width of the uniform altitude noise band, in metres.
    pub noise_amplitude: f64,
    pub altitude: AltitudeProfile,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_batch: 3,
            delay_probability: 0.3,
            release_probability: 0.4,
            max_release: 2,
            min_step_secs: 2.0,
            max_step_secs: 5.0,
            noise_amplitude: 50.0,
            altitude: AltitudeProfile::default(),
        }
    }
}

impl From<&SimulationConfig> for EngineSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            max_batch: config.max_batch,
            delay_probability: config.delay_probability,
            release_probability: config.release_probability,
            max_release: config.max_release,
            min_step_secs: config.min_step_secs,
            max_step_secs: config.max_step_secs,
            noise_amplitude: config.noise_amplitude,
            altitude: AltitudeProfile {
                min_altitude: config.min_altitude,
                max_altitude: config.max_altitude,
            },
        }
    }
}

/// Cycle progress. The transition back to `Streaming` is evaluated at the
/// start of every batch request, so the call after exhaustion observes a
/// freshly reset engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Streaming,
    Exhausted,
}

/// Replays a fixed trajectory as a jittered telemetry stream.
///
/// The engine owns all mutable state (cursor, backlog, synthetic clock) and
/// is deliberately not thread-safe; callers must serialize access, which the
/// API layer does with a mutex around the instance.
#[derive(Debug)]
pub struct TelemetryEngine {
    trajectory: Trajectory,
    settings: EngineSettings,
    rng: StdRng,
    cursor: usize,
    backlog: VecDeque<TelemetryPoint>,
    clock: DateTime<Utc>,
    state: CycleState,
    cycles_completed: u64,
}

impl TelemetryEngine {
    /// Build an engine over an already loaded trajectory.
    pub fn new(trajectory: Trajectory, settings: EngineSettings, seed: u64) -> Self {
        Self {
            trajectory,
            settings,
            rng: StdRng::seed_from_u64(seed),
            cursor: 0,
            backlog: VecDeque::new(),
            clock: Utc::now(),
            state: CycleState::Streaming,
            cycles_completed: 0,
        }
    }

    /// Load the dataset and build the engine. Any dataset problem is fatal
    /// here; `next_batch` has no error path once construction succeeds.
    pub fn from_path(
        path: &Path,
        settings: EngineSettings,
        seed: u64,
    ) -> Result<Self, DataLoadError> {
        let trajectory = Trajectory::from_path(path)?;
        Ok(Self::new(trajectory, settings, seed))
    }

    /// Produce the next batch of telemetry points.
    ///
    /// Each call may release previously withheld points, generate up to
    /// `max_batch` new ones, withhold some of those, and returns the batch
    /// sorted by timestamp. An empty batch is possible when the whole
    /// budget went into the backlog.
    pub fn next_batch(&mut self) -> Vec<TelemetryPoint> {
        if self.state == CycleState::Exhausted {
            self.reset_cycle();
        }

        let mut budget = self.rng.gen_range(1..=self.settings.max_batch) as i64;
        let mut batch = Vec::new();

        if !self.backlog.is_empty()
            && self.rng.gen::<f64>() < self.settings.release_probability
        {
            let cap = self.settings.max_release.min(self.backlog.len());
            let release = self.rng.gen_range(1..=cap);
            for _ in 0..release {
                if let Some(point) = self.backlog.pop_front() {
                    batch.push(point);
                    budget -= 1;
                }
            }
        }

        while budget > 0 && self.cursor < self.trajectory.len() {
            let Some(coordinate) = self.trajectory.get(self.cursor) else {
                break;
            };

            let step = self
                .rng
                .gen_range(self.settings.min_step_secs..self.settings.max_step_secs);
            self.clock += Duration::milliseconds((step * 1000.0).round() as i64);

            let noise = self
                .rng
                .gen_range(-self.settings.noise_amplitude..=self.settings.noise_amplitude);
            let altitude = self
                .settings
                .altitude
                .altitude_at(self.cursor, self.trajectory.len())
                + noise;
            let point = TelemetryPoint::new(coordinate, altitude, self.clock);

            // The final coordinate is never withheld, so a cycle always ends
            // with an observable point.
            let at_last_index = self.cursor + 1 == self.trajectory.len();
            if !at_last_index && self.rng.gen::<f64>() < self.settings.delay_probability {
                self.backlog.push_back(point);
            } else {
                batch.push(point);
            }

            self.cursor += 1;
            budget -= 1;
        }

        if self.cursor >= self.trajectory.len() {
            self.state = CycleState::Exhausted;
        }

        batch.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        batch
    }

    fn reset_cycle(&mut self) {
        self.cycles_completed += 1;
        debug!(
            cycles = self.cycles_completed,
            dropped_backlog = self.backlog.len(),
            "trajectory exhausted; starting a fresh cycle"
        );
        self.cursor = 0;
        self.backlog.clear();
        self.clock = Utc::now();
        self.state = CycleState::Streaming;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }
}
