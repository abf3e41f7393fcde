use crate::algorithms::AlgorithmStep;
use crate::clock::DEFAULT_MAX_DELTA;
use crate::physics::{ReadoutValue, SystemKind};
use crate::simulation::SimulationState;
use crate::solvers::DEFAULT_MAX_STEP;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Position within a session: simulated seconds or a step index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cursor {
    Time(f64),
    Index(usize),
}

/// Identifies one `start()`. Ticks carrying an older token are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken {
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Delay between discrete steps at speed 1.
    pub step_interval_ms: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Longest frame delta (seconds) fed to one continuous tick.
    pub max_frame_delta: f64,
    /// Longest frame delta (seconds) counted towards discrete steps. Frames
    /// up to one step interval always count in full.
    pub stall_delta: f64,
    /// Largest simulated-time step handed to the integrator.
    pub max_step: f64,
    pub max_substeps: usize,
    pub history_capacity: usize,
    /// Simulated seconds after which a continuous session completes.
    pub duration: Option<f64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            step_interval_ms: 600.0,
            min_speed: 0.25,
            max_speed: 8.0,
            max_frame_delta: DEFAULT_MAX_DELTA,
            stall_delta: 0.25,
            max_step: DEFAULT_MAX_STEP,
            max_substeps: 2048,
            history_capacity: 600,
            duration: None,
        }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.step_interval_ms.is_finite() && self.step_interval_ms > 0.0) {
            bail!("step_interval_ms must be positive.");
        }
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            bail!("min_speed must be positive.");
        }
        if !(self.max_speed.is_finite() && self.max_speed >= self.min_speed) {
            bail!("max_speed must be at least min_speed.");
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            bail!("max_frame_delta must be positive.");
        }
        if !(self.stall_delta.is_finite() && self.stall_delta > 0.0) {
            bail!("stall_delta must be positive.");
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            bail!("max_step must be positive.");
        }
        if self.max_substeps == 0 {
            bail!("max_substeps must be at least 1.");
        }
        if let Some(duration) = self.duration {
            if !(duration.is_finite() && duration > 0.0) {
                bail!("duration must be positive when set.");
            }
        }
        Ok(())
    }

    /// Seconds between discrete steps at `speed`.
    pub fn step_interval(&self, speed: f64) -> f64 {
        self.step_interval_ms / 1000.0 / speed
    }

    /// Portion of a raw frame delta that counts towards discrete steps.
    pub fn discrete_delta(&self, raw: f64, interval: f64) -> f64 {
        raw.min(interval.max(self.stall_delta))
    }
}

/// Read-only view handed to the renderer once per tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Continuous {
        run_state: RunState,
        speed: f64,
        system: SystemKind,
        state: SimulationState,
        readout: Vec<ReadoutValue>,
    },
    Discrete {
        run_state: RunState,
        speed: f64,
        /// Most recently applied step; `None` before the first advance.
        step: Option<AlgorithmStep>,
        index: usize,
        total: usize,
    },
}

impl Snapshot {
    pub fn run_state(&self) -> RunState {
        match self {
            Snapshot::Continuous { run_state, .. } | Snapshot::Discrete { run_state, .. } => {
                *run_state
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The token belongs to a stopped or superseded session.
    Stale,
    /// Nothing to do this tick (paused, idle, completed, or waiting for the
    /// next step interval).
    Deferred,
    Advanced { steps: usize },
    Completed,
}
