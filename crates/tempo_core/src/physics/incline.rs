//! Block on an inclined plane with static and kinetic friction.
//!
//! The block holds still while `sin θ <= μs cos θ`. Once static friction is
//! overcome it switches to the kinetic phase and stays there for the rest of
//! the session, even if the angle is later lowered below the threshold.

use super::params::{require_finite, ParamRange};
use super::ReadoutValue;
use crate::error::SimResult;
use crate::simulation::SimulationState;
use crate::traits::{DynamicalSystem, StateLayout};
use serde::{Deserialize, Serialize};

pub const STANDARD_GRAVITY: f64 = 9.81;

/// Index of the phase latch in the state vector.
pub const PHASE_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclineParams {
    pub angle_deg: f64,
    pub static_friction: f64,
    pub kinetic_friction: f64,
    pub ramp_length: f64,
    pub mass: f64,
}

impl Default for InclineParams {
    fn default() -> Self {
        Self {
            angle_deg: 30.0,
            static_friction: 0.5,
            kinetic_friction: 0.3,
            ramp_length: 5.0,
            mass: 1.0,
        }
    }
}

impl InclineParams {
    pub const ANGLE_DEG: ParamRange = ParamRange::new(0.0, 60.0);
    pub const FRICTION: ParamRange = ParamRange::new(0.0, 1.0);
    pub const RAMP_LENGTH: ParamRange = ParamRange::new(0.5, 20.0);
    pub const MASS: ParamRange = ParamRange::new(0.1, 100.0);

    pub fn build(&self) -> SimResult<Incline> {
        let static_friction = Self::FRICTION.clamp("static_friction", self.static_friction)?;
        let kinetic_friction = ParamRange::new(0.0, static_friction)
            .clamp("kinetic_friction", self.kinetic_friction)?;
        Incline::new(
            Self::ANGLE_DEG.clamp("angle_deg", self.angle_deg)?,
            static_friction,
            kinetic_friction,
            Self::RAMP_LENGTH.clamp("ramp_length", self.ramp_length)?,
            Self::MASS.clamp("mass", self.mass)?,
        )
    }

    pub fn initial_state(&self) -> SimulationState {
        SimulationState::new(vec![0.0, 0.0, 0.0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InclinePhase {
    Static,
    Sliding,
}

impl InclinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            InclinePhase::Static => "static",
            InclinePhase::Sliding => "sliding",
        }
    }
}

/// State: `[s, v, phase]` where `s` is the distance travelled down the ramp
/// and `phase` is 0 while static and 1 once sliding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incline {
    angle: f64,
    static_friction: f64,
    kinetic_friction: f64,
    ramp_length: f64,
    mass: f64,
    gravity: f64,
}

impl Incline {
    pub fn new(
        angle_deg: f64,
        static_friction: f64,
        kinetic_friction: f64,
        ramp_length: f64,
        mass: f64,
    ) -> SimResult<Self> {
        Ok(Self {
            angle: require_finite("angle_deg", angle_deg)?.to_radians(),
            static_friction: require_finite("static_friction", static_friction)?,
            kinetic_friction: require_finite("kinetic_friction", kinetic_friction)?,
            ramp_length: require_finite("ramp_length", ramp_length)?,
            mass: require_finite("mass", mass)?,
            gravity: STANDARD_GRAVITY,
        })
    }

    /// m g sin θ > μs m g cos θ
    pub fn overcomes_static_friction(&self) -> bool {
        self.angle.sin() > self.static_friction * self.angle.cos()
    }

    /// a = g (sin θ - μk cos θ)
    pub fn kinetic_acceleration(&self) -> f64 {
        self.gravity * (self.angle.sin() - self.kinetic_friction * self.angle.cos())
    }

    pub fn phase(x: &[f64]) -> InclinePhase {
        if x[PHASE_INDEX] >= 0.5 {
            InclinePhase::Sliding
        } else {
            InclinePhase::Static
        }
    }

    pub fn readout(&self, state: &SimulationState) -> Vec<ReadoutValue> {
        let x = &state.values;
        let normal = self.mass * self.gravity * self.angle.cos();
        let (acceleration, friction) = match Self::phase(x) {
            InclinePhase::Static => (0.0, self.mass * self.gravity * self.angle.sin()),
            InclinePhase::Sliding => (self.kinetic_acceleration(), self.kinetic_friction * normal),
        };
        vec![
            ReadoutValue::text("phase", Self::phase(x).as_str()),
            ReadoutValue::new("position", x[0], "m"),
            ReadoutValue::new("velocity", x[1], "m/s"),
            ReadoutValue::new("acceleration", acceleration, "m/s²"),
            ReadoutValue::new("normal_force", normal, "N"),
            ReadoutValue::new("friction_force", friction, "N"),
        ]
    }
}

impl DynamicalSystem<f64> for Incline {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        match Self::phase(x) {
            InclinePhase::Static => {
                out[0] = 0.0;
                out[1] = 0.0;
            }
            InclinePhase::Sliding => {
                out[0] = x[1];
                out[1] = self.kinetic_acceleration();
            }
        }
        out[PHASE_INDEX] = 0.0;
    }

    fn layout(&self) -> StateLayout {
        StateLayout::SecondOrder { dof: 1 }
    }

    fn constrain(&self, _t: f64, x: &mut [f64]) {
        match Self::phase(x) {
            InclinePhase::Static => {
                x[1] = 0.0;
                if self.overcomes_static_friction() {
                    x[PHASE_INDEX] = 1.0;
                }
            }
            InclinePhase::Sliding => {
                // The block never moves back up the ramp.
                x[1] = x[1].max(0.0);
            }
        }
        x[0] = x[0].clamp(0.0, self.ramp_length);
    }

    fn is_terminal(&self, _t: f64, x: &[f64]) -> bool {
        x[0] >= self.ramp_length
    }
}
