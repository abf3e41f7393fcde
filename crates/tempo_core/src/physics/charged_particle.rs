//! Charged particle in a uniform magnetic field normal to the plane.

use super::params::{require_denominator, require_finite, ParamRange, DENOMINATOR_EPSILON};
use super::ReadoutValue;
use crate::error::SimResult;
use crate::simulation::SimulationState;
use crate::traits::{DynamicalSystem, StateLayout};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Largest rotation of the velocity per integrator step, in radians.
const MAX_TURN_PER_STEP: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleParams {
    pub charge: f64,
    pub mass: f64,
    pub field: f64,
    pub speed: f64,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            charge: 1.0,
            mass: 1.0,
            field: 1.0,
            speed: 2.0,
        }
    }
}

impl ParticleParams {
    pub const CHARGE: ParamRange = ParamRange::new(-5.0, 5.0);
    pub const MASS: ParamRange = ParamRange::new(0.1, 10.0);
    pub const FIELD: ParamRange = ParamRange::new(-2.0, 2.0);
    pub const SPEED: ParamRange = ParamRange::new(0.0, 20.0);

    pub fn build(&self) -> SimResult<ChargedParticle> {
        ChargedParticle::new(
            Self::CHARGE.clamp("charge", self.charge)?,
            Self::MASS.clamp("mass", self.mass)?,
            Self::FIELD.clamp("field", self.field)?,
        )
    }

    /// Starts at the origin moving along +x.
    pub fn initial_state(&self) -> SimResult<SimulationState> {
        let speed = Self::SPEED.clamp("speed", self.speed)?;
        Ok(SimulationState::new(vec![0.0, 0.0, speed, 0.0, speed]))
    }
}

/// State: `[x, y, vx, vy, speed]`. The magnetic force does no work, so the
/// stored speed is constant and the velocity is held to it after every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargedParticle {
    charge: f64,
    mass: f64,
    field: f64,
}

impl ChargedParticle {
    pub fn new(charge: f64, mass: f64, field: f64) -> SimResult<Self> {
        Ok(Self {
            charge: require_finite("charge", charge)?,
            mass: require_denominator("mass", mass)?,
            field: require_finite("field", field)?,
        })
    }

    fn coupling(&self) -> f64 {
        self.charge * self.field
    }

    /// Cyclotron angular frequency `q B / m` (signed).
    pub fn angular_frequency(&self) -> f64 {
        self.coupling() / self.mass
    }

    /// `r = m v / |q B|`. `None` when the particle travels in a straight line.
    pub fn orbit_radius(&self, speed: f64) -> Option<f64> {
        let coupling = self.coupling().abs();
        if coupling <= DENOMINATOR_EPSILON {
            return None;
        }
        Some(self.mass * speed / coupling)
    }

    pub fn period(&self) -> Option<f64> {
        let coupling = self.coupling().abs();
        if coupling <= DENOMINATOR_EPSILON {
            return None;
        }
        Some(TAU * self.mass / coupling)
    }

    pub fn readout(&self, state: &SimulationState) -> Vec<ReadoutValue> {
        let x = &state.values;
        let speed = x[2].hypot(x[3]);
        vec![
            ReadoutValue::new("x", x[0], "m"),
            ReadoutValue::new("y", x[1], "m"),
            ReadoutValue::new("speed", speed, "m/s"),
            ReadoutValue::optional("orbit_radius", self.orbit_radius(speed), "m"),
            ReadoutValue::optional("period", self.period(), "s"),
            ReadoutValue::new("kinetic_energy", 0.5 * self.mass * speed * speed, "J"),
        ]
    }
}

impl DynamicalSystem<f64> for ChargedParticle {
    fn dimension(&self) -> usize {
        5
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let w = self.angular_frequency();
        out[0] = x[2];
        out[1] = x[3];
        // F = q v × B with B along z.
        out[2] = w * x[3];
        out[3] = -w * x[2];
        out[4] = 0.0;
    }

    fn layout(&self) -> StateLayout {
        StateLayout::SecondOrder { dof: 2 }
    }

    fn constrain(&self, _t: f64, x: &mut [f64]) {
        let norm = x[2].hypot(x[3]);
        if norm > DENOMINATOR_EPSILON && norm.is_finite() {
            let scale = x[4] / norm;
            x[2] *= scale;
            x[3] *= scale;
        }
    }

    fn max_stable_step(&self) -> Option<f64> {
        let w = self.angular_frequency().abs();
        if w <= DENOMINATOR_EPSILON {
            return None;
        }
        Some(MAX_TURN_PER_STEP / w)
    }
}
