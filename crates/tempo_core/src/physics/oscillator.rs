//! Damped, driven mass-spring oscillator.

use super::params::{require_denominator, require_finite, ParamRange};
use super::ReadoutValue;
use crate::error::SimResult;
use crate::simulation::SimulationState;
use crate::traits::{DynamicalSystem, StateLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorParams {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub drive_amplitude: f64,
    pub drive_frequency: f64,
    pub initial_displacement: f64,
    pub initial_velocity: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 10.0,
            damping: 0.5,
            drive_amplitude: 0.0,
            drive_frequency: 1.0,
            initial_displacement: 1.0,
            initial_velocity: 0.0,
        }
    }
}

impl OscillatorParams {
    pub const MASS: ParamRange = ParamRange::new(0.1, 10.0);
    pub const STIFFNESS: ParamRange = ParamRange::new(0.1, 100.0);
    pub const DAMPING: ParamRange = ParamRange::new(0.0, 10.0);
    pub const DRIVE_AMPLITUDE: ParamRange = ParamRange::new(0.0, 50.0);
    pub const DRIVE_FREQUENCY: ParamRange = ParamRange::new(0.0, 20.0);
    pub const DISPLACEMENT: ParamRange = ParamRange::new(-2.0, 2.0);
    pub const VELOCITY: ParamRange = ParamRange::new(-10.0, 10.0);

    pub fn build(&self) -> SimResult<Oscillator> {
        Oscillator::new(
            Self::MASS.clamp("mass", self.mass)?,
            Self::STIFFNESS.clamp("stiffness", self.stiffness)?,
            Self::DAMPING.clamp("damping", self.damping)?,
            Self::DRIVE_AMPLITUDE.clamp("drive_amplitude", self.drive_amplitude)?,
            Self::DRIVE_FREQUENCY.clamp("drive_frequency", self.drive_frequency)?,
        )
    }

    pub fn initial_state(&self) -> SimResult<SimulationState> {
        Ok(SimulationState::new(vec![
            Self::DISPLACEMENT.clamp("initial_displacement", self.initial_displacement)?,
            Self::VELOCITY.clamp("initial_velocity", self.initial_velocity)?,
        ]))
    }
}

/// State: `[x, v]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    mass: f64,
    stiffness: f64,
    damping: f64,
    drive_amplitude: f64,
    drive_frequency: f64,
}

impl Oscillator {
    pub fn new(
        mass: f64,
        stiffness: f64,
        damping: f64,
        drive_amplitude: f64,
        drive_frequency: f64,
    ) -> SimResult<Self> {
        Ok(Self {
            mass: require_denominator("mass", mass)?,
            stiffness: require_finite("stiffness", stiffness)?,
            damping: require_finite("damping", damping)?,
            drive_amplitude: require_finite("drive_amplitude", drive_amplitude)?,
            drive_frequency: require_finite("drive_frequency", drive_frequency)?,
        })
    }

    /// a = (-k x - b v + F0 cos(w t)) / m
    pub fn acceleration(&self, t: f64, x: f64, v: f64) -> f64 {
        let drive = self.drive_amplitude * (self.drive_frequency * t).cos();
        (-self.stiffness * x - self.damping * v + drive) / self.mass
    }

    pub fn kinetic_energy(&self, v: f64) -> f64 {
        0.5 * self.mass * v * v
    }

    pub fn potential_energy(&self, x: f64) -> f64 {
        0.5 * self.stiffness * x * x
    }

    pub fn energy(&self, x: f64, v: f64) -> f64 {
        self.kinetic_energy(v) + self.potential_energy(x)
    }

    pub fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }

    pub fn readout(&self, state: &SimulationState) -> Vec<ReadoutValue> {
        let (x, v) = (state.values[0], state.values[1]);
        vec![
            ReadoutValue::new("displacement", x, "m"),
            ReadoutValue::new("velocity", v, "m/s"),
            ReadoutValue::new("acceleration", self.acceleration(state.time, x, v), "m/s²"),
            ReadoutValue::new("kinetic_energy", self.kinetic_energy(v), "J"),
            ReadoutValue::new("potential_energy", self.potential_energy(x), "J"),
            ReadoutValue::new("total_energy", self.energy(x, v), "J"),
        ]
    }
}

impl DynamicalSystem<f64> for Oscillator {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = x[1];
        out[1] = self.acceleration(t, x[0], x[1]);
    }

    fn layout(&self) -> StateLayout {
        StateLayout::SecondOrder { dof: 1 }
    }
}
