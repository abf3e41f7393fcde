//! Continuous systems driven by the integrator.
//!
//! Each system is a pure rate function over its own state layout plus a
//! parameter struct with clamped ranges. [`SystemConfig`] is the tagged form
//! the host sends; [`PhysicalSystem`] is the closed set the playback
//! controller dispatches over.

pub mod charged_particle;
pub mod incline;
pub mod oscillator;
pub mod params;
pub mod rc_circuit;

pub use charged_particle::{ChargedParticle, ParticleParams};
pub use incline::{Incline, InclineParams, InclinePhase};
pub use oscillator::{Oscillator, OscillatorParams};
pub use params::ParamRange;
pub use rc_circuit::{RcCircuit, RcMode, RcParams};

use crate::error::SimResult;
use crate::simulation::SimulationState;
use crate::traits::{DynamicalSystem, StateLayout};
use serde::{Deserialize, Serialize};

/// One labelled value for the informational readout next to the drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadoutValue {
    pub label: &'static str,
    /// `None` when the quantity is undefined for the current parameters.
    pub value: Option<f64>,
    pub unit: &'static str,
    /// Named state for readouts that are not numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'static str>,
}

impl ReadoutValue {
    pub fn new(label: &'static str, value: f64, unit: &'static str) -> Self {
        Self::optional(label, Some(value), unit)
    }

    pub fn optional(label: &'static str, value: Option<f64>, unit: &'static str) -> Self {
        Self {
            label,
            value,
            unit,
            text: None,
        }
    }

    pub fn text(label: &'static str, text: &'static str) -> Self {
        Self {
            label,
            value: None,
            unit: "",
            text: Some(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum SystemConfig {
    RcCircuit(RcParams),
    Oscillator(OscillatorParams),
    Incline(InclineParams),
    ChargedParticle(ParticleParams),
}

impl SystemConfig {
    pub fn build_system(&self) -> SimResult<PhysicalSystem> {
        Ok(match self {
            SystemConfig::RcCircuit(p) => PhysicalSystem::RcCircuit(p.build()?),
            SystemConfig::Oscillator(p) => PhysicalSystem::Oscillator(p.build()?),
            SystemConfig::Incline(p) => PhysicalSystem::Incline(p.build()?),
            SystemConfig::ChargedParticle(p) => PhysicalSystem::ChargedParticle(p.build()?),
        })
    }

    pub fn initial_state(&self) -> SimResult<SimulationState> {
        match self {
            SystemConfig::RcCircuit(p) => p.initial_state(),
            SystemConfig::Oscillator(p) => p.initial_state(),
            SystemConfig::Incline(p) => Ok(p.initial_state()),
            SystemConfig::ChargedParticle(p) => p.initial_state(),
        }
    }

    pub fn build(&self) -> SimResult<(PhysicalSystem, SimulationState)> {
        Ok((self.build_system()?, self.initial_state()?))
    }

    pub fn kind(&self) -> SystemKind {
        match self {
            SystemConfig::RcCircuit(_) => SystemKind::RcCircuit,
            SystemConfig::Oscillator(_) => SystemKind::Oscillator,
            SystemConfig::Incline(_) => SystemKind::Incline,
            SystemConfig::ChargedParticle(_) => SystemKind::ChargedParticle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    RcCircuit,
    Oscillator,
    Incline,
    ChargedParticle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicalSystem {
    RcCircuit(RcCircuit),
    Oscillator(Oscillator),
    Incline(Incline),
    ChargedParticle(ChargedParticle),
}

impl PhysicalSystem {
    pub fn kind(&self) -> SystemKind {
        match self {
            PhysicalSystem::RcCircuit(_) => SystemKind::RcCircuit,
            PhysicalSystem::Oscillator(_) => SystemKind::Oscillator,
            PhysicalSystem::Incline(_) => SystemKind::Incline,
            PhysicalSystem::ChargedParticle(_) => SystemKind::ChargedParticle,
        }
    }

    pub fn readout(&self, state: &SimulationState) -> Vec<ReadoutValue> {
        match self {
            PhysicalSystem::RcCircuit(s) => s.readout(state),
            PhysicalSystem::Oscillator(s) => s.readout(state),
            PhysicalSystem::Incline(s) => s.readout(state),
            PhysicalSystem::ChargedParticle(s) => s.readout(state),
        }
    }
}

impl DynamicalSystem<f64> for PhysicalSystem {
    fn dimension(&self) -> usize {
        match self {
            PhysicalSystem::RcCircuit(s) => s.dimension(),
            PhysicalSystem::Oscillator(s) => s.dimension(),
            PhysicalSystem::Incline(s) => s.dimension(),
            PhysicalSystem::ChargedParticle(s) => s.dimension(),
        }
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        match self {
            PhysicalSystem::RcCircuit(s) => s.apply(t, x, out),
            PhysicalSystem::Oscillator(s) => s.apply(t, x, out),
            PhysicalSystem::Incline(s) => s.apply(t, x, out),
            PhysicalSystem::ChargedParticle(s) => s.apply(t, x, out),
        }
    }

    fn layout(&self) -> StateLayout {
        match self {
            PhysicalSystem::RcCircuit(s) => s.layout(),
            PhysicalSystem::Oscillator(s) => s.layout(),
            PhysicalSystem::Incline(s) => s.layout(),
            PhysicalSystem::ChargedParticle(s) => s.layout(),
        }
    }

    fn constrain(&self, t: f64, x: &mut [f64]) {
        match self {
            PhysicalSystem::RcCircuit(s) => s.constrain(t, x),
            PhysicalSystem::Oscillator(s) => s.constrain(t, x),
            PhysicalSystem::Incline(s) => s.constrain(t, x),
            PhysicalSystem::ChargedParticle(s) => s.constrain(t, x),
        }
    }

    fn is_terminal(&self, t: f64, x: &[f64]) -> bool {
        match self {
            PhysicalSystem::RcCircuit(s) => s.is_terminal(t, x),
            PhysicalSystem::Oscillator(s) => s.is_terminal(t, x),
            PhysicalSystem::Incline(s) => s.is_terminal(t, x),
            PhysicalSystem::ChargedParticle(s) => s.is_terminal(t, x),
        }
    }
    fn max_stable_step(&self) -> Option<f64> {
        match self {
            PhysicalSystem::RcCircuit(s) => s.max_stable_step(),
            PhysicalSystem::Oscillator(s) => s.max_stable_step(),
            PhysicalSystem::Incline(s) => s.max_stable_step(),
            PhysicalSystem::ChargedParticle(s) => s.max_stable_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PhysicalSystem, SystemConfig, SystemKind};
    use crate::error::SimError;
    use crate::physics::RcParams;
    use crate::traits::{DynamicalSystem, StateLayout};

    #[test]
    fn every_config_builds_a_matching_system_and_state() {
        let configs = [
            SystemConfig::RcCircuit(Default::default()),
            SystemConfig::Oscillator(Default::default()),
            SystemConfig::Incline(Default::default()),
            SystemConfig::ChargedParticle(Default::default()),
        ];
        for config in configs {
            let (system, state) = config.build().expect("default config builds");
            assert_eq!(system.kind(), config.kind());
            assert_eq!(system.dimension(), state.values.len());
            assert!(!system.readout(&state).is_empty());
        }
    }

    #[test]
    fn layouts_are_dispatched() {
        let (particle, _) = SystemConfig::ChargedParticle(Default::default())
            .build()
            .expect("build");
        assert_eq!(particle.layout(), StateLayout::SecondOrder { dof: 2 });
        let (rc, _) = SystemConfig::RcCircuit(Default::default())
            .build()
            .expect("build");
        assert_eq!(rc.layout(), StateLayout::FirstOrder);
        assert_eq!(rc.kind(), SystemKind::RcCircuit);
        assert!(matches!(rc, PhysicalSystem::RcCircuit(_)));
    }

    #[test]
    fn stability_limits_are_dispatched() {
        let (rc, _) = SystemConfig::RcCircuit(Default::default())
            .build()
            .expect("build");
        let tau = match rc {
            PhysicalSystem::RcCircuit(circuit) => circuit.time_constant(),
            _ => unreachable!(),
        };
        assert_eq!(rc.max_stable_step(), Some(tau / 50.0));
        let (incline, _) = SystemConfig::Incline(Default::default())
            .build()
            .expect("build");
        assert_eq!(incline.max_stable_step(), None);
    }

    #[test]
    fn non_finite_parameter_is_rejected() {
        let config = SystemConfig::RcCircuit(RcParams {
            resistance: f64::NAN,
            ..RcParams::default()
        });
        assert_eq!(
            config.build_system().expect_err("NaN resistance"),
            SimError::NonFinite { name: "resistance" }
        );
    }
}
