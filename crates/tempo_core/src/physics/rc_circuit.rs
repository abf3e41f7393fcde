//! Series RC circuit charging from, or discharging without, a DC source.

use super::params::{require_denominator, require_finite, ParamRange};
use super::ReadoutValue;
use crate::error::SimResult;
use crate::simulation::SimulationState;
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// Integrator steps per time constant. Keeps explicit Euler within half a
/// percent of the exact curve at t = tau.
const STEPS_PER_TIME_CONSTANT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcMode {
    #[default]
    Charging,
    Discharging,
}

impl RcMode {
    /// Multiplier applied to the source voltage.
    pub fn gate(self) -> f64 {
        match self {
            RcMode::Charging => 1.0,
            RcMode::Discharging => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcParams {
    pub source_voltage: f64,
    pub resistance: f64,
    pub capacitance_uf: f64,
    pub mode: RcMode,
    /// Capacitor voltage at t = 0. Defaults to empty when charging and to the
    /// source voltage when discharging.
    pub initial_voltage: Option<f64>,
}

impl Default for RcParams {
    fn default() -> Self {
        Self {
            source_voltage: 9.0,
            resistance: 100.0,
            capacitance_uf: 100.0,
            mode: RcMode::Charging,
            initial_voltage: None,
        }
    }
}

impl RcParams {
    pub const SOURCE_VOLTAGE: ParamRange = ParamRange::new(0.0, 24.0);
    pub const RESISTANCE: ParamRange = ParamRange::new(10.0, 1000.0);
    pub const CAPACITANCE_UF: ParamRange = ParamRange::new(10.0, 500.0);

    pub fn build(&self) -> SimResult<RcCircuit> {
        let source_voltage = Self::SOURCE_VOLTAGE.clamp("source_voltage", self.source_voltage)?;
        let resistance = Self::RESISTANCE.clamp("resistance", self.resistance)?;
        let capacitance_uf = Self::CAPACITANCE_UF.clamp("capacitance_uf", self.capacitance_uf)?;
        RcCircuit::new(source_voltage, resistance, capacitance_uf * 1e-6, self.mode)
    }

    pub fn initial_state(&self) -> SimResult<SimulationState> {
        let source_voltage = Self::SOURCE_VOLTAGE.clamp("source_voltage", self.source_voltage)?;
        let voltage = match self.initial_voltage {
            Some(v) => ParamRange::new(0.0, source_voltage).clamp("initial_voltage", v)?,
            None => match self.mode {
                RcMode::Charging => 0.0,
                RcMode::Discharging => source_voltage,
            },
        };
        Ok(SimulationState::new(vec![voltage]))
    }
}

/// State: `[v_c]`, the capacitor voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RcCircuit {
    source_voltage: f64,
    resistance: f64,
    capacitance: f64,
    mode: RcMode,
}

impl RcCircuit {
    /// `capacitance` is in farads.
    pub fn new(
        source_voltage: f64,
        resistance: f64,
        capacitance: f64,
        mode: RcMode,
    ) -> SimResult<Self> {
        Ok(Self {
            source_voltage: require_finite("source_voltage", source_voltage)?,
            resistance: require_denominator("resistance", resistance)?,
            capacitance: require_denominator("capacitance", capacitance)?,
            mode,
        })
    }

    pub fn time_constant(&self) -> f64 {
        self.resistance * self.capacitance
    }

    /// I = (V_source * gate - V_c) / R
    pub fn current(&self, voltage: f64) -> f64 {
        (self.source_voltage * self.mode.gate() - voltage) / self.resistance
    }

    pub fn mode(&self) -> RcMode {
        self.mode
    }

    pub fn source_voltage(&self) -> f64 {
        self.source_voltage
    }

    pub fn readout(&self, state: &SimulationState) -> Vec<ReadoutValue> {
        let voltage = state.values[0];
        let fraction = if self.source_voltage > 0.0 {
            Some(voltage / self.source_voltage)
        } else {
            None
        };
        vec![
            ReadoutValue::new("voltage", voltage, "V"),
            ReadoutValue::new("current", self.current(voltage), "A"),
            ReadoutValue::optional("charge_fraction", fraction, ""),
            ReadoutValue::new(
                "stored_energy",
                0.5 * self.capacitance * voltage * voltage,
                "J",
            ),
            ReadoutValue::new("time_constant", self.time_constant(), "s"),
        ]
    }
}

impl DynamicalSystem<f64> for RcCircuit {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.current(x[0]) / self.capacitance;
    }

    fn max_stable_step(&self) -> Option<f64> {
        Some(self.time_constant() / STEPS_PER_TIME_CONSTANT)
    }
}
