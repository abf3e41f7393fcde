//! Parameter ranges shared by the physical systems.

use crate::error::{SimError, SimResult};
use serde::Serialize;
use tracing::debug;

/// Values with magnitude at or below this are treated as zero when used as a
/// denominator.
pub const DENOMINATOR_EPSILON: f64 = 1e-9;

/// Closed interval a user-facing parameter is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps `value` into the range. Non-finite input is rejected.
    pub fn clamp(&self, name: &'static str, value: f64) -> SimResult<f64> {
        if !value.is_finite() {
            return Err(SimError::NonFinite { name });
        }
        let clamped = value.clamp(self.min, self.max);
        if clamped != value {
            debug!(name, value, clamped, "parameter clamped into range");
        }
        Ok(clamped)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::NonFinite { name })
    }
}

/// Rejects values that would be divided by and are zero or close to it.
pub(crate) fn require_denominator(name: &'static str, value: f64) -> SimResult<f64> {
    let value = require_finite(name, value)?;
    if value.abs() <= DENOMINATOR_EPSILON {
        return Err(SimError::Degenerate { name, value });
    }
    Ok(value)
}
