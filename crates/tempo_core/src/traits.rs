use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our simulations.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// How a state vector is laid out, which decides how a solver applies the rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum StateLayout {
    /// Every component is advanced directly from its rate.
    FirstOrder,
    /// `[q_0..q_dof, v_0..v_dof, extra..]`. `apply` writes velocities into the
    /// first `dof` slots and accelerations into the next `dof`.
    SecondOrder { dof: usize },
}

/// Represents a continuous system advanced by an integrator.
///
/// Implementations must be pure: the same `(t, x)` always yields the same rates.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the rates of change.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);

    fn layout(&self) -> StateLayout {
        StateLayout::FirstOrder
    }

    /// Largest step the solver stays stable and accurate with, when the system
    /// has a limit of its own (e.g. a fraction of its time constant).
    fn max_stable_step(&self) -> Option<T> {
        None
    }

    /// Projects the state back onto its admissible set. Called by the integrator
    /// before and after every step.
    fn constrain(&self, _t: T, _x: &mut [T]) {}

    /// Whether the system has reached a natural end (e.g. a block leaving its ramp).
    fn is_terminal(&self, _t: T, _x: &[T]) -> bool {
        false
    }
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
