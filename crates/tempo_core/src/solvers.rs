use crate::error::{SimError, SimResult};
use crate::simulation::SimulationState;
use crate::traits::{DynamicalSystem, Scalar, StateLayout, Steppable};

/// Default bound on one integrator step, in seconds of simulated time.
pub const DEFAULT_MAX_STEP: f64 = 0.005;

/// Semi-implicit (symplectic) Euler.
///
/// For second-order layouts the velocities are advanced from the accelerations
/// first, then the positions from the *updated* velocities. First-order layouts
/// reduce to explicit Euler.
pub struct SemiImplicitEuler<T: Scalar> {
    rates: Vec<T>,
}

impl<T: Scalar> SemiImplicitEuler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            rates: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for SemiImplicitEuler<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        if self.rates.len() != state.len() {
            self.rates.resize(state.len(), T::zero());
        }

        let t0 = *t;
        system.apply(t0, state, &mut self.rates);

        match system.layout() {
            StateLayout::FirstOrder => {
                for i in 0..state.len() {
                    state[i] = state[i] + dt * self.rates[i];
                }
            }
            StateLayout::SecondOrder { dof } => {
                // v(t+dt) = v(t) + a(t) * dt
                for i in dof..2 * dof {
                    state[i] = state[i] + dt * self.rates[i];
                }
                // x(t+dt) = x(t) + v(t+dt) * dt
                for i in 0..dof {
                    state[i] = state[i] + dt * state[dof + i];
                }
                for i in 2 * dof..state.len() {
                    state[i] = state[i] + dt * self.rates[i];
                }
            }
        }

        *t = t0 + dt;
    }
}

/// Clamps a requested step into `[0, max_dt]`. Non-finite or negative requests
/// become a zero step.
pub fn clamp_dt(dt: f64, max_dt: f64) -> f64 {
    if !dt.is_finite() || dt <= 0.0 || !max_dt.is_finite() || max_dt <= 0.0 {
        return 0.0;
    }
    dt.min(max_dt)
}

/// Produces the next state without touching `state`.
///
/// If the step yields a non-finite component the caller keeps its previous
/// state and receives [`SimError::Diverged`].
pub fn integrate<S: DynamicalSystem<f64>>(
    solver: &mut SemiImplicitEuler<f64>,
    system: &S,
    state: &SimulationState,
    dt: f64,
    max_dt: f64,
) -> SimResult<SimulationState> {
    let dt = clamp_dt(dt, max_dt);
    let mut t = state.time;
    let mut values = state.values.clone();

    system.constrain(t, &mut values);
    if dt > 0.0 {
        solver.step(system, &mut t, &mut values, dt);
        system.constrain(t, &mut values);
    }

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SimError::Diverged { index });
    }

    Ok(SimulationState {
        time: t,
        values,
        version: state.version + 1,
    })
}
