use crate::error::SimResult;
use crate::solvers::{integrate, SemiImplicitEuler};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Remaining time below this is treated as zero.
const TIME_EPSILON: f64 = 1e-12;

/// Continuous-mode state. Replaced wholesale on every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub time: f64,
    pub values: Vec<f64>,
    /// Incremented once per integrator step.
    pub version: u64,
}

impl SimulationState {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            time: 0.0,
            values,
            version: 0,
        }
    }
}

/// Ring buffer of recent states.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    states: VecDeque<SimulationState>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            states: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    pub fn push(&mut self, state: SimulationState) {
        if self.capacity == 0 {
            return;
        }
        while self.states.len() >= self.capacity {
            self.states.pop_front();
        }
        self.states.push_back(state);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationState> {
        self.states.iter()
    }
}

/// An owned continuous system together with its current and initial state.
pub struct Simulation<S: DynamicalSystem<f64>> {
    system: S,
    initial: SimulationState,
    state: SimulationState,
    solver: SemiImplicitEuler<f64>,
    max_step: f64,
    duration: Option<f64>,
    history: History,
}

impl<S: DynamicalSystem<f64>> Simulation<S> {
    pub fn new(system: S, initial: SimulationState, max_step: f64) -> Self {
        let dim = system.dimension();
        Self {
            system,
            state: initial.clone(),
            initial,
            solver: SemiImplicitEuler::new(dim),
            max_step,
            duration: None,
            history: History::new(0),
        }
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history = History::new(capacity);
        self
    }

    /// Bound on a single integrator step: `max_step`, tightened by the
    /// system's own stability limit when it has one.
    pub fn step_limit(&self) -> f64 {
        match self.system.max_stable_step() {
            Some(cap) if cap.is_finite() && cap > 0.0 => self.max_step.min(cap),
            _ => self.max_step,
        }
    }

    /// Advances by one integrator step of at most [`Self::step_limit`]. On
    /// error the current state is kept.
    pub fn step(&mut self, dt: f64) -> SimResult<()> {
        let limit = self.step_limit();
        let next = integrate(&mut self.solver, &self.system, &self.state, dt, limit)?;
        self.state = next;
        Ok(())
    }

    /// Advances by `dt`, split into steps no larger than the step limit,
    /// taking at most `max_substeps` steps. Stops early once the simulation is
    /// finished. Returns the number of steps taken.
    pub fn advance(&mut self, dt: f64, max_substeps: usize) -> SimResult<usize> {
        let mut remaining = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if let Some(duration) = self.duration {
            remaining = remaining.min((duration - self.state.time).max(0.0));
        }

        let limit = self.step_limit();
        let mut taken = 0;
        while remaining > TIME_EPSILON && taken < max_substeps && !self.is_finished() {
            let h = remaining.min(limit);
            self.step(h)?;
            remaining -= h;
            taken += 1;
        }
        Ok(taken)
    }

    /// Appends the current state to the replay window.
    pub fn record(&mut self) {
        self.history.push(self.state.clone());
    }

    pub fn is_finished(&self) -> bool {
        if let Some(duration) = self.duration {
            if self.state.time >= duration - TIME_EPSILON {
                return true;
            }
        }
        self.system.is_terminal(self.state.time, &self.state.values)
    }

    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        self.history.clear();
    }

    /// Swaps in a new parameter set and the initial state it implies. The
    /// current state carries over and the new system is used from the next
    /// step; `reset` rewinds to the new initial state.
    pub fn reconfigure(&mut self, system: S, initial: SimulationState) {
        self.system = system;
        self.initial = initial;
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn initial(&self) -> &SimulationState {
        &self.initial
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
