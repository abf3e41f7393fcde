//! Session loaders: physics parameter sets and algorithm traces.

use crate::playback::{js_error, WasmPlayback};
use anyhow::{bail, Result};
use nalgebra::DMatrix;
use serde_wasm_bindgen::{from_value, to_value};
use tempo_core::algorithms::{binary_search_steps, multiply_steps, Tree, TreeOperation};
use tempo_core::physics::SystemConfig;
use wasm_bindgen::prelude::*;

/// Largest integer a JS number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn to_integer(name: &str, value: f64) -> Result<i64> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > MAX_SAFE_INTEGER {
        bail!("{} must be an integer, got {}.", name, value);
    }
    Ok(value as i64)
}

fn to_integers(name: &str, values: &[f64]) -> Result<Vec<i64>> {
    values.iter().map(|&v| to_integer(name, v)).collect()
}

fn to_matrix(name: &str, rows: u32, cols: u32, entries: &[f64]) -> Result<DMatrix<i64>> {
    let (rows, cols) = (rows as usize, cols as usize);
    let Some(len) = rows.checked_mul(cols) else {
        bail!("{} dimensions {}x{} are too large.", name, rows, cols);
    };
    if entries.len() != len {
        bail!(
            "{} has {} entries but is declared {}x{}.",
            name,
            entries.len(),
            rows,
            cols
        );
    }
    Ok(DMatrix::from_row_slice(rows, cols, &to_integers(name, entries)?))
}

#[wasm_bindgen]
impl WasmPlayback {
    /// Loads a continuous session from a `{ system: "...", ...params }` object.
    pub fn load_physics(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: SystemConfig =
            from_value(config).map_err(|e| js_error("Invalid system config", e))?;
        self.controller
            .load_simulation(config)
            .map_err(|e| js_error("Failed to build system", e))
    }

    /// Applies new parameters from the next tick without restarting the
    /// session.
    pub fn reconfigure(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: SystemConfig =
            from_value(config).map_err(|e| js_error("Invalid system config", e))?;
        self.controller
            .reconfigure(config)
            .map_err(|e| js_error("Failed to build system", e))
    }

    /// Loads a binary-search trace. Returns its step count (0 for empty or
    /// unsorted input).
    pub fn load_binary_search(&mut self, values: Vec<f64>, target: f64) -> Result<u32, JsValue> {
        let values = to_integers("values", &values).map_err(|e| js_error("Invalid input", e))?;
        let target = to_integer("target", target).map_err(|e| js_error("Invalid input", e))?;
        let steps = binary_search_steps(&values, target);
        let count = steps.len() as u32;
        self.controller.load_steps(steps);
        Ok(count)
    }

    /// Replaces the base tree with one built by inserting `values` in order.
    pub fn set_tree(&mut self, values: Vec<f64>) -> Result<(), JsValue> {
        let values = to_integers("values", &values).map_err(|e| js_error("Invalid input", e))?;
        self.tree = Tree::from_values(values);
        Ok(())
    }

    pub fn clear_tree(&mut self) {
        self.tree = Tree::new();
    }

    /// Current base tree as nested `{ value, left, right }` nodes.
    pub fn tree(&self) -> Result<JsValue, JsValue> {
        to_value(&self.tree).map_err(|e| js_error("Serialization error", e))
    }

    /// Loads the trace of a BST operation (`{ op: "insert", value: 5 }`,
    /// `{ op: "traverse", value: "in_order" }`, ...) against the base tree.
    /// Inserts and deletes commit their result as the next base tree.
    /// Returns the step count.
    pub fn load_tree_operation(&mut self, operation: JsValue) -> Result<u32, JsValue> {
        let operation: TreeOperation =
            from_value(operation).map_err(|e| js_error("Invalid tree operation", e))?;
        let trace = operation.generate(&self.tree);
        let count = trace.steps.len() as u32;
        self.tree = trace.result;
        self.controller.load_steps(trace.steps);
        Ok(count)
    }

    /// Loads a matrix-multiplication trace from row-major entries. Returns
    /// its step count (0 when the inner dimensions disagree).
    pub fn load_matrix_multiply(
        &mut self,
        a: Vec<f64>,
        a_rows: u32,
        a_cols: u32,
        b: Vec<f64>,
        b_rows: u32,
        b_cols: u32,
    ) -> Result<u32, JsValue> {
        let a = to_matrix("a", a_rows, a_cols, &a).map_err(|e| js_error("Invalid input", e))?;
        let b = to_matrix("b", b_rows, b_cols, &b).map_err(|e| js_error("Invalid input", e))?;
        let steps = multiply_steps(&a, &b);
        let count = steps.len() as u32;
        self.controller.load_steps(steps);
        Ok(count)
    }
}
