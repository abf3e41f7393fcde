//! Playback controller wrapper and frame entry point.

use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use tempo_core::algorithms::Tree;
use tempo_core::playback::{PlaybackController, PlaybackSettings, SessionToken};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPlayback {
    pub(crate) controller: PlaybackController,
    /// Base tree for the next BST operation.
    pub(crate) tree: Tree,
}

pub(crate) fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

#[wasm_bindgen]
impl WasmPlayback {
    /// `settings` may be `undefined` for the defaults; missing fields fall
    /// back to their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<WasmPlayback, JsValue> {
        console_error_panic_hook::set_once();

        let settings: PlaybackSettings = if settings.is_undefined() || settings.is_null() {
            PlaybackSettings::default()
        } else {
            from_value(settings).map_err(|e| js_error("Invalid playback settings", e))?
        };
        let controller = PlaybackController::new(settings)
            .map_err(|e| js_error("Invalid playback settings", e))?;

        Ok(WasmPlayback {
            controller,
            tree: Tree::new(),
        })
    }

    /// Returns the session token, or `undefined` when nothing is loaded.
    pub fn start(&mut self) -> Option<u32> {
        self.controller.start().map(|token| token.generation)
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn resume(&mut self) {
        self.controller.resume();
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        self.controller.set_speed(multiplier);
    }

    pub fn speed(&self) -> f64 {
        self.controller.speed()
    }

    pub fn jump_to(&mut self, index: u32) {
        self.controller.jump_to(index as usize);
    }

    /// Advances the session for one animation frame. `now_ms` is the frame
    /// timestamp. Returns the tick outcome (`{ outcome: "stale" }` for a
    /// superseded token).
    pub fn tick(&mut self, token: u32, now_ms: f64) -> Result<JsValue, JsValue> {
        let outcome = self
            .controller
            .tick(SessionToken { generation: token }, now_ms);
        to_value(&outcome).map_err(|e| js_error("Serialization error", e))
    }

    pub fn is_current(&self, token: u32) -> bool {
        self.controller
            .is_current(SessionToken { generation: token })
    }

    /// Read-only view for the renderer, or `null` when nothing is loaded.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        match self.controller.snapshot() {
            Some(snapshot) => to_value(&snapshot).map_err(|e| js_error("Serialization error", e)),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn run_state(&self) -> Result<JsValue, JsValue> {
        to_value(&self.controller.run_state()).map_err(|e| js_error("Serialization error", e))
    }

    /// Times of the recorded continuous states, oldest first.
    pub fn history_times(&self) -> Float64Array {
        let times: Vec<f64> = self
            .controller
            .history()
            .map(|h| h.iter().map(|s| s.time).collect())
            .unwrap_or_default();
        Float64Array::from(times.as_slice())
    }

    /// One state component across the recorded history, oldest first.
    pub fn history_component(&self, index: u32) -> Result<Float64Array, JsValue> {
        let Some(history) = self.controller.history() else {
            return Ok(Float64Array::new_with_length(0));
        };
        let index = index as usize;
        let mut values = Vec::with_capacity(history.len());
        for state in history.iter() {
            match state.values.get(index) {
                Some(v) => values.push(*v),
                None => return Err(JsValue::from_str("History component index out of range.")),
            }
        }
        Ok(Float64Array::from(values.as_slice()))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_playback_tests {
    use super::WasmPlayback;
    use serde::{Deserialize, Serialize};
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[derive(Serialize)]
    struct BadSettings {
        max_substeps: usize,
    }

    #[derive(Deserialize)]
    struct Outcome {
        outcome: String,
    }

    #[derive(Deserialize)]
    struct DiscreteView {
        kind: String,
        run_state: String,
        index: usize,
        total: usize,
    }

    fn outcome(value: JsValue) -> String {
        from_value::<Outcome>(value).expect("decode outcome").outcome
    }

    #[wasm_bindgen_test]
    fn start_without_session_returns_none() {
        let mut playback = WasmPlayback::new(JsValue::UNDEFINED).expect("playback");
        assert_eq!(playback.start(), None);
        assert!(playback.snapshot().expect("snapshot").is_null());
    }

    #[wasm_bindgen_test]
    fn rejects_invalid_settings() {
        let settings = to_value(&BadSettings { max_substeps: 0 }).expect("encode");
        let message = match WasmPlayback::new(settings) {
            Ok(_) => panic!("expected settings error"),
            Err(err) => err.as_string().unwrap_or_default(),
        };
        assert!(message.contains("Invalid playback settings"));
        assert!(message.contains("max_substeps"));
    }

    #[wasm_bindgen_test]
    fn stale_token_is_reported() {
        let mut playback = WasmPlayback::new(JsValue::UNDEFINED).expect("playback");
        playback
            .load_binary_search(vec![1.0, 3.0, 5.0, 7.0], 5.0)
            .expect("load");
        let first = playback.start().expect("token");
        let second = playback.start().expect("token");
        assert!(!playback.is_current(first));
        assert!(playback.is_current(second));
        assert_eq!(outcome(playback.tick(first, 0.0).expect("tick")), "stale");
        assert_eq!(outcome(playback.tick(second, 0.0).expect("tick")), "deferred");
    }

    #[wasm_bindgen_test]
    fn discrete_snapshot_reports_progress() {
        let mut playback = WasmPlayback::new(JsValue::UNDEFINED).expect("playback");
        let total = playback
            .load_binary_search(vec![2.0, 5.0, 8.0, 12.0, 16.0], 12.0)
            .expect("load");
        playback.start().expect("token");
        playback.pause();
        playback.jump_to(1);

        let view: DiscreteView =
            from_value(playback.snapshot().expect("snapshot")).expect("decode snapshot");
        assert_eq!(view.kind, "discrete");
        assert_eq!(view.run_state, "paused");
        assert_eq!(view.index, 1);
        assert_eq!(view.total, total as usize);

        playback.stop();
        let view: DiscreteView =
            from_value(playback.snapshot().expect("snapshot")).expect("decode snapshot");
        assert_eq!((view.run_state.as_str(), view.index), ("idle", 0));
    }
}
