//! Browser bridge for the `tempo_core` playback engine.
//!
//! Each visualization page owns one [`WasmPlayback`]. The page loads a
//! session (physics or an algorithm trace), calls `start()`, and forwards
//! every animation frame to `tick()` along with the token `start()` returned.

mod loaders;
mod playback;

pub use playback::WasmPlayback;
