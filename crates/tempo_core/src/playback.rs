//! Single-session playback over either a continuous simulation or a
//! precomputed step trace.
//!
//! The controller is driven entirely by the host's frame callback: every
//! mutation of cursor or state happens inside [`PlaybackController::tick`],
//! which first checks the caller's [`SessionToken`] against the live session.

pub mod controller;
pub mod types;

pub use controller::PlaybackController;
pub use types::{Cursor, PlaybackSettings, RunState, SessionToken, Snapshot, TickOutcome};
