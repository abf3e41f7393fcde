/// The `tempo_core` crate is the simulation and playback engine behind the
/// interactive physics and algorithm visualizations.
///
/// Key components:
/// - **Traits**: `Scalar`, `DynamicalSystem` (rate functions with optional constraints and
///   terminal conditions), `Steppable` (solvers).
/// - **Solvers**: Semi-implicit Euler and the `integrate` step used by every continuous system.
/// - **Physics**: RC circuit, damped-driven oscillator, friction incline, charged particle.
/// - **Algorithms**: Pure step generators for binary search, BST edits and traversals, and
///   matrix multiplication.
/// - **Playback**: One controller per page driving either kind of session from host frames.
pub mod algorithms;
pub mod clock;
pub mod error;
pub mod physics;
pub mod playback;
pub mod simulation;
pub mod solvers;
pub mod traits;
