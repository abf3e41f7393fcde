use super::types::{Cursor, PlaybackSettings, RunState, SessionToken, Snapshot, TickOutcome};
use crate::algorithms::AlgorithmStep;
use crate::clock::{FrameClock, IntervalTimer};
use crate::error::SimResult;
use crate::physics::{PhysicalSystem, SystemConfig};
use crate::simulation::{History, Simulation};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, trace, warn};

enum Timeline {
    Continuous {
        config: SystemConfig,
        simulation: Simulation<PhysicalSystem>,
    },
    Discrete {
        steps: Arc<[AlgorithmStep]>,
        cursor: usize,
    },
}

/// Owns the one active session of a page.
///
/// Commands that are invalid for the current run state are ignored. Ticks
/// from a stopped or superseded session are dropped before touching state.
pub struct PlaybackController {
    settings: PlaybackSettings,
    timeline: Option<Timeline>,
    run_state: RunState,
    speed: f64,
    generation: u32,
    clock: FrameClock,
    timer: IntervalTimer,
}

impl PlaybackController {
    pub fn new(settings: PlaybackSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            clock: FrameClock::new(settings.max_frame_delta),
            settings,
            timeline: None,
            run_state: RunState::Idle,
            speed: 1.0_f64.clamp(settings.min_speed, settings.max_speed),
            generation: 0,
            timer: IntervalTimer::default(),
        })
    }

    /// Prepares a continuous session. Any running session is cancelled.
    pub fn load_simulation(&mut self, config: SystemConfig) -> SimResult<()> {
        let (system, initial) = config.build()?;
        let simulation = Simulation::new(system, initial, self.settings.max_step)
            .with_duration(self.settings.duration)
            .with_history(self.settings.history_capacity);
        self.replace_timeline(Timeline::Continuous { config, simulation });
        Ok(())
    }

    /// Prepares a discrete session over a precomputed trace. Any running
    /// session is cancelled.
    pub fn load_steps<S: Into<AlgorithmStep>>(&mut self, steps: impl IntoIterator<Item = S>) {
        let steps: Arc<[AlgorithmStep]> = steps.into_iter().map(Into::into).collect();
        self.replace_timeline(Timeline::Discrete { steps, cursor: 0 });
    }

    fn replace_timeline(&mut self, timeline: Timeline) {
        self.invalidate();
        self.timeline = Some(timeline);
        self.set_run_state(RunState::Idle);
    }

    /// Starts (or restarts) the loaded session from its beginning and returns
    /// the token the host must pass to [`tick`](Self::tick). Returns `None`
    /// when nothing is loaded.
    pub fn start(&mut self) -> Option<SessionToken> {
        if self.timeline.is_none() {
            debug!("start ignored: nothing loaded");
            return None;
        }
        self.invalidate();
        self.rewind();
        let empty =
            matches!(&self.timeline, Some(Timeline::Discrete { steps, .. }) if steps.is_empty());
        self.set_run_state(if empty {
            RunState::Completed
        } else {
            RunState::Running
        });
        Some(self.token())
    }

    pub fn pause(&mut self) {
        if self.run_state != RunState::Running {
            debug!(state = ?self.run_state, "pause ignored");
            return;
        }
        self.set_run_state(RunState::Paused);
    }

    pub fn resume(&mut self) {
        if self.run_state != RunState::Paused {
            debug!(state = ?self.run_state, "resume ignored");
            return;
        }
        // The paused interval must not be replayed as one large delta.
        self.clock.rebase();
        self.set_run_state(RunState::Running);
    }

    /// Cancels the session, restores the initial cursor or state and returns
    /// to `Idle`. Outstanding tokens become stale.
    pub fn stop(&mut self) {
        self.invalidate();
        self.rewind();
        self.set_run_state(RunState::Idle);
    }

    pub fn reset(&mut self) {
        self.stop();
    }

    /// Clamps into `[min_speed, max_speed]`. Takes effect on the next tick.
    pub fn set_speed(&mut self, multiplier: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            debug!(multiplier, "set_speed ignored");
            return;
        }
        let clamped = multiplier.clamp(self.settings.min_speed, self.settings.max_speed);
        if clamped != multiplier {
            debug!(multiplier, clamped, "speed clamped");
        }
        self.speed = clamped;
    }

    /// Moves the discrete cursor. Valid once a session has started; jumping
    /// to the end completes it and jumping back from `Completed` pauses.
    pub fn jump_to(&mut self, index: usize) {
        if self.run_state == RunState::Idle {
            debug!(index, "jump_to ignored while idle");
            return;
        }
        let Some(Timeline::Discrete { steps, cursor }) = &mut self.timeline else {
            debug!(index, "jump_to ignored for continuous session");
            return;
        };
        let total = steps.len();
        *cursor = index.min(total);
        let at_end = *cursor == total;
        self.timer.clear();
        if at_end {
            self.set_run_state(RunState::Completed);
        } else if self.run_state == RunState::Completed {
            self.set_run_state(RunState::Paused);
        }
    }

    /// Applies new parameters to the continuous session without restarting
    /// it. A different system kind replaces the session instead.
    pub fn reconfigure(&mut self, config: SystemConfig) -> SimResult<()> {
        if let Some(Timeline::Continuous {
            config: current,
            simulation,
        }) = &mut self.timeline
        {
            if current.kind() == config.kind() {
                let (system, initial) = config.build()?;
                simulation.reconfigure(system, initial);
                *current = config;
                debug!(system = ?config.kind(), "parameters updated");
                return Ok(());
            }
        }
        self.load_simulation(config)
    }

    /// Advances the session identified by `token` by one host frame.
    pub fn tick(&mut self, token: SessionToken, now_ms: f64) -> TickOutcome {
        if !self.is_current(token) {
            trace!(
                token = token.generation,
                current = self.generation,
                "dropping stale tick"
            );
            return TickOutcome::Stale;
        }

        let frame = self.clock.tick(now_ms);
        if self.run_state != RunState::Running {
            return TickOutcome::Deferred;
        }

        let speed = self.speed;
        let outcome = match &mut self.timeline {
            None => TickOutcome::Deferred,
            Some(Timeline::Discrete { steps, cursor }) => {
                let interval = self.settings.step_interval(speed);
                let delta = self.settings.discrete_delta(frame.raw, interval);
                let due = self.timer.accumulate(delta, interval);
                let advanced = due.min(steps.len() - *cursor);
                *cursor += advanced;
                if *cursor == steps.len() {
                    TickOutcome::Completed
                } else if advanced == 0 {
                    TickOutcome::Deferred
                } else {
                    TickOutcome::Advanced { steps: advanced }
                }
            }
            Some(Timeline::Continuous { simulation, .. }) => {
                match simulation.advance(frame.delta * speed, self.settings.max_substeps) {
                    Ok(steps) => {
                        simulation.record();
                        if simulation.is_finished() {
                            TickOutcome::Completed
                        } else {
                            TickOutcome::Advanced { steps }
                        }
                    }
                    Err(err) => {
                        let time = simulation.state().time;
                        warn!(%err, time, "integrator diverged; holding last state");
                        simulation.record();
                        TickOutcome::Completed
                    }
                }
            }
        };

        if outcome == TickOutcome::Completed {
            self.set_run_state(RunState::Completed);
        }
        outcome
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        let run_state = self.run_state;
        let speed = self.speed;
        Some(match self.timeline.as_ref()? {
            Timeline::Continuous { simulation, .. } => {
                let state = simulation.state().clone();
                let system = simulation.system();
                Snapshot::Continuous {
                    run_state,
                    speed,
                    system: system.kind(),
                    readout: system.readout(&state),
                    state,
                }
            }
            Timeline::Discrete { steps, cursor } => Snapshot::Discrete {
                run_state,
                speed,
                step: cursor.checked_sub(1).and_then(|i| steps.get(i)).cloned(),
                index: *cursor,
                total: steps.len(),
            },
        })
    }

    pub fn cursor(&self) -> Option<Cursor> {
        Some(match self.timeline.as_ref()? {
            Timeline::Continuous { simulation, .. } => Cursor::Time(simulation.state().time),
            Timeline::Discrete { cursor, .. } => Cursor::Index(*cursor),
        })
    }

    pub fn steps(&self) -> Option<&[AlgorithmStep]> {
        match self.timeline.as_ref()? {
            Timeline::Discrete { steps, .. } => Some(steps),
            Timeline::Continuous { .. } => None,
        }
    }

    pub fn history(&self) -> Option<&History> {
        match self.timeline.as_ref()? {
            Timeline::Continuous { simulation, .. } => Some(simulation.history()),
            Timeline::Discrete { .. } => None,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn token(&self) -> SessionToken {
        SessionToken {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        token.generation == self.generation
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn rewind(&mut self) {
        self.clock.reset();
        self.timer.clear();
        match &mut self.timeline {
            Some(Timeline::Continuous { simulation, .. }) => simulation.reset(),
            Some(Timeline::Discrete { cursor, .. }) => *cursor = 0,
            None => {}
        }
    }

    fn set_run_state(&mut self, next: RunState) {
        if self.run_state != next {
            debug!(from = ?self.run_state, to = ?next, "run state");
            self.run_state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlaybackController;
    use crate::algorithms::{binary_search_steps, multiply_steps, AlgorithmStep, SearchStep};
    use crate::physics::{InclineParams, OscillatorParams, ParticleParams, RcParams, SystemConfig};
    use crate::playback::types::{
        Cursor, PlaybackSettings, RunState, SessionToken, Snapshot, TickOutcome,
    };
    use tracing_test::traced_test;

    const FRAME_MS: f64 = 100.0;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    /// One discrete step per 100 ms frame at speed 1.
    fn discrete_settings() -> PlaybackSettings {
        PlaybackSettings {
            step_interval_ms: 100.0,
            max_frame_delta: 0.25,
            ..PlaybackSettings::default()
        }
    }

    fn search_trace() -> Vec<SearchStep> {
        binary_search_steps(&[2, 5, 8, 12, 16, 23, 38, 45, 56, 72, 91], 12)
    }

    fn discrete() -> PlaybackController {
        let mut ctrl = PlaybackController::new(discrete_settings()).expect("settings");
        ctrl.load_steps(search_trace());
        ctrl
    }

    /// Ticks `frames` frames, `FRAME_MS` apart, starting after `*now`.
    fn run(ctrl: &mut PlaybackController, token: SessionToken, now: &mut f64, frames: usize) {
        for _ in 0..frames {
            *now += FRAME_MS;
            ctrl.tick(token, *now);
        }
    }

    fn index(ctrl: &PlaybackController) -> usize {
        match ctrl.cursor() {
            Some(Cursor::Index(i)) => i,
            other => panic!("expected discrete cursor, got {other:?}"),
        }
    }

    #[test]
    fn discrete_session_steps_once_per_interval_then_completes() {
        let mut ctrl = discrete();
        let token = ctrl.start().expect("loaded");
        assert_eq!(ctrl.run_state(), RunState::Running);

        assert_eq!(ctrl.tick(token, 0.0), TickOutcome::Deferred);
        assert_eq!(ctrl.tick(token, 100.0), TickOutcome::Advanced { steps: 1 });
        assert_eq!(ctrl.tick(token, 200.0), TickOutcome::Advanced { steps: 1 });
        assert_eq!(ctrl.tick(token, 300.0), TickOutcome::Completed);
        assert_eq!(ctrl.run_state(), RunState::Completed);
        assert_eq!(index(&ctrl), 3);

        // Completed sessions stop auto-advancing.
        assert_eq!(ctrl.tick(token, 400.0), TickOutcome::Deferred);
        assert_eq!(index(&ctrl), 3);
    }

    #[test]
    fn snapshot_shows_last_applied_step() {
        let mut ctrl = discrete();
        let token = ctrl.start().expect("loaded");
        match ctrl.snapshot() {
            Some(Snapshot::Discrete { step, index, total, .. }) => {
                assert!(step.is_none());
                assert_eq!((index, total), (0, 3));
            }
            other => panic!("unexpected snapshot {other:?}"),
        }

        let mut now = 0.0;
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 1);
        let expected = AlgorithmStep::Search(search_trace()[0]);
        match ctrl.snapshot() {
            Some(Snapshot::Discrete { step, index, .. }) => {
                assert_eq!(step, Some(expected));
                assert_eq!(index, 1);
            }
            other => panic!("unexpected snapshot {other:?}"),
        }
    }

    #[test]
    fn pause_and_resume_keep_the_cursor() {
        let mut ctrl = discrete();
        let token = ctrl.start().expect("loaded");
        let mut now = 0.0;
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 1);
        assert_eq!(index(&ctrl), 1);

        ctrl.pause();
        assert_eq!(ctrl.run_state(), RunState::Paused);
        run(&mut ctrl, token, &mut now, 20);
        assert_eq!(index(&ctrl), 1);

        // A long wall-clock gap while paused is not replayed.
        ctrl.resume();
        now += 60_000.0;
        assert_eq!(ctrl.tick(token, now), TickOutcome::Deferred);
        assert_eq!(index(&ctrl), 1);
        run(&mut ctrl, token, &mut now, 1);
        assert_eq!(index(&ctrl), 2);
    }

    #[test]
    fn stop_from_any_state_returns_to_idle_at_zero() {
        let mut now = 0.0;

        let mut ctrl = discrete();
        ctrl.stop();
        assert_eq!(ctrl.run_state(), RunState::Idle);
        assert_eq!(index(&ctrl), 0);

        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 1);
        ctrl.stop();
        assert_eq!((ctrl.run_state(), index(&ctrl)), (RunState::Idle, 0));

        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 2);
        ctrl.pause();
        ctrl.stop();
        assert_eq!((ctrl.run_state(), index(&ctrl)), (RunState::Idle, 0));

        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 5);
        assert_eq!(ctrl.run_state(), RunState::Completed);
        ctrl.reset();
        assert_eq!((ctrl.run_state(), index(&ctrl)), (RunState::Idle, 0));
    }

    #[traced_test]
    #[test]
    fn stale_tokens_are_dropped() {
        let mut ctrl = discrete();
        let first = ctrl.start().expect("loaded");
        let second = ctrl.start().expect("loaded");
        assert_ne!(first, second);

        let mut now = 0.0;
        ctrl.tick(second, now);
        now += FRAME_MS;
        assert_eq!(ctrl.tick(first, now), TickOutcome::Stale);
        assert_eq!(index(&ctrl), 0);
        assert!(logs_contain("dropping stale tick"));

        ctrl.stop();
        now += FRAME_MS;
        assert_eq!(ctrl.tick(second, now), TickOutcome::Stale);
        assert_eq!(ctrl.run_state(), RunState::Idle);
    }

    #[test]
    fn double_start_restarts_from_zero() {
        let mut ctrl = discrete();
        let first = ctrl.start().expect("loaded");
        let mut now = 0.0;
        ctrl.tick(first, now);
        run(&mut ctrl, first, &mut now, 2);
        assert_eq!(index(&ctrl), 2);

        let second = ctrl.start().expect("loaded");
        assert_eq!(index(&ctrl), 0);
        // Interleaved callbacks from both sessions advance only the live one.
        ctrl.tick(second, now);
        for _ in 0..2 {
            now += FRAME_MS;
            assert_eq!(ctrl.tick(first, now), TickOutcome::Stale);
            ctrl.tick(second, now);
        }
        assert_eq!(index(&ctrl), 2);
    }

    #[test]
    fn slow_frames_still_play_one_step_per_interval() {
        let a = nalgebra::DMatrix::from_row_slice(3, 3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_steps(multiply_steps(&a, &a));
        let token = ctrl.start().expect("loaded");

        // 10 fps host, 600 ms step interval.
        let mut now = 0.0;
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 5);
        assert_eq!(index(&ctrl), 0);
        run(&mut ctrl, token, &mut now, 1);
        assert_eq!(index(&ctrl), 1);
        run(&mut ctrl, token, &mut now, 54);
        assert_eq!(index(&ctrl), 10);
    }

    #[test]
    fn stalled_frame_counts_at_most_one_interval() {
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_steps(binary_search_steps(&(0..64).collect::<Vec<_>>(), 0));
        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, 0.0);
        assert_eq!(ctrl.tick(token, 60_000.0), TickOutcome::Advanced { steps: 1 });
    }

    #[test]
    fn empty_trace_completes_immediately() {
        let mut ctrl = PlaybackController::new(discrete_settings()).expect("settings");
        ctrl.load_steps(binary_search_steps(&[], 4));
        ctrl.start().expect("loaded");
        assert_eq!(ctrl.run_state(), RunState::Completed);
    }

    #[test]
    fn start_without_a_session_is_ignored() {
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        assert!(ctrl.start().is_none());
        assert!(ctrl.snapshot().is_none());
        assert_eq!(ctrl.run_state(), RunState::Idle);
    }

    #[test]
    fn speed_scales_the_step_interval_from_the_next_tick() {
        let mut ctrl = PlaybackController::new(discrete_settings()).expect("settings");
        ctrl.load_steps(binary_search_steps(&(0..64).collect::<Vec<_>>(), 0));
        let token = ctrl.start().expect("loaded");
        let mut now = 0.0;
        ctrl.tick(token, now);
        run(&mut ctrl, token, &mut now, 1);
        assert_eq!(index(&ctrl), 1);

        ctrl.set_speed(2.0);
        now += FRAME_MS;
        assert_eq!(ctrl.tick(token, now), TickOutcome::Advanced { steps: 2 });

        ctrl.set_speed(100.0);
        assert_eq!(ctrl.speed(), 8.0);
        ctrl.set_speed(f64::NAN);
        ctrl.set_speed(-1.0);
        assert_eq!(ctrl.speed(), 8.0);
    }

    #[test]
    fn jump_to_moves_the_cursor() {
        let mut ctrl = discrete();
        ctrl.jump_to(2);
        assert_eq!(index(&ctrl), 0);

        ctrl.start().expect("loaded");
        ctrl.pause();
        ctrl.jump_to(2);
        assert_eq!((index(&ctrl), ctrl.run_state()), (2, RunState::Paused));

        ctrl.jump_to(99);
        assert_eq!((index(&ctrl), ctrl.run_state()), (3, RunState::Completed));

        ctrl.jump_to(1);
        assert_eq!((index(&ctrl), ctrl.run_state()), (1, RunState::Paused));
    }

    #[test]
    fn commands_invalid_for_the_state_are_ignored() {
        let mut ctrl = discrete();
        ctrl.resume();
        assert_eq!(ctrl.run_state(), RunState::Idle);
        ctrl.pause();
        assert_eq!(ctrl.run_state(), RunState::Idle);

        ctrl.start().expect("loaded");
        ctrl.resume();
        assert_eq!(ctrl.run_state(), RunState::Running);
    }

    fn continuous_settings(duration: Option<f64>) -> PlaybackSettings {
        PlaybackSettings {
            duration,
            ..PlaybackSettings::default()
        }
    }

    #[test]
    fn continuous_session_runs_until_duration() {
        let mut ctrl = PlaybackController::new(continuous_settings(Some(0.5))).expect("settings");
        ctrl.load_simulation(SystemConfig::Oscillator(OscillatorParams::default()))
            .expect("load");
        let token = ctrl.start().expect("loaded");

        let mut now = 0.0;
        let mut ticks = 0;
        while ctrl.run_state() == RunState::Running && ticks < 100 {
            ctrl.tick(token, now);
            now += 50.0;
            ticks += 1;
        }
        assert_eq!(ctrl.run_state(), RunState::Completed);
        match ctrl.cursor() {
            Some(Cursor::Time(t)) => assert!((t - 0.5).abs() < 1e-9, "t = {t}"),
            other => panic!("expected time cursor, got {other:?}"),
        }
        let history = ctrl.history().expect("continuous history");
        assert!(!history.is_empty());
        let times: Vec<f64> = history.iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn speed_scales_simulated_time() {
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_simulation(SystemConfig::RcCircuit(RcParams::default()))
            .expect("load");
        ctrl.set_speed(4.0);
        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, 0.0);
        ctrl.tick(token, 50.0);
        match ctrl.cursor() {
            Some(Cursor::Time(t)) => assert!((t - 0.2).abs() < 1e-9, "t = {t}"),
            other => panic!("expected time cursor, got {other:?}"),
        }
    }

    /// Runs an RC session with default playback settings for `time_constants`
    /// time constants and returns the capacitor voltage over the source.
    fn charge_fraction_after(params: RcParams, time_constants: f64) -> f64 {
        let tau = params.build().expect("circuit").time_constant();
        let mut ctrl = PlaybackController::new(continuous_settings(Some(time_constants * tau)))
            .expect("settings");
        ctrl.load_simulation(SystemConfig::RcCircuit(params)).expect("load");
        let token = ctrl.start().expect("loaded");

        let mut now = 0.0;
        for _ in 0..10_000 {
            if ctrl.tick(token, now) == TickOutcome::Completed {
                break;
            }
            now += 16.0;
        }
        assert_eq!(ctrl.run_state(), RunState::Completed);
        match ctrl.snapshot() {
            Some(Snapshot::Continuous { state, .. }) => state.values[0] / params.source_voltage,
            other => panic!("unexpected snapshot {other:?}"),
        }
    }

    #[test]
    fn rc_time_constant_marks_hold_across_the_parameter_range() {
        // Default, fastest (tau = 0.1 ms) and slowest (tau = 0.5 s) circuits.
        for (resistance, capacitance_uf) in [(100.0, 100.0), (10.0, 10.0), (1000.0, 500.0)] {
            let params = RcParams {
                resistance,
                capacitance_uf,
                ..RcParams::default()
            };
            let at_tau = charge_fraction_after(params, 1.0);
            assert!(
                (at_tau - 0.632).abs() < 0.005,
                "R = {resistance}, C = {capacitance_uf}: {at_tau} at tau"
            );
            let at_five_tau = charge_fraction_after(params, 5.0);
            assert!(
                at_five_tau > 0.99 && at_five_tau <= 1.0,
                "R = {resistance}, C = {capacitance_uf}: {at_five_tau} at 5 tau"
            );
        }
    }

    #[test]
    fn fastest_circuit_never_overshoots_the_source() {
        let params = RcParams {
            resistance: 10.0,
            capacitance_uf: 10.0,
            ..RcParams::default()
        };
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_simulation(SystemConfig::RcCircuit(params)).expect("load");
        let token = ctrl.start().expect("loaded");
        let mut now = 0.0;
        for _ in 0..50 {
            assert_ne!(ctrl.tick(token, now), TickOutcome::Completed);
            now += 50.0;
            match ctrl.snapshot() {
                Some(Snapshot::Continuous { state, .. }) => {
                    let v = state.values[0];
                    assert!((0.0..=9.0).contains(&v), "voltage {v}");
                }
                other => panic!("unexpected snapshot {other:?}"),
            }
        }
    }

    #[test]
    fn incline_completes_at_the_bottom_and_stop_restores_initial_state() {
        let params = InclineParams {
            angle_deg: 60.0,
            static_friction: 0.1,
            kinetic_friction: 0.1,
            ramp_length: 0.5,
            mass: 1.0,
        };
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_simulation(SystemConfig::Incline(params)).expect("load");
        let token = ctrl.start().expect("loaded");

        let mut now = 0.0;
        for _ in 0..200 {
            if ctrl.tick(token, now) == TickOutcome::Completed {
                break;
            }
            now += 50.0;
        }
        assert_eq!(ctrl.run_state(), RunState::Completed);

        ctrl.stop();
        match ctrl.snapshot() {
            Some(Snapshot::Continuous { run_state, state, .. }) => {
                assert_eq!(run_state, RunState::Idle);
                assert_eq!(state.values, vec![0.0, 0.0, 0.0]);
                assert_eq!(state.time, 0.0);
            }
            other => panic!("unexpected snapshot {other:?}"),
        }
        assert!(ctrl.history().expect("history").is_empty());
    }

    #[test]
    fn reconfigure_keeps_the_session_running() {
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_simulation(SystemConfig::Oscillator(OscillatorParams::default()))
            .expect("load");
        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, 0.0);
        ctrl.tick(token, 50.0);

        let stiffer = OscillatorParams {
            stiffness: 50.0,
            ..OscillatorParams::default()
        };
        ctrl.reconfigure(SystemConfig::Oscillator(stiffer))
            .expect("reconfigure");
        assert_eq!(ctrl.run_state(), RunState::Running);
        assert_eq!(ctrl.tick(token, 100.0), TickOutcome::Advanced { steps: 10 });

        // Switching system kind loads a fresh session.
        ctrl.reconfigure(SystemConfig::RcCircuit(RcParams::default()))
            .expect("reconfigure");
        assert_eq!(ctrl.run_state(), RunState::Idle);
        assert_eq!(ctrl.tick(token, 150.0), TickOutcome::Stale);
    }

    #[test]
    fn reconfigure_applies_new_initial_conditions_on_restart() {
        let slow = ParticleParams {
            speed: 2.0,
            ..ParticleParams::default()
        };
        let mut ctrl = PlaybackController::new(PlaybackSettings::default()).expect("settings");
        ctrl.load_simulation(SystemConfig::ChargedParticle(slow)).expect("load");
        let token = ctrl.start().expect("loaded");
        ctrl.tick(token, 0.0);
        ctrl.tick(token, 50.0);

        let fast = ParticleParams {
            speed: 10.0,
            ..ParticleParams::default()
        };
        ctrl.reconfigure(SystemConfig::ChargedParticle(fast)).expect("reconfigure");
        ctrl.stop();
        ctrl.start().expect("loaded");
        match ctrl.snapshot() {
            Some(Snapshot::Continuous { state, .. }) => {
                assert_eq!(state.time, 0.0);
                assert_eq!(state.values[2], 10.0);
                assert_eq!(state.values[3], 0.0);
            }
            other => panic!("unexpected snapshot {other:?}"),
        }
    }

    #[test]
    fn settings_are_validated() {
        let bad = PlaybackSettings {
            max_step: 0.0,
            ..PlaybackSettings::default()
        };
        assert_err_contains(PlaybackController::new(bad).map(|_| ()), "max_step");

        let bad = PlaybackSettings {
            min_speed: 4.0,
            max_speed: 2.0,
            ..PlaybackSettings::default()
        };
        assert_err_contains(bad.validate(), "max_speed");

        let bad = PlaybackSettings {
            duration: Some(f64::NAN),
            ..PlaybackSettings::default()
        };
        assert_err_contains(bad.validate(), "duration");

        let bad = PlaybackSettings {
            stall_delta: -1.0,
            ..PlaybackSettings::default()
        };
        assert_err_contains(bad.validate(), "stall_delta");
        assert!(PlaybackSettings::default().validate().is_ok());
    }
}
