// PlacentaFlow - Sequential Placental Circulation Animator
// Licensed under MIT License

//! Stage/timer controller.
//!
//! Owns the animation state and the two scheduled-task handles that drive it:
//! a repeating tick deadline (fires every [`TICK_PERIOD`] while playing) and a
//! one-shot advance deadline (fires [`ADVANCE_DELAY`] after a stage's reveal
//! completes with auto-advance enabled). Deadlines are plain data owned by the
//! controller, so dropping the controller cancels everything pending.

use std::time::{Duration, Instant};

use crate::stages::FINAL_STAGE;

pub const TICK_PERIOD: Duration = Duration::from_millis(50);
pub const ADVANCE_DELAY: Duration = Duration::from_millis(500);

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 3.0;
pub const SPEED_STEP: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    /// Current stage, 0..=8.
    pub stage: usize,
    /// Reveal completion of the current stage, 0.0..=100.0.
    pub progress: f32,
    pub playing: bool,
    /// Progress added per tick, bounded by the speed slider.
    pub speed: f32,
    pub auto_advance: bool,
    pub show_labels: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            stage: 0,
            progress: 0.0,
            playing: false,
            speed: 1.0,
            auto_advance: true,
            show_labels: true,
        }
    }
}

pub struct StageController {
    pub state: AnimationState,
    next_tick: Option<Instant>,
    pending_advance: Option<Instant>,
}

impl StageController {
    pub fn new() -> Self {
        Self {
            state: AnimationState::default(),
            next_tick: None,
            pending_advance: None,
        }
    }

    pub fn toggle_play(&mut self) {
        self.state.playing = !self.state.playing;
        if !self.state.playing {
            self.next_tick = None;
        }
    }

    pub fn next_stage(&mut self) {
        let target = (self.state.stage + 1).min(FINAL_STAGE);
        self.enter_stage(target);
    }

    pub fn prev_stage(&mut self) {
        let target = self.state.stage.saturating_sub(1);
        self.enter_stage(target);
    }

    pub fn jump_to_stage(&mut self, stage: usize) {
        self.enter_stage(stage.min(FINAL_STAGE));
    }

    pub fn reset(&mut self) {
        self.state.stage = 0;
        self.state.progress = 0.0;
        self.state.playing = false;
        self.next_tick = None;
        self.pending_advance = None;
    }

    /// True while an auto-advance is scheduled but has not fired yet.
    pub fn advance_pending(&self) -> bool {
        self.pending_advance.is_some()
    }

    /// Fires every deadline that is due at `now`. Called once per frame from
    /// the event loop; a late frame catches up on all missed ticks at once.
    pub fn poll(&mut self, now: Instant) {
        if let Some(due) = self.pending_advance {
            if now >= due {
                self.pending_advance = None;
                // Auto-advance wraps from the final stage back to the start;
                // the Next button clamps instead. Observed behavior, kept.
                self.state.stage = if self.state.stage < FINAL_STAGE {
                    self.state.stage + 1
                } else {
                    0
                };
                self.state.progress = 0.0;
            }
        }

        if !self.state.playing {
            self.next_tick = None;
            return;
        }
        if self.next_tick.is_none() {
            self.next_tick = Some(now + TICK_PERIOD);
        }
        while let Some(due) = self.next_tick {
            if now < due {
                break;
            }
            self.next_tick = Some(due + TICK_PERIOD);
            self.tick(due);
        }
    }

    /// Earliest pending deadline, if any. Used for frame scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_tick, self.pending_advance) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn enter_stage(&mut self, stage: usize) {
        self.state.stage = stage;
        self.state.progress = 0.0;
        self.state.playing = true;
        self.pending_advance = None;
    }

    fn tick(&mut self, now: Instant) {
        let next = self.state.progress + self.state.speed;
        if next >= 100.0 {
            self.state.progress = 100.0;
            if self.state.auto_advance && self.pending_advance.is_none() {
                self.pending_advance = Some(now + ADVANCE_DELAY);
            }
        } else {
            self.state.progress = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_controller(speed: f32) -> StageController {
        let mut c = StageController::new();
        c.state.playing = true;
        c.state.speed = speed;
        c
    }

    /// Runs `ticks` full tick periods starting from a fresh deadline.
    fn run_ticks(c: &mut StageController, ticks: u32) -> Instant {
        let t0 = Instant::now();
        c.poll(t0); // seeds the tick deadline
        let end = t0 + TICK_PERIOD * ticks;
        c.poll(end);
        end
    }

    #[test]
    fn jump_to_stage_resets_progress_and_plays() {
        for n in 0..=FINAL_STAGE {
            let mut c = StageController::new();
            c.state.progress = 42.0;
            c.jump_to_stage(n);
            assert_eq!(c.state.stage, n);
            assert_eq!(c.state.progress, 0.0);
            assert!(c.state.playing);
        }
    }

    #[test]
    fn jump_to_stage_clamps_out_of_range() {
        let mut c = StageController::new();
        c.jump_to_stage(99);
        assert_eq!(c.state.stage, FINAL_STAGE);
    }

    #[test]
    fn next_stage_clamps_at_final_stage() {
        let mut c = StageController::new();
        c.jump_to_stage(FINAL_STAGE);
        c.next_stage();
        assert_eq!(c.state.stage, FINAL_STAGE);
        assert_eq!(c.state.progress, 0.0);
        assert!(c.state.playing);
    }

    #[test]
    fn prev_stage_clamps_at_zero() {
        let mut c = StageController::new();
        c.prev_stage();
        assert_eq!(c.state.stage, 0);
        assert!(c.state.playing);
    }

    #[test]
    fn reset_restores_initial_stage_regardless_of_prior_state() {
        let mut c = playing_controller(3.0);
        c.jump_to_stage(5);
        run_ticks(&mut c, 10);
        c.reset();
        assert_eq!(c.state.stage, 0);
        assert_eq!(c.state.progress, 0.0);
        assert!(!c.state.playing);
        assert!(!c.advance_pending());
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn progress_accumulates_speed_per_tick() {
        let mut c = playing_controller(2.0);
        c.state.auto_advance = false;
        run_ticks(&mut c, 13);
        assert_eq!(c.state.progress, 26.0);
    }

    #[test]
    fn progress_caps_at_one_hundred() {
        let mut c = playing_controller(3.0);
        c.state.auto_advance = false;
        run_ticks(&mut c, 50); // 150 pre-cap
        assert_eq!(c.state.progress, 100.0);
        assert_eq!(c.state.stage, 0);
        assert!(!c.advance_pending());
    }

    #[test]
    fn paused_controller_does_not_tick() {
        let mut c = StageController::new();
        c.state.speed = 2.0;
        run_ticks(&mut c, 20);
        assert_eq!(c.state.progress, 0.0);
    }

    #[test]
    fn auto_advance_moves_to_next_stage_after_delay() {
        let mut c = playing_controller(2.0);
        let end = run_ticks(&mut c, 50); // reaches 100 exactly
        assert_eq!(c.state.progress, 100.0);
        assert!(c.advance_pending());
        assert_eq!(c.state.stage, 0);

        c.poll(end + ADVANCE_DELAY + TICK_PERIOD);
        assert_eq!(c.state.stage, 1);
        assert!(!c.advance_pending());
    }

    #[test]
    fn auto_advance_schedules_only_one_pending_transition() {
        let mut c = playing_controller(2.0);
        let end = run_ticks(&mut c, 50);
        // Keep ticking past the cap; the pending advance must not stack.
        c.poll(end + TICK_PERIOD * 5);
        assert!(c.advance_pending());

        c.poll(end + ADVANCE_DELAY * 2);
        assert_eq!(c.state.stage, 1);
        // One transition only, even after a long quiet period.
        c.poll(end + ADVANCE_DELAY * 3);
        assert_eq!(c.state.stage, 1);
    }

    #[test]
    fn auto_advance_wraps_final_stage_to_zero() {
        let mut c = playing_controller(2.0);
        c.jump_to_stage(FINAL_STAGE);
        let end = run_ticks(&mut c, 50);
        c.poll(end + ADVANCE_DELAY + TICK_PERIOD);
        assert_eq!(c.state.stage, 0);
        assert_eq!(c.state.progress, 0.0);
    }

    #[test]
    fn manual_stage_change_cancels_pending_advance() {
        let mut c = playing_controller(2.0);
        let end = run_ticks(&mut c, 50);
        assert!(c.advance_pending());
        c.next_stage();
        assert!(!c.advance_pending());
        assert_eq!(c.state.stage, 1);

        // The cancelled advance must not fire later.
        c.state.playing = false;
        c.poll(end + ADVANCE_DELAY * 4);
        assert_eq!(c.state.stage, 1);
    }

    #[test]
    fn disabled_auto_advance_holds_at_cap() {
        let mut c = playing_controller(2.0);
        c.state.auto_advance = false;
        let end = run_ticks(&mut c, 60);
        assert_eq!(c.state.progress, 100.0);
        c.poll(end + ADVANCE_DELAY * 2);
        assert_eq!(c.state.stage, 0);
        assert_eq!(c.state.progress, 100.0);
    }

    #[test]
    fn pause_clears_tick_deadline_but_keeps_pending_advance() {
        let mut c = playing_controller(2.0);
        let end = run_ticks(&mut c, 50);
        c.toggle_play();
        assert!(!c.state.playing);
        assert!(c.advance_pending());

        c.poll(end + ADVANCE_DELAY + TICK_PERIOD);
        assert_eq!(c.state.stage, 1);
        assert_eq!(c.state.progress, 0.0);
    }

    #[test]
    fn stage_never_leaves_valid_range_under_rapid_input() {
        let mut c = StageController::new();
        for _ in 0..20 {
            c.next_stage();
        }
        assert_eq!(c.state.stage, FINAL_STAGE);
        for _ in 0..20 {
            c.prev_stage();
        }
        assert_eq!(c.state.stage, 0);
    }
}
