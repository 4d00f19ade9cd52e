//! Per-leg stepping state machine.
//!
//! A [`LegStepper`] owns two poses: the home anchor (where the foot would
//! like to rest, moved by ground placement) and the foot target (what the IK
//! solver reaches for). When the foot drifts too far from home, or has sat
//! idle for too long, a [`Step`] animates it back along a raised quadratic
//! Bezier arc with cubic ease-in-out timing.

use nalgebra::Vector3;
use tracing::{debug, trace};

use strider_core::config::StepConfig;
use strider_core::math::{
    DEGENERATE_EPSILON, ease_in_out_cubic, project_on_plane, quadratic_bezier, slerp_safe,
};
use strider_core::types::{LegId, Pose};

/// Stepping state of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState {
    /// Never stepped since construction or reset.
    Resting,
    /// A step is in progress.
    Stepping,
    /// Planted after a step; the idle re-placement timer is running.
    SettledWaiting,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One in-flight foot transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    start: Pose,
    end: Pose,
    control: Vector3<f32>,
    duration: f32,
    elapsed: f32,
}

impl Step {
    /// Plan a step from `foot` toward `home`.
    ///
    /// The landing point overshoots home by `overshoot` metres along the
    /// foot → home direction flattened onto the plane normal to `up`. The
    /// Bezier control point sits above the midpoint by half the step length
    /// times `curve_height`.
    #[must_use]
    pub fn plan(
        foot: &Pose,
        home: &Pose,
        up: &Vector3<f32>,
        overshoot: f32,
        curve_height: f32,
        duration: f32,
    ) -> Self {
        let toward_home = home.position - foot.position;
        let overshoot_vec = if toward_home.norm() > DEGENERATE_EPSILON {
            project_on_plane(&(toward_home.normalize() * overshoot), up)
        } else {
            Vector3::zeros()
        };
        let end_point = home.position + overshoot_vec;

        let up_dir = up.try_normalize(DEGENERATE_EPSILON).unwrap_or_else(Vector3::y);
        let lift = (end_point - foot.position).norm() / 2.0 * curve_height;
        let control = (foot.position + end_point) / 2.0 + up_dir * lift;

        Self {
            start: *foot,
            end: Pose::new(end_point, home.orientation),
            control,
            duration,
            elapsed: 0.0,
        }
    }

    /// Pose along the arc at normalized time `t` (eased, clamped).
    #[must_use]
    pub fn sample(&self, t: f32) -> Pose {
        let eased = ease_in_out_cubic(t);
        let position =
            quadratic_bezier(&self.start.position, &self.control, &self.end.position, eased);
        let orientation = slerp_safe(&self.start.orientation, &self.end.orientation, eased);
        Pose::new(position, orientation)
    }

    /// Advance by `dt` seconds and return the new foot pose.
    pub fn advance(&mut self, dt: f32) -> Pose {
        self.elapsed += dt.max(0.0);
        self.sample(self.progress())
    }

    /// Elapsed fraction of the step in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub const fn start(&self) -> &Pose {
        &self.start
    }

    pub const fn end(&self) -> &Pose {
        &self.end
    }

    pub const fn control(&self) -> &Vector3<f32> {
        &self.control
    }

    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

// ---------------------------------------------------------------------------
// LegStepper
// ---------------------------------------------------------------------------

/// What happened to a stepper during one [`LegStepper::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// Nothing changed state.
    None,
    /// The in-flight step landed this tick.
    Landed,
    /// The idle timer ran out; the next offered trigger forces a step.
    IdleResetDue,
}

/// Decides when one leg steps and animates its foot target.
#[derive(Debug, Clone)]
pub struct LegStepper {
    id: LegId,
    config: StepConfig,
    home: Pose,
    foot: Pose,
    state: LegState,
    step: Option<Step>,
    idle_remaining: Option<f32>,
    idle_due: bool,
    steps_started: u64,
}

impl LegStepper {
    /// Create a stepper whose foot starts planted on `home`.
    #[must_use]
    pub fn new(id: LegId, config: StepConfig, home: Pose) -> Self {
        Self {
            id,
            config,
            home,
            foot: home,
            state: LegState::Resting,
            step: None,
            idle_remaining: None,
            idle_due: false,
            steps_started: 0,
        }
    }

    pub const fn id(&self) -> LegId {
        self.id
    }

    pub const fn config(&self) -> &StepConfig {
        &self.config
    }

    pub const fn state(&self) -> LegState {
        self.state
    }

    /// True for the whole of a step, false otherwise.
    pub const fn moving(&self) -> bool {
        matches!(self.state, LegState::Stepping)
    }

    /// Home anchor pose.
    pub const fn home(&self) -> &Pose {
        &self.home
    }

    /// Move the home anchor. Takes effect at the next step.
    pub fn set_home(&mut self, home: Pose) {
        self.home = home;
    }

    /// Current foot target pose.
    pub const fn foot(&self) -> &Pose {
        &self.foot
    }

    /// The in-flight step, if any.
    pub const fn current_step(&self) -> Option<&Step> {
        self.step.as_ref()
    }

    /// Steps started since construction.
    pub const fn steps_started(&self) -> u64 {
        self.steps_started
    }

    /// Whether the idle timer has expired and a forced step is pending.
    pub const fn idle_reset_due(&self) -> bool {
        self.idle_due
    }

    /// Seconds left on the idle timer, if armed.
    pub const fn idle_remaining(&self) -> Option<f32> {
        self.idle_remaining
    }

    #[must_use]
    pub fn distance_from_home(&self) -> f32 {
        (self.foot.position - self.home.position).norm()
    }

    /// Whether a trigger offered now would start a step.
    #[must_use]
    pub fn wants_step(&self) -> bool {
        !self.moving()
            && (self.idle_due || self.distance_from_home() > self.config.step_trigger_distance)
    }

    /// Start a step if one is wanted. A no-op while moving.
    ///
    /// `up` is the body's up axis; it flattens the overshoot and lifts the
    /// arc. Returns whether a step started.
    pub fn try_move(&mut self, up: &Vector3<f32>) -> bool {
        if !self.wants_step() {
            return false;
        }

        let forced = self.idle_due
            && self.distance_from_home() <= self.config.step_trigger_distance;
        let overshoot = self.config.step_trigger_distance * self.config.overshoot_fraction;
        let step = Step::plan(
            &self.foot,
            &self.home,
            up,
            overshoot,
            self.config.curve_height,
            self.config.move_duration,
        );
        debug!(
            leg = %self.id,
            forced,
            distance = self.distance_from_home(),
            "step started"
        );

        self.step = Some(step);
        self.state = LegState::Stepping;
        self.idle_remaining = None;
        self.idle_due = false;
        self.steps_started += 1;
        true
    }

    /// Advance the stepper by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> StepEvent {
        match self.state {
            LegState::Resting => StepEvent::None,
            LegState::Stepping => self.advance_step(dt),
            LegState::SettledWaiting => self.advance_idle(dt),
        }
    }

    /// Snap the foot onto `home` and forget any step or timer.
    pub fn reset(&mut self, home: Pose) {
        self.home = home;
        self.foot = home;
        self.state = LegState::Resting;
        self.step = None;
        self.idle_remaining = None;
        self.idle_due = false;
    }

    fn advance_step(&mut self, dt: f32) -> StepEvent {
        let Some(step) = self.step.as_mut() else {
            self.state = LegState::SettledWaiting;
            return StepEvent::None;
        };
        self.foot = step.advance(dt);
        if !step.is_finished() {
            return StepEvent::None;
        }

        self.foot = *step.end();
        self.step = None;
        self.state = LegState::SettledWaiting;
        self.idle_remaining = Some(self.config.rest_timer);
        trace!(leg = %self.id, "step landed");
        StepEvent::Landed
    }

    fn advance_idle(&mut self, dt: f32) -> StepEvent {
        let Some(remaining) = self.idle_remaining.as_mut() else {
            return StepEvent::None;
        };
        *remaining -= dt.max(0.0);
        if *remaining > 0.0 {
            return StepEvent::None;
        }
        self.idle_remaining = None;
        self.idle_due = true;
        debug!(leg = %self.id, "idle reset due");
        StepEvent::IdleResetDue
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn config() -> StepConfig {
        StepConfig {
            step_trigger_distance: 0.5,
            move_duration: 1.0,
            overshoot_fraction: 0.0,
            curve_height: 1.0,
            rest_timer: 3.0,
        }
    }

    fn up() -> Vector3<f32> {
        Vector3::y()
    }

    fn stepper_at_origin() -> LegStepper {
        LegStepper::new(LegId::FrontLeft, config(), Pose::identity())
    }

    #[test]
    fn fresh_stepper_is_resting() {
        let leg = stepper_at_origin();
        assert_eq!(leg.state(), LegState::Resting);
        assert!(!leg.moving());
        assert_relative_eq!(leg.distance_from_home(), 0.0);
    }

    #[test]
    fn no_step_within_trigger_distance() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.4, 0.0, 0.0)));
        assert!(!leg.try_move(&up()));
        assert!(!leg.moving());
    }

    #[test]
    fn step_starts_beyond_trigger_distance() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        assert!(leg.try_move(&up()));
        assert!(leg.moving());
        assert_eq!(leg.state(), LegState::Stepping);
        assert_eq!(leg.steps_started(), 1);
    }

    #[test]
    fn try_move_is_noop_while_moving() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        assert!(leg.try_move(&up()));
        let step = *leg.current_step().unwrap();

        leg.set_home(Pose::from_position(Vector3::new(5.0, 0.0, 0.0)));
        for _ in 0..5 {
            assert!(!leg.try_move(&up()));
        }
        assert_eq!(leg.current_step().unwrap(), &step);
        assert_eq!(leg.steps_started(), 1);
    }

    #[test]
    fn step_lands_exactly_on_home_after_duration() {
        let mut leg = stepper_at_origin();
        let home = Pose::from_position(Vector3::new(0.0, 0.0, 0.6));
        leg.set_home(home);
        leg.try_move(&up());

        let mut events = Vec::new();
        for _ in 0..7 {
            events.push(leg.tick(0.15));
        }
        // 7 * 0.15 = 1.05 >= 1.0: the last tick lands.
        assert_eq!(events.last(), Some(&StepEvent::Landed));
        assert_eq!(events.iter().filter(|e| **e == StepEvent::Landed).count(), 1);
        assert!(!leg.moving());
        assert_eq!(leg.state(), LegState::SettledWaiting);
        assert_relative_eq!(leg.foot().position, home.position, epsilon = 1e-6);
    }

    #[test]
    fn moving_is_true_for_the_whole_step() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        leg.try_move(&up());
        for _ in 0..3 {
            leg.tick(0.25);
            assert!(leg.moving());
        }
        leg.tick(0.25);
        assert!(!leg.moving());
    }

    #[test]
    fn arc_rises_above_the_straight_line() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 1.0)));
        leg.try_move(&up());
        let step = *leg.current_step().unwrap();
        // Control point is lifted by half the step length.
        assert_relative_eq!(*step.control(), Vector3::new(0.0, 0.5, 0.5), epsilon = 1e-6);
        let mid = step.sample(0.5);
        assert_relative_eq!(mid.position, Vector3::new(0.0, 0.25, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn curve_height_scales_the_lift() {
        let flat = Step::plan(
            &Pose::identity(),
            &Pose::from_position(Vector3::new(1.0, 0.0, 0.0)),
            &Vector3::y(),
            0.0,
            0.0,
            1.0,
        );
        assert_relative_eq!(flat.control().y, 0.0);
        let tall = Step::plan(
            &Pose::identity(),
            &Pose::from_position(Vector3::new(1.0, 0.0, 0.0)),
            &Vector3::y(),
            0.0,
            2.0,
            1.0,
        );
        assert_relative_eq!(tall.control().y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn overshoot_is_flattened_onto_ground_plane() {
        // Home is above and ahead; the overshoot only extends along the ground.
        let step = Step::plan(
            &Pose::identity(),
            &Pose::from_position(Vector3::new(0.0, 1.0, 1.0)),
            &Vector3::y(),
            0.5,
            1.0,
            1.0,
        );
        let expected_z = 1.0 + 0.5 * std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(step.end().position, Vector3::new(0.0, 1.0, expected_z), epsilon = 1e-5);
    }

    #[test]
    fn rotation_slerps_to_home_rotation() {
        let mut leg = stepper_at_origin();
        let turned = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        leg.set_home(Pose::new(Vector3::new(0.0, 0.0, 0.6), turned));
        leg.try_move(&up());
        leg.tick(0.5);
        let halfway = leg.foot().orientation;
        assert_relative_eq!(halfway.angle(), 0.5, epsilon = 1e-4);
        leg.tick(0.5);
        assert_relative_eq!(leg.foot().orientation, turned, epsilon = 1e-5);
    }

    #[test]
    fn idle_timer_forces_a_step_when_offered() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        leg.try_move(&up());
        leg.tick(1.0);
        assert_eq!(leg.idle_remaining(), Some(3.0));

        assert_eq!(leg.tick(2.0), StepEvent::None);
        assert!(!leg.idle_reset_due());
        assert_eq!(leg.tick(1.0), StepEvent::IdleResetDue);
        assert!(leg.idle_reset_due());
        // Still planted until a trigger is offered.
        assert!(!leg.moving());

        assert!(leg.try_move(&up()));
        assert!(leg.moving());
        assert!(!leg.idle_reset_due());
        assert_eq!(leg.idle_remaining(), None);
        assert_eq!(leg.steps_started(), 2);
    }

    #[test]
    fn new_step_discards_pending_idle_timer() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        leg.try_move(&up());
        leg.tick(1.0);
        leg.tick(1.0);
        assert!(leg.idle_remaining().is_some());

        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 1.5)));
        assert!(leg.try_move(&up()));
        assert_eq!(leg.idle_remaining(), None);
        leg.tick(1.0);
        // Timer re-armed from full.
        assert_eq!(leg.idle_remaining(), Some(3.0));
    }

    #[test]
    fn resting_stepper_has_no_idle_timer() {
        let mut leg = stepper_at_origin();
        for _ in 0..100 {
            assert_eq!(leg.tick(0.1), StepEvent::None);
        }
        assert!(!leg.idle_reset_due());
        assert!(!leg.try_move(&up()));
    }

    #[test]
    fn reset_snaps_foot_to_home() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        leg.try_move(&up());
        leg.tick(0.3);
        let home = Pose::from_position(Vector3::new(2.0, 0.0, 0.0));
        leg.reset(home);
        assert_eq!(leg.state(), LegState::Resting);
        assert_eq!(leg.foot(), &home);
        assert!(leg.current_step().is_none());
    }

    #[test]
    fn zero_dt_tick_does_not_advance() {
        let mut leg = stepper_at_origin();
        leg.set_home(Pose::from_position(Vector3::new(0.0, 0.0, 0.6)));
        leg.try_move(&up());
        leg.tick(0.0);
        assert!(leg.moving());
        assert_relative_eq!(leg.foot().position, Vector3::zeros());
    }
}
