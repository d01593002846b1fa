//! Time-driven interpolation of scene properties.
//!
//! An [`Animator`] holds a value, a target and a timed transition between
//! them. Time is always passed in (seconds on the game clock); the animator
//! never reads a clock itself, which keeps `update` deterministic.

use glam::Vec3;

/// Values an [`Animator`] can interpolate.
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

/// Progress curve of a transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Easing {
    Linear,
    /// Quadratic deceleration; used for card travel.
    EaseOut,
    /// Oscillates start → target → start once per duration and never settles.
    Pulse,
}

impl Easing {
    fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::Pulse => {
                let phase = t.fract();
                if phase < 0.5 {
                    phase * 2.0
                } else {
                    2.0 - phase * 2.0
                }
            }
        }
    }
}

/// A value animated toward a target over time.
#[derive(Debug, Clone)]
pub struct Animator<T: Lerp> {
    current: T,
    start: T,
    target: T,
    start_time: f64,
    /// `start_time + duration`; the transition settles once `now` reaches it.
    end_time: f64,
    duration: f64,
    easing: Easing,
    running: bool,
}

impl<T: Lerp> Animator<T> {
    /// A settled animator holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            start: value,
            target: value,
            start_time: 0.0,
            end_time: 0.0,
            duration: 0.0,
            easing: Easing::Linear,
            running: false,
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.current
    }

    #[inline]
    pub fn target(&self) -> T {
        self.target
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Jumps to `value` and stops any transition, including a pulse.
    pub fn reset(&mut self, value: T) {
        self.current = value;
        self.start = value;
        self.target = value;
        self.running = false;
    }

    /// Starts a transition from the current value to `target` at `now`.
    ///
    /// A non-positive duration applies the target immediately.
    pub fn set_target(&mut self, target: T, now: f64, duration: f64, easing: Easing) {
        if duration <= 0.0 {
            self.reset(target);
            return;
        }
        self.start = self.current;
        self.target = target;
        self.start_time = now;
        self.end_time = now + duration;
        self.duration = duration;
        self.easing = easing;
        self.running = true;
    }

    /// Oscillates between `low` and `high`, one full cycle per `period`.
    pub fn pulse(&mut self, low: T, high: T, now: f64, period: f64) {
        self.current = low;
        self.set_target(high, now, period, Easing::Pulse);
    }

    /// Advances to `now` and returns the value. Timestamps before the start of
    /// the transition are treated as the start.
    pub fn update(&mut self, now: f64) -> T {
        if !self.running {
            return self.current;
        }

        if self.easing != Easing::Pulse && now >= self.end_time {
            self.current = self.target;
            self.running = false;
            return self.current;
        }

        let elapsed = (now - self.start_time).max(0.0);
        let t = (elapsed / self.duration).min(1.0) as f32;
        self.current = T::lerp(self.start, self.target, self.easing.apply(t));
        self.current
    }

    /// True while a transition is in flight. A pulse stays true until `reset`.
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.running
    }
}

impl<T: Lerp + Default> Default for Animator<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    // ── convergence ──────────────────────────────────────────────────────

    #[test]
    fn reaches_target_exactly_at_end() {
        let mut a = Animator::new(0.0f32);
        a.set_target(0.7, 2.0, 0.3, Easing::Linear);
        assert!(a.needs_update());
        assert_eq!(a.update(2.3), 0.7);
        assert!(!a.needs_update());
        assert_eq!(a.update(10.0), 0.7);
    }

    #[test]
    fn lands_on_target_when_end_time_rounds_below_duration() {
        // 0.8 - 0.7 is slightly less than 0.1 in binary floating point.
        let mut a = Animator::new(0.0f32);
        a.set_target(0.7, 0.7, 0.1, Easing::Linear);
        assert_eq!(a.update(0.7 + 0.1), 0.7);
        assert!(!a.needs_update());

        let mut b = Animator::new(1.0f32);
        b.set_target(-1.0, 0.7, 0.1, Easing::EaseOut);
        assert_eq!(b.update(0.8), -1.0);
        assert!(!b.needs_update());
    }

    #[test]
    fn ease_out_also_lands_on_target() {
        let mut a = Animator::new(Vec3::ZERO);
        let goal = Vec3::new(1.0, -2.0, 0.5);
        a.set_target(goal, 0.0, 1.0, Easing::EaseOut);
        let mid = a.update(0.5);
        // Decelerating: more than half way at half time.
        assert!(mid.x > 0.5);
        assert_eq!(a.update(1.0), goal);
        assert!(!a.needs_update());
    }

    #[test]
    fn linear_midpoint() {
        let mut a = Animator::new(1.0f32);
        a.set_target(3.0, 0.0, 2.0, Easing::Linear);
        assert!((a.update(1.0) - 2.0).abs() < EPS);
    }

    // ── time handling ────────────────────────────────────────────────────

    #[test]
    fn time_before_start_clamps_to_start() {
        let mut a = Animator::new(0.25f32);
        a.set_target(1.0, 5.0, 1.0, Easing::Linear);
        assert_eq!(a.update(1.0), 0.25);
        assert!(a.needs_update());
    }

    #[test]
    fn update_is_idempotent_at_same_time() {
        let mut a = Animator::new(0.0f32);
        a.set_target(1.0, 0.0, 1.0, Easing::EaseOut);
        let first = a.update(0.4);
        let second = a.update(0.4);
        assert_eq!(first, second);
    }

    #[test]
    fn retarget_restarts_from_current_value() {
        let mut a = Animator::new(0.0f32);
        a.set_target(1.0, 0.0, 1.0, Easing::Linear);
        let at_half = a.update(0.5);
        a.set_target(0.0, 0.5, 1.0, Easing::Linear);
        assert!((a.update(0.5) - at_half).abs() < EPS);
        assert_eq!(a.update(1.5), 0.0);
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut a = Animator::new(0.0f32);
        a.set_target(1.0, 3.0, 0.0, Easing::Linear);
        assert_eq!(a.get(), 1.0);
        assert!(!a.needs_update());
    }

    // ── pulse ────────────────────────────────────────────────────────────

    #[test]
    fn pulse_oscillates_and_never_settles() {
        let mut a = Animator::new(0.0f32);
        a.pulse(0.2, 0.8, 0.0, 1.0);
        assert!((a.update(0.0) - 0.2).abs() < EPS);
        assert!((a.update(0.5) - 0.8).abs() < EPS);
        assert!((a.update(1.0) - 0.2).abs() < EPS);
        assert!((a.update(100.25) - 0.5).abs() < 1e-4);
        assert!(a.needs_update());
    }

    #[test]
    fn reset_terminates_pulse() {
        let mut a = Animator::new(0.0f32);
        a.pulse(0.2, 0.8, 0.0, 1.0);
        a.update(0.3);
        a.reset(0.0);
        assert!(!a.needs_update());
        assert_eq!(a.update(0.9), 0.0);
    }
}
