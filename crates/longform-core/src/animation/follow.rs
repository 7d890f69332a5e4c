#![forbid(unsafe_code)]

//! Retargetable value follower.
//!
//! Every call to [`Follower::set_target`] restarts a short tween from the
//! current value to the new target, so a stream of pointer positions turns
//! into a smooth trailing motion. A zero duration makes the follower snap.

use std::time::Duration;

use super::{Animation, EasingFn, Fade, power2_out};

#[derive(Debug, Clone, Copy)]
pub struct Follower {
    from: f32,
    target: f32,
    value: f32,
    fade: Fade,
    duration: Duration,
    easing: EasingFn,
}

impl Follower {
    #[must_use]
    pub fn new(initial: f32, duration: Duration) -> Self {
        let mut fade = Fade::new(duration).easing(power2_out);
        fade.finish();
        Self {
            from: initial,
            target: initial,
            value: initial,
            fade,
            duration,
            easing: power2_out,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self.fade = self.fade.easing(easing);
        self
    }

    /// Start moving toward `target` from wherever the value is now.
    pub fn set_target(&mut self, target: f32) {
        if self.duration.is_zero() {
            self.snap(target);
            return;
        }
        self.from = self.value;
        self.target = target;
        self.fade = Fade::new(self.duration).easing(self.easing);
    }

    /// Jump straight to `value` and stop moving.
    pub fn snap(&mut self, value: f32) {
        self.from = value;
        self.target = value;
        self.value = value;
        self.fade.finish();
    }

    /// Change the follow duration for subsequent targets.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.fade.is_complete() {
            return;
        }
        self.fade.tick(dt);
        self.value = self.from + (self.target - self.from) * self.fade.value();
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.fade.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::linear;

    #[test]
    fn trails_then_arrives() {
        let mut f = Follower::new(0.0, Duration::from_secs(1)).easing(linear);
        f.set_target(100.0);
        f.tick(Duration::from_millis(250));
        assert!((f.value() - 25.0).abs() < 1e-3);
        f.tick(Duration::from_secs(1));
        assert_eq!(f.value(), 100.0);
        assert!(f.is_settled());
    }

    #[test]
    fn retarget_starts_from_current_value() {
        let mut f = Follower::new(0.0, Duration::from_secs(1)).easing(linear);
        f.set_target(100.0);
        f.tick(Duration::from_millis(500));
        f.set_target(0.0);
        f.tick(Duration::from_millis(500));
        assert!((f.value() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn zero_duration_snaps() {
        let mut f = Follower::new(5.0, Duration::ZERO);
        f.set_target(42.0);
        assert_eq!(f.value(), 42.0);
        assert!(f.is_settled());
    }
}
