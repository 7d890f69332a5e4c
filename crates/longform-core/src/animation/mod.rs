#![forbid(unsafe_code)]

//! Animation primitives.
//!
//! Everything here is driven by explicit `tick(dt)` calls; nothing reads a
//! clock. That keeps every animator deterministic under test and lets the
//! host decide the frame cadence.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Animation`] | progress-producing state machine (0.0 → 1.0) |
//! | [`Fade`], [`Delayed`] | the two leaf animations everything else builds on |
//! | [`Timeline`] | one-shot keyed events at absolute offsets |
//! | [`Stage`] | node poses plus property tweens with completion cues |
//! | [`Follower`] | retargetable tween ("quick-to") for lagging values |
//! | [`ScrubTrigger`] | scroll position → progress, with optional lag |
//! | [`Inertia`] | bounded drag with edge resistance and a decaying throw |

pub mod follow;
pub mod inertia;
pub mod scrub;
pub mod stage;
pub mod timeline;

pub use follow::Follower;
pub use inertia::{Bounds, Inertia};
pub use scrub::{Edge, ScrubTrigger};
pub use stage::{Cue, Stage, TweenId, TweenSpec};
pub use timeline::{PlaybackState, Timeline};

use std::time::Duration;

/// A time-driven animation producing a progress value.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current (eased) progress, normally in [0.0, 1.0].
    ///
    /// Elastic curves may briefly leave that range.
    fn value(&self) -> f32;

    /// Rewind to the initial state.
    fn reset(&mut self);

    /// Time that elapsed past the end during the last tick.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

/// Easing curve: maps linear progress in [0, 1] to eased progress.
pub type EasingFn = fn(f32) -> f32;

#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

#[inline]
pub fn power2_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

#[inline]
pub fn power2_out(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv
}

pub fn power2_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let inv = -2.0 * t + 2.0;
        1.0 - inv * inv / 2.0
    }
}

#[inline]
pub fn power3_out(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Exponential ease-out. Exactly 1.0 at the end.
pub fn expo_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

/// Elastic ease-out with amplitude 1 and period 0.5.
///
/// Overshoots past 1.0 and rings back; exactly 0.0 and 1.0 at the ends.
pub fn elastic_out(t: f32) -> f32 {
    const PERIOD: f32 = 0.5;
    let t = t.clamp(0.0, 1.0);
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    // amplitude 1 → phase shift of a quarter period
    let shift = PERIOD / 4.0;
    2f32.powf(-10.0 * t) * ((t - shift) * std::f32::consts::TAU / PERIOD).sin() + 1.0
}

/// Linear progress over a fixed duration, shaped by an easing curve.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// A zero duration is clamped to 1ns.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: duration.max(Duration::from_nanos(1)),
            easing: linear,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Un-eased progress in [0, 1].
    #[must_use]
    pub fn raw_progress(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Jump to the end.
    pub fn finish(&mut self) {
        self.elapsed = self.duration;
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

/// Holds an inner animation at its start until a delay elapses.
#[derive(Debug, Clone, Copy)]
pub struct Delayed<A> {
    delay: Duration,
    waited: Duration,
    inner: A,
}

/// Wrap `animation` so it starts after `offset`.
#[must_use]
pub fn delay<A: Animation>(offset: Duration, animation: A) -> Delayed<A> {
    Delayed {
        delay: offset,
        waited: Duration::ZERO,
        inner: animation,
    }
}

impl<A: Animation> Delayed<A> {
    /// Whether the delay has fully elapsed.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.waited >= self.delay
    }

    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }
}

impl<A: Animation> Animation for Delayed<A> {
    fn tick(&mut self, dt: Duration) {
        if self.has_started() {
            self.inner.tick(dt);
            return;
        }
        let remaining = self.delay - self.waited;
        if dt < remaining {
            self.waited += dt;
        } else {
            self.waited = self.delay;
            self.inner.tick(dt - remaining);
        }
    }

    fn is_complete(&self) -> bool {
        self.has_started() && self.inner.is_complete()
    }

    fn value(&self) -> f32 {
        self.inner.value()
    }

    fn reset(&mut self) {
        self.waited = Duration::ZERO;
        self.inner.reset();
    }

    fn overshoot(&self) -> Duration {
        self.inner.overshoot()
    }
}

/// Evenly spaced start offsets: `0, step, 2·step, …`.
#[must_use]
pub fn stagger_offsets(count: usize, step: Duration) -> Vec<Duration> {
    (0..count).map(|i| step.saturating_mul(i as u32)).collect()
}
