#![forbid(unsafe_code)]

//! Bounded free-form dragging with an inertial throw.
//!
//! [`Inertia`] tracks one draggable offset. While the pointer is down the
//! offset follows the pointer delta, with movement beyond [`Bounds`] damped
//! by an edge-resistance factor. On release the recent pointer velocity is
//! projected forward, clamped into bounds, and eased toward with a
//! cubic-out curve.
//!
//! # Invariants
//!
//! 1. After a throw settles the offset lies inside the bounds.
//! 2. No snapping: the resting offset is wherever the throw ends.

use std::time::Duration;

use super::{Follower, power3_out};
use crate::geometry::Point;

/// Allowed range for a drag offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    /// `±reach` on both axes.
    #[must_use]
    pub fn symmetric(reach: f32) -> Self {
        let reach = reach.abs();
        Self {
            min_x: -reach,
            max_x: reach,
            min_y: -reach,
            max_y: reach,
        }
    }

    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }
}

/// How far a throw projects the release velocity (seconds of travel).
const PROJECTION: f32 = 0.35;
/// Releases slower than this (px/s) do not throw.
const MIN_THROW_SPEED: f32 = 20.0;
const MIN_THROW: Duration = Duration::from_millis(300);
const MAX_THROW: Duration = Duration::from_millis(1500);

/// Drag/throw state for one offset.
#[derive(Debug, Clone)]
pub struct Inertia {
    bounds: Bounds,
    edge_resistance: f32,
    position: Point,
    /// Position the drag started from, and the pointer position at press.
    anchor: Option<(Point, Point)>,
    velocity: Point,
    since_sample: Duration,
    throw: Option<(Follower, Follower)>,
}

impl Inertia {
    /// `edge_resistance` in [0, 1]: 0 moves freely past bounds, 1 stops dead.
    #[must_use]
    pub fn new(position: Point, bounds: Bounds, edge_resistance: f32) -> Self {
        Self {
            bounds,
            edge_resistance: edge_resistance.clamp(0.0, 1.0),
            position,
            anchor: None,
            velocity: Point::ZERO,
            since_sample: Duration::ZERO,
            throw: None,
        }
    }

    /// Pointer down. Interrupts any running throw.
    pub fn press(&mut self, pointer: Point) {
        self.throw = None;
        self.anchor = Some((self.position, pointer));
        self.velocity = Point::ZERO;
        self.since_sample = Duration::ZERO;
    }

    /// Pointer moved while pressed. Returns the new offset.
    pub fn drag_to(&mut self, pointer: Point) -> Point {
        let Some((origin, press)) = self.anchor else {
            return self.position;
        };
        let raw = origin.offset(pointer.x - press.x, pointer.y - press.y);
        let next = self.resist(raw);

        let secs = self.since_sample.as_secs_f32();
        if secs > 0.0 {
            let vx = (next.x - self.position.x) / secs;
            let vy = (next.y - self.position.y) / secs;
            // light smoothing over the last two samples
            self.velocity = Point::new(
                (self.velocity.x + vx * 2.0) / 3.0,
                (self.velocity.y + vy * 2.0) / 3.0,
            );
        }
        self.since_sample = Duration::ZERO;
        self.position = next;
        next
    }

    fn resist(&self, p: Point) -> Point {
        let keep = 1.0 - self.edge_resistance;
        let axis = |v: f32, lo: f32, hi: f32| {
            if v < lo {
                lo + (v - lo) * keep
            } else if v > hi {
                hi + (v - hi) * keep
            } else {
                v
            }
        };
        Point::new(
            axis(p.x, self.bounds.min_x, self.bounds.max_x),
            axis(p.y, self.bounds.min_y, self.bounds.max_y),
        )
    }

    /// Pointer up. Starts a throw when moving fast enough or when the
    /// offset is outside the bounds. Returns whether a throw started.
    pub fn release(&mut self) -> bool {
        if self.anchor.take().is_none() {
            return false;
        }
        let speed = self.velocity.x.hypot(self.velocity.y);
        let fast = speed >= MIN_THROW_SPEED;
        if !fast && self.bounds.contains(self.position) {
            return false;
        }
        let projected = if fast {
            self.position
                .offset(self.velocity.x * PROJECTION, self.velocity.y * PROJECTION)
        } else {
            self.position
        };
        let target = self.bounds.clamp(projected);
        let secs = (speed / 1000.0).clamp(MIN_THROW.as_secs_f32(), MAX_THROW.as_secs_f32());
        let duration = Duration::from_secs_f32(secs);
        let mut fx = Follower::new(self.position.x, duration).easing(power3_out);
        let mut fy = Follower::new(self.position.y, duration).easing(power3_out);
        fx.set_target(target.x);
        fy.set_target(target.y);
        self.throw = Some((fx, fy));
        self.velocity = Point::ZERO;
        true
    }

    /// Advance time. Returns `true` while a throw moved the offset.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.anchor.is_some() {
            self.since_sample = self.since_sample.saturating_add(dt);
            return false;
        }
        let Some((fx, fy)) = &mut self.throw else {
            return false;
        };
        fx.tick(dt);
        fy.tick(dt);
        self.position = Point::new(fx.value(), fy.value());
        if fx.is_settled() && fy.is_settled() {
            self.throw = None;
        }
        true
    }

    /// Place the offset directly (restoring a saved arrangement).
    pub fn set_position(&mut self, position: Point) {
        self.throw = None;
        self.position = position;
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    #[must_use]
    pub fn is_throwing(&self) -> bool {
        self.throw.is_some()
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn drag_follows_pointer_delta() {
        let mut inertia = Inertia::new(Point::new(10.0, 0.0), Bounds::symmetric(500.0), 0.5);
        inertia.press(Point::new(100.0, 100.0));
        inertia.tick(FRAME);
        assert_eq!(inertia.drag_to(Point::new(130.0, 80.0)), Point::new(40.0, -20.0));
        assert!(inertia.is_dragging());
    }

    #[test]
    fn edge_resistance_damps_overshoot() {
        let mut inertia = Inertia::new(Point::ZERO, Bounds::symmetric(100.0), 0.5);
        inertia.press(Point::ZERO);
        let p = inertia.drag_to(Point::new(300.0, 0.0));
        assert_eq!(p.x, 200.0);
    }

    #[test]
    fn slow_release_inside_bounds_stays_put() {
        let mut inertia = Inertia::new(Point::ZERO, Bounds::symmetric(100.0), 0.5);
        inertia.press(Point::ZERO);
        inertia.tick(Duration::from_secs(1));
        inertia.drag_to(Point::new(5.0, 0.0));
        assert!(!inertia.release());
        assert_eq!(inertia.position(), Point::new(5.0, 0.0));
    }

    #[test]
    fn throw_settles_inside_bounds() {
        let mut inertia = Inertia::new(Point::ZERO, Bounds::symmetric(100.0), 0.5);
        inertia.press(Point::ZERO);
        for i in 1..=5 {
            inertia.tick(FRAME);
            inertia.drag_to(Point::new(i as f32 * 30.0, 0.0));
        }
        assert!(inertia.release());
        for _ in 0..200 {
            inertia.tick(FRAME);
        }
        assert!(!inertia.is_throwing());
        assert!(inertia.bounds().contains(inertia.position()));
        assert_eq!(inertia.position().x, 100.0);
    }

    #[test]
    fn press_interrupts_throw() {
        let mut inertia = Inertia::new(Point::ZERO, Bounds::symmetric(1000.0), 0.0);
        inertia.press(Point::ZERO);
        inertia.tick(FRAME);
        inertia.drag_to(Point::new(50.0, 0.0));
        assert!(inertia.release());
        inertia.tick(FRAME);
        inertia.press(Point::ZERO);
        assert!(!inertia.is_throwing());
    }
}
