#![forbid(unsafe_code)]

//! Scroll-bound progress.
//!
//! A [`ScrubTrigger`] maps the document scroll offset onto a progress value
//! in [0, 1]. The mapping is defined by two [`Edge`]s, each pairing a point
//! on the element with a line on the viewport: `"top bottom"` means "the
//! element's top meets the viewport's bottom". Progress is 0 at the start
//! edge and 1 at the end edge.
//!
//! With a lag, progress trails the scroll-derived value through a
//! [`Follower`] instead of snapping to it.
//!
//! # Invariants
//!
//! 1. Before the first [`ScrubTrigger::refresh`] progress is 0.
//! 2. Raw progress is always clamped to [0, 1].
//! 3. `refresh` re-derives the scroll range but keeps the current progress;
//!    the next `update` moves it.

use std::time::Duration;

use super::Follower;
use crate::geometry::{Rect, Viewport};

/// A point on the element paired with a line on the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Fraction of the element height (0 = top, 1 = bottom).
    pub element: f32,
    /// Fraction of the viewport height (0 = top, 1 = bottom).
    pub viewport: f32,
}

impl Edge {
    #[must_use]
    pub const fn new(element: f32, viewport: f32) -> Self {
        Self { element, viewport }
    }

    /// Parse `"<element> <viewport>"`, where each side is `top`, `center`,
    /// `bottom` or a percentage such as `70%`.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let element = parse_position(parts.next()?)?;
        let viewport = parse_position(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { element, viewport })
    }

    /// Scroll offset at which this edge is met for an element at `rect`
    /// (document coordinates).
    #[must_use]
    pub fn scroll_offset(&self, rect: Rect, viewport: Viewport) -> f32 {
        rect.top() + rect.height * self.element - viewport.line_at(self.viewport)
    }
}

fn parse_position(token: &str) -> Option<f32> {
    match token {
        "top" => Some(0.0),
        "center" => Some(0.5),
        "bottom" => Some(1.0),
        _ => {
            let pct: f32 = token.strip_suffix('%')?.parse().ok()?;
            pct.is_finite().then_some(pct / 100.0)
        }
    }
}

/// Scroll position → animation progress.
#[derive(Debug, Clone)]
pub struct ScrubTrigger {
    start: Edge,
    end: Edge,
    start_scroll: f32,
    end_scroll: f32,
    raw: f32,
    smoothing: Option<Follower>,
    refreshed: bool,
}

impl ScrubTrigger {
    #[must_use]
    pub fn new(start: Edge, end: Edge) -> Self {
        Self {
            start,
            end,
            start_scroll: 0.0,
            end_scroll: 0.0,
            raw: 0.0,
            smoothing: None,
            refreshed: false,
        }
    }

    /// Make progress trail the scroll position by `lag`.
    #[must_use]
    pub fn with_lag(mut self, lag: Duration) -> Self {
        self.smoothing = (!lag.is_zero()).then(|| Follower::new(self.raw, lag));
        self
    }

    /// Recalculate the scroll range from fresh geometry.
    pub fn refresh(&mut self, element: Rect, viewport: Viewport) {
        self.start_scroll = self.start.scroll_offset(element, viewport);
        self.end_scroll = self.end.scroll_offset(element, viewport);
        self.refreshed = true;
    }

    /// Feed the current document scroll offset.
    pub fn update(&mut self, scroll_y: f32) {
        if !self.refreshed {
            return;
        }
        let span = self.end_scroll - self.start_scroll;
        self.raw = if span <= f32::EPSILON {
            if scroll_y >= self.end_scroll { 1.0 } else { 0.0 }
        } else {
            ((scroll_y - self.start_scroll) / span).clamp(0.0, 1.0)
        };
        if let Some(follower) = &mut self.smoothing {
            // same target: keep the running lag instead of restarting it
            if follower.target() != self.raw {
                follower.set_target(self.raw);
            }
        }
    }

    /// Advance the lag smoothing.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(follower) = &mut self.smoothing {
            follower.tick(dt);
        }
    }

    /// Jump the smoothed progress to `value` (e.g. when binding a node that
    /// is already revealed).
    pub fn snap_progress(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.raw = value;
        if let Some(follower) = &mut self.smoothing {
            follower.snap(value);
        }
    }

    /// Progress as seen by the animation (smoothed when lagging).
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.smoothing.as_ref().map_or(self.raw, Follower::value)
    }

    /// Progress derived directly from the last scroll offset.
    #[must_use]
    pub fn raw_progress(&self) -> f32 {
        self.raw
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.smoothing.as_ref().is_none_or(Follower::is_settled)
    }

    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        self.refreshed
    }

    /// `(start, end)` scroll offsets from the last refresh.
    #[must_use]
    pub fn scroll_range(&self) -> (f32, f32) {
        (self.start_scroll, self.end_scroll)
    }
}
