#![forbid(unsafe_code)]

//! Motion profile: reduced-motion preference and touch capability.
//!
//! The host probes the platform (`matchMedia('(prefers-reduced-motion: reduce)')`,
//! `'ontouchstart' in window`, `navigator.maxTouchPoints`) and hands the raw
//! answers over as [`MotionSignals`]. [`MotionProfile::detect`] turns them into
//! the two booleans every animator branches on.
//!
//! # Invariants
//!
//! 1. A profile is always replaced whole; there is no way to flip one flag
//!    of a published profile in place.
//! 2. Detection is pure: equal signals always produce equal profiles.

/// Raw platform probe results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionSignals {
    /// `prefers-reduced-motion: reduce` matched.
    pub prefers_reduced_motion: bool,
    /// `ontouchstart` is present on the window object.
    pub has_touch_events: bool,
    /// `navigator.maxTouchPoints` (or the legacy `msMaxTouchPoints`).
    pub max_touch_points: u32,
}

impl MotionSignals {
    /// Signals for a desktop browser with a mouse and no preference set.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            prefers_reduced_motion: false,
            has_touch_events: false,
            max_touch_points: 0,
        }
    }

    /// Signals for a phone or tablet.
    #[must_use]
    pub const fn touch() -> Self {
        Self {
            prefers_reduced_motion: false,
            has_touch_events: true,
            max_touch_points: 5,
        }
    }

    /// Same signals with the reduced-motion preference set.
    #[must_use]
    pub const fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.prefers_reduced_motion = reduced;
        self
    }
}

/// Process-wide motion capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionProfile {
    pub reduced_motion: bool,
    pub is_touch_device: bool,
}

impl MotionProfile {
    /// Full motion on a pointer device.
    pub const FULL: Self = Self {
        reduced_motion: false,
        is_touch_device: false,
    };

    /// Resolve a profile from platform signals.
    #[must_use]
    pub const fn detect(signals: &MotionSignals) -> Self {
        Self {
            reduced_motion: signals.prefers_reduced_motion,
            is_touch_device: signals.has_touch_events || signals.max_touch_points > 0,
        }
    }

    /// Which animation variant to use.
    #[must_use]
    pub const fn variant(&self) -> MotionVariant {
        if self.reduced_motion {
            MotionVariant::Reduced
        } else {
            MotionVariant::Full
        }
    }

    /// Whether the pointer proxy should exist at all.
    #[must_use]
    pub const fn has_pointer_proxy(&self) -> bool {
        !self.is_touch_device
    }

    /// Pick between a full-motion and a reduced-motion value.
    #[must_use]
    pub fn pick<T>(&self, full: T, reduced: T) -> T {
        match self.variant() {
            MotionVariant::Full => full,
            MotionVariant::Reduced => reduced,
        }
    }
}

/// Full-motion vs reduced-motion branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionVariant {
    Full,
    Reduced,
}
