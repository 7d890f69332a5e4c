#![forbid(unsafe_code)]

//! Motion capability detector.
//!
//! Holds the latest [`MotionSignals`] and publishes the derived
//! [`MotionProfile`] through an [`Observable`]. Components read the profile
//! on their next use; nothing in flight is re-animated by a change. The
//! story runs its own reconciliation pass when a change is reported.

use longform_core::motion::{MotionProfile, MotionSignals};

use crate::reactive::Observable;

#[derive(Debug, Clone)]
pub struct MotionDetector {
    signals: MotionSignals,
    profile: Observable<MotionProfile>,
}

impl MotionDetector {
    /// Read the initial platform signals.
    #[must_use]
    pub fn new(signals: MotionSignals) -> Self {
        let profile = MotionProfile::detect(&signals);
        tracing::debug!(
            reduced_motion = profile.reduced_motion,
            touch = profile.is_touch_device,
            "motion profile detected"
        );
        Self {
            signals,
            profile: Observable::new("motion_profile", profile),
        }
    }

    #[must_use]
    pub fn profile(&self) -> MotionProfile {
        self.profile.get()
    }

    /// Shared handle for subscribers.
    #[must_use]
    pub fn observable(&self) -> Observable<MotionProfile> {
        self.profile.clone()
    }

    #[must_use]
    pub fn signals(&self) -> MotionSignals {
        self.signals
    }

    /// `prefers-reduced-motion` media change. Returns whether the published
    /// profile changed.
    pub fn set_reduced_motion(&mut self, reduced: bool) -> bool {
        self.refresh(self.signals.with_reduced_motion(reduced))
    }

    /// Fresh probe results, e.g. after a resize re-detects touch support.
    pub fn refresh(&mut self, signals: MotionSignals) -> bool {
        self.signals = signals;
        let changed = self.profile.set(MotionProfile::detect(&signals));
        if changed {
            let profile = self.profile.get();
            tracing::info!(
                reduced_motion = profile.reduced_motion,
                touch = profile.is_touch_device,
                "motion profile changed"
            );
        }
        changed
    }
}
