#![forbid(unsafe_code)]

//! Slide transition animator.
//!
//! Each slide has a content node and any number of highlight nodes. When
//! the active slide changes the outgoing slide exits and the incoming one
//! enters; the entry is delayed up front by the exit plus a pause so the
//! two never overlap on screen. Completion cues reset the exited slide to
//! its hidden pose and start the highlight reveals of the entered one.

use std::time::Duration;

use longform_core::animation::{
    Cue, EasingFn, Stage, TweenSpec, expo_out, power2_out, power3_out, stagger_offsets,
};
use longform_core::motion::MotionProfile;
use longform_core::pose::{NodeId, PoseProperty, PosePatch};

use crate::config::SlidePolicyConfig;

const EXITED: &str = "slide.exited";
const ENTERED: &str = "slide.entered";

/// Nodes that make up one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideNodes {
    pub content: NodeId,
    /// Inline emphasis spans, revealed in order after the content settles.
    pub highlights: Vec<NodeId>,
}

impl SlideNodes {
    #[must_use]
    pub fn new(content: NodeId, highlights: Vec<NodeId>) -> Self {
        Self {
            content,
            highlights,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlideAnimator {
    slides: Vec<SlideNodes>,
    active: Option<usize>,
    config: SlidePolicyConfig,
}

impl SlideAnimator {
    #[must_use]
    pub fn new(slides: Vec<SlideNodes>, config: SlidePolicyConfig) -> Self {
        Self {
            slides,
            active: None,
            config,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Pre-set every slide to its hidden pose.
    pub fn mount(&self, stage: &mut Stage, profile: MotionProfile) {
        for index in 0..self.slides.len() {
            self.hide(index, stage, profile);
        }
    }

    fn hidden(&self, reduced: bool) -> PosePatch {
        if reduced {
            PosePatch::new()
                .opacity(0.0)
                .y(self.config.reduced_hidden_y)
                .blur(0.0)
        } else {
            PosePatch::new()
                .opacity(0.0)
                .y(self.config.hidden_y)
                .blur(self.config.hidden_blur)
        }
    }

    fn hide(&self, index: usize, stage: &mut Stage, profile: MotionProfile) {
        let Some(slide) = self.slides.get(index) else {
            return;
        };
        stage.set(slide.content, &self.hidden(profile.reduced_motion));
        for &h in &slide.highlights {
            stage.kill_node(h);
            stage.set(h, &PosePatch::new().highlight(0.0));
        }
    }

    /// Switch the active slide. `previous` is the slide that was active
    /// before, used to decide whether the entry waits for an exit.
    pub fn show(
        &mut self,
        current: Option<usize>,
        previous: Option<usize>,
        stage: &mut Stage,
        profile: MotionProfile,
    ) {
        let current = current.filter(|&i| i < self.slides.len());
        if current == self.active {
            return;
        }
        if let Some(out) = self.active {
            self.exit(out, stage, profile);
        }
        if let Some(incoming) = current {
            let waits = previous.is_some_and(|p| p != incoming);
            self.enter(incoming, waits, stage, profile);
        }
        self.active = current;
    }

    fn exit(&self, index: usize, stage: &mut Stage, profile: MotionProfile) {
        let slide = &self.slides[index];
        let reduced = profile.reduced_motion;
        let to = if reduced {
            PosePatch::new().opacity(0.0).y(self.config.reduced_exit_y)
        } else {
            PosePatch::new()
                .opacity(0.0)
                .y(self.config.exit_y)
                .blur(self.config.exit_blur)
        };
        let ease: EasingFn = if reduced { power2_out } else { power3_out };
        // an entry still waiting out its delay must not fire after the exit
        stage.kill_node(slide.content);
        stage.tween(
            TweenSpec::to(slide.content, to)
                .duration(self.config.exit(reduced))
                .ease(ease)
                .cue(EXITED),
        );
    }

    fn enter(&self, index: usize, waits: bool, stage: &mut Stage, profile: MotionProfile) {
        let slide = &self.slides[index];
        let reduced = profile.reduced_motion;
        for &h in &slide.highlights {
            stage.kill_node(h);
            stage.set(h, &PosePatch::new().highlight(0.0));
        }
        let delay = if waits {
            self.config.enter_pause(reduced)
        } else {
            Duration::ZERO
        };
        let (to, ease): (PosePatch, EasingFn) = if reduced {
            (PosePatch::new().opacity(1.0).y(0.0), power2_out)
        } else {
            (PosePatch::new().opacity(1.0).y(0.0).blur(0.0), expo_out)
        };
        stage.kill_node(slide.content);
        stage.tween(
            TweenSpec::from_to(slide.content, self.hidden(reduced), to)
                .delay(delay)
                .duration(self.config.enter(reduced))
                .ease(ease)
                .cue(ENTERED),
        );
        tracing::debug!(slide = index, delayed = waits, reduced, "slide enter scheduled");
    }

    /// Route a stage cue. Returns whether it belonged to a slide.
    pub fn on_cue(&self, cue: &Cue, stage: &mut Stage, profile: MotionProfile) -> bool {
        let Some(index) = self.slides.iter().position(|s| s.content == cue.node) else {
            return false;
        };
        match cue.label {
            EXITED if self.active != Some(index) => self.hide(index, stage, profile),
            ENTERED if self.active == Some(index) => self.reveal_highlights(index, stage, profile),
            _ => {}
        }
        true
    }

    fn reveal_highlights(&self, index: usize, stage: &mut Stage, profile: MotionProfile) {
        let reduced = profile.reduced_motion;
        let highlights = &self.slides[index].highlights;
        let offsets = stagger_offsets(highlights.len(), self.config.highlight_stagger(reduced));
        for (&h, offset) in highlights.iter().zip(offsets) {
            stage.tween(
                TweenSpec::to(h, PosePatch::new().highlight(1.0))
                    .delay(offset)
                    .duration(self.config.highlight(reduced))
                    .ease(power2_out),
            );
        }
    }

    /// Normalize every slide to its terminal state for `profile`: the
    /// active slide fully shown, every other slide hidden. Used when the
    /// motion profile flips mid-transition.
    pub fn reconcile(&self, stage: &mut Stage, profile: MotionProfile) {
        for (index, slide) in self.slides.iter().enumerate() {
            stage.kill_node(slide.content);
            if self.active == Some(index) {
                stage.set(slide.content, &PosePatch::new().opacity(1.0).y(0.0).blur(0.0));
                for &h in &slide.highlights {
                    stage.kill_node(h);
                    stage.set(h, &PosePatch::new().highlight(1.0));
                }
            } else {
                self.hide(index, stage, profile);
            }
        }
    }

    /// Whether any slide node is still animating.
    #[must_use]
    pub fn is_animating(&self, stage: &Stage) -> bool {
        self.slides.iter().any(|s| {
            stage.is_tweening(s.content) || s.highlights.iter().any(|&h| stage.is_tweening(h))
        })
    }

    /// Resting opacity of a slide's content.
    #[must_use]
    pub fn opacity(&self, index: usize, stage: &Stage) -> Option<f32> {
        self.slides
            .get(index)
            .map(|s| stage.pose(s.content).get(PoseProperty::Opacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);
    const REDUCED: MotionProfile = MotionProfile {
        reduced_motion: true,
        is_touch_device: false,
    };

    fn animator() -> SlideAnimator {
        SlideAnimator::new(
            vec![
                SlideNodes::new(NodeId(10), vec![NodeId(11), NodeId(12)]),
                SlideNodes::new(NodeId(20), vec![]),
                SlideNodes::new(NodeId(30), vec![NodeId(31)]),
            ],
            SlidePolicyConfig::default(),
        )
    }

    fn run(a: &SlideAnimator, stage: &mut Stage, profile: MotionProfile, total: Duration) {
        let mut t = Duration::ZERO;
        while t < total {
            for cue in stage.tick(FRAME) {
                a.on_cue(&cue, stage, profile);
            }
            t += FRAME;
        }
    }

    #[test]
    fn never_active_slides_start_hidden() {
        let a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, MotionProfile::FULL);
        let pose = stage.pose(NodeId(20));
        assert_eq!((pose.opacity, pose.y, pose.blur), (0.0, 40.0, 10.0));
        assert_eq!(stage.pose(NodeId(11)).highlight, 0.0);
    }

    #[test]
    fn first_slide_enters_immediately_then_highlights() {
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, MotionProfile::FULL);
        a.show(Some(0), None, &mut stage, MotionProfile::FULL);
        run(&a, &mut stage, MotionProfile::FULL, Duration::from_millis(1400));
        assert_eq!(stage.pose(NodeId(10)).opacity, 1.0);
        assert_eq!(stage.pose(NodeId(11)).highlight, 0.0);
        run(&a, &mut stage, MotionProfile::FULL, Duration::from_millis(1000));
        assert_eq!(stage.pose(NodeId(11)).highlight, 1.0);
        assert_eq!(stage.pose(NodeId(12)).highlight, 1.0);
    }

    #[test]
    fn full_motion_transition_settles_within_budget() {
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, MotionProfile::FULL);
        a.show(Some(0), None, &mut stage, MotionProfile::FULL);
        run(&a, &mut stage, MotionProfile::FULL, Duration::from_secs(3));
        a.show(Some(1), Some(0), &mut stage, MotionProfile::FULL);

        run(&a, &mut stage, MotionProfile::FULL, Duration::from_millis(1200));
        assert_eq!(stage.pose(NodeId(20)).opacity, 0.0, "entry waits for the exit");
        assert_eq!(stage.pose(NodeId(10)).opacity, 0.0);

        run(&a, &mut stage, MotionProfile::FULL, Duration::from_millis(1520));
        assert!(!stage.is_tweening(NodeId(10)) && !stage.is_tweening(NodeId(20)));
        let entered = stage.pose(NodeId(20));
        assert_eq!((entered.opacity, entered.y, entered.blur), (1.0, 0.0, 0.0));
        let exited = stage.pose(NodeId(10));
        assert_eq!((exited.opacity, exited.y, exited.blur), (0.0, 40.0, 10.0));
        assert_eq!(stage.pose(NodeId(11)).highlight, 0.0);
    }

    #[test]
    fn reduced_motion_transition_settles_fast() {
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, REDUCED);
        a.show(Some(0), None, &mut stage, REDUCED);
        run(&a, &mut stage, REDUCED, Duration::from_secs(1));
        a.show(Some(1), Some(0), &mut stage, REDUCED);
        run(&a, &mut stage, REDUCED, Duration::from_millis(416));
        assert_eq!(stage.pose(NodeId(20)).opacity, 1.0);
        let exited = stage.pose(NodeId(10));
        assert_eq!((exited.opacity, exited.y), (0.0, 20.0));
    }

    #[test]
    fn reconcile_normalizes_mid_flight() {
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, MotionProfile::FULL);
        a.show(Some(0), None, &mut stage, MotionProfile::FULL);
        run(&a, &mut stage, MotionProfile::FULL, Duration::from_secs(3));
        a.show(Some(2), Some(0), &mut stage, MotionProfile::FULL);
        run(&a, &mut stage, MotionProfile::FULL, Duration::from_millis(500));
        a.reconcile(&mut stage, REDUCED);
        assert!(!a.is_animating(&stage));
        assert_eq!(a.opacity(2, &stage), Some(1.0));
        assert_eq!(a.opacity(0, &stage), Some(0.0));
        assert_eq!(stage.pose(NodeId(31)).highlight, 1.0);
        assert_eq!(stage.pose(NodeId(10)).y, 20.0);
    }

    #[test]
    fn stale_exit_cue_does_not_hide_reactivated_slide() {
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, REDUCED);
        a.show(Some(0), None, &mut stage, REDUCED);
        run(&a, &mut stage, REDUCED, Duration::from_secs(1));
        a.show(Some(1), Some(0), &mut stage, REDUCED);
        a.show(Some(0), Some(1), &mut stage, REDUCED);
        run(&a, &mut stage, REDUCED, Duration::from_secs(1));
        assert_eq!(a.opacity(0, &stage), Some(1.0));
        assert_eq!(a.opacity(1, &stage), Some(0.0));
    }

    #[test]
    fn exit_cancels_a_pending_delayed_entry() {
        let full = MotionProfile::FULL;
        let mut a = animator();
        let mut stage = Stage::new();
        a.mount(&mut stage, full);
        a.show(Some(0), None, &mut stage, full);
        run(&a, &mut stage, full, Duration::from_secs(3));
        a.show(Some(1), Some(0), &mut stage, full);
        run(&a, &mut stage, full, Duration::from_millis(200));
        a.show(Some(0), Some(1), &mut stage, full);
        run(&a, &mut stage, full, Duration::from_secs(5));
        assert_eq!(a.opacity(0, &stage), Some(1.0));
        assert_eq!(a.opacity(1, &stage), Some(0.0));
    }
}
