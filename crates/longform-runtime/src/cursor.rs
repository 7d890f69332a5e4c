#![forbid(unsafe_code)]

//! Pointer proxy: the on-screen follower that doubles as the advance
//! control on pointer devices.
//!
//! The proxy owns its own [`Stage`] for opacity and scale, plus two
//! [`Follower`]s for position. The orchestrator drives it only through
//! [`CursorControl`], and learns what an advance means from the action the
//! proxy returns. No callback is stored.
//!
//! Pointer moves are coalesced: the latest position is held until the next
//! [`PointerProxy::tick`], matching one update per animation frame.

use std::time::Duration;

use longform_core::animation::{Follower, Stage, TweenId, TweenSpec, power2_out};
use longform_core::event::{PointerEvent, PointerEventKind, PointerType};
use longform_core::geometry::{Point, Viewport};
use longform_core::motion::MotionProfile;
use longform_core::pose::{NodeId, Pose, PosePatch};

use crate::config::CursorPolicyConfig;

/// What an advance request resolves to, given the current intro phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvanceAction {
    /// Leave the title screen for the first slide.
    EnterTitle,
    /// Move to the next slide.
    NextSlide,
    /// Leave the last slide for the document.
    Begin,
}

impl AdvanceAction {
    /// Text shown inside the proxy.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::EnterTitle => "Enter",
            Self::NextSlide | Self::Begin => "Continue",
        }
    }
}

/// Capability handle the intro sequencer holds on the pointer proxy.
pub trait CursorControl {
    /// Play the press pulse and return the bound action, if any.
    fn advance(&mut self) -> Option<AdvanceAction>;
    /// Attention pulse after a slide change. Ignored under reduced motion.
    fn pulse(&mut self);
    /// Stop following the pointer.
    fn pause(&mut self);
    fn resume(&mut self);
}

/// The pointer proxy. Only exists on non-touch devices.
#[derive(Debug)]
pub struct PointerProxy {
    node: NodeId,
    stage: Stage,
    x: Follower,
    y: Follower,
    pending: Option<Point>,
    reduced_motion: bool,
    visible: bool,
    paused: bool,
    action: Option<AdvanceAction>,
    pulse: Vec<TweenId>,
    config: CursorPolicyConfig,
}

impl PointerProxy {
    /// Mount at the viewport center and fade in.
    #[must_use]
    pub fn new(
        node: NodeId,
        viewport: Viewport,
        profile: MotionProfile,
        config: CursorPolicyConfig,
    ) -> Self {
        let center = viewport.center();
        let mut proxy = Self {
            node,
            stage: Stage::new(),
            x: Follower::new(center.x, config.follow()),
            y: Follower::new(center.y, config.follow()),
            pending: None,
            reduced_motion: profile.reduced_motion,
            visible: true,
            paused: false,
            action: None,
            pulse: Vec::new(),
            config,
        };
        proxy.mount();
        proxy
    }

    fn mount(&mut self) {
        let rest = self.config.rest_opacity;
        if self.reduced_motion {
            self.stage
                .set(self.node, &PosePatch::new().scale(1.0).opacity(rest));
        } else {
            self.stage.tween(
                TweenSpec::from_to(
                    self.node,
                    PosePatch::new().scale(0.0).opacity(0.0),
                    PosePatch::new().scale(1.0).opacity(rest),
                )
                .duration(self.config.mount())
                .ease(power2_out),
            );
        }
    }

    /// Re-run the mount for a new motion profile. Position is kept.
    pub fn set_profile(&mut self, profile: MotionProfile) {
        if profile.reduced_motion == self.reduced_motion {
            return;
        }
        self.reduced_motion = profile.reduced_motion;
        self.pulse.clear();
        self.stage.kill_node(self.node);
        let (x, y) = (self.x.target(), self.y.target());
        self.x.snap(x);
        self.y.snap(y);
        self.mount();
    }

    /// Bind what the next advance means.
    pub fn bind(&mut self, action: Option<AdvanceAction>) {
        self.action = action;
    }

    #[must_use]
    pub fn bound_action(&self) -> Option<AdvanceAction> {
        self.action
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.action.map_or("Continue", AdvanceAction::label)
    }

    /// Mouse tracking and viewport enter/leave.
    pub fn on_pointer(&mut self, event: &PointerEvent, viewport: Viewport) {
        if event.pointer_type != PointerType::Mouse {
            return;
        }
        match event.kind {
            PointerEventKind::Move | PointerEventKind::Down => {
                if !self.paused && self.visible {
                    self.pending = Some(event.position);
                }
            }
            PointerEventKind::Enter => {
                self.visible = true;
                self.fade_to(self.config.rest_opacity, self.config.enter_fade());
            }
            PointerEventKind::Leave if viewport.is_outside(event.position) => {
                self.hide(self.config.leave_fade());
            }
            _ => {}
        }
    }

    /// Window focus changes. Losing focus hides the proxy until the
    /// pointer re-enters.
    pub fn on_focus(&mut self, focused: bool) {
        if !focused {
            self.hide(self.config.blur_fade());
        }
    }

    fn hide(&mut self, duration: Duration) {
        self.visible = false;
        self.pending = None;
        self.fade_to(0.0, duration);
    }

    fn fade_to(&mut self, opacity: f32, duration: Duration) {
        self.stage.tween(
            TweenSpec::to(self.node, PosePatch::new().opacity(opacity))
                .duration(duration)
                .ease(power2_out),
        );
    }

    fn play_pulse(&mut self, (scale, up, settle): (f32, Duration, Duration)) {
        for id in self.pulse.drain(..) {
            self.stage.kill(id);
        }
        let rise = self.stage.tween(
            TweenSpec::to(self.node, PosePatch::new().scale(scale))
                .duration(up)
                .ease(power2_out),
        );
        let fall = self.stage.tween(
            TweenSpec::to(self.node, PosePatch::new().scale(1.0))
                .delay(up)
                .duration(settle)
                .ease(power2_out),
        );
        self.pulse.extend([rise, fall]);
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Some(p) = self.pending.take() {
            if self.reduced_motion {
                self.x.snap(p.x);
                self.y.snap(p.y);
            } else {
                self.x.set_target(p.x);
                self.y.set_target(p.y);
            }
        }
        self.x.tick(dt);
        self.y.tick(dt);
        self.stage.tick(dt);
        self.pulse.retain(|id| self.stage.is_running(*id));
    }

    /// Composed pose: stage opacity/scale, follower position.
    #[must_use]
    pub fn pose(&self) -> Pose {
        let mut pose = self.stage.pose(self.node);
        pose.x = self.x.value();
        pose.y = self.y.value();
        pose
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x.value(), self.y.value())
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl CursorControl for PointerProxy {
    fn advance(&mut self) -> Option<AdvanceAction> {
        self.play_pulse(self.config.advance_pulse());
        tracing::debug!(action = ?self.action, "pointer proxy advance");
        self.action
    }

    fn pulse(&mut self) {
        if self.reduced_motion {
            return;
        }
        self.play_pulse(self.config.attention_pulse());
    }

    fn pause(&mut self) {
        self.paused = true;
        self.pending = None;
    }

    fn resume(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn proxy(reduced: bool) -> PointerProxy {
        let profile = MotionProfile {
            reduced_motion: reduced,
            is_touch_device: false,
        };
        PointerProxy::new(
            NodeId(1),
            Viewport::new(1000.0, 800.0),
            profile,
            CursorPolicyConfig::default(),
        )
    }

    fn run(p: &mut PointerProxy, total: Duration) {
        let mut t = Duration::ZERO;
        while t < total {
            p.tick(FRAME);
            t += FRAME;
        }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::mouse(PointerEventKind::Move, Point::new(x, y))
    }

    #[test]
    fn mounts_centered_and_fades_in() {
        let mut p = proxy(false);
        assert_eq!(p.position(), Point::new(500.0, 400.0));
        assert_eq!(p.pose().scale, 0.0);
        run(&mut p, Duration::from_millis(400));
        assert_eq!(p.pose().scale, 1.0);
        assert!((p.pose().opacity - 0.75).abs() < 1e-4);
    }

    #[test]
    fn reduced_motion_mounts_at_rest_and_snaps() {
        let mut p = proxy(true);
        assert_eq!(p.pose().scale, 1.0);
        p.on_pointer(&moved(10.0, 20.0), Viewport::new(1000.0, 800.0));
        p.tick(FRAME);
        assert_eq!(p.position(), Point::new(10.0, 20.0));
    }

    #[test]
    fn follows_with_delay() {
        let mut p = proxy(false);
        p.on_pointer(&moved(900.0, 400.0), Viewport::new(1000.0, 800.0));
        p.tick(FRAME);
        assert!(p.position().x < 900.0);
        run(&mut p, Duration::from_millis(1100));
        assert!((p.position().x - 900.0).abs() < 1e-3);
    }

    #[test]
    fn paused_or_hidden_ignores_moves() {
        let vp = Viewport::new(1000.0, 800.0);
        let mut p = proxy(true);
        p.pause();
        p.on_pointer(&moved(1.0, 1.0), vp);
        p.tick(FRAME);
        assert_eq!(p.position(), Point::new(500.0, 400.0));
        p.resume();
        p.on_focus(false);
        p.on_pointer(&moved(1.0, 1.0), vp);
        p.tick(FRAME);
        assert_eq!(p.position(), Point::new(500.0, 400.0));
        assert!(!p.is_visible());
    }

    #[test]
    fn leave_outside_viewport_fades_out() {
        let vp = Viewport::new(1000.0, 800.0);
        let mut p = proxy(true);
        p.on_pointer(
            &PointerEvent::mouse(PointerEventKind::Leave, Point::new(500.0, 400.0)),
            vp,
        );
        assert!(p.is_visible(), "leave inside the viewport is a child hop");
        p.on_pointer(
            &PointerEvent::mouse(PointerEventKind::Leave, Point::new(-1.0, 400.0)),
            vp,
        );
        run(&mut p, Duration::from_millis(320));
        assert_eq!(p.pose().opacity, 0.0);
        p.on_pointer(
            &PointerEvent::mouse(PointerEventKind::Enter, Point::new(5.0, 400.0)),
            vp,
        );
        run(&mut p, Duration::from_millis(320));
        assert!((p.pose().opacity - 0.75).abs() < 1e-4);
    }

    #[test]
    fn advance_returns_bound_action_and_settles() {
        let mut p = proxy(true);
        assert_eq!(p.advance(), None);
        p.bind(Some(AdvanceAction::EnterTitle));
        assert_eq!(p.label(), "Enter");
        assert_eq!(p.advance(), Some(AdvanceAction::EnterTitle));
        run(&mut p, Duration::from_millis(150));
        assert!(p.pose().scale > 1.0);
        run(&mut p, Duration::from_millis(700));
        assert_eq!(p.pose().scale, 1.0);
    }

    #[test]
    fn pulse_ignored_under_reduced_motion() {
        let mut p = proxy(true);
        p.pulse();
        run(&mut p, Duration::from_millis(200));
        assert_eq!(p.pose().scale, 1.0);
    }

    #[test]
    fn repulse_restarts_cleanly() {
        let mut p = proxy(false);
        run(&mut p, Duration::from_millis(400));
        p.pulse();
        run(&mut p, Duration::from_millis(500));
        p.pulse();
        run(&mut p, Duration::from_millis(900));
        assert_eq!(p.pose().scale, 1.0);
    }
}
