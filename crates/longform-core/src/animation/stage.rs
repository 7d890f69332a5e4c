#![forbid(unsafe_code)]

//! Stage: node poses plus the tweens that drive them.
//!
//! The stage is the in-process stand-in for a DOM animation library. It
//! owns the current [`Pose`] of every node it has touched and a list of
//! running property tweens. Completion callbacks are modelled as data: a
//! tween may carry a [`Cue`] label, and [`Stage::tick`] returns the cues of
//! every tween that finished during that tick. Owners match on the label.
//!
//! # Invariants
//!
//! 1. A tween with an explicit `from` renders it immediately on creation.
//! 2. A tween without `from` captures its start values when its delay ends,
//!    not when it is created.
//! 3. When a tween starts, it takes over its properties from any earlier
//!    started tween on the same node. A tween left with no properties is
//!    dropped without emitting its cue.
//! 4. Every cue is emitted at most once.

use std::time::Duration;

use ahash::AHashMap;

use super::{Animation, Delayed, EasingFn, Fade, delay, power2_out};
use crate::pose::{NodeId, Pose, PosePatch, PoseProperty};

/// Handle to a scheduled tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// Emitted when a tween carrying a label completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub tween: TweenId,
    pub node: NodeId,
    pub label: &'static str,
}

/// Description of a tween before it is scheduled.
#[derive(Debug, Clone)]
pub struct TweenSpec {
    node: NodeId,
    from: Option<PosePatch>,
    to: PosePatch,
    duration: Duration,
    delay: Duration,
    easing: EasingFn,
    cue: Option<&'static str>,
}

impl TweenSpec {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(500);

    /// Tween from the node's values at start time to `to`.
    #[must_use]
    pub fn to(node: NodeId, to: PosePatch) -> Self {
        Self {
            node,
            from: None,
            to,
            duration: Self::DEFAULT_DURATION,
            delay: Duration::ZERO,
            easing: power2_out,
            cue: None,
        }
    }

    /// Tween between explicit endpoints.
    #[must_use]
    pub fn from_to(node: NodeId, from: PosePatch, to: PosePatch) -> Self {
        Self {
            from: Some(from),
            ..Self::to(node, to)
        }
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn ease(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Emit a [`Cue`] with this label when the tween completes.
    #[must_use]
    pub fn cue(mut self, label: &'static str) -> Self {
        self.cue = Some(label);
        self
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Delay plus duration.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.delay + self.duration
    }
}

#[derive(Debug)]
struct ActiveTween {
    id: TweenId,
    node: NodeId,
    from: Option<PosePatch>,
    to: PosePatch,
    clock: Delayed<Fade>,
    cue: Option<&'static str>,
    started: bool,
    overwritten: bool,
}

/// Poses and running tweens for every node.
#[derive(Debug, Default)]
pub struct Stage {
    poses: AHashMap<NodeId, Pose>,
    tweens: Vec<ActiveTween>,
    next_id: u64,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pose of `node` ([`Pose::REST`] if never touched).
    #[must_use]
    pub fn pose(&self, node: NodeId) -> Pose {
        self.poses.get(&node).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn has_node(&self, node: NodeId) -> bool {
        self.poses.contains_key(&node)
    }

    /// Immediate property set.
    pub fn set(&mut self, node: NodeId, patch: &PosePatch) {
        patch.apply(self.poses.entry(node).or_default());
    }

    /// Replace the whole pose.
    pub fn set_pose(&mut self, node: NodeId, pose: Pose) {
        self.poses.insert(node, pose);
    }

    /// Schedule a tween.
    pub fn tween(&mut self, spec: TweenSpec) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        if let Some(from) = &spec.from {
            from.apply(self.poses.entry(spec.node).or_default());
        }
        self.tweens.push(ActiveTween {
            id,
            node: spec.node,
            from: spec.from,
            to: spec.to,
            clock: delay(spec.delay, Fade::new(spec.duration).easing(spec.easing)),
            cue: spec.cue,
            started: false,
            overwritten: false,
        });
        id
    }

    /// Cancel one tween. Its cue is never emitted.
    pub fn kill(&mut self, id: TweenId) -> bool {
        let before = self.tweens.len();
        self.tweens.retain(|t| t.id != id);
        before != self.tweens.len()
    }

    /// Cancel every tween on `node`. Returns how many were cancelled.
    pub fn kill_node(&mut self, node: NodeId) -> usize {
        let before = self.tweens.len();
        self.tweens.retain(|t| t.node != node);
        before - self.tweens.len()
    }

    /// Stop animating one property of `node`, leaving other properties running.
    pub fn kill_property(&mut self, node: NodeId, prop: PoseProperty) {
        for tween in self.tweens.iter_mut().filter(|t| t.node == node) {
            if tween.to.remove(prop) && tween.to.is_empty() {
                tween.overwritten = true;
            }
        }
        self.tweens.retain(|t| !t.overwritten);
    }

    /// Forget a node entirely (unmount).
    pub fn remove_node(&mut self, node: NodeId) {
        self.kill_node(node);
        self.poses.remove(&node);
    }

    #[must_use]
    pub fn is_tweening(&self, node: NodeId) -> bool {
        self.tweens.iter().any(|t| t.node == node)
    }

    #[must_use]
    pub fn is_running(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|t| t.id == id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Advance every tween and return the cues of those that completed.
    pub fn tick(&mut self, dt: Duration) -> Vec<Cue> {
        let mut starting = Vec::new();
        for (idx, tween) in self.tweens.iter_mut().enumerate() {
            tween.clock.tick(dt);
            if !tween.started && tween.clock.has_started() {
                starting.push(idx);
            }
        }

        for idx in starting {
            self.start(idx);
        }
        self.tweens.retain(|t| !t.overwritten);

        let mut cues = Vec::new();
        let poses = &mut self.poses;
        self.tweens.retain(|tween| {
            if !tween.started {
                return true;
            }
            let pose = poses.entry(tween.node).or_default();
            if let Some(from) = &tween.from {
                tween.to.lerp_into(from, tween.clock.value(), pose);
            }
            if tween.clock.is_complete() {
                if let Some(label) = tween.cue {
                    cues.push(Cue {
                        tween: tween.id,
                        node: tween.node,
                        label,
                    });
                }
                false
            } else {
                true
            }
        });
        cues
    }

    fn start(&mut self, idx: usize) {
        let node = self.tweens[idx].node;
        let props: Vec<PoseProperty> = self.tweens[idx].to.iter().map(|(p, _)| p).collect();
        for (j, other) in self.tweens.iter_mut().enumerate() {
            if j == idx || other.node != node || !other.started {
                continue;
            }
            let mut touched = false;
            for prop in &props {
                touched |= other.to.remove(*prop);
            }
            if touched && other.to.is_empty() {
                other.overwritten = true;
            }
        }

        let pose = self.poses.get(&node).copied().unwrap_or_default();
        let tween = &mut self.tweens[idx];
        let mut from = tween.to.capture(&pose);
        if let Some(explicit) = &tween.from {
            for (prop, value) in explicit.iter() {
                from.insert(prop, value);
            }
        }
        tween.from = Some(from);
        tween.started = true;
    }

    /// Jump every tween to its end state and return all pending cues.
    ///
    /// Used when the motion profile flips so nothing is left mid-flight.
    pub fn finish_all(&mut self) -> Vec<Cue> {
        let tweens = std::mem::take(&mut self.tweens);
        self.finish(tweens)
    }

    /// Jump every tween on `node` to its end state.
    pub fn finish_node(&mut self, node: NodeId) -> Vec<Cue> {
        let (mine, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tweens).into_iter().partition(|t| t.node == node);
        self.tweens = rest;
        self.finish(mine)
    }

    fn finish(&mut self, tweens: Vec<ActiveTween>) -> Vec<Cue> {
        let mut cues = Vec::new();
        for tween in tweens {
            tween.to.apply(self.poses.entry(tween.node).or_default());
            if let Some(label) = tween.cue {
                cues.push(Cue {
                    tween: tween.id,
                    node: tween.node,
                    label,
                });
            }
        }
        cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::linear;

    const N: NodeId = NodeId(1);
    const MS_100: Duration = Duration::from_millis(100);

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn untouched_node_is_at_rest() {
        let stage = Stage::new();
        assert_eq!(stage.pose(N), Pose::REST);
        assert!(!stage.has_node(N));
    }

    #[test]
    fn from_to_renders_from_immediately() {
        let mut stage = Stage::new();
        stage.tween(
            TweenSpec::from_to(N, PosePatch::new().opacity(0.0), PosePatch::new().opacity(1.0))
                .delay(Duration::from_secs(1)),
        );
        assert_eq!(stage.pose(N).opacity, 0.0);
        stage.tick(MS_100);
        assert_eq!(stage.pose(N).opacity, 0.0);
    }

    #[test]
    fn start_values_captured_after_delay() {
        let mut stage = Stage::new();
        stage.set(N, &PosePatch::new().y(40.0));
        stage.tween(
            TweenSpec::to(N, PosePatch::new().y(0.0))
                .delay(MS_100)
                .duration(Duration::from_millis(200))
                .ease(linear),
        );
        // Moved by someone else during the delay.
        stage.set(N, &PosePatch::new().y(100.0));
        stage.tick(MS_100);
        stage.tick(MS_100);
        assert!(approx(stage.pose(N).y, 50.0));
    }

    #[test]
    fn cue_fires_once_on_completion() {
        let mut stage = Stage::new();
        stage.tween(
            TweenSpec::to(N, PosePatch::new().opacity(0.0))
                .duration(MS_100)
                .cue("faded"),
        );
        assert!(stage.tick(Duration::from_millis(50)).is_empty());
        let cues = stage.tick(Duration::from_millis(50));
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].label, "faded");
        assert_eq!(cues[0].node, N);
        assert_eq!(stage.pose(N).opacity, 0.0);
        assert!(stage.tick(MS_100).is_empty());
        assert_eq!(stage.active_count(), 0);
    }

    #[test]
    fn later_tween_overwrites_shared_properties() {
        let mut stage = Stage::new();
        stage.tween(
            TweenSpec::to(N, PosePatch::new().opacity(0.0))
                .duration(Duration::from_secs(1))
                .cue("exit"),
        );
        stage.tick(MS_100);
        stage.tween(TweenSpec::to(N, PosePatch::new().opacity(1.0)).duration(MS_100));
        let mut cues = Vec::new();
        for _ in 0..20 {
            cues.extend(stage.tick(MS_100));
        }
        assert!(cues.is_empty(), "overwritten tween must not cue");
        assert_eq!(stage.pose(N).opacity, 1.0);
    }

    #[test]
    fn kill_node_drops_cues() {
        let mut stage = Stage::new();
        stage.tween(TweenSpec::to(N, PosePatch::new().x(10.0)).cue("a"));
        stage.tween(TweenSpec::to(NodeId(2), PosePatch::new().x(10.0)));
        assert_eq!(stage.kill_node(N), 1);
        assert!(!stage.is_tweening(N));
        assert!(stage.is_tweening(NodeId(2)));
    }

    #[test]
    fn kill_property_keeps_other_properties() {
        let mut stage = Stage::new();
        stage.tween(
            TweenSpec::to(N, PosePatch::new().x(10.0).rotation(5.0))
                .duration(MS_100)
                .ease(linear),
        );
        stage.kill_property(N, PoseProperty::Rotation);
        stage.tick(MS_100);
        assert!(approx(stage.pose(N).x, 10.0));
        assert_eq!(stage.pose(N).rotation, 0.0);
    }

    #[test]
    fn finish_all_lands_on_targets() {
        let mut stage = Stage::new();
        stage.tween(
            TweenSpec::to(N, PosePatch::new().blur(8.0))
                .delay(Duration::from_secs(2))
                .cue("done"),
        );
        let cues = stage.finish_all();
        assert_eq!(cues.len(), 1);
        assert_eq!(stage.pose(N).blur, 8.0);
        assert_eq!(stage.active_count(), 0);
    }

    #[test]
    fn empty_patch_acts_as_timer() {
        let mut stage = Stage::new();
        stage.tween(TweenSpec::to(N, PosePatch::new()).duration(MS_100).cue("tick"));
        let cues = stage.tick(MS_100);
        assert_eq!(cues.len(), 1);
    }
}
