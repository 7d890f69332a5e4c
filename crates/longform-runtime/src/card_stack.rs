#![forbid(unsafe_code)]

//! Draggable card stack.
//!
//! Overlapping photo cards, each draggable within generous bounds around
//! the container. Pressing a card brings it to the front; dragging tilts
//! it in proportion to its offset; releasing lets it coast and springs the
//! tilt back to the card's rest rotation.
//!
//! Stacking order lives in a [`ZOrderArena`], the only writer of card
//! z-indices. Hosts read [`CardStack::z_index`] after every frame, so no
//! external agent can leave a stale value behind.
//!
//! # Invariants
//!
//! 1. A press always yields a z-index strictly greater than every z-index
//!    handed out before it.
//! 2. [`CardStack::relayout`] keeps offsets, rotations and z-indices of
//!    cards that survive the new descriptor list.
//! 3. Under reduced motion cards are static: presses are ignored.

use std::time::Duration;

use longform_core::animation::{Bounds, Inertia, Stage, TweenSpec, elastic_out};
use longform_core::geometry::{Point, Size};
use longform_core::motion::MotionProfile;
use longform_core::pose::{NodeId, PoseProperty, PosePatch};

use crate::config::CardPolicyConfig;

const DEFAULT_OFFSET_STEP: f32 = 35.0;
const DEFAULT_WIDTH: f32 = 300.0;
const DEFAULT_HEIGHT: f32 = 400.0;

/// Static description of one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDescriptor {
    /// Stable identity across re-renders.
    pub key: String,
    pub image: String,
    pub node: NodeId,
    /// Degrees.
    pub rest_rotation: f32,
    pub rest_left: Option<f32>,
    pub rest_top: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl CardDescriptor {
    #[must_use]
    pub fn new(key: impl Into<String>, image: impl Into<String>, node: NodeId) -> Self {
        Self {
            key: key.into(),
            image: image.into(),
            node,
            rest_rotation: 0.0,
            rest_left: None,
            rest_top: None,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rest_rotation = degrees;
        self
    }

    #[must_use]
    pub fn offset(mut self, left: f32, top: f32) -> Self {
        self.rest_left = Some(left);
        self.rest_top = Some(top);
        self
    }

    #[must_use]
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Where a card sits before any dragging, relative to the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub left: f32,
    pub top: f32,
    pub size: Size,
}

/// Fallback positions fan the cards out diagonally.
fn rest_layout(descriptor: &CardDescriptor, index: usize) -> CardLayout {
    let step = DEFAULT_OFFSET_STEP * index as f32;
    CardLayout {
        left: descriptor.rest_left.unwrap_or(step),
        top: descriptor.rest_top.unwrap_or(step * 0.8),
        size: Size::new(
            descriptor.width.unwrap_or(DEFAULT_WIDTH),
            descriptor.height.unwrap_or(DEFAULT_HEIGHT),
        ),
    }
}

/// Authoritative card index → z-index store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZOrderArena {
    z: Vec<u32>,
    top: u32,
}

impl ZOrderArena {
    /// First card on top: card `i` of `len` rests at `len - i`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let top = u32::try_from(len).unwrap_or(u32::MAX);
        Self {
            z: (0..len).map(|i| top - i as u32).collect(),
            top,
        }
    }

    /// Move `index` above everything handed out so far.
    pub fn bump(&mut self, index: usize) -> Option<u32> {
        let slot = self.z.get_mut(index)?;
        self.top = self.top.saturating_add(1);
        *slot = self.top;
        Some(self.top)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.z.get(index).copied()
    }

    /// Highest z-index handed out.
    #[must_use]
    pub fn top(&self) -> u32 {
        self.top
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Rebuild for `len` cards, keeping saved values where present. The top
    /// never decreases.
    fn resize_with(&mut self, len: usize, saved: &[u32]) {
        let mut fresh = Self::new(len);
        for (slot, &z) in fresh.z.iter_mut().zip(saved) {
            *slot = z;
        }
        let saved_max = saved.iter().copied().max().unwrap_or(0);
        fresh.top = self.top.max(fresh.top).max(saved_max);
        *self = fresh;
    }
}

#[derive(Debug, Clone)]
struct CardInstance {
    descriptor: CardDescriptor,
    layout: CardLayout,
    /// `None` while cards are static.
    drag: Option<Inertia>,
    throwing: bool,
}

#[derive(Debug, Clone)]
pub struct CardStack {
    cards: Vec<CardInstance>,
    z: ZOrderArena,
    container: Size,
    interactive: bool,
    dragging: Option<usize>,
    config: CardPolicyConfig,
}

impl CardStack {
    #[must_use]
    pub fn new(
        descriptors: Vec<CardDescriptor>,
        container: Size,
        profile: MotionProfile,
        config: CardPolicyConfig,
        stage: &mut Stage,
    ) -> Self {
        let mut stack = Self {
            cards: Vec::new(),
            z: ZOrderArena::new(descriptors.len()),
            container,
            interactive: !profile.reduced_motion,
            dragging: None,
            config,
        };
        stack.build(descriptors, &[], stage);
        tracing::debug!(
            cards = stack.cards.len(),
            interactive = stack.interactive,
            "card stack mounted"
        );
        stack
    }

    fn bounds(&self) -> Bounds {
        Bounds::symmetric(self.container.max_side() * self.config.reach_fraction)
    }

    fn build(&mut self, descriptors: Vec<CardDescriptor>, saved: &[SavedCard], stage: &mut Stage) {
        let bounds = self.bounds();
        let interactive = self.interactive;
        let resistance = self.config.edge_resistance;
        self.cards = descriptors
            .into_iter()
            .enumerate()
            .map(|(i, descriptor)| {
                let saved = saved.get(i);
                let position = saved.map_or(Point::ZERO, |s| s.position);
                let rotation = saved.map_or(descriptor.rest_rotation, |s| s.rotation);
                stage.set(
                    descriptor.node,
                    &PosePatch::new()
                        .x(position.x)
                        .y(position.y)
                        .rotation(rotation),
                );
                let drag = interactive.then(|| Inertia::new(position, bounds, resistance));
                CardInstance {
                    layout: rest_layout(&descriptor, i),
                    descriptor,
                    drag,
                    throwing: false,
                }
            })
            .collect();
        for i in 0..self.cards.len() {
            let node = self.cards[i].descriptor.node;
            let rest = self.cards[i].descriptor.rest_rotation;
            if stage.pose(node).rotation != rest {
                self.settle_rotation(i, stage);
            }
        }
    }

    /// Rebuild for a new descriptor list, container size, or motion
    /// profile, carrying the current arrangement over by index.
    pub fn relayout(
        &mut self,
        descriptors: Vec<CardDescriptor>,
        container: Size,
        profile: MotionProfile,
        stage: &mut Stage,
    ) {
        let saved: Vec<SavedCard> = self
            .cards
            .iter()
            .map(|card| {
                let pose = stage.pose(card.descriptor.node);
                SavedCard {
                    position: Point::new(pose.x, pose.y),
                    rotation: pose.rotation,
                }
            })
            .collect();
        let saved_z: Vec<u32> = (0..self.cards.len())
            .filter_map(|i| self.z.get(i))
            .collect();
        self.unmount(stage);

        self.container = container;
        self.interactive = !profile.reduced_motion;
        self.z.resize_with(descriptors.len(), &saved_z);
        let saved = if self.interactive {
            saved
        } else {
            // static cards keep offsets but rest their tilt
            saved
                .into_iter()
                .zip(&descriptors)
                .map(|(s, d)| SavedCard {
                    rotation: d.rest_rotation,
                    ..s
                })
                .collect()
        };
        self.build(descriptors, &saved, stage);
        tracing::debug!(cards = self.cards.len(), top = self.z.top(), "card stack relayout");
    }

    /// Detach every drag and tween.
    pub fn unmount(&mut self, stage: &mut Stage) {
        for card in &self.cards {
            stage.kill_node(card.descriptor.node);
        }
        self.dragging = None;
    }

    /// Card owning `node`.
    #[must_use]
    pub fn card_at(&self, node: NodeId) -> Option<usize> {
        self.cards.iter().position(|c| c.descriptor.node == node)
    }

    /// Pointer down on card `index`. Returns its new z-index.
    pub fn press(&mut self, index: usize, pointer: Point, stage: &mut Stage) -> Option<u32> {
        let card = self.cards.get_mut(index)?;
        let drag = card.drag.as_mut()?;
        drag.press(pointer);
        card.throwing = false;
        stage.kill_property(card.descriptor.node, PoseProperty::Rotation);
        self.dragging = Some(index);
        let z = self.z.bump(index);
        tracing::trace!(index, ?z, "card pressed");
        z
    }

    /// Pointer moved with a card held.
    pub fn drag(&mut self, pointer: Point, stage: &mut Stage) {
        let Some(index) = self.dragging else {
            return;
        };
        let Some(drag) = self.cards.get_mut(index).and_then(|c| c.drag.as_mut()) else {
            return;
        };
        drag.drag_to(pointer);
        self.write(index, stage);
    }

    /// Pointer up. Starts a throw or springs the tilt back.
    pub fn release(&mut self, stage: &mut Stage) {
        let Some(index) = self.dragging.take() else {
            return;
        };
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let throwing = card.drag.as_mut().is_some_and(Inertia::release);
        card.throwing = throwing;
        if !throwing {
            self.settle_rotation(index, stage);
        }
    }

    fn settle_rotation(&self, index: usize, stage: &mut Stage) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        if !self.interactive {
            stage.set(
                card.descriptor.node,
                &PosePatch::new().rotation(card.descriptor.rest_rotation),
            );
            return;
        }
        stage.tween(
            TweenSpec::to(
                card.descriptor.node,
                PosePatch::new().rotation(card.descriptor.rest_rotation),
            )
            .duration(self.config.settle())
            .ease(elastic_out),
        );
    }

    /// Offset and drag-derived tilt into the stage.
    fn write(&self, index: usize, stage: &mut Stage) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        let Some(drag) = &card.drag else {
            return;
        };
        let p = drag.position();
        let tilt = card.descriptor.rest_rotation + (p.x + p.y) * self.config.rotation_per_px;
        stage.set(
            card.descriptor.node,
            &PosePatch::new().x(p.x).y(p.y).rotation(tilt),
        );
    }

    pub fn tick(&mut self, dt: Duration, stage: &mut Stage) {
        for i in 0..self.cards.len() {
            let card = &mut self.cards[i];
            let Some(drag) = card.drag.as_mut() else {
                continue;
            };
            let moved = drag.tick(dt);
            let ended = card.throwing && !drag.is_throwing();
            if moved {
                self.write(i, stage);
            }
            if ended {
                self.cards[i].throwing = false;
                self.settle_rotation(i, stage);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    #[must_use]
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    #[must_use]
    pub fn z_index(&self, index: usize) -> Option<u32> {
        self.z.get(index)
    }

    #[must_use]
    pub fn z_order(&self) -> &ZOrderArena {
        &self.z
    }

    #[must_use]
    pub fn layout(&self, index: usize) -> Option<CardLayout> {
        self.cards.get(index).map(|c| c.layout)
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<NodeId> {
        self.cards.get(index).map(|c| c.descriptor.node)
    }

    /// Current drag offset of card `index`.
    #[must_use]
    pub fn offset(&self, index: usize, stage: &Stage) -> Option<Point> {
        let node = self.node(index)?;
        let pose = stage.pose(node);
        Some(Point::new(pose.x, pose.y))
    }
}

#[derive(Debug, Clone, Copy)]
struct SavedCard {
    position: Point,
    rotation: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn descriptors() -> Vec<CardDescriptor> {
        vec![
            CardDescriptor::new("a", "a.jpg", NodeId(10)).rotation(-4.0),
            CardDescriptor::new("b", "b.jpg", NodeId(11)).rotation(3.0),
            CardDescriptor::new("c", "c.jpg", NodeId(12)).offset(80.0, 20.0),
        ]
    }

    fn stack(profile: MotionProfile, stage: &mut Stage) -> CardStack {
        CardStack::new(
            descriptors(),
            Size::new(600.0, 400.0),
            profile,
            CardPolicyConfig::default(),
            stage,
        )
    }

    fn run(stack: &mut CardStack, stage: &mut Stage, total: Duration) {
        let mut t = Duration::ZERO;
        while t < total {
            stage.tick(FRAME);
            stack.tick(FRAME, stage);
            t += FRAME;
        }
    }

    #[test]
    fn rest_arrangement() {
        let mut stage = Stage::new();
        let s = stack(MotionProfile::FULL, &mut stage);
        assert_eq!(
            (s.z_index(0), s.z_index(1), s.z_index(2)),
            (Some(3), Some(2), Some(1))
        );
        assert_eq!(stage.pose(NodeId(10)).rotation, -4.0);
        let fanned = s.layout(1).map(|l| (l.left, l.top));
        assert_eq!(fanned, Some((35.0, 28.0)));
        assert_eq!(s.layout(2).map(|l| l.left), Some(80.0));
    }

    #[test]
    fn press_brings_to_front() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        let a = s.press(2, Point::ZERO, &mut stage);
        s.release(&mut stage);
        let b = s.press(0, Point::ZERO, &mut stage);
        s.release(&mut stage);
        assert_eq!(a, Some(4));
        assert_eq!(b, Some(5));
        assert!(s.z_index(0) > s.z_index(2));
    }

    #[test]
    fn drag_tilts_and_release_springs_back() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        s.press(1, Point::new(100.0, 100.0), &mut stage);
        s.drag(Point::new(140.0, 120.0), &mut stage);
        let pose = stage.pose(NodeId(11));
        assert_eq!((pose.x, pose.y), (40.0, 20.0));
        assert!((pose.rotation - (3.0 + 60.0 * 0.05)).abs() < 1e-4);

        s.release(&mut stage);
        run(&mut s, &mut stage, Duration::from_millis(700));
        let pose = stage.pose(NodeId(11));
        assert_eq!(pose.rotation, 3.0);
        assert_eq!((pose.x, pose.y), (40.0, 20.0));
    }

    #[test]
    fn edge_resistance_damps_overshoot() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        // reach is 600 * 0.8 = 480
        s.press(0, Point::ZERO, &mut stage);
        s.drag(Point::new(580.0, 0.0), &mut stage);
        assert_eq!(stage.pose(NodeId(10)).x, 530.0);
    }

    #[test]
    fn throw_keeps_final_offset_inside_bounds() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        s.press(0, Point::ZERO, &mut stage);
        run(&mut s, &mut stage, FRAME);
        s.drag(Point::new(100.0, 0.0), &mut stage);
        run(&mut s, &mut stage, FRAME);
        s.drag(Point::new(200.0, 0.0), &mut stage);
        s.release(&mut stage);
        run(&mut s, &mut stage, Duration::from_millis(2500));
        let pose = stage.pose(NodeId(10));
        assert!(pose.x > 200.0 && pose.x <= 480.0);
        assert!((pose.rotation + 4.0).abs() < 1e-4);
        assert!(!stage.is_tweening(NodeId(10)));
    }

    #[test]
    fn relayout_restores_arrangement() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        s.press(0, Point::ZERO, &mut stage);
        s.drag(Point::new(30.0, -10.0), &mut stage);
        s.release(&mut stage);
        s.press(1, Point::ZERO, &mut stage);
        s.drag(Point::new(-50.0, 5.0), &mut stage);
        s.release(&mut stage);
        run(&mut s, &mut stage, Duration::from_millis(700));

        s.relayout(
            descriptors(),
            Size::new(500.0, 300.0),
            MotionProfile::FULL,
            &mut stage,
        );
        assert_eq!(s.offset(0, &stage), Some(Point::new(30.0, -10.0)));
        assert_eq!(s.offset(1, &stage), Some(Point::new(-50.0, 5.0)));
        assert!(s.z_index(1) > s.z_index(0));
        let z = s.press(2, Point::ZERO, &mut stage);
        assert!(z > s.z_index(1));
    }

    #[test]
    fn reduced_motion_is_static() {
        let reduced = MotionProfile {
            reduced_motion: true,
            is_touch_device: false,
        };
        let mut stage = Stage::new();
        let mut s = stack(reduced, &mut stage);
        assert!(!s.is_interactive());
        assert_eq!(s.press(0, Point::ZERO, &mut stage), None);
        assert_eq!(s.z_index(0), Some(3));
    }

    #[test]
    fn profile_flip_mid_drag_settles_tilt() {
        let mut stage = Stage::new();
        let mut s = stack(MotionProfile::FULL, &mut stage);
        s.press(0, Point::ZERO, &mut stage);
        s.drag(Point::new(100.0, 0.0), &mut stage);
        let reduced = MotionProfile {
            reduced_motion: true,
            is_touch_device: false,
        };
        s.relayout(descriptors(), Size::new(600.0, 400.0), reduced, &mut stage);
        assert_eq!(stage.pose(NodeId(10)).rotation, -4.0);
        assert_eq!(s.dragging(), None);

        s.relayout(
            descriptors(),
            Size::new(600.0, 400.0),
            MotionProfile::FULL,
            &mut stage,
        );
        assert_eq!(stage.pose(NodeId(10)).rotation, -4.0);
        assert_eq!(s.offset(0, &stage), Some(Point::new(100.0, 0.0)));
    }
}
