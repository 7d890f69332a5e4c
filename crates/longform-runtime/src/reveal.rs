#![forbid(unsafe_code)]

//! Scroll-linked reveal engine.
//!
//! Binds text nodes in the content region to [`ScrubTrigger`]s so they fade,
//! un-blur and rise into place as their top edge travels from the viewport
//! bottom to the reveal line. The same machinery drives two decorative
//! scrubs: horizontal drive-bys and caption fades.
//!
//! # Lifecycle
//!
//! ```text
//! bind ──► on_scroll / on_resize / tick ──► unbind
//!   │                                         │
//!   └─ late refresh (300ms)                   └─ every node left at its final pose
//!   └─ drive-by mount (100ms)
//! ```
//!
//! Binding twice without unbinding is not possible: [`RevealEngine::bind`]
//! tears down any existing bindings first.
//!
//! Under reduced motion nothing is bound. Callers use
//! [`RevealEngine::settle`] to render the final state instead.

use std::time::Duration;

use longform_core::animation::{
    EasingFn, ScrubTrigger, Stage, Timeline, linear, power2_in_out, power2_out,
};
use longform_core::pose::{NodeId, PosePatch};

use crate::config::RevealPolicyConfig;
use crate::host::{HostDocument, viewport_rect};

/// Element category, as far as reveal qualification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Heading,
    Paragraph,
    SectionTitle,
    Image,
    Button,
    Other,
}

/// A node in the content region that may get a reveal binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealCandidate {
    pub node: NodeId,
    pub kind: NodeKind,
    /// Non-whitespace text content present.
    pub has_text: bool,
    /// Lives inside a draggable card stack.
    pub in_card_stack: bool,
}

impl RevealCandidate {
    #[must_use]
    pub fn text(node: NodeId, kind: NodeKind) -> Self {
        Self {
            node,
            kind,
            has_text: true,
            in_card_stack: false,
        }
    }

    /// Headings, paragraphs and section titles with text, outside card
    /// stacks.
    #[must_use]
    pub fn qualifies(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Heading | NodeKind::Paragraph | NodeKind::SectionTitle
        ) && self.has_text
            && !self.in_card_stack
    }
}

/// A decorative illustration that crosses the screen horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveBy {
    pub node: NodeId,
    /// Travel right-to-left instead of left-to-right.
    pub reversed: bool,
}

impl DriveBy {
    /// Drive-bys whose direction alternates per occurrence, starting
    /// left-to-right.
    #[must_use]
    pub fn alternating(nodes: &[NodeId]) -> Vec<Self> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| Self {
                node,
                reversed: i % 2 == 1,
            })
            .collect()
    }
}

/// Everything the engine binds in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealTargets {
    pub candidates: Vec<RevealCandidate>,
    pub drive_bys: Vec<DriveBy>,
    pub captions: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    Text,
    DriveBy,
    Caption,
}

#[derive(Debug, Clone)]
struct ScrubBinding {
    node: NodeId,
    kind: BindingKind,
    trigger: ScrubTrigger,
    from: PosePatch,
    to: PosePatch,
    ease: EasingFn,
    /// Progress last written to the stage.
    written: Option<f32>,
}

impl ScrubBinding {
    fn refresh(&mut self, doc: &dyn HostDocument) {
        if let Some(rect) = doc.node_rect(self.node) {
            self.trigger.refresh(rect, doc.viewport());
            self.trigger.update(doc.scroll_y());
        }
    }

    fn write(&mut self, stage: &mut Stage) {
        let progress = self.trigger.progress();
        if self.written == Some(progress) {
            return;
        }
        self.written = Some(progress);
        let mut pose = stage.pose(self.node);
        self.to.lerp_into(&self.from, (self.ease)(progress), &mut pose);
        stage.set_pose(self.node, pose);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealJob {
    Refresh,
    MountDriveBys,
}

#[derive(Debug, Clone)]
pub struct RevealEngine {
    bindings: Vec<ScrubBinding>,
    pending_drive_bys: Vec<DriveBy>,
    drive_bys: Vec<DriveBy>,
    timers: Timeline<RevealJob>,
    bound: bool,
    config: RevealPolicyConfig,
}

impl RevealEngine {
    #[must_use]
    pub fn new(config: RevealPolicyConfig) -> Self {
        Self {
            bindings: Vec::new(),
            pending_drive_bys: Vec::new(),
            drive_bys: Vec::new(),
            timers: Timeline::new(),
            bound: false,
            config,
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Number of live scroll bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn hidden(&self) -> PosePatch {
        PosePatch::new()
            .opacity(0.0)
            .blur(self.config.hidden_blur)
            .y(self.config.hidden_y)
    }

    fn shown() -> PosePatch {
        PosePatch::new().opacity(1.0).blur(0.0).y(0.0)
    }

    /// Bind every qualifying node. Nodes without geometry are skipped.
    pub fn bind(&mut self, targets: &RevealTargets, doc: &dyn HostDocument, stage: &mut Stage) {
        self.unbind(stage);
        let _span = tracing::debug_span!("longform.reveal.bind").entered();

        let viewport = doc.viewport();
        let reveal_line = viewport.height * self.config.reveal_line;
        let (start, end) = self.config.band();
        for candidate in targets.candidates.iter().filter(|c| c.qualifies()) {
            let Some(rect) = viewport_rect(doc, candidate.node) else {
                continue;
            };
            let already_revealed = rect.top() < reveal_line;
            let mut binding = ScrubBinding {
                node: candidate.node,
                kind: BindingKind::Text,
                trigger: ScrubTrigger::new(start, end).with_lag(self.config.lag()),
                from: self.hidden(),
                to: Self::shown(),
                ease: power2_out,
                written: None,
            };
            binding.refresh(doc);
            binding
                .trigger
                .snap_progress(if already_revealed { 1.0 } else { 0.0 });
            binding.trigger.update(doc.scroll_y());
            binding.write(stage);
            self.bindings.push(binding);
        }

        let (start, end) = self.config.drive_band();
        for &node in &targets.captions {
            if doc.node_rect(node).is_none() {
                continue;
            }
            stage.set(node, &PosePatch::new().opacity(1.0).blur(0.0));
            let mut binding = ScrubBinding {
                node,
                kind: BindingKind::Caption,
                trigger: ScrubTrigger::new(start, end),
                from: PosePatch::new().opacity(1.0).blur(0.0),
                to: PosePatch::new().opacity(0.0).blur(self.config.caption_blur),
                ease: power2_in_out,
                written: None,
            };
            binding.refresh(doc);
            binding.write(stage);
            self.bindings.push(binding);
        }

        self.pending_drive_bys = targets.drive_bys.clone();
        self.timers
            .schedule(self.config.late_refresh(), RevealJob::Refresh);
        if !self.pending_drive_bys.is_empty() {
            self.timers
                .schedule(self.config.drive_mount_delay(), RevealJob::MountDriveBys);
        }
        self.bound = true;
        tracing::debug!(
            bindings = self.bindings.len(),
            drive_bys = self.pending_drive_bys.len(),
            "reveal bindings attached"
        );
    }

    /// (Re)create the drive-by bindings from current geometry.
    fn mount_drive_bys(&mut self, doc: &dyn HostDocument, stage: &mut Stage) {
        self.bindings.retain(|b| b.kind != BindingKind::DriveBy);
        if !self.pending_drive_bys.is_empty() {
            self.drive_bys = std::mem::take(&mut self.pending_drive_bys);
        }
        let distance = self.config.drive_distance(doc.viewport().width);
        let (start, end) = self.config.drive_band();
        for drive in &self.drive_bys {
            if doc.node_rect(drive.node).is_none() {
                continue;
            }
            let (from, to) = if drive.reversed {
                (distance, -distance)
            } else {
                (-distance, distance)
            };
            stage.kill_node(drive.node);
            stage.set(drive.node, &PosePatch::new().x(from));
            let mut binding = ScrubBinding {
                node: drive.node,
                kind: BindingKind::DriveBy,
                trigger: ScrubTrigger::new(start, end).with_lag(self.config.drive_lag()),
                from: PosePatch::new().x(from),
                to: PosePatch::new().x(to),
                ease: linear,
                written: None,
            };
            binding.refresh(doc);
            let raw = binding.trigger.raw_progress();
            binding.trigger.snap_progress(raw);
            binding.write(stage);
            self.bindings.push(binding);
        }
    }

    fn refresh_all(&mut self, doc: &dyn HostDocument) {
        for binding in &mut self.bindings {
            binding.refresh(doc);
        }
    }

    /// Detach every binding and leave each node at its final pose.
    pub fn unbind(&mut self, stage: &mut Stage) {
        if !self.bound {
            return;
        }
        for binding in self.bindings.drain(..) {
            let rest = match binding.kind {
                BindingKind::Text => Self::shown(),
                BindingKind::DriveBy => PosePatch::new().x(0.0),
                BindingKind::Caption => PosePatch::new().opacity(1.0).blur(0.0),
            };
            stage.set(binding.node, &rest);
        }
        for drive in self.pending_drive_bys.drain(..).chain(self.drive_bys.drain(..)) {
            stage.set(drive.node, &PosePatch::new().x(0.0));
        }
        self.timers.clear();
        self.bound = false;
        tracing::debug!("reveal bindings detached");
    }

    /// Render every target in its final state without binding anything.
    pub fn settle(&mut self, targets: &RevealTargets, stage: &mut Stage) {
        self.unbind(stage);
        for candidate in targets.candidates.iter().filter(|c| c.qualifies()) {
            stage.set(candidate.node, &Self::shown());
        }
        for drive in &targets.drive_bys {
            stage.set(drive.node, &PosePatch::new().x(0.0));
        }
        for &node in &targets.captions {
            stage.set(node, &PosePatch::new().opacity(1.0).blur(0.0));
        }
    }

    /// Document scroll moved.
    pub fn on_scroll(&mut self, scroll_y: f32) {
        for binding in &mut self.bindings {
            binding.trigger.update(scroll_y);
        }
    }

    /// Viewport resized: recompute geometry and rebuild drive-bys.
    pub fn on_resize(&mut self, doc: &dyn HostDocument, stage: &mut Stage) {
        if !self.bound {
            return;
        }
        self.refresh_all(doc);
        if !self.drive_bys.is_empty() {
            self.mount_drive_bys(doc, stage);
        }
    }

    pub fn tick(&mut self, dt: Duration, doc: &dyn HostDocument, stage: &mut Stage) {
        if !self.bound {
            return;
        }
        for job in self.timers.advance(dt) {
            match job {
                RevealJob::Refresh => {
                    tracing::trace!("late reveal refresh");
                    self.refresh_all(doc);
                }
                RevealJob::MountDriveBys => self.mount_drive_bys(doc, stage),
            }
        }
        for binding in &mut self.bindings {
            binding.trigger.tick(dt);
            binding.write(stage);
        }
    }

    /// Smoothed progress of the binding for `node`.
    #[must_use]
    pub fn progress(&self, node: NodeId) -> Option<f32> {
        self.bindings
            .iter()
            .find(|b| b.node == node)
            .map(|b| b.trigger.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::TestDocument;
    use longform_core::geometry::Rect;

    const FRAME: Duration = Duration::from_millis(16);

    fn run(engine: &mut RevealEngine, doc: &TestDocument, stage: &mut Stage, total: Duration) {
        let mut t = Duration::ZERO;
        while t < total {
            engine.tick(FRAME, doc, stage);
            t += FRAME;
        }
    }

    fn targets(nodes: &[NodeId]) -> RevealTargets {
        RevealTargets {
            candidates: nodes
                .iter()
                .map(|&n| RevealCandidate::text(n, NodeKind::Paragraph))
                .collect(),
            ..RevealTargets::default()
        }
    }

    #[test]
    fn qualification_filter() {
        let p = RevealCandidate::text(NodeId(1), NodeKind::Paragraph);
        assert!(p.qualifies());
        assert!(!RevealCandidate::text(NodeId(2), NodeKind::Image).qualifies());
        assert!(!RevealCandidate::text(NodeId(3), NodeKind::Button).qualifies());
        assert!(
            !RevealCandidate {
                in_card_stack: true,
                ..p
            }
            .qualifies()
        );
        assert!(
            !RevealCandidate {
                has_text: false,
                ..p
            }
            .qualifies()
        );
    }

    #[test]
    fn initial_pose_depends_on_reveal_line() {
        let doc = TestDocument::new(1000.0, 1000.0)
            .with_rect(NodeId(1), Rect::new(0.0, 200.0, 600.0, 50.0))
            .with_rect(NodeId(2), Rect::new(0.0, 1500.0, 600.0, 50.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        engine.bind(&targets(&[NodeId(1), NodeId(2)]), &doc, &mut stage);

        let above = stage.pose(NodeId(1));
        assert_eq!((above.opacity, above.y, above.blur), (1.0, 0.0, 0.0));
        assert!(!stage.is_tweening(NodeId(1)));
        let below = stage.pose(NodeId(2));
        assert_eq!((below.opacity, below.y, below.blur), (0.0, 40.0, 10.0));
    }

    #[test]
    fn progress_trails_scroll() {
        let mut doc = TestDocument::new(1000.0, 1000.0)
            .with_rect(NodeId(1), Rect::new(0.0, 1500.0, 600.0, 50.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        engine.bind(&targets(&[NodeId(1)]), &doc, &mut stage);

        // top reaches the 70% line at scroll 800
        doc.scroll_y = 900.0;
        engine.on_scroll(doc.scroll_y);
        run(&mut engine, &doc, &mut stage, FRAME);
        let early = stage.pose(NodeId(1)).opacity;
        assert!(early > 0.0 && early < 1.0);
        run(&mut engine, &doc, &mut stage, Duration::from_millis(1100));
        assert_eq!(stage.pose(NodeId(1)).opacity, 1.0);
    }

    #[test]
    fn nodes_without_geometry_are_skipped() {
        let doc = TestDocument::new(1000.0, 1000.0);
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        engine.bind(&targets(&[NodeId(7)]), &doc, &mut stage);
        assert_eq!(engine.binding_count(), 0);
        assert!(engine.is_bound());
    }

    #[test]
    fn rebinding_replaces_bindings() {
        let doc = TestDocument::new(1000.0, 1000.0)
            .with_rect(NodeId(1), Rect::new(0.0, 1500.0, 600.0, 50.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        let t = targets(&[NodeId(1)]);
        engine.bind(&t, &doc, &mut stage);
        engine.bind(&t, &doc, &mut stage);
        assert_eq!(engine.binding_count(), 1);
        engine.unbind(&mut stage);
        assert_eq!(engine.binding_count(), 0);
        assert_eq!(stage.pose(NodeId(1)).opacity, 1.0);
    }

    #[test]
    fn drive_by_mounts_after_delay_and_alternates() {
        let doc = TestDocument::new(1000.0, 1000.0)
            .with_rect(NodeId(5), Rect::new(0.0, 3000.0, 200.0, 100.0))
            .with_rect(NodeId(6), Rect::new(0.0, 4000.0, 200.0, 100.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        let targets = RevealTargets {
            drive_bys: DriveBy::alternating(&[NodeId(5), NodeId(6)]),
            ..RevealTargets::default()
        };
        engine.bind(&targets, &doc, &mut stage);
        assert_eq!(engine.binding_count(), 0);
        run(&mut engine, &doc, &mut stage, Duration::from_millis(112));
        assert_eq!(engine.binding_count(), 2);
        assert_eq!(stage.pose(NodeId(5)).x, -500.0);
        assert_eq!(stage.pose(NodeId(6)).x, 500.0);
    }

    #[test]
    fn drive_distance_is_capped() {
        let doc = TestDocument::new(2400.0, 1000.0)
            .with_rect(NodeId(5), Rect::new(0.0, 3000.0, 200.0, 100.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        let targets = RevealTargets {
            drive_bys: vec![DriveBy {
                node: NodeId(5),
                reversed: false,
            }],
            ..RevealTargets::default()
        };
        engine.bind(&targets, &doc, &mut stage);
        run(&mut engine, &doc, &mut stage, Duration::from_millis(112));
        assert_eq!(stage.pose(NodeId(5)).x, -800.0);
    }

    #[test]
    fn caption_fades_without_lag() {
        let mut doc = TestDocument::new(1000.0, 1000.0)
            .with_rect(NodeId(9), Rect::new(0.0, 2000.0, 600.0, 40.0));
        let mut stage = Stage::new();
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        let targets = RevealTargets {
            captions: vec![NodeId(9)],
            ..RevealTargets::default()
        };
        engine.bind(&targets, &doc, &mut stage);
        assert_eq!(stage.pose(NodeId(9)).opacity, 1.0);
        // band ends when the top reaches 20%: scroll 1800
        doc.scroll_y = 1800.0;
        engine.on_scroll(doc.scroll_y);
        engine.tick(FRAME, &doc, &mut stage);
        let caption = stage.pose(NodeId(9));
        assert_eq!((caption.opacity, caption.blur), (0.0, 8.0));
    }

    #[test]
    fn settle_renders_final_state() {
        let mut stage = Stage::new();
        stage.set(NodeId(1), &PosePatch::new().opacity(0.0).y(40.0));
        let mut engine = RevealEngine::new(RevealPolicyConfig::default());
        engine.settle(&targets(&[NodeId(1)]), &mut stage);
        let pose = stage.pose(NodeId(1));
        assert_eq!((pose.opacity, pose.y), (1.0, 0.0));
    }
}
