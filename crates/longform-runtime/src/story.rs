#![forbid(unsafe_code)]

//! Story: the composition root.
//!
//! A [`Story`] owns one [`Stage`] and every component, routes canonical
//! [`Event`]s to them, and steps them once per frame in [`Story::tick`].
//! The platform is reached only through the [`Host`] passed into each call.
//!
//! # Frame order
//!
//! ```text
//! stage.tick ─► cues ─► intro / slides / overlays
//!            ─► intro timers ─► pointer proxy ─► backgrounds
//!            ─► reveal scrubs ─► chapter frame ─► cards ─► audio
//! ```
//!
//! Effects the intro sequencer returns are applied in order, as they
//! arrive, before the next component runs.

use std::time::Duration;

use longform_core::animation::{Stage, TweenSpec, power2_out};
use longform_core::event::{
    ClickEvent, Event, HitTarget, KeyEvent, PointerEvent, PointerEventKind,
};
use longform_core::geometry::{Size, Viewport};
use longform_core::motion::{MotionProfile, MotionSignals};
use longform_core::pose::{NodeId, Pose, PosePatch};

use crate::audio::{AmbientAudio, OverlayRegistry, OverlaySpec};
use crate::background::{BackgroundLayer, BackgroundNodes};
use crate::card_stack::{CardDescriptor, CardStack};
use crate::chapter::{Chapter, ChapterLocator};
use crate::config::StoryConfig;
use crate::cursor::{AdvanceAction, CursorControl, PointerProxy};
use crate::host::{AudioSlot, Host, MediaEvent};
use crate::intro::{IntroEffect, IntroPhase, IntroSequencer, KeyRoute};
use crate::motion::MotionDetector;
use crate::reveal::{RevealEngine, RevealTargets};
use crate::slide::{SlideAnimator, SlideNodes};

/// Cards of one chapter and the box they are laid out in.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStackLayout {
    pub cards: Vec<CardDescriptor>,
    pub container: Size,
}

/// Node ids of everything the story animates.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryLayout {
    pub intro_container: NodeId,
    pub title: NodeId,
    /// Pointer proxy (non-touch devices).
    pub cursor: NodeId,
    /// Touch "Continue" control.
    pub touch_fallback: NodeId,
    pub slides: Vec<SlideNodes>,
    /// One per slide, same order.
    pub backgrounds: Vec<BackgroundNodes>,
    pub reveal: RevealTargets,
    pub chapters: Vec<Chapter>,
    pub card_stacks: Vec<CardStackLayout>,
    pub overlays: Vec<OverlaySpec>,
}

/// Whether the host should suppress the platform default for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    PreventDefault,
}

impl Disposition {
    #[must_use]
    pub fn prevents_default(self) -> bool {
        self == Self::PreventDefault
    }

    fn from_flag(prevent: bool) -> Self {
        if prevent {
            Self::PreventDefault
        } else {
            Self::Default
        }
    }
}

#[derive(Debug)]
pub struct Story {
    stage: Stage,
    motion: MotionDetector,
    proxy: Option<PointerProxy>,
    intro: IntroSequencer,
    slides: SlideAnimator,
    backgrounds: BackgroundLayer,
    reveal: RevealEngine,
    cards: Vec<CardStack>,
    card_layouts: Vec<CardStackLayout>,
    dragging: Option<usize>,
    chapters: ChapterLocator,
    ambient: AmbientAudio,
    overlays: OverlayRegistry,
    layout: StoryLayout,
    viewport: Viewport,
    config: StoryConfig,
    mounted: bool,
}

impl Story {
    /// Build every component. Nothing is shown until [`Story::mount`].
    #[must_use]
    pub fn new(
        config: StoryConfig,
        layout: StoryLayout,
        signals: MotionSignals,
        viewport: Viewport,
    ) -> Self {
        let motion = MotionDetector::new(signals);
        let profile = motion.profile();
        let mut stage = Stage::new();
        let mut intro_config = config.intro.clone();
        intro_config.slide_count = layout.slides.len();
        let cards = layout
            .card_stacks
            .iter()
            .map(|l| {
                CardStack::new(
                    l.cards.clone(),
                    l.container,
                    profile,
                    config.cards.clone(),
                    &mut stage,
                )
            })
            .collect();
        Self {
            motion,
            proxy: None,
            intro: IntroSequencer::new(layout.title, layout.intro_container, intro_config),
            slides: SlideAnimator::new(layout.slides.clone(), config.slides.clone()),
            backgrounds: BackgroundLayer::new(
                layout.backgrounds.clone(),
                config.background.clone(),
            ),
            reveal: RevealEngine::new(config.reveal.clone()),
            cards,
            card_layouts: layout.card_stacks.clone(),
            dragging: None,
            chapters: ChapterLocator::new(layout.chapters.clone(), config.chapters.clone()),
            ambient: AmbientAudio::new(config.audio.clone()),
            overlays: OverlayRegistry::new(layout.overlays.clone(), &config.audio),
            stage,
            layout,
            viewport,
            config,
            mounted: false,
        }
    }

    /// Present the title screen and lock scrolling.
    pub fn mount(&mut self, host: &mut dyn Host) {
        if self.mounted {
            return;
        }
        let _span = tracing::info_span!("longform.story.mount").entered();
        self.mounted = true;
        let profile = self.profile();
        self.viewport = host.document().viewport();
        self.sync_proxy();
        self.ambient.configure(host);
        self.slides.mount(&mut self.stage, profile);
        self.backgrounds.mount(&mut self.stage);
        self.overlays.mount(&mut self.stage);
        let effects = self.intro.mount(&mut self.stage, profile);
        self.apply(effects, host);
    }

    /// Tear everything down. Always leaves the document scrollable.
    pub fn unmount(&mut self, host: &mut dyn Host) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        let effects = self.intro.unmount();
        self.apply(effects, host);
        self.reveal.unbind(&mut self.stage);
        for stack in &mut self.cards {
            stack.unmount(&mut self.stage);
        }
        self.dragging = None;
        self.chapters.set_enabled(false);
        self.overlays.close_all(&mut self.stage);
        self.ambient.stop_now(host);
        self.proxy = None;
        tracing::info!("story unmounted");
    }

    /// Route one input event.
    pub fn handle_event(&mut self, event: &Event, host: &mut dyn Host) -> Disposition {
        if !self.mounted {
            return Disposition::Default;
        }
        if event.is_user_gesture() {
            self.ambient.on_gesture(host);
        }
        match event {
            Event::Key(key) => self.on_key(key, host),
            Event::Pointer(pointer) => {
                self.on_pointer(pointer);
                Disposition::Default
            }
            Event::Click(click) => {
                self.on_click(click, host);
                Disposition::Default
            }
            Event::Wheel { .. } | Event::TouchMove => {
                Disposition::from_flag(self.intro.blocks_scroll())
            }
            Event::Scroll { y } => {
                self.reveal.on_scroll(*y);
                self.chapters.on_scroll();
                Disposition::Default
            }
            Event::Resize(viewport) => {
                self.viewport = *viewport;
                self.reveal.on_resize(host.document(), &mut self.stage);
                Disposition::Default
            }
            Event::Focus(focused) => {
                if let Some(proxy) = &mut self.proxy {
                    proxy.on_focus(*focused);
                }
                Disposition::Default
            }
            Event::ReducedMotionChanged(reduced) => {
                if self.motion.set_reduced_motion(*reduced) {
                    self.reconcile(host);
                }
                Disposition::Default
            }
        }
    }

    fn on_key(&mut self, key: &KeyEvent, host: &mut dyn Host) -> Disposition {
        let route = self.intro.route_key(key);
        match route {
            KeyRoute::Advance => self.advance(host),
            KeyRoute::Begin => self.perform(AdvanceAction::Begin, host),
            KeyRoute::Back => {
                let effects = self.intro.back();
                self.apply(effects, host);
            }
            KeyRoute::Block | KeyRoute::Pass => {}
        }
        Disposition::from_flag(route.prevents_default())
    }

    fn on_click(&mut self, click: &ClickEvent, host: &mut dyn Host) {
        if self.intro.accepts_click(click) {
            self.advance(host);
        }
    }

    fn on_pointer(&mut self, pointer: &PointerEvent) {
        let profile = self.profile();
        if let Some(proxy) = &mut self.proxy {
            proxy.on_pointer(pointer, self.viewport);
        }
        match pointer.kind {
            PointerEventKind::Move => {
                self.backgrounds
                    .pointer_moved(pointer.position, self.viewport, profile);
                if let Some(stack) = self.dragging.and_then(|s| self.cards.get_mut(s)) {
                    stack.drag(pointer.position, &mut self.stage);
                }
            }
            PointerEventKind::Down => {
                let HitTarget::Node(node) = pointer.target else {
                    return;
                };
                for (s, stack) in self.cards.iter_mut().enumerate() {
                    if let Some(card) = stack.card_at(node) {
                        if stack.press(card, pointer.position, &mut self.stage).is_some() {
                            self.dragging = Some(s);
                        }
                        break;
                    }
                }
            }
            PointerEventKind::Up | PointerEventKind::Cancel => {
                if let Some(stack) = self.dragging.take().and_then(|s| self.cards.get_mut(s)) {
                    stack.release(&mut self.stage);
                }
            }
            PointerEventKind::Enter | PointerEventKind::Leave => {}
        }
    }

    /// Pointer proxy advance, or the contextual action without one.
    fn advance(&mut self, host: &mut dyn Host) {
        let action = match &mut self.proxy {
            Some(proxy) => proxy.advance(),
            None => self.intro.contextual_action(),
        };
        if let Some(action) = action {
            self.perform(action, host);
        }
    }

    fn perform(&mut self, action: AdvanceAction, host: &mut dyn Host) {
        let effects = self.intro.perform(action, &mut self.stage);
        self.apply(effects, host);
    }

    /// Explicit "begin" control on the last slide.
    pub fn begin(&mut self, host: &mut dyn Host) {
        self.perform(AdvanceAction::Begin, host);
    }

    /// Skip-intro affordance. Reachable from every phase before Complete.
    pub fn skip(&mut self, host: &mut dyn Host) {
        let effects = self.intro.skip(&mut self.stage);
        self.apply(effects, host);
    }

    /// Touch "Continue" control: same contextual action as the pointer
    /// proxy, with its own press pulse.
    pub fn tap_fallback(&mut self, host: &mut dyn Host) {
        let profile = self.profile();
        if !profile.is_touch_device || !matches!(self.intro.phase(), IntroPhase::Slide(_)) {
            return;
        }
        if !profile.reduced_motion {
            let node = self.layout.touch_fallback;
            let (scale, up, settle) = self.config.cursor.touch_pulse();
            self.stage.kill_node(node);
            self.stage.tween(
                TweenSpec::to(node, PosePatch::new().scale(scale))
                    .duration(up)
                    .ease(power2_out),
            );
            self.stage.tween(
                TweenSpec::to(node, PosePatch::new().scale(1.0))
                    .delay(up)
                    .duration(settle)
                    .ease(power2_out),
            );
        }
        if let Some(action) = self.intro.contextual_action() {
            self.perform(action, host);
        }
    }

    /// Slide indicator. Only wired on touch devices.
    pub fn select_slide(&mut self, index: usize, host: &mut dyn Host) {
        if !self.profile().is_touch_device {
            return;
        }
        let effects = self.intro.jump_to(index);
        self.apply(effects, host);
    }

    /// Chapter rail or sheet selection.
    pub fn select_chapter(&mut self, index: usize, host: &mut dyn Host) -> bool {
        self.chapters.navigate(index, host.document())
    }

    /// Mute control. Returns the new muted state.
    pub fn toggle_mute(&mut self, host: &mut dyn Host) -> bool {
        self.ambient.toggle_mute(host)
    }

    /// Open overlay `index`, closing any other one.
    pub fn open_overlay(&mut self, index: usize) -> bool {
        self.overlays.open(index, &mut self.stage)
    }

    pub fn close_overlay(&mut self, index: usize) {
        self.overlays.close(index, &mut self.stage);
    }

    pub fn toggle_overlay_playback(&mut self, index: usize, host: &mut dyn Host) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.toggle_play(host);
        }
    }

    /// Click on an overlay progress bar.
    pub fn seek_overlay(&mut self, index: usize, fraction: f32, host: &mut dyn Host) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.seek_fraction(fraction, host);
        }
    }

    /// Drag on an overlay progress bar. `None` ends the drag.
    pub fn scrub_overlay(&mut self, index: usize, fraction: Option<f32>, host: &mut dyn Host) {
        let Some(overlay) = self.overlays.get_mut(index) else {
            return;
        };
        match fraction {
            Some(f) => overlay.begin_seek(f, host),
            None => overlay.end_seek(),
        }
    }

    /// Media element notification.
    pub fn media_event(&mut self, event: &MediaEvent, host: &mut dyn Host) {
        match event.slot {
            AudioSlot::Ambient => self.ambient.on_media(&event.kind, host),
            AudioSlot::Overlay(i) => self.overlays.on_media(i, &event.kind, host),
        }
    }

    /// Fresh platform probes (e.g. touch re-detection after a resize).
    pub fn refresh_signals(&mut self, signals: MotionSignals, host: &mut dyn Host) {
        if self.motion.refresh(signals) {
            self.reconcile(host);
        }
    }

    /// Replace the cards of stack `index`, keeping the arrangement.
    pub fn relayout_cards(&mut self, index: usize, layout: CardStackLayout) {
        let profile = self.profile();
        let Some(stack) = self.cards.get_mut(index) else {
            return;
        };
        if self.dragging == Some(index) {
            self.dragging = None;
        }
        stack.relayout(layout.cards.clone(), layout.container, profile, &mut self.stage);
        if let Some(slot) = self.card_layouts.get_mut(index) {
            *slot = layout;
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: Duration, host: &mut dyn Host) {
        if !self.mounted {
            return;
        }
        let profile = self.profile();
        for cue in self.stage.tick(dt) {
            let effects = self.intro.on_cue(&cue);
            self.apply(effects, host);
            if !self.slides.on_cue(&cue, &mut self.stage, profile) {
                self.overlays.on_cue(&cue, host);
            }
        }
        let effects = self.intro.tick(dt);
        self.apply(effects, host);

        if let Some(proxy) = &mut self.proxy {
            proxy.tick(dt);
        }
        self.backgrounds.tick(dt, &mut self.stage);
        {
            let doc = host.document();
            self.reveal.tick(dt, doc, &mut self.stage);
            self.chapters.on_frame(doc);
        }
        for stack in &mut self.cards {
            stack.tick(dt, &mut self.stage);
        }
        self.ambient.tick(dt, host);
        self.overlays.tick(dt, host, &mut self.stage);
    }

    fn apply(&mut self, effects: Vec<IntroEffect>, host: &mut dyn Host) {
        let profile = self.profile();
        for effect in effects {
            match effect {
                IntroEffect::Announce(text) => host.document().announce(&text),
                IntroEffect::LockScroll(locked) => host.document().set_scroll_locked(locked),
                IntroEffect::ShowSlide { current, previous } => {
                    self.slides
                        .show(Some(current), previous, &mut self.stage, profile);
                    self.backgrounds
                        .activate(Some(current), &mut self.stage, profile);
                }
                IntroEffect::BindAdvance(action) => {
                    if let Some(proxy) = &mut self.proxy {
                        proxy.bind(action);
                    }
                }
                IntroEffect::StartAmbient => self.ambient.start(host),
                IntroEffect::StopAmbient { fade: true } => self.ambient.stop_with_fade(host),
                IntroEffect::StopAmbient { fade: false } => self.ambient.stop_now(host),
                IntroEffect::ScrollToTop => host.document().scroll_to(0.0, true),
                IntroEffect::PulseCursor => {
                    if let Some(proxy) = &mut self.proxy {
                        proxy.pulse();
                    }
                }
                IntroEffect::Completed => self.on_intro_complete(host),
            }
        }
    }

    fn on_intro_complete(&mut self, host: &mut dyn Host) {
        self.proxy = None;
        let profile = self.profile();
        self.backgrounds.activate(None, &mut self.stage, profile);
        self.bind_content(host);
        self.chapters.set_enabled(true);
    }

    fn bind_content(&mut self, host: &mut dyn Host) {
        if self.profile().reduced_motion {
            self.reveal.unbind(&mut self.stage);
            self.reveal.settle(&self.layout.reveal, &mut self.stage);
        } else {
            self.reveal
                .bind(&self.layout.reveal, host.document(), &mut self.stage);
        }
    }

    /// The proxy exists on non-touch devices until the intro completes.
    fn sync_proxy(&mut self) {
        let profile = self.profile();
        if !profile.has_pointer_proxy() || self.intro.is_complete() {
            self.proxy = None;
            return;
        }
        if let Some(proxy) = &mut self.proxy {
            proxy.set_profile(profile);
            return;
        }
        let mut proxy = PointerProxy::new(
            self.layout.cursor,
            self.viewport,
            profile,
            self.config.cursor.clone(),
        );
        proxy.bind(self.intro.contextual_action());
        self.proxy = Some(proxy);
    }

    /// Normalize every component to the terminal state of the new profile.
    fn reconcile(&mut self, host: &mut dyn Host) {
        let _span = tracing::debug_span!("longform.story.reconcile").entered();
        let profile = self.profile();
        self.sync_proxy();
        self.slides.reconcile(&mut self.stage, profile);
        self.backgrounds.reconcile(&mut self.stage, profile);
        self.dragging = None;
        for (stack, layout) in self.cards.iter_mut().zip(&self.card_layouts) {
            stack.relayout(layout.cards.clone(), layout.container, profile, &mut self.stage);
        }
        if self.intro.is_complete() {
            self.bind_content(host);
        }
    }

    #[must_use]
    pub fn profile(&self) -> MotionProfile {
        self.motion.profile()
    }

    #[must_use]
    pub fn motion(&self) -> &MotionDetector {
        &self.motion
    }

    #[must_use]
    pub fn phase(&self) -> IntroPhase {
        self.intro.phase()
    }

    #[must_use]
    pub fn intro(&self) -> &IntroSequencer {
        &self.intro
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.intro.is_scroll_locked()
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Current pose of `node`, the pointer proxy included.
    #[must_use]
    pub fn pose(&self, node: NodeId) -> Pose {
        match &self.proxy {
            Some(proxy) if proxy.node() == node => proxy.pose(),
            _ => self.stage.pose(node),
        }
    }

    #[must_use]
    pub fn pointer_proxy(&self) -> Option<&PointerProxy> {
        self.proxy.as_ref()
    }

    #[must_use]
    pub fn slides(&self) -> &SlideAnimator {
        &self.slides
    }

    #[must_use]
    pub fn backgrounds(&self) -> &BackgroundLayer {
        &self.backgrounds
    }

    #[must_use]
    pub fn reveal(&self) -> &RevealEngine {
        &self.reveal
    }

    #[must_use]
    pub fn card_stack(&self, index: usize) -> Option<&CardStack> {
        self.cards.get(index)
    }

    #[must_use]
    pub fn chapters(&self) -> &ChapterLocator {
        &self.chapters
    }

    #[must_use]
    pub fn chapter_index(&self) -> usize {
        self.chapters.index()
    }

    #[must_use]
    pub fn ambient(&self) -> &AmbientAudio {
        &self.ambient
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{TestDocument, TestHost};
    use crate::reveal::{NodeKind, RevealCandidate};
    use longform_core::event::{KeyCode, PointerType};
    use longform_core::geometry::{Point, Rect};

    const FRAME: Duration = Duration::from_millis(16);

    fn layout() -> StoryLayout {
        StoryLayout {
            intro_container: NodeId(1),
            title: NodeId(2),
            cursor: NodeId(3),
            touch_fallback: NodeId(4),
            slides: (0..3)
                .map(|i| SlideNodes::new(NodeId(10 + i), vec![NodeId(20 + i)]))
                .collect(),
            backgrounds: (0..3)
                .map(|i| BackgroundNodes {
                    layer: NodeId(30 + i),
                    image: NodeId(40 + i),
                })
                .collect(),
            reveal: RevealTargets {
                candidates: vec![
                    RevealCandidate::text(NodeId(50), NodeKind::Heading),
                    RevealCandidate::text(NodeId(51), NodeKind::Paragraph),
                ],
                ..RevealTargets::default()
            },
            chapters: vec![
                Chapter::new(NodeId(60), "One"),
                Chapter::new(NodeId(61), "Two"),
            ],
            card_stacks: vec![CardStackLayout {
                cards: vec![
                    CardDescriptor::new("a", "a.jpg", NodeId(70)).rotation(-4.0),
                    CardDescriptor::new("b", "b.jpg", NodeId(71)).rotation(3.0),
                ],
                container: Size::new(400.0, 500.0),
            }],
            overlays: Vec::new(),
        }
    }

    fn host() -> TestHost {
        TestHost {
            doc: TestDocument::new(1000.0, 800.0)
                .with_rect(NodeId(50), Rect::new(0.0, 100.0, 600.0, 60.0))
                .with_rect(NodeId(51), Rect::new(0.0, 1500.0, 600.0, 200.0))
                .with_rect(NodeId(60), Rect::new(0.0, 0.0, 1000.0, 1600.0))
                .with_rect(NodeId(61), Rect::new(0.0, 1600.0, 1000.0, 1600.0)),
            ..TestHost::default()
        }
    }

    fn story(signals: MotionSignals, host: &mut TestHost) -> Story {
        let mut story = Story::new(
            StoryConfig::default(),
            layout(),
            signals,
            Viewport::new(1000.0, 800.0),
        );
        story.mount(host);
        story
    }

    fn run(story: &mut Story, host: &mut TestHost, total: Duration) {
        let mut t = Duration::ZERO;
        while t < total {
            story.tick(FRAME, host);
            t += FRAME;
        }
    }

    fn space() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(' ')))
    }

    #[test]
    fn mount_locks_and_announces_title() {
        let mut host = host();
        let story = story(MotionSignals::desktop(), &mut host);
        assert!(host.doc.locked);
        assert_eq!(host.doc.announced, vec!["Title screen".to_owned()]);
        assert_eq!(story.phase(), IntroPhase::Title);
        assert_eq!(
            story.pointer_proxy().and_then(PointerProxy::bound_action),
            Some(AdvanceAction::EnterTitle)
        );
    }

    #[test]
    fn wheel_blocked_until_complete() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        let wheel = Event::Wheel { delta_y: 40.0 };
        assert!(story.handle_event(&wheel, &mut host).prevents_default());
        assert!(story.handle_event(&Event::TouchMove, &mut host).prevents_default());
        story.skip(&mut host);
        assert!(!host.doc.locked);
        assert!(!story.handle_event(&wheel, &mut host).prevents_default());
    }

    #[test]
    fn walkthrough_reaches_content() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        assert!(story.handle_event(&space(), &mut host).prevents_default());
        run(&mut story, &mut host, Duration::from_millis(500));
        assert_eq!(story.phase(), IntroPhase::Slide(0));
        for _ in 0..2 {
            story.handle_event(&space(), &mut host);
            run(&mut story, &mut host, Duration::from_millis(100));
        }
        assert_eq!(story.phase(), IntroPhase::Slide(2));
        story.handle_event(&space(), &mut host);
        assert!(host.doc.locked);
        run(&mut story, &mut host, Duration::from_millis(700));
        assert_eq!(story.phase(), IntroPhase::Complete);
        assert!(!host.doc.locked);
        assert!(story.pointer_proxy().is_none());
        assert!(story.chapters().is_enabled());
        assert!(story.reveal().is_bound());
        run(&mut story, &mut host, Duration::from_millis(900));
        assert_eq!(host.doc.scrolls.last(), Some(&(0.0, true)));
    }

    #[test]
    fn click_and_key_resolve_to_the_same_action() {
        let mut by_key = host();
        let mut keyed = story(MotionSignals::desktop(), &mut by_key);
        let mut by_click = host();
        let mut clicked = story(MotionSignals::desktop(), &mut by_click);

        for _ in 0..3 {
            keyed.handle_event(&space(), &mut by_key);
            let click = Event::Click(ClickEvent::surface(Point::new(500.0, 400.0)));
            clicked.handle_event(&click, &mut by_click);
            run(&mut keyed, &mut by_key, Duration::from_millis(500));
            run(&mut clicked, &mut by_click, Duration::from_millis(500));
            assert_eq!(keyed.phase(), clicked.phase());
        }
        assert_eq!(keyed.phase(), IntroPhase::Slide(2));
        assert_eq!(by_key.doc.announced, by_click.doc.announced);
    }

    #[test]
    fn skip_stops_ambient_and_scrolls_to_top() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(1500));
        assert!(!host.ambient.paused);
        host.ambient.time = 12.0;
        story.skip(&mut host);
        assert_eq!(story.phase(), IntroPhase::Complete);
        assert!(host.ambient.paused);
        assert_eq!(host.ambient.time, 0.0);
        run(&mut story, &mut host, Duration::from_millis(400));
        assert_eq!(host.doc.scrolls.last(), Some(&(0.0, true)));
    }

    #[test]
    fn touch_uses_fallback_and_indicator() {
        let mut host = host();
        let mut story = story(MotionSignals::touch(), &mut host);
        assert!(story.pointer_proxy().is_none());
        let tap = ClickEvent {
            position: Point::new(10.0, 10.0),
            target: HitTarget::Surface,
            pointer_type: PointerType::Touch,
        };
        story.handle_event(&Event::Click(tap), &mut host);
        run(&mut story, &mut host, Duration::from_millis(500));
        assert_eq!(story.phase(), IntroPhase::Slide(0));
        // taps on the slide surface do nothing; the fallback advances
        story.handle_event(&Event::Click(tap), &mut host);
        assert_eq!(story.phase(), IntroPhase::Slide(0));
        story.tap_fallback(&mut host);
        assert_eq!(story.phase(), IntroPhase::Slide(1));
        story.select_slide(0, &mut host);
        assert_eq!(story.phase(), IntroPhase::Slide(0));
    }

    #[test]
    fn indicator_ignored_on_desktop() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(500));
        story.select_slide(2, &mut host);
        assert_eq!(story.phase(), IntroPhase::Slide(0));
    }

    #[test]
    fn card_drag_routes_through_story() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        let down = PointerEvent::mouse(PointerEventKind::Down, Point::new(100.0, 100.0))
            .on(HitTarget::Node(NodeId(71)));
        story.handle_event(&Event::Pointer(down), &mut host);
        let mv = PointerEvent::mouse(PointerEventKind::Move, Point::new(130.0, 110.0));
        story.handle_event(&Event::Pointer(mv), &mut host);
        let up = PointerEvent::mouse(PointerEventKind::Up, Point::new(130.0, 110.0));
        story.handle_event(&Event::Pointer(up), &mut host);
        run(&mut story, &mut host, Duration::from_millis(2000));
        let stack = story.card_stack(0).map(|s| (s.z_index(0), s.z_index(1)));
        assert!(matches!(stack, Some((Some(a), Some(b))) if b > a));
        let pose = story.pose(NodeId(71));
        assert!(pose.x > 0.0);
        assert!((pose.rotation - 3.0).abs() < 0.05);
    }

    #[test]
    fn reduced_motion_flip_normalizes_slides() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(500));
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(200));
        story.handle_event(&Event::ReducedMotionChanged(true), &mut host);
        story.handle_event(&Event::ReducedMotionChanged(false), &mut host);
        run(&mut story, &mut host, Duration::from_millis(3000));
        assert_eq!(story.slides().opacity(1, story.stage()), Some(1.0));
        assert_eq!(story.slides().opacity(0, story.stage()), Some(0.0));
        assert_eq!(story.pose(NodeId(11)).y, 0.0);
    }

    #[test]
    fn going_back_during_delayed_entry_keeps_the_slide_hidden() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(3000));
        story.handle_event(&space(), &mut host);
        run(&mut story, &mut host, Duration::from_millis(200));
        // slide 1 is still waiting out its entry delay
        let back = Event::Key(KeyEvent::new(KeyCode::Left));
        assert!(story.handle_event(&back, &mut host).prevents_default());
        assert_eq!(story.phase(), IntroPhase::Slide(0));
        run(&mut story, &mut host, Duration::from_millis(5000));
        assert_eq!(story.slides().opacity(1, story.stage()), Some(0.0));
        assert_eq!(story.slides().opacity(0, story.stage()), Some(1.0));
        assert!(!story.stage().is_tweening(NodeId(11)));
    }

    #[test]
    fn reduced_motion_content_is_settled_not_bound() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop().with_reduced_motion(true), &mut host);
        story.skip(&mut host);
        assert!(!story.reveal().is_bound());
        assert_eq!(story.pose(NodeId(51)).opacity, 1.0);
    }

    #[test]
    fn unmount_releases_lock() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        assert!(host.doc.locked);
        story.unmount(&mut host);
        assert!(!host.doc.locked);
        assert!(!story.is_mounted());
    }

    #[test]
    fn chapter_tracking_starts_after_intro() {
        let mut host = host();
        let mut story = story(MotionSignals::desktop(), &mut host);
        host.doc.scroll_y = 1700.0;
        story.handle_event(&Event::Scroll { y: 1700.0 }, &mut host);
        story.tick(FRAME, &mut host);
        assert_eq!(story.chapter_index(), 0);
        story.skip(&mut host);
        host.doc.scroll_y = 1700.0;
        story.handle_event(&Event::Scroll { y: 1700.0 }, &mut host);
        story.tick(FRAME, &mut host);
        assert_eq!(story.chapter_index(), 1);
        assert!(story.select_chapter(0, &mut host));
        assert_eq!(story.chapter_index(), 0);
    }
}
