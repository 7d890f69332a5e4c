#![forbid(unsafe_code)]

//! Intro sequencer: Title → Slide 0 → … → last slide → Complete.
//!
//! The sequencer owns the phase, the scroll lock and the intro's own fades
//! (title out, container out). Everything it needs from other components
//! comes back to the caller as [`IntroEffect`]s, in the order they must be
//! applied. Timed follow-ups (ambient start, scroll to top, cursor pulse)
//! run on an internal [`Timeline`].
//!
//! # Invariants
//!
//! 1. Exactly one phase is active. Complete is terminal.
//! 2. The scroll lock is set at mount and released exactly when Complete
//!    is entered, or on unmount.
//! 3. While a title or container fade is in flight every navigation
//!    request is ignored, so repeated keys commit a transition once.
//! 4. Keyboard and pointer inputs resolve through
//!    [`IntroSequencer::contextual_action`], so both modalities always
//!    perform the same action.

use std::time::Duration;

use longform_core::animation::{
    Cue, Stage, Timeline, TweenId, TweenSpec, power2_in, power2_out, power3_out,
};
use longform_core::event::{ClickEvent, KeyCode, KeyEvent, KeyEventKind, PointerType};
use longform_core::motion::MotionProfile;
use longform_core::pose::{NodeId, PosePatch};

use crate::config::IntroPolicyConfig;
use crate::cursor::AdvanceAction;

/// Where the reader is in the intro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntroPhase {
    Title,
    Slide(usize),
    Complete,
}

/// Work the sequencer hands back to the story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroEffect {
    /// Replace the live-region text.
    Announce(String),
    LockScroll(bool),
    /// Slide visuals: `current` is entering, `previous` (if any) leaving.
    ShowSlide {
        current: usize,
        previous: Option<usize>,
    },
    /// What the pointer proxy's advance now means.
    BindAdvance(Option<AdvanceAction>),
    StartAmbient,
    StopAmbient {
        fade: bool,
    },
    ScrollToTop,
    PulseCursor,
    /// Complete was entered; the document takes over.
    Completed,
}

/// How the story should handle a key during the intro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    /// Run the contextual action (through the pointer proxy if present).
    Advance,
    /// Leave the last slide.
    Begin,
    /// Previous slide.
    Back,
    /// Suppress the key's default scrolling only.
    Block,
    /// Not ours.
    Pass,
}

impl KeyRoute {
    #[must_use]
    pub fn prevents_default(self) -> bool {
        !matches!(self, Self::Pass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    TitleFade(TweenId),
    ContainerFade(TweenId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroJob {
    StartAmbient,
    ScrollToTop,
    PulseCursor,
}

const TITLE_FADED: &str = "intro.title-faded";
const CONTAINER_FADED: &str = "intro.container-faded";

#[derive(Debug, Clone)]
pub struct IntroSequencer {
    phase: IntroPhase,
    previous_slide: Option<usize>,
    pending: Option<Pending>,
    scroll_locked: bool,
    timers: Timeline<IntroJob>,
    title: NodeId,
    container: NodeId,
    config: IntroPolicyConfig,
}

impl IntroSequencer {
    #[must_use]
    pub fn new(title: NodeId, container: NodeId, config: IntroPolicyConfig) -> Self {
        Self {
            phase: IntroPhase::Title,
            previous_slide: None,
            pending: None,
            scroll_locked: false,
            timers: Timeline::new(),
            title,
            container,
            config,
        }
    }

    /// Lock scrolling, play the title entrance and announce the title.
    pub fn mount(&mut self, stage: &mut Stage, profile: MotionProfile) -> Vec<IntroEffect> {
        let cfg = &self.config;
        let spec = if profile.reduced_motion {
            TweenSpec::from_to(
                self.title,
                PosePatch::new().opacity(0.0).y(cfg.reduced_title_enter_y),
                PosePatch::new().opacity(1.0).y(0.0),
            )
            .duration(cfg.reduced_title_enter())
            .ease(power2_out)
        } else {
            TweenSpec::from_to(
                self.title,
                PosePatch::new()
                    .opacity(0.0)
                    .y(cfg.title_enter_y)
                    .blur(cfg.title_enter_blur),
                PosePatch::new().opacity(1.0).y(0.0).blur(0.0),
            )
            .duration(cfg.title_enter())
            .ease(power3_out)
        };
        stage.tween(spec);
        stage.set(self.container, &PosePatch::new().opacity(1.0));
        self.scroll_locked = true;
        tracing::info!(slides = self.config.slide_count, "intro mounted");
        vec![
            IntroEffect::LockScroll(true),
            IntroEffect::Announce("Title screen".into()),
            IntroEffect::BindAdvance(Some(AdvanceAction::EnterTitle)),
        ]
    }

    #[must_use]
    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    #[must_use]
    pub fn previous_slide(&self) -> Option<usize> {
        self.previous_slide
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == IntroPhase::Complete
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// A title or container fade is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    fn last_slide(&self) -> usize {
        self.config.slide_count.saturating_sub(1)
    }

    /// What an advance means right now. `None` while transitioning or
    /// once complete.
    #[must_use]
    pub fn contextual_action(&self) -> Option<AdvanceAction> {
        if self.pending.is_some() {
            return None;
        }
        match self.phase {
            IntroPhase::Title => Some(AdvanceAction::EnterTitle),
            IntroPhase::Slide(n) if n < self.last_slide() => Some(AdvanceAction::NextSlide),
            IntroPhase::Slide(_) => Some(AdvanceAction::Begin),
            IntroPhase::Complete => None,
        }
    }

    /// Classify a key press.
    #[must_use]
    pub fn route_key(&self, key: &KeyEvent) -> KeyRoute {
        if key.kind == KeyEventKind::Release || self.is_complete() {
            return KeyRoute::Pass;
        }
        let on_last = matches!(self.phase, IntroPhase::Slide(n) if n >= self.last_slide());
        if key.is_activate() {
            return if on_last {
                KeyRoute::Begin
            } else {
                KeyRoute::Advance
            };
        }
        match (key.code, self.phase) {
            (KeyCode::Right, IntroPhase::Slide(_)) if !on_last => KeyRoute::Advance,
            (KeyCode::Left, IntroPhase::Slide(n)) if n > 0 => KeyRoute::Back,
            _ if key.is_scroll_key() => KeyRoute::Block,
            _ => KeyRoute::Pass,
        }
    }

    /// Whether a click anywhere on the intro should advance.
    ///
    /// Pointer devices advance from the title and every slide but the
    /// last; the last slide needs its explicit "begin" control. Touch
    /// devices only tap through the title; slides have their own fallback
    /// target.
    #[must_use]
    pub fn accepts_click(&self, click: &ClickEvent) -> bool {
        if click.target.is_interactive() || self.pending.is_some() {
            return false;
        }
        match (self.phase, click.pointer_type) {
            (IntroPhase::Title, _) => true,
            (IntroPhase::Slide(n), PointerType::Mouse | PointerType::Pen) => n < self.last_slide(),
            _ => false,
        }
    }

    /// Scroll input (wheel, touch-move, scroll keys) must be suppressed.
    #[must_use]
    pub fn blocks_scroll(&self) -> bool {
        self.scroll_locked
    }

    /// Perform `action` if it is what the current phase expects. Stale or
    /// repeated requests are ignored.
    pub fn perform(&mut self, action: AdvanceAction, stage: &mut Stage) -> Vec<IntroEffect> {
        if self.contextual_action() != Some(action) {
            tracing::debug!(?action, phase = ?self.phase, "stale advance ignored");
            return Vec::new();
        }
        match action {
            AdvanceAction::EnterTitle => {
                let id = stage.tween(
                    TweenSpec::to(self.title, PosePatch::new().opacity(0.0))
                        .duration(self.config.title_fade())
                        .ease(power2_in)
                        .cue(TITLE_FADED),
                );
                self.pending = Some(Pending::TitleFade(id));
                vec![IntroEffect::BindAdvance(None)]
            }
            AdvanceAction::NextSlide => match self.phase {
                IntroPhase::Slide(n) => self.enter_slide(n + 1),
                _ => Vec::new(),
            },
            AdvanceAction::Begin => {
                let id = stage.tween(
                    TweenSpec::to(self.container, PosePatch::new().opacity(0.0))
                        .duration(self.config.intro_fade())
                        .ease(power2_out)
                        .cue(CONTAINER_FADED),
                );
                self.pending = Some(Pending::ContainerFade(id));
                tracing::info!("intro begin");
                vec![
                    IntroEffect::BindAdvance(None),
                    IntroEffect::StopAmbient { fade: true },
                ]
            }
        }
    }

    /// Previous slide (ArrowLeft). Never returns to the title.
    pub fn back(&mut self) -> Vec<IntroEffect> {
        match self.phase {
            IntroPhase::Slide(n) if n > 0 && self.pending.is_none() => self.enter_slide(n - 1),
            _ => Vec::new(),
        }
    }

    /// Jump straight to a slide (touch indicator).
    pub fn jump_to(&mut self, index: usize) -> Vec<IntroEffect> {
        match self.phase {
            IntroPhase::Slide(n)
                if n != index && index <= self.last_slide() && self.pending.is_none() =>
            {
                self.enter_slide(index)
            }
            _ => Vec::new(),
        }
    }

    /// Skip straight to Complete from any phase.
    pub fn skip(&mut self, stage: &mut Stage) -> Vec<IntroEffect> {
        if self.is_complete() {
            return Vec::new();
        }
        if let Some(Pending::TitleFade(id) | Pending::ContainerFade(id)) = self.pending.take() {
            stage.kill(id);
        }
        stage.kill_node(self.container);
        stage.set(self.container, &PosePatch::new().opacity(0.0));
        tracing::info!(phase = ?self.phase, "intro skipped");
        let mut effects = vec![IntroEffect::StopAmbient { fade: false }];
        effects.extend(self.complete(self.config.skip_settle()));
        effects
    }

    /// Route a stage cue. Cues for other nodes are ignored.
    pub fn on_cue(&mut self, cue: &Cue) -> Vec<IntroEffect> {
        match self.pending {
            Some(Pending::TitleFade(id)) if id == cue.tween => {
                self.pending = None;
                let effects = self.enter_slide(0);
                self.timers
                    .schedule(self.config.audio_grace(), IntroJob::StartAmbient);
                effects
            }
            Some(Pending::ContainerFade(id)) if id == cue.tween => {
                self.pending = None;
                self.complete(self.config.begin_settle())
            }
            _ => Vec::new(),
        }
    }

    /// Advance timers.
    pub fn tick(&mut self, dt: Duration) -> Vec<IntroEffect> {
        self.timers
            .advance(dt)
            .into_iter()
            .map(|job| match job {
                IntroJob::StartAmbient => IntroEffect::StartAmbient,
                IntroJob::ScrollToTop => IntroEffect::ScrollToTop,
                IntroJob::PulseCursor => IntroEffect::PulseCursor,
            })
            .collect()
    }

    /// Teardown. Always releases the scroll lock.
    pub fn unmount(&mut self) -> Vec<IntroEffect> {
        self.timers.clear();
        self.pending = None;
        let was_locked = std::mem::replace(&mut self.scroll_locked, false);
        if was_locked {
            tracing::debug!("intro unmounted while locked");
        }
        vec![IntroEffect::LockScroll(false)]
    }

    fn enter_slide(&mut self, index: usize) -> Vec<IntroEffect> {
        let previous = match self.phase {
            IntroPhase::Slide(n) => Some(n),
            _ => None,
        };
        self.previous_slide = previous;
        self.phase = IntroPhase::Slide(index);
        self.timers.cancel(&IntroJob::PulseCursor);
        self.timers
            .schedule(self.config.pulse_delay(), IntroJob::PulseCursor);
        tracing::info!(slide = index, ?previous, "slide entered");
        vec![
            IntroEffect::ShowSlide {
                current: index,
                previous,
            },
            IntroEffect::Announce(format!(
                "Slide {} of {}",
                index + 1,
                self.config.slide_count
            )),
            IntroEffect::BindAdvance(self.contextual_action()),
        ]
    }

    fn complete(&mut self, settle: Duration) -> Vec<IntroEffect> {
        self.phase = IntroPhase::Complete;
        self.previous_slide = None;
        self.scroll_locked = false;
        self.timers.clear();
        self.timers.schedule(settle, IntroJob::ScrollToTop);
        tracing::info!("intro complete");
        vec![
            IntroEffect::BindAdvance(None),
            IntroEffect::LockScroll(false),
            IntroEffect::Completed,
        ]
    }
}
