#![forbid(unsafe_code)]

//! Longform Runtime
//!
//! This crate turns the building blocks of `longform-core` into a story:
//! a gated intro (title, slides, hand-off) followed by a scrolling document
//! with scroll-linked reveals, draggable card stacks, chapter tracking and
//! audio.
//!
//! # Key Components
//!
//! - [`Story`] - Composition root; routes events and steps frames
//! - [`IntroSequencer`] - Title → slides → Complete, with the scroll lock
//! - [`SlideAnimator`] - Per-slide enter/exit choreography
//! - [`PointerProxy`] - Following cursor that doubles as the advance control
//! - [`RevealEngine`] - Scroll-scrubbed text reveals and decorative scrubs
//! - [`CardStack`] - Draggable cards with a z-order arena
//! - [`ChapterLocator`] - Most visible chapter, evaluated once per frame
//! - [`AmbientAudio`] / [`OverlayRegistry`] - Audio lifecycle
//! - [`StoryConfig`] - Every timing constant, as data
//!
//! # Role in Longform
//! `longform-runtime` is the orchestrator. It consumes `longform-core`
//! events, writes poses into a `Stage`, and reaches the platform only
//! through the [`host`] traits. `longform-web` provides a deterministic
//! implementation of those traits.

pub mod audio;
pub mod background;
pub mod card_stack;
pub mod chapter;
pub mod config;
pub mod cursor;
pub mod error;
pub mod host;
pub mod intro;
pub mod motion;
pub mod reactive;
pub mod reveal;
pub mod slide;
pub mod story;

pub use audio::{AmbientAudio, GestureRetry, OverlayPlayer, OverlayRegistry, OverlaySpec};
pub use background::{BackgroundLayer, BackgroundNodes};
pub use card_stack::{CardDescriptor, CardLayout, CardStack, ZOrderArena};
pub use chapter::{Chapter, ChapterLocator};
pub use config::{ConfigError, StoryConfig};
pub use cursor::{AdvanceAction, CursorControl, PointerProxy};
pub use error::PlaybackError;
pub use host::{AudioSlot, Host, HostAudio, HostDocument, MediaEvent, MediaEventKind, ReadyState};
pub use intro::{IntroEffect, IntroPhase, IntroSequencer, KeyRoute};
pub use motion::MotionDetector;
pub use reactive::{Observable, Subscription};
pub use reveal::{DriveBy, NodeKind, RevealCandidate, RevealEngine, RevealTargets};
pub use slide::{SlideAnimator, SlideNodes};
pub use story::{CardStackLayout, Disposition, Story, StoryLayout};
