#![forbid(unsafe_code)]

//! `longform-web` provides a deterministic, host-driven backend for
//! Longform stories.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes input events,
//!   size changes and media notifications.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The document and audio elements are simulated in memory, which makes the
//! same backend usable as a test harness for whole-story behavior.

pub mod audio;
pub mod document;
pub mod driver;

use core::time::Duration;
use std::collections::VecDeque;

use longform_core::event::Event;
use longform_runtime::{AudioSlot, Host, HostAudio, HostDocument};

pub use audio::{AutoplayPolicy, SimulatedAudio};
pub use document::{ScrollRequest, WebDocument};
pub use driver::{StepReport, StoryDriver};

/// Web backend error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebHostError {
    /// No audio element is registered for the slot.
    MissingAudio(AudioSlot),
}

impl core::fmt::Display for WebHostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingAudio(slot) => write!(f, "no audio element for {slot:?}"),
        }
    }
}

impl std::error::Error for WebHostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Host-driven event source.
///
/// The host is responsible for pushing [`Event`] values; the driver drains
/// them once per frame.
#[derive(Debug, Clone, Default)]
pub struct WebEventSource {
    queue: VecDeque<Event>,
}

impl WebEventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a canonical event into the queue.
    pub fn push_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}

/// The simulated page: one document, the ambient element and one element
/// per overlay.
#[derive(Debug, Clone)]
pub struct WebHost {
    pub document: WebDocument,
    pub ambient: SimulatedAudio,
    pub overlays: Vec<SimulatedAudio>,
}

impl WebHost {
    #[must_use]
    pub fn new(document: WebDocument, ambient: SimulatedAudio) -> Self {
        Self {
            document,
            ambient,
            overlays: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_overlay(mut self, audio: SimulatedAudio) -> Self {
        self.overlays.push(audio);
        self
    }

    /// Typed access to an element, for hosts that feed it load progress.
    pub fn element(&mut self, slot: AudioSlot) -> Result<&mut SimulatedAudio, WebHostError> {
        match slot {
            AudioSlot::Ambient => Ok(&mut self.ambient),
            AudioSlot::Overlay(i) => self
                .overlays
                .get_mut(i)
                .ok_or(WebHostError::MissingAudio(slot)),
        }
    }

    /// Every element sees the gesture, as the browser unlocks the page.
    pub fn note_gesture(&mut self) {
        self.ambient.note_gesture();
        for overlay in &mut self.overlays {
            overlay.note_gesture();
        }
    }

    /// Every slot in registration order.
    #[must_use]
    pub fn slots(&self) -> Vec<AudioSlot> {
        std::iter::once(AudioSlot::Ambient)
            .chain((0..self.overlays.len()).map(AudioSlot::Overlay))
            .collect()
    }
}

impl Host for WebHost {
    fn document(&mut self) -> &mut dyn HostDocument {
        &mut self.document
    }

    fn audio(&mut self, slot: AudioSlot) -> Option<&mut dyn HostAudio> {
        self.element(slot).ok().map(|a| a as &mut dyn HostAudio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_core::event::{KeyCode, KeyEvent};
    use longform_core::geometry::Viewport;

    #[test]
    fn clock_advances_monotonically() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(32));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn event_source_is_fifo() {
        let mut source = WebEventSource::new();
        source.push_event(Event::Key(KeyEvent::new(KeyCode::Enter)));
        source.push_event(Event::TouchMove);
        assert_eq!(source.pending(), 2);
        let drained: Vec<_> = source.drain_events().collect();
        assert_eq!(drained[1], Event::TouchMove);
        assert_eq!(source.pending(), 0);
    }

    #[test]
    fn missing_overlay_is_an_error() {
        let mut host = WebHost::new(
            WebDocument::new(Viewport::new(800.0, 600.0)),
            SimulatedAudio::new("ambient.mp3"),
        );
        assert_eq!(
            host.element(AudioSlot::Overlay(0)).err(),
            Some(WebHostError::MissingAudio(AudioSlot::Overlay(0)))
        );
        assert!(host.audio(AudioSlot::Ambient).is_some());
        assert_eq!(host.slots(), vec![AudioSlot::Ambient]);
        assert_eq!(
            WebHostError::MissingAudio(AudioSlot::Ambient).to_string(),
            "no audio element for Ambient"
        );
    }
}
