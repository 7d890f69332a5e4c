#![forbid(unsafe_code)]

//! Platform boundary.
//!
//! The runtime never touches a real document or media element. Everything
//! it needs from the platform goes through these traits, which a backend
//! (see `longform-web`) implements. All calls are synchronous; media
//! notifications flow back in as [`MediaEvent`]s.

use longform_core::geometry::{Rect, Viewport};
use longform_core::pose::NodeId;

use crate::error::PlaybackError;

/// HTML media `readyState` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Enough data to start playing without waiting for `canplay`.
    #[must_use]
    pub fn can_play(self) -> bool {
        self >= Self::HaveCurrentData
    }
}

/// One audio element.
pub trait HostAudio {
    /// Request playback. Autoplay policies may reject it.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Length in seconds. NaN or infinite until metadata is known.
    fn duration(&self) -> f64;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn is_looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
    fn has_source(&self) -> bool;
    fn ready_state(&self) -> ReadyState;
}

/// Document-level services.
pub trait HostDocument {
    /// Replace the text of the assistive live region.
    fn announce(&mut self, text: &str);
    /// Request a scroll to document offset `top`.
    fn scroll_to(&mut self, top: f32, smooth: bool);
    fn scroll_y(&self) -> f32;
    fn viewport(&self) -> Viewport;
    /// Toggle the document scroll lock.
    fn set_scroll_locked(&mut self, locked: bool);
    /// Layout box of a node in document coordinates, `None` while the node
    /// is not mounted.
    fn node_rect(&self, node: NodeId) -> Option<Rect>;
}

/// Which audio element a call or notification concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioSlot {
    /// The looping intro track.
    Ambient,
    /// An overlay player, by registry index.
    Overlay(usize),
}

/// Everything the story reaches on the platform.
pub trait Host {
    fn document(&mut self) -> &mut dyn HostDocument;
    /// `None` when the element does not exist.
    fn audio(&mut self, slot: AudioSlot) -> Option<&mut dyn HostAudio>;
}

/// Media element notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    LoadedMetadata,
    CanPlay,
    TimeUpdate,
    Play,
    Pause,
    Ended,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub slot: AudioSlot,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    #[must_use]
    pub fn new(slot: AudioSlot, kind: MediaEventKind) -> Self {
        Self { slot, kind }
    }
}

/// Rect of `node` relative to the viewport top.
#[must_use]
pub fn viewport_rect(doc: &dyn HostDocument, node: NodeId) -> Option<Rect> {
    doc.node_rect(node).map(|r| r.translate_y(-doc.scroll_y()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_threshold() {
        assert!(!ReadyState::HaveNothing.can_play());
        assert!(!ReadyState::HaveMetadata.can_play());
        assert!(ReadyState::HaveCurrentData.can_play());
        assert!(ReadyState::HaveEnoughData.can_play());
    }
}
