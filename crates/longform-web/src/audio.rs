#![forbid(unsafe_code)]

//! Simulated `<audio>` element.
//!
//! Models the parts of an HTML media element the runtime relies on: an
//! autoplay policy that rejects `play()` until the page has seen a user
//! gesture, `readyState` progression, and the notifications the element
//! would dispatch. Notifications queue up until the host drains them.

use std::collections::VecDeque;
use std::time::Duration;

use longform_runtime::{HostAudio, MediaEventKind, PlaybackError, ReadyState};

/// Whether unattended playback is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayPolicy {
    Allowed,
    /// `play()` rejects until a click, keydown, touchstart or mousedown.
    #[default]
    RequireGesture,
}

#[derive(Debug, Clone)]
pub struct SimulatedAudio {
    source: Option<String>,
    policy: AutoplayPolicy,
    gesture_seen: bool,
    paused: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    muted: bool,
    looping: bool,
    ready: ReadyState,
    error: Option<String>,
    pending: VecDeque<MediaEventKind>,
    play_attempts: u32,
}

impl SimulatedAudio {
    /// An element for `source`, metadata not yet loaded.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::empty()
        }
    }

    /// An element without a `src`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            source: None,
            policy: AutoplayPolicy::default(),
            gesture_seen: false,
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            muted: false,
            looping: false,
            ready: ReadyState::HaveNothing,
            error: None,
            pending: VecDeque::new(),
            play_attempts: 0,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AutoplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Metadata and enough data to play through, as after a full preload.
    #[must_use]
    pub fn loaded(mut self, duration_secs: f64) -> Self {
        self.load_metadata(duration_secs);
        self.buffer();
        self.pending.clear();
        self
    }

    /// The page saw a user gesture. Playback is unlocked from now on.
    pub fn note_gesture(&mut self) {
        self.gesture_seen = true;
    }

    pub fn load_metadata(&mut self, duration_secs: f64) {
        self.duration = duration_secs;
        self.ready = self.ready.max(ReadyState::HaveMetadata);
        self.pending.push_back(MediaEventKind::LoadedMetadata);
    }

    pub fn buffer(&mut self) {
        self.ready = ReadyState::HaveEnoughData;
        self.pending.push_back(MediaEventKind::CanPlay);
    }

    /// The resource failed to load.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.ready = ReadyState::HaveNothing;
        self.paused = true;
        self.error = Some(reason.clone());
        self.pending.push_back(MediaEventKind::Error(reason));
    }

    /// Move the playhead by `dt` if playing.
    pub fn advance(&mut self, dt: Duration) {
        if self.paused || !self.ready.can_play() {
            return;
        }
        self.current_time += dt.as_secs_f64();
        if self.duration.is_finite() && self.current_time >= self.duration {
            if self.looping {
                self.current_time %= self.duration.max(f64::EPSILON);
            } else {
                self.current_time = self.duration;
                self.paused = true;
                self.pending.push_back(MediaEventKind::TimeUpdate);
                self.pending.push_back(MediaEventKind::Pause);
                self.pending.push_back(MediaEventKind::Ended);
                return;
            }
        }
        self.pending.push_back(MediaEventKind::TimeUpdate);
    }

    /// Notifications dispatched since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = MediaEventKind> + '_ {
        self.pending.drain(..)
    }

    #[must_use]
    pub fn play_attempts(&self) -> u32 {
        self.play_attempts
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl HostAudio for SimulatedAudio {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.play_attempts += 1;
        if self.source.is_none() {
            return Err(PlaybackError::MediaUnavailable("no source".into()));
        }
        if let Some(reason) = &self.error {
            return Err(PlaybackError::MediaUnavailable(reason.clone()));
        }
        if self.policy == AutoplayPolicy::RequireGesture && !self.gesture_seen {
            return Err(PlaybackError::AutoplayRejected);
        }
        // an unbuffered element starts once data arrives
        if self.paused {
            self.paused = false;
            self.pending.push_back(MediaEventKind::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.pending.push_back(MediaEventKind::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = if self.duration.is_finite() {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        };
        self.pending.push_back(MediaEventKind::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }
}
