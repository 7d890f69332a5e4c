#![forbid(unsafe_code)]

//! Timeline: keyed one-shot events at absolute offsets.
//!
//! A [`Timeline`] is the scheduler behind every "do X after N ms" in the
//! runtime: audio grace delays, settle delays before smooth scrolls, cursor
//! pulses, geometry refreshes. Keys are plain data (usually a small enum), so
//! a component can cancel or query a pending event without holding a handle.
//!
//! # Invariants
//!
//! 1. Events are always sorted by offset; equal offsets keep insertion order.
//! 2. An event fires at most once. Fired events are removed.
//! 3. [`Timeline::advance`] only moves time while `Playing`.
//! 4. [`Timeline::seek`] never fires events; events it jumps over are dropped.
//!
//! # Failure Modes
//!
//! - Empty timeline: progress is 1.0 and the state is `Finished` after the
//!   first advance.
//! - Scheduling onto a finished timeline resumes it.

use std::time::Duration;

/// Playback state of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not yet started.
    Idle,
    Playing,
    /// Paused; can be resumed.
    Paused,
    /// Every event has fired.
    Finished,
}

#[derive(Debug, Clone)]
struct Scheduled<K> {
    offset: Duration,
    key: K,
}

/// A scheduler of keyed one-shot events.
#[derive(Debug, Clone)]
pub struct Timeline<K> {
    events: Vec<Scheduled<K>>,
    state: PlaybackState,
    current_time: Duration,
    /// Offset of the furthest event ever scheduled, for progress.
    horizon: Duration,
}

impl<K> Default for Timeline<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Timeline<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            state: PlaybackState::Idle,
            current_time: Duration::ZERO,
            horizon: Duration::ZERO,
        }
    }

    /// Add an event at an absolute offset (builder pattern).
    #[must_use]
    pub fn at(mut self, offset: Duration, key: K) -> Self {
        self.insert(offset, key);
        self
    }

    /// Schedule `key` to fire `after` from the current time.
    ///
    /// Starts (or resumes) playback unless the timeline is paused.
    pub fn schedule(&mut self, after: Duration, key: K) {
        let offset = self.current_time.saturating_add(after);
        self.insert(offset, key);
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Finished) {
            self.state = PlaybackState::Playing;
        }
    }

    fn insert(&mut self, offset: Duration, key: K) {
        let pos = self.events.partition_point(|e| e.offset <= offset);
        self.events.insert(pos, Scheduled { offset, key });
        self.horizon = self.horizon.max(offset);
    }

    /// Start playback from the current position.
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback. No-op if not playing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume from pause. No-op if not paused.
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Drop every pending event and return to idle.
    pub fn clear(&mut self) {
        self.events.clear();
        self.state = PlaybackState::Idle;
        self.current_time = Duration::ZERO;
        self.horizon = Duration::ZERO;
    }

    /// Jump to `time`, dropping (not firing) every event before it.
    pub fn seek(&mut self, time: Duration) {
        self.events.retain(|e| e.offset >= time);
        self.current_time = time;
        if self.state == PlaybackState::Idle || self.state == PlaybackState::Finished {
            self.state = PlaybackState::Paused;
        }
    }

    /// Advance time and return the keys of every event that became due, in
    /// offset order.
    pub fn advance(&mut self, dt: Duration) -> Vec<K> {
        if self.state != PlaybackState::Playing {
            return Vec::new();
        }
        self.current_time = self.current_time.saturating_add(dt);
        let due = self.events.partition_point(|e| e.offset <= self.current_time);
        let fired: Vec<K> = self.events.drain(..due).map(|e| e.key).collect();
        if self.events.is_empty() {
            self.state = PlaybackState::Finished;
        }
        fired
    }

    /// Remove pending events matching `pred`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !pred(&e.key));
        before - self.events.len()
    }

    /// Time until the first pending event matching `pred`, if any.
    #[must_use]
    pub fn time_until(&self, mut pred: impl FnMut(&K) -> bool) -> Option<Duration> {
        self.events
            .iter()
            .find(|e| pred(&e.key))
            .map(|e| e.offset.saturating_sub(self.current_time))
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    /// Fraction of the scheduled horizon already elapsed, in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.events.is_empty() || self.horizon.is_zero() {
            return 1.0;
        }
        (self.current_time.as_secs_f64() / self.horizon.as_secs_f64()).clamp(0.0, 1.0) as f32
    }
}

impl<K: PartialEq> Timeline<K> {
    /// Remove every pending event with this key.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.cancel_where(|k| k == key) > 0
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.events.iter().any(|e| &e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Job {
        Announce,
        Play,
        Scroll,
    }

    #[test]
    fn empty_timeline_is_complete() {
        let mut tl: Timeline<Job> = Timeline::new();
        assert_eq!(tl.progress(), 1.0);
        tl.play();
        assert!(tl.advance(MS_100).is_empty());
        assert_eq!(tl.state(), PlaybackState::Finished);
    }

    #[test]
    fn fires_in_offset_order_once() {
        let mut tl = Timeline::new()
            .at(MS_200, Job::Scroll)
            .at(MS_100, Job::Play)
            .at(Duration::ZERO, Job::Announce);
        tl.play();
        assert_eq!(tl.advance(MS_100), vec![Job::Announce, Job::Play]);
        assert!(tl.advance(Duration::from_millis(50)).is_empty());
        assert_eq!(tl.advance(Duration::from_millis(50)), vec![Job::Scroll]);
        assert_eq!(tl.state(), PlaybackState::Finished);
        assert!(tl.advance(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut tl = Timeline::new();
        tl.schedule(MS_100, Job::Play);
        tl.advance(Duration::from_millis(80));
        tl.schedule(MS_100, Job::Scroll);
        assert_eq!(tl.advance(Duration::from_millis(20)), vec![Job::Play]);
        assert_eq!(tl.time_until(|k| *k == Job::Scroll), Some(Duration::from_millis(80)));
    }

    #[test]
    fn pause_stops_time() {
        let mut tl = Timeline::new();
        tl.schedule(MS_100, Job::Play);
        tl.pause();
        assert!(tl.advance(MS_200).is_empty());
        tl.resume();
        assert_eq!(tl.advance(MS_100), vec![Job::Play]);
    }

    #[test]
    fn cancel_removes_pending() {
        let mut tl = Timeline::new();
        tl.schedule(MS_100, Job::Play);
        tl.schedule(MS_100, Job::Announce);
        assert!(tl.cancel(&Job::Play));
        assert!(!tl.is_pending(&Job::Play));
        assert_eq!(tl.advance(MS_100), vec![Job::Announce]);
    }

    #[test]
    fn seek_drops_skipped_events() {
        let mut tl = Timeline::new().at(MS_100, Job::Play).at(MS_200, Job::Scroll);
        tl.seek(Duration::from_millis(150));
        assert_eq!(tl.state(), PlaybackState::Paused);
        assert_eq!(tl.pending_count(), 1);
        tl.resume();
        assert_eq!(tl.advance(Duration::from_millis(50)), vec![Job::Scroll]);
    }
}
