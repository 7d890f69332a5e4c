#![forbid(unsafe_code)]

//! Fixed-cadence story driver.
//!
//! Each [`StoryDriver::step`] runs one animation frame:
//!
//! 1. drain queued input, unlocking audio on user gestures and applying
//!    unprevented wheel and scroll input to the document;
//! 2. advance the clock and every playing audio element;
//! 3. deliver media notifications;
//! 4. tick the story;
//! 5. dispatch one coalesced scroll event if the document moved.

use core::time::Duration;

use longform_core::event::Event;
use longform_runtime::{HostDocument, MediaEvent, Story};
use web_time::Instant;

use crate::{DeterministicClock, WebEventSource, WebHost};

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Input events drained.
    pub events: usize,
    /// Events whose platform default was suppressed.
    pub prevented: usize,
    /// Media notifications delivered.
    pub media: usize,
    /// A scroll event was dispatched.
    pub scrolled: bool,
}

#[derive(Debug)]
pub struct StoryDriver {
    story: Story,
    host: WebHost,
    events: WebEventSource,
    clock: DeterministicClock,
    frame: Duration,
}

impl StoryDriver {
    /// One frame at 60Hz, rounded to whole milliseconds.
    pub const DEFAULT_FRAME: Duration = Duration::from_millis(16);

    /// Mount `story` on `host`.
    #[must_use]
    pub fn new(mut story: Story, mut host: WebHost) -> Self {
        story.mount(&mut host);
        Self {
            story,
            host,
            events: WebEventSource::new(),
            clock: DeterministicClock::new(),
            frame: Self::DEFAULT_FRAME,
        }
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Duration) -> Self {
        self.frame = frame;
        self
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_event(event);
    }

    /// Run one frame.
    pub fn step(&mut self) -> StepReport {
        let started = Instant::now();
        let mut report = StepReport::default();

        let events: Vec<Event> = self.events.drain_events().collect();
        for event in &events {
            report.events += 1;
            self.dispatch(event, &mut report);
        }

        self.clock.advance(self.frame);
        for slot in self.host.slots() {
            if let Ok(element) = self.host.element(slot) {
                element.advance(self.frame);
            }
        }
        report.media += self.deliver_media();
        self.story.tick(self.frame, &mut self.host);
        report.media += self.deliver_media();

        if self.host.document.take_scrolled() {
            let y = self.host.document.scroll_y();
            self.story.handle_event(&Event::Scroll { y }, &mut self.host);
            report.scrolled = true;
        }

        tracing::trace!(
            now_ms = self.clock.now().as_millis() as u64,
            events = report.events,
            media = report.media,
            elapsed_us = started.elapsed().as_micros() as u64,
            "story step"
        );
        report
    }

    fn dispatch(&mut self, event: &Event, report: &mut StepReport) {
        match event {
            Event::Scroll { y } => {
                // reported back as one coalesced scroll at the end of the step
                self.host.document.user_scroll(*y);
                return;
            }
            Event::Resize(viewport) => self.host.document.set_viewport(*viewport),
            _ => {}
        }
        if event.is_user_gesture() {
            self.host.note_gesture();
        }
        let disposition = self.story.handle_event(event, &mut self.host);
        if disposition.prevents_default() {
            report.prevented += 1;
            return;
        }
        if let Event::Wheel { delta_y } = event {
            let top = self.host.document.scroll_y() + delta_y;
            self.host.document.user_scroll(top);
        }
    }

    fn deliver_media(&mut self) -> usize {
        let mut delivered = 0;
        for slot in self.host.slots() {
            let kinds: Vec<_> = match self.host.element(slot) {
                Ok(element) => element.drain_events().collect(),
                Err(_) => continue,
            };
            for kind in kinds {
                self.story
                    .media_event(&MediaEvent::new(slot, kind), &mut self.host);
                delivered += 1;
            }
        }
        delivered
    }

    /// Step until at least `duration` of story time has passed. Returns the
    /// number of frames run.
    pub fn run_for(&mut self, duration: Duration) -> usize {
        let target = self.clock.now().saturating_add(duration);
        let mut frames = 0;
        while self.clock.now() < target {
            self.step();
            frames += 1;
        }
        frames
    }

    /// Step until `done` holds, for at most `limit` of story time. Returns
    /// whether it held.
    pub fn run_until(&mut self, limit: Duration, mut done: impl FnMut(&Story) -> bool) -> bool {
        let target = self.clock.now().saturating_add(limit);
        while !done(&self.story) {
            if self.clock.now() >= target {
                return false;
            }
            self.step();
        }
        true
    }

    /// Call into the story directly, as a control's click handler would.
    pub fn act<R>(&mut self, f: impl FnOnce(&mut Story, &mut WebHost) -> R) -> R {
        f(&mut self.story, &mut self.host)
    }

    /// Unmount the story.
    pub fn shutdown(&mut self) {
        self.story.unmount(&mut self.host);
    }

    #[must_use]
    pub fn story(&self) -> &Story {
        &self.story
    }

    #[must_use]
    pub fn host(&self) -> &WebHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut WebHost {
        &mut self.host
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn frame(&self) -> Duration {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimulatedAudio, WebDocument};
    use longform_core::event::{KeyCode, KeyEvent};
    use longform_core::geometry::{Rect, Viewport};
    use longform_core::motion::MotionSignals;
    use longform_core::pose::NodeId;
    use longform_runtime::{HostAudio, IntroPhase, RevealTargets, SlideNodes, StoryConfig, StoryLayout};

    fn driver() -> StoryDriver {
        let layout = StoryLayout {
            intro_container: NodeId(1),
            title: NodeId(2),
            cursor: NodeId(3),
            touch_fallback: NodeId(4),
            slides: (0..3)
                .map(|i| SlideNodes::new(NodeId(10 + i), Vec::new()))
                .collect(),
            backgrounds: Vec::new(),
            reveal: RevealTargets::default(),
            chapters: Vec::new(),
            card_stacks: Vec::new(),
            overlays: Vec::new(),
        };
        let viewport = Viewport::new(1280.0, 800.0);
        let story = Story::new(
            StoryConfig::default(),
            layout,
            MotionSignals::desktop(),
            viewport,
        );
        let document =
            WebDocument::new(viewport).with_node(NodeId(90), Rect::new(0.0, 0.0, 1280.0, 4000.0));
        let host = WebHost::new(document, SimulatedAudio::new("ambient.mp3").loaded(120.0));
        StoryDriver::new(story, host)
    }

    #[test]
    fn wheel_is_prevented_during_intro() {
        let mut driver = driver();
        driver.push_event(Event::Wheel { delta_y: 120.0 });
        let report = driver.step();
        assert_eq!(report.prevented, 1);
        assert!(!report.scrolled);
        assert_eq!(driver.host().document.scroll_y(), 0.0);
    }

    #[test]
    fn wheel_scrolls_after_skip() {
        let mut driver = driver();
        driver.act(|story, host| story.skip(host));
        driver.run_for(Duration::from_millis(200));
        driver.push_event(Event::Wheel { delta_y: 120.0 });
        let report = driver.step();
        assert_eq!(report.prevented, 0);
        assert!(report.scrolled);
        assert_eq!(driver.host().document.scroll_y(), 120.0);
    }

    #[test]
    fn gesture_unlocks_ambient_playback() {
        let mut driver = driver();
        driver.push_event(Event::Key(KeyEvent::new(KeyCode::Enter)));
        assert!(driver.run_until(Duration::from_secs(2), |s| {
            s.phase() == IntroPhase::Slide(0)
        }));
        driver.run_for(Duration::from_millis(200));
        assert!(!driver.host().ambient.is_paused());
    }

    #[test]
    fn run_for_counts_frames() {
        let mut driver = driver().with_frame(Duration::from_millis(10));
        assert_eq!(driver.run_for(Duration::from_millis(100)), 10);
        assert_eq!(driver.now(), Duration::from_millis(100));
    }
}
