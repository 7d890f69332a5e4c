#![forbid(unsafe_code)]

//! Audio: the ambient intro track and the chapter audio overlays.
//!
//! # Ambient track
//!
//! One looping element shared by two owners. The intro sequencer starts and
//! stops it; the mute control flips `muted` and may start playback when
//! unmuting. Both read the element state right before writing it.
//!
//! Playback requests never block. When the element is not ready yet, a
//! [`ReadinessWait`] holds the request until `canplay` arrives or the wait
//! times out, and then plays either way. Failures are logged and dropped;
//! the story never stalls on media.
//!
//! # Overlays
//!
//! Small players that slide in over the content. Opening one closes every
//! other, so at most one overlay is audible.

use std::time::Duration;

use longform_core::animation::{Cue, Stage, Timeline, TweenSpec, power2_in, power2_out};
use longform_core::pose::{NodeId, PosePatch};

use crate::config::AudioPolicyConfig;
use crate::error::PlaybackError;
use crate::host::{AudioSlot, Host, HostAudio, MediaEventKind};

const OVERLAY_CLOSED: &str = "overlay.closed";

/// `m:ss`, with `0:00` for anything non-finite or negative.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_owned();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn log_play_failure(slot: AudioSlot, err: &PlaybackError) {
    if err.is_recoverable() {
        tracing::debug!(?slot, error = %err, "playback deferred");
    } else {
        tracing::warn!(?slot, error = %err, "playback failed");
    }
}

fn try_play(slot: AudioSlot, audio: &mut dyn HostAudio) -> bool {
    match audio.play() {
        Ok(()) => true,
        Err(err) => {
            log_play_failure(slot, &err);
            false
        }
    }
}

/// Bounded wait for the `canplay` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessWait {
    remaining: Duration,
}

impl ReadinessWait {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { remaining: timeout }
    }

    /// Returns `true` once the wait has timed out.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// One-shot playback retry on the first user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureRetry {
    /// Not listening yet.
    Arming(Duration),
    /// Listening for the first gesture.
    Armed,
    /// Fired or cancelled.
    Spent,
}

impl GestureRetry {
    fn tick(&mut self, dt: Duration) {
        if let Self::Arming(left) = *self {
            let left = left.saturating_sub(dt);
            *self = if left.is_zero() {
                Self::Armed
            } else {
                Self::Arming(left)
            };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VolumeFade {
    step: f32,
    steps_left: u32,
    until_next: Duration,
}

/// Ambient track lifecycle, gesture retry, and mute control.
#[derive(Debug, Clone)]
pub struct AmbientAudio {
    gesture: GestureRetry,
    fade: Option<VolumeFade>,
    wait: Option<ReadinessWait>,
    config: AudioPolicyConfig,
}

impl AmbientAudio {
    #[must_use]
    pub fn new(config: AudioPolicyConfig) -> Self {
        Self {
            gesture: GestureRetry::Arming(config.gesture_arm()),
            fade: None,
            wait: None,
            config,
        }
    }

    /// Loop at the ambient volume.
    pub fn configure(&self, host: &mut dyn Host) {
        if let Some(audio) = host.audio(AudioSlot::Ambient) {
            audio.set_volume(self.config.ambient_volume);
            audio.set_looping(true);
        }
    }

    #[must_use]
    pub fn gesture_retry(&self) -> GestureRetry {
        self.gesture
    }

    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.wait.is_some()
    }

    /// Start the track if it is paused. Rejections are expected before the
    /// first gesture and are left to the gesture retry.
    pub fn start(&mut self, host: &mut dyn Host) {
        if self.fade.is_some() {
            return;
        }
        let Some(audio) = host.audio(AudioSlot::Ambient) else {
            return;
        };
        if audio.is_paused() {
            try_play(AudioSlot::Ambient, audio);
        }
    }

    /// Fade out, then pause and rewind. An already paused track is only
    /// rewound.
    pub fn stop_with_fade(&mut self, host: &mut dyn Host) {
        self.wait = None;
        self.gesture = GestureRetry::Spent;
        let Some(audio) = host.audio(AudioSlot::Ambient) else {
            return;
        };
        if audio.is_paused() {
            self.reset(audio);
            return;
        }
        let steps = self.config.fade_steps.max(1);
        self.fade = Some(VolumeFade {
            step: audio.volume() / steps as f32,
            steps_left: steps,
            until_next: self.config.fade_step(),
        });
        tracing::debug!(steps, "ambient fade out");
    }

    /// Pause and rewind immediately.
    pub fn stop_now(&mut self, host: &mut dyn Host) {
        self.fade = None;
        self.wait = None;
        self.gesture = GestureRetry::Spent;
        if let Some(audio) = host.audio(AudioSlot::Ambient) {
            audio.pause();
            self.reset(audio);
        }
    }

    fn reset(&self, audio: &mut dyn HostAudio) {
        audio.set_current_time(0.0);
        audio.set_volume(self.config.ambient_volume);
    }

    /// Click, keydown, touchstart or mousedown anywhere.
    pub fn on_gesture(&mut self, host: &mut dyn Host) {
        if self.gesture != GestureRetry::Armed {
            return;
        }
        self.gesture = GestureRetry::Spent;
        let Some(audio) = host.audio(AudioSlot::Ambient) else {
            return;
        };
        if audio.is_paused() && audio.has_source() && audio.is_looping() {
            tracing::debug!("gesture retry");
            self.play_when_ready(audio, self.config.gesture_ready_wait());
        }
    }

    /// Flip `muted`. Returns the new state. Unmuting a paused track with a
    /// source also starts it once ready.
    pub fn toggle_mute(&mut self, host: &mut dyn Host) -> bool {
        let Some(audio) = host.audio(AudioSlot::Ambient) else {
            return false;
        };
        let muted = !audio.is_muted();
        audio.set_muted(muted);
        if !muted && audio.is_paused() && audio.has_source() {
            self.gesture = GestureRetry::Spent;
            self.play_when_ready(audio, self.config.mute_ready_wait());
        }
        tracing::debug!(muted, "ambient mute toggled");
        muted
    }

    fn play_when_ready(&mut self, audio: &mut dyn HostAudio, timeout: Duration) {
        if audio.ready_state().can_play() {
            try_play(AudioSlot::Ambient, audio);
        } else {
            self.wait = Some(ReadinessWait::new(timeout));
        }
    }

    pub fn on_media(&mut self, kind: &MediaEventKind, host: &mut dyn Host) {
        match kind {
            MediaEventKind::CanPlay => {
                if self.wait.take().is_some()
                    && let Some(audio) = host.audio(AudioSlot::Ambient)
                {
                    try_play(AudioSlot::Ambient, audio);
                }
            }
            MediaEventKind::Error(reason) => {
                tracing::warn!(reason = %reason, "ambient track failed to load");
                self.wait = None;
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, dt: Duration, host: &mut dyn Host) {
        self.gesture.tick(dt);

        if let Some(wait) = &mut self.wait
            && wait.tick(dt)
        {
            self.wait = None;
            if let Some(audio) = host.audio(AudioSlot::Ambient) {
                try_play(AudioSlot::Ambient, audio);
            }
        }

        let Some(mut fade) = self.fade.take() else {
            return;
        };
        let Some(audio) = host.audio(AudioSlot::Ambient) else {
            return;
        };
        let interval = self.config.fade_step();
        let mut budget = dt;
        while budget >= fade.until_next {
            budget -= fade.until_next;
            fade.until_next = interval;
            fade.steps_left = fade.steps_left.saturating_sub(1);
            let volume = (audio.volume() - fade.step).max(0.0);
            audio.set_volume(volume);
            if fade.steps_left == 0 || volume <= 0.0 {
                audio.pause();
                self.reset(audio);
                tracing::debug!("ambient fade complete");
                return;
            }
        }
        fade.until_next -= budget;
        self.fade = Some(fade);
    }
}

/// Static description of one overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    pub node: NodeId,
    pub title: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayJob {
    Autoplay,
    AutoClose,
}

/// One chapter audio player.
#[derive(Debug, Clone)]
pub struct OverlayPlayer {
    spec: OverlaySpec,
    slot: AudioSlot,
    visible: bool,
    playing: bool,
    current_time: f64,
    duration: f64,
    seeking: bool,
    timers: Timeline<OverlayJob>,
    config: AudioPolicyConfig,
}

impl OverlayPlayer {
    #[must_use]
    pub fn new(spec: OverlaySpec, slot: AudioSlot, config: AudioPolicyConfig) -> Self {
        Self {
            spec,
            slot,
            visible: false,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            seeking: false,
            timers: Timeline::new(),
            config,
        }
    }

    /// Hidden until opened.
    pub fn mount(&self, stage: &mut Stage) {
        stage.set(
            self.spec.node,
            &PosePatch::new()
                .opacity(0.0)
                .y(self.config.overlay_rise_px),
        );
    }

    pub fn open(&mut self, stage: &mut Stage) {
        if self.visible {
            return;
        }
        self.visible = true;
        stage.kill_node(self.spec.node);
        stage.tween(
            TweenSpec::from_to(
                self.spec.node,
                PosePatch::new()
                    .opacity(0.0)
                    .y(self.config.overlay_rise_px),
                PosePatch::new().opacity(1.0).y(0.0),
            )
            .duration(self.config.overlay_in())
            .ease(power2_out),
        );
        self.timers.clear();
        self.timers
            .schedule(self.config.overlay_autoplay(), OverlayJob::Autoplay);
        tracing::debug!(title = %self.spec.title, "overlay opened");
    }

    /// Animate out. Playback stops when the animation completes.
    pub fn close(&mut self, stage: &mut Stage) {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.seeking = false;
        self.timers.clear();
        stage.tween(
            TweenSpec::to(
                self.spec.node,
                PosePatch::new()
                    .opacity(0.0)
                    .y(self.config.overlay_rise_px),
            )
            .duration(self.config.overlay_out())
            .ease(power2_in)
            .cue(OVERLAY_CLOSED),
        );
        tracing::debug!(title = %self.spec.title, "overlay closing");
    }

    fn finish_close(&mut self, host: &mut dyn Host) {
        if let Some(audio) = host.audio(self.slot) {
            audio.pause();
            audio.set_current_time(0.0);
        }
        self.current_time = 0.0;
        self.playing = false;
    }

    /// Returns whether the cue belonged to this overlay.
    pub fn on_cue(&mut self, cue: &Cue, host: &mut dyn Host) -> bool {
        if cue.node != self.spec.node || cue.label != OVERLAY_CLOSED {
            return false;
        }
        if !self.visible {
            self.finish_close(host);
        }
        true
    }

    pub fn toggle_play(&mut self, host: &mut dyn Host) {
        let Some(audio) = host.audio(self.slot) else {
            return;
        };
        if self.playing {
            audio.pause();
            self.playing = false;
        } else if try_play(self.slot, audio) {
            self.playing = true;
        }
    }

    /// Jump to a fraction of the track, clamped to [0, 1].
    pub fn seek_fraction(&mut self, fraction: f32, host: &mut dyn Host) {
        let time = f64::from(fraction.clamp(0.0, 1.0)) * self.duration;
        if let Some(audio) = host.audio(self.slot) {
            audio.set_current_time(time);
        }
        self.current_time = time;
    }

    /// Progress-bar drag started; `timeupdate` is ignored until it ends.
    pub fn begin_seek(&mut self, fraction: f32, host: &mut dyn Host) {
        self.seeking = true;
        self.seek_fraction(fraction, host);
    }

    pub fn end_seek(&mut self) {
        self.seeking = false;
    }

    pub fn on_media(&mut self, kind: &MediaEventKind, host: &mut dyn Host) {
        let Some(audio) = host.audio(self.slot) else {
            return;
        };
        match kind {
            MediaEventKind::LoadedMetadata | MediaEventKind::CanPlay => {
                let duration = audio.duration();
                if duration.is_finite() && duration > 0.0 {
                    self.duration = duration;
                }
            }
            MediaEventKind::TimeUpdate => {
                if !self.seeking {
                    self.current_time = audio.current_time();
                }
            }
            MediaEventKind::Play => self.playing = true,
            MediaEventKind::Pause => self.playing = false,
            MediaEventKind::Ended => {
                self.playing = false;
                self.current_time = 0.0;
                self.timers
                    .schedule(self.config.overlay_autoclose(), OverlayJob::AutoClose);
            }
            MediaEventKind::Error(reason) => {
                tracing::warn!(title = %self.spec.title, reason = %reason, "overlay audio failed to load");
            }
        }
    }

    pub fn tick(&mut self, dt: Duration, host: &mut dyn Host, stage: &mut Stage) {
        for job in self.timers.advance(dt) {
            match job {
                OverlayJob::Autoplay => {
                    if self.visible
                        && let Some(audio) = host.audio(self.slot)
                        && try_play(self.slot, audio)
                    {
                        self.playing = true;
                    }
                }
                OverlayJob::AutoClose => self.close(stage),
            }
        }
    }

    #[must_use]
    pub fn spec(&self) -> &OverlaySpec {
        &self.spec
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Fraction for the progress bar.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }

    /// `(elapsed, total)` labels.
    #[must_use]
    pub fn time_labels(&self) -> (String, String) {
        (format_time(self.current_time), format_time(self.duration))
    }
}

/// Every overlay on the page.
#[derive(Debug, Clone, Default)]
pub struct OverlayRegistry {
    overlays: Vec<OverlayPlayer>,
}

impl OverlayRegistry {
    /// Overlay `i` plays through [`AudioSlot::Overlay`]`(i)`.
    #[must_use]
    pub fn new(specs: Vec<OverlaySpec>, config: &AudioPolicyConfig) -> Self {
        Self {
            overlays: specs
                .into_iter()
                .enumerate()
                .map(|(i, spec)| OverlayPlayer::new(spec, AudioSlot::Overlay(i), config.clone()))
                .collect(),
        }
    }

    pub fn mount(&self, stage: &mut Stage) {
        for overlay in &self.overlays {
            overlay.mount(stage);
        }
    }

    /// Open `index`, closing every other overlay first.
    pub fn open(&mut self, index: usize, stage: &mut Stage) -> bool {
        if index >= self.overlays.len() {
            return false;
        }
        for (i, overlay) in self.overlays.iter_mut().enumerate() {
            if i != index {
                overlay.close(stage);
            }
        }
        self.overlays[index].open(stage);
        true
    }

    pub fn close(&mut self, index: usize, stage: &mut Stage) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.close(stage);
        }
    }

    pub fn close_all(&mut self, stage: &mut Stage) {
        for overlay in &mut self.overlays {
            overlay.close(stage);
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&OverlayPlayer> {
        self.overlays.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut OverlayPlayer> {
        self.overlays.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Route a completion cue. Returns whether an overlay consumed it.
    pub fn on_cue(&mut self, cue: &Cue, host: &mut dyn Host) -> bool {
        self.overlays
            .iter_mut()
            .any(|overlay| overlay.on_cue(cue, host))
    }

    pub fn on_media(&mut self, index: usize, kind: &MediaEventKind, host: &mut dyn Host) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.on_media(kind, host);
        }
    }

    pub fn tick(&mut self, dt: Duration, host: &mut dyn Host, stage: &mut Stage) {
        for overlay in &mut self.overlays {
            overlay.tick(dt, host, stage);
        }
    }
}
