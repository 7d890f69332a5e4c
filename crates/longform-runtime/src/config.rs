#![forbid(unsafe_code)]

//! Policy-as-data configuration for a Longform story.
//!
//! Every timing, distance and threshold the components use lives in a
//! single [`StoryConfig`], grouped per component. The defaults are the
//! values the story ships with, so `StoryConfig::default()` is the
//! reference behavior.
//!
//! # Loading
//!
//! ```toml
//! # longform.toml
//! [slides]
//! exit_ms = 900
//! enter_pause_ms = 1200
//!
//! [chapters]
//! visibility_threshold = 0.25
//! ```
//!
//! ```rust,ignore
//! let config = StoryConfig::from_toml_file("longform.toml")?;
//! let config = StoryConfig::from_json_str(json)?;
//! ```
//!
//! Durations are stored as whole milliseconds (`*_ms`) and exposed as
//! [`Duration`] through accessor methods.

#[cfg(feature = "config-file")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use longform_core::animation::Edge;

// ---------------------------------------------------------------------------
// Top-level StoryConfig
// ---------------------------------------------------------------------------

/// All tunable parameters of a story.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct StoryConfig {
    /// Title screen, slide gating and the hand-off to the document.
    pub intro: IntroPolicyConfig,
    /// Slide enter/exit choreography.
    pub slides: SlidePolicyConfig,
    /// Per-slide background layers.
    pub background: BackgroundPolicyConfig,
    /// Pointer proxy following and pulses.
    pub cursor: CursorPolicyConfig,
    /// Scroll-linked reveals and decorative scrubs.
    pub reveal: RevealPolicyConfig,
    /// Draggable card stacks.
    pub cards: CardPolicyConfig,
    /// Chapter locator.
    pub chapters: ChapterPolicyConfig,
    /// Ambient track, mute control and overlays.
    pub audio: AudioPolicyConfig,
}

impl StoryConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate and return `self`, or every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            tracing::debug!(slides = self.intro.slide_count, "story config accepted");
            Ok(self)
        } else {
            tracing::warn!(problems = errors.len(), "story config rejected");
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.intro.slide_count == 0 {
            errors.push("intro.slide_count must be > 0".into());
        }
        nonzero(&mut errors, "intro.title_fade_ms", self.intro.title_fade_ms);
        nonzero(&mut errors, "intro.intro_fade_ms", self.intro.intro_fade_ms);
        nonzero(&mut errors, "intro.title_enter_ms", self.intro.title_enter_ms);

        nonzero(&mut errors, "slides.exit_ms", self.slides.exit_ms);
        nonzero(&mut errors, "slides.enter_ms", self.slides.enter_ms);
        nonzero(&mut errors, "slides.highlight_ms", self.slides.highlight_ms);
        nonzero(&mut errors, "slides.reduced_exit_ms", self.slides.reduced_exit_ms);
        nonzero(&mut errors, "slides.reduced_enter_ms", self.slides.reduced_enter_ms);
        if self.slides.enter_pause_ms < self.slides.exit_ms {
            errors.push(format!(
                "slides.enter_pause_ms ({}) must cover slides.exit_ms ({})",
                self.slides.enter_pause_ms, self.slides.exit_ms
            ));
        }

        nonzero(&mut errors, "cursor.follow_ms", self.cursor.follow_ms);
        unit(&mut errors, "cursor.rest_opacity", self.cursor.rest_opacity);

        unit(&mut errors, "reveal.reveal_line", self.reveal.reveal_line);
        for (name, edge) in [
            ("reveal.start", &self.reveal.start),
            ("reveal.end", &self.reveal.end),
            ("reveal.drive_start", &self.reveal.drive_start),
            ("reveal.drive_end", &self.reveal.drive_end),
        ] {
            if Edge::parse(edge).is_none() {
                errors.push(format!("{name} is not a valid edge: {edge:?}"));
            }
        }
        if self.reveal.drive_max_px <= 0.0 {
            errors.push("reveal.drive_max_px must be > 0".into());
        }

        unit(&mut errors, "cards.edge_resistance", self.cards.edge_resistance);
        if self.cards.reach_fraction < 0.0 {
            errors.push("cards.reach_fraction must be >= 0".into());
        }

        let threshold = self.chapters.visibility_threshold;
        if threshold <= 0.0 || threshold >= 1.0 {
            errors.push(format!(
                "chapters.visibility_threshold must be in (0, 1), got {threshold}"
            ));
        }

        unit(&mut errors, "audio.ambient_volume", self.audio.ambient_volume);
        if self.audio.fade_steps == 0 {
            errors.push("audio.fade_steps must be > 0".into());
        }
        nonzero(&mut errors, "audio.fade_ms", self.audio.fade_ms);

        errors
    }
}

fn nonzero(errors: &mut Vec<String>, name: &str, ms: u64) {
    if ms == 0 {
        errors.push(format!("{name} must be > 0"));
    }
}

fn unit(errors: &mut Vec<String>, name: &str, value: f32) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{name} must be in [0, 1], got {value}"));
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Intro sequencer timings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct IntroPolicyConfig {
    /// Number of intro slides.
    pub slide_count: usize,
    /// Title fade-out before the first slide commits.
    pub title_fade_ms: u64,
    /// Intro container fade-out on "begin".
    pub intro_fade_ms: u64,
    /// Grace delay between entering slide 1 and starting ambient audio.
    pub audio_grace_ms: u64,
    /// Delay between completing "begin" and scrolling to the top.
    pub begin_settle_ms: u64,
    /// Delay between a skip and scrolling to the top.
    pub skip_settle_ms: u64,
    /// Delay after a slide change before the pointer proxy pulses.
    pub pulse_delay_ms: u64,
    /// Title entrance on mount.
    pub title_enter_ms: u64,
    pub title_enter_y: f32,
    pub title_enter_blur: f32,
    pub reduced_title_enter_ms: u64,
    pub reduced_title_enter_y: f32,
}

impl Default for IntroPolicyConfig {
    fn default() -> Self {
        Self {
            slide_count: 3,
            title_fade_ms: 400,
            intro_fade_ms: 600,
            audio_grace_ms: 100,
            begin_settle_ms: 150,
            skip_settle_ms: 100,
            pulse_delay_ms: 800,
            title_enter_ms: 500,
            title_enter_y: 20.0,
            title_enter_blur: 4.0,
            reduced_title_enter_ms: 200,
            reduced_title_enter_y: 10.0,
        }
    }
}

impl IntroPolicyConfig {
    #[must_use]
    pub fn title_fade(&self) -> Duration {
        ms(self.title_fade_ms)
    }

    #[must_use]
    pub fn intro_fade(&self) -> Duration {
        ms(self.intro_fade_ms)
    }

    #[must_use]
    pub fn audio_grace(&self) -> Duration {
        ms(self.audio_grace_ms)
    }

    #[must_use]
    pub fn begin_settle(&self) -> Duration {
        ms(self.begin_settle_ms)
    }

    #[must_use]
    pub fn skip_settle(&self) -> Duration {
        ms(self.skip_settle_ms)
    }

    #[must_use]
    pub fn pulse_delay(&self) -> Duration {
        ms(self.pulse_delay_ms)
    }

    #[must_use]
    pub fn title_enter(&self) -> Duration {
        ms(self.title_enter_ms)
    }

    #[must_use]
    pub fn reduced_title_enter(&self) -> Duration {
        ms(self.reduced_title_enter_ms)
    }
}

/// Slide enter/exit choreography.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct SlidePolicyConfig {
    pub exit_ms: u64,
    pub exit_y: f32,
    pub exit_blur: f32,
    /// Pose a slide waits in before entering.
    pub hidden_y: f32,
    pub hidden_blur: f32,
    pub enter_ms: u64,
    /// Delay of an entering slide when another slide is leaving. Covers
    /// the exit plus a pause.
    pub enter_pause_ms: u64,
    pub highlight_ms: u64,
    pub highlight_stagger_ms: u64,
    pub reduced_exit_ms: u64,
    pub reduced_exit_y: f32,
    pub reduced_hidden_y: f32,
    pub reduced_enter_ms: u64,
    pub reduced_highlight_ms: u64,
    pub reduced_highlight_stagger_ms: u64,
}

impl Default for SlidePolicyConfig {
    fn default() -> Self {
        Self {
            exit_ms: 1000,
            exit_y: -60.0,
            exit_blur: 8.0,
            hidden_y: 40.0,
            hidden_blur: 10.0,
            enter_ms: 1400,
            enter_pause_ms: 1300,
            highlight_ms: 800,
            highlight_stagger_ms: 150,
            reduced_exit_ms: 400,
            reduced_exit_y: -20.0,
            reduced_hidden_y: 20.0,
            reduced_enter_ms: 300,
            reduced_highlight_ms: 400,
            reduced_highlight_stagger_ms: 100,
        }
    }
}

impl SlidePolicyConfig {
    #[must_use]
    pub fn exit(&self, reduced: bool) -> Duration {
        ms(if reduced { self.reduced_exit_ms } else { self.exit_ms })
    }

    #[must_use]
    pub fn enter(&self, reduced: bool) -> Duration {
        ms(if reduced { self.reduced_enter_ms } else { self.enter_ms })
    }

    /// Reduced motion never waits for the outgoing slide.
    #[must_use]
    pub fn enter_pause(&self, reduced: bool) -> Duration {
        if reduced { Duration::ZERO } else { ms(self.enter_pause_ms) }
    }

    #[must_use]
    pub fn highlight(&self, reduced: bool) -> Duration {
        ms(if reduced {
            self.reduced_highlight_ms
        } else {
            self.highlight_ms
        })
    }

    #[must_use]
    pub fn highlight_stagger(&self, reduced: bool) -> Duration {
        ms(if reduced {
            self.reduced_highlight_stagger_ms
        } else {
            self.highlight_stagger_ms
        })
    }
}

/// Per-slide background layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct BackgroundPolicyConfig {
    pub fade_ms: u64,
    pub settle_ms: u64,
    pub scale_from: f32,
    pub blur_from: f32,
    pub blur_to: f32,
    pub reduced_ms: u64,
    pub reduced_scale_from: f32,
    /// Maximum parallax offset in px at the viewport edge.
    pub parallax_px: f32,
    pub parallax_follow_ms: u64,
}

impl Default for BackgroundPolicyConfig {
    fn default() -> Self {
        Self {
            fade_ms: 1800,
            settle_ms: 2000,
            scale_from: 1.08,
            blur_from: 6.0,
            blur_to: 2.0,
            reduced_ms: 600,
            reduced_scale_from: 1.05,
            parallax_px: 6.0,
            parallax_follow_ms: 1500,
        }
    }
}

impl BackgroundPolicyConfig {
    #[must_use]
    pub fn fade(&self) -> Duration {
        ms(self.fade_ms)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        ms(self.settle_ms)
    }

    #[must_use]
    pub fn reduced(&self) -> Duration {
        ms(self.reduced_ms)
    }

    #[must_use]
    pub fn parallax_follow(&self) -> Duration {
        ms(self.parallax_follow_ms)
    }
}

/// Pointer proxy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct CursorPolicyConfig {
    pub follow_ms: u64,
    pub rest_opacity: f32,
    pub mount_ms: u64,
    pub enter_fade_ms: u64,
    pub leave_fade_ms: u64,
    pub blur_fade_ms: u64,
    pub advance_scale: f32,
    pub advance_up_ms: u64,
    pub advance_settle_ms: u64,
    pub pulse_scale: f32,
    pub pulse_up_ms: u64,
    pub pulse_settle_ms: u64,
    /// Press pulse of the touch fallback target.
    pub touch_pulse_scale: f32,
    pub touch_pulse_up_ms: u64,
    pub touch_pulse_settle_ms: u64,
}

impl Default for CursorPolicyConfig {
    fn default() -> Self {
        Self {
            follow_ms: 1000,
            rest_opacity: 0.75,
            mount_ms: 350,
            enter_fade_ms: 300,
            leave_fade_ms: 300,
            blur_fade_ms: 200,
            advance_scale: 1.08,
            advance_up_ms: 150,
            advance_settle_ms: 600,
            pulse_scale: 1.05,
            pulse_up_ms: 250,
            pulse_settle_ms: 600,
            touch_pulse_scale: 1.05,
            touch_pulse_up_ms: 150,
            touch_pulse_settle_ms: 500,
        }
    }
}

impl CursorPolicyConfig {
    #[must_use]
    pub fn follow(&self) -> Duration {
        ms(self.follow_ms)
    }

    #[must_use]
    pub fn mount(&self) -> Duration {
        ms(self.mount_ms)
    }

    #[must_use]
    pub fn enter_fade(&self) -> Duration {
        ms(self.enter_fade_ms)
    }

    #[must_use]
    pub fn leave_fade(&self) -> Duration {
        ms(self.leave_fade_ms)
    }

    #[must_use]
    pub fn blur_fade(&self) -> Duration {
        ms(self.blur_fade_ms)
    }

    /// `(scale, up, settle)` of the advance press.
    #[must_use]
    pub fn advance_pulse(&self) -> (f32, Duration, Duration) {
        (
            self.advance_scale,
            ms(self.advance_up_ms),
            ms(self.advance_settle_ms),
        )
    }

    /// `(scale, up, settle)` of the attention pulse.
    #[must_use]
    pub fn attention_pulse(&self) -> (f32, Duration, Duration) {
        (self.pulse_scale, ms(self.pulse_up_ms), ms(self.pulse_settle_ms))
    }

    /// `(scale, up, settle)` of the touch fallback press.
    #[must_use]
    pub fn touch_pulse(&self) -> (f32, Duration, Duration) {
        (
            self.touch_pulse_scale,
            ms(self.touch_pulse_up_ms),
            ms(self.touch_pulse_settle_ms),
        )
    }
}

/// Scroll-linked reveals, drive-bys and the caption fade.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct RevealPolicyConfig {
    /// Viewport fraction above which a node counts as already revealed.
    pub reveal_line: f32,
    pub start: String,
    pub end: String,
    pub lag_ms: u64,
    pub hidden_y: f32,
    pub hidden_blur: f32,
    /// Second geometry refresh after mount, for late-loading images.
    pub late_refresh_ms: u64,
    pub drive_fraction: f32,
    pub drive_max_px: f32,
    pub drive_start: String,
    pub drive_end: String,
    pub drive_lag_ms: u64,
    pub drive_mount_delay_ms: u64,
    pub caption_blur: f32,
}

impl Default for RevealPolicyConfig {
    fn default() -> Self {
        Self {
            reveal_line: 0.7,
            start: "top bottom".into(),
            end: "top 70%".into(),
            lag_ms: 1000,
            hidden_y: 40.0,
            hidden_blur: 10.0,
            late_refresh_ms: 300,
            drive_fraction: 0.5,
            drive_max_px: 800.0,
            drive_start: "top 80%".into(),
            drive_end: "top 20%".into(),
            drive_lag_ms: 1000,
            drive_mount_delay_ms: 100,
            caption_blur: 8.0,
        }
    }
}

impl RevealPolicyConfig {
    /// Reveal band edges. Invalid strings fall back to the defaults.
    #[must_use]
    pub fn band(&self) -> (Edge, Edge) {
        (
            Edge::parse(&self.start).unwrap_or(Edge::new(0.0, 1.0)),
            Edge::parse(&self.end).unwrap_or(Edge::new(0.0, 0.7)),
        )
    }

    /// Drive-by and caption band edges.
    #[must_use]
    pub fn drive_band(&self) -> (Edge, Edge) {
        (
            Edge::parse(&self.drive_start).unwrap_or(Edge::new(0.0, 0.8)),
            Edge::parse(&self.drive_end).unwrap_or(Edge::new(0.0, 0.2)),
        )
    }

    #[must_use]
    pub fn lag(&self) -> Duration {
        ms(self.lag_ms)
    }

    #[must_use]
    pub fn late_refresh(&self) -> Duration {
        ms(self.late_refresh_ms)
    }

    #[must_use]
    pub fn drive_lag(&self) -> Duration {
        ms(self.drive_lag_ms)
    }

    #[must_use]
    pub fn drive_mount_delay(&self) -> Duration {
        ms(self.drive_mount_delay_ms)
    }

    /// Horizontal travel of a drive-by for a viewport width.
    #[must_use]
    pub fn drive_distance(&self, viewport_width: f32) -> f32 {
        (viewport_width * self.drive_fraction).min(self.drive_max_px)
    }
}

/// Draggable card stacks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct CardPolicyConfig {
    /// Drag reach beyond the container, as a fraction of its larger side.
    pub reach_fraction: f32,
    pub edge_resistance: f32,
    /// Degrees of rotation per px of displacement.
    pub rotation_per_px: f32,
    pub settle_ms: u64,
}

impl Default for CardPolicyConfig {
    fn default() -> Self {
        Self {
            reach_fraction: 0.8,
            edge_resistance: 0.5,
            rotation_per_px: 0.05,
            settle_ms: 600,
        }
    }
}

impl CardPolicyConfig {
    #[must_use]
    pub fn settle(&self) -> Duration {
        ms(self.settle_ms)
    }
}

/// Chapter locator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ChapterPolicyConfig {
    pub visibility_threshold: f32,
}

impl Default for ChapterPolicyConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
        }
    }
}

/// Ambient track, mute control and overlays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct AudioPolicyConfig {
    pub ambient_volume: f32,
    pub fade_ms: u64,
    pub fade_steps: u32,
    pub gesture_arm_ms: u64,
    pub gesture_ready_wait_ms: u64,
    pub mute_ready_wait_ms: u64,
    pub overlay_in_ms: u64,
    pub overlay_out_ms: u64,
    pub overlay_rise_px: f32,
    pub overlay_autoplay_ms: u64,
    pub overlay_autoclose_ms: u64,
}

impl Default for AudioPolicyConfig {
    fn default() -> Self {
        Self {
            ambient_volume: 0.7,
            fade_ms: 500,
            fade_steps: 20,
            gesture_arm_ms: 200,
            gesture_ready_wait_ms: 2000,
            mute_ready_wait_ms: 1000,
            overlay_in_ms: 300,
            overlay_out_ms: 200,
            overlay_rise_px: 20.0,
            overlay_autoplay_ms: 100,
            overlay_autoclose_ms: 500,
        }
    }
}

impl AudioPolicyConfig {
    /// Interval between volume steps of the fade-out.
    #[must_use]
    pub fn fade_step(&self) -> Duration {
        ms(self.fade_ms) / self.fade_steps.max(1)
    }

    #[must_use]
    pub fn gesture_arm(&self) -> Duration {
        ms(self.gesture_arm_ms)
    }

    #[must_use]
    pub fn gesture_ready_wait(&self) -> Duration {
        ms(self.gesture_ready_wait_ms)
    }

    #[must_use]
    pub fn mute_ready_wait(&self) -> Duration {
        ms(self.mute_ready_wait_ms)
    }

    #[must_use]
    pub fn overlay_in(&self) -> Duration {
        ms(self.overlay_in_ms)
    }

    #[must_use]
    pub fn overlay_out(&self) -> Duration {
        ms(self.overlay_out_ms)
    }

    #[must_use]
    pub fn overlay_autoplay(&self) -> Duration {
        ms(self.overlay_autoplay_ms)
    }

    #[must_use]
    pub fn overlay_autoclose(&self) -> Duration {
        ms(self.overlay_autoclose_ms)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading or validating a story config.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
