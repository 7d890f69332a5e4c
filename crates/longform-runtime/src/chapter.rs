#![forbid(unsafe_code)]

//! Chapter locator and navigation.
//!
//! Scroll events only mark a frame as pending; the evaluation itself runs
//! once per animation frame in [`ChapterLocator::on_frame`]. The published
//! index moves only when the most visible section clears the visibility
//! threshold, so two half-hidden sections never make it flicker.

use longform_core::geometry::Rect;
use longform_core::pose::NodeId;

use crate::config::ChapterPolicyConfig;
use crate::host::{HostDocument, viewport_rect};
use crate::reactive::Observable;

/// One chapter section of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub node: NodeId,
    pub title: String,
    pub short_title: Option<String>,
}

impl Chapter {
    #[must_use]
    pub fn new(node: NodeId, title: impl Into<String>) -> Self {
        Self {
            node,
            title: title.into(),
            short_title: None,
        }
    }

    #[must_use]
    pub fn short(mut self, short_title: impl Into<String>) -> Self {
        self.short_title = Some(short_title.into());
        self
    }

    /// Label for the chapter rail: the short title when there is one.
    #[must_use]
    pub fn rail_label(&self) -> &str {
        self.short_title.as_deref().unwrap_or(&self.title)
    }
}

/// Fraction of a section that is on screen, relative to the most of it that
/// could be on screen at once.
///
/// `rect` is viewport-relative.
#[must_use]
pub fn visible_fraction(rect: Rect, viewport_height: f32) -> f32 {
    let capacity = rect.height.min(viewport_height);
    if capacity <= 0.0 {
        return 0.0;
    }
    let visible = rect.bottom().min(viewport_height) - rect.top().max(0.0);
    visible.clamp(0.0, capacity) / capacity
}

#[derive(Debug)]
pub struct ChapterLocator {
    chapters: Vec<Chapter>,
    index: Observable<usize>,
    frame_pending: bool,
    enabled: bool,
    config: ChapterPolicyConfig,
}

impl ChapterLocator {
    #[must_use]
    pub fn new(chapters: Vec<Chapter>, config: ChapterPolicyConfig) -> Self {
        Self {
            chapters,
            index: Observable::new("chapter_index", 0),
            frame_pending: false,
            enabled: false,
            config,
        }
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index.get()
    }

    /// Shared handle for rail and sheet subscribers.
    #[must_use]
    pub fn observable(&self) -> Observable<usize> {
        self.index.clone()
    }

    /// Tracking starts once the intro is complete.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.frame_pending = false;
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scroll happened; evaluate on the next frame.
    pub fn on_scroll(&mut self) {
        if self.enabled {
            self.frame_pending = true;
        }
    }

    #[must_use]
    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Run the coalesced evaluation. Returns whether the index changed.
    pub fn on_frame(&mut self, doc: &dyn HostDocument) -> bool {
        if !std::mem::take(&mut self.frame_pending) {
            return false;
        }
        let viewport_height = doc.viewport().height;
        let mut best: Option<(usize, f32)> = None;
        for (i, chapter) in self.chapters.iter().enumerate() {
            let Some(rect) = viewport_rect(doc, chapter.node) else {
                continue;
            };
            let fraction = visible_fraction(rect, viewport_height);
            if best.is_none_or(|(_, max)| fraction > max) {
                best = Some((i, fraction));
            }
        }
        let Some((index, fraction)) = best else {
            return false;
        };
        if fraction <= self.config.visibility_threshold {
            return false;
        }
        let changed = self.index.set(index);
        if changed {
            tracing::debug!(index, fraction, "chapter changed");
        }
        changed
    }

    /// Rail or sheet selection: publish at once and scroll to the section.
    pub fn navigate(&mut self, index: usize, doc: &mut dyn HostDocument) -> bool {
        let Some(chapter) = self.chapters.get(index) else {
            return false;
        };
        let Some(rect) = doc.node_rect(chapter.node) else {
            tracing::debug!(index, "chapter section not mounted");
            return false;
        };
        self.index.set(index);
        doc.scroll_to(rect.top(), true);
        true
    }
}
