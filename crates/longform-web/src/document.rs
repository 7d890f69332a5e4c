#![forbid(unsafe_code)]

//! Simulated document: scroll position, scroll lock, live region and the
//! layout boxes of mounted nodes.

use ahash::AHashMap;
use longform_core::geometry::{Rect, Viewport};
use longform_core::pose::NodeId;
use longform_runtime::HostDocument;

/// A programmatic scroll request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f32,
    pub smooth: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WebDocument {
    viewport: Viewport,
    scroll_y: f32,
    height: f32,
    scroll_locked: bool,
    live_region: Vec<String>,
    scroll_requests: Vec<ScrollRequest>,
    rects: AHashMap<NodeId, Rect>,
    scrolled: bool,
}

impl WebDocument {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            height: viewport.height,
            ..Self::default()
        }
    }

    /// Mount `node` with its document-space box. The document grows to
    /// contain it.
    pub fn place(&mut self, node: NodeId, rect: Rect) {
        self.height = self.height.max(rect.bottom());
        self.rects.insert(node, rect);
    }

    #[must_use]
    pub fn with_node(mut self, node: NodeId, rect: Rect) -> Self {
        self.place(node, rect);
        self
    }

    pub fn unmount(&mut self, node: NodeId) {
        self.rects.remove(&node);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scroll_y = self.scroll_y.min(self.max_scroll());
    }

    fn max_scroll(&self) -> f32 {
        (self.height - self.viewport.height).max(0.0)
    }

    /// User scroll. Ignored while locked; returns whether it moved.
    pub fn user_scroll(&mut self, top: f32) -> bool {
        if self.scroll_locked {
            return false;
        }
        self.move_to(top)
    }

    fn move_to(&mut self, top: f32) -> bool {
        let top = top.clamp(0.0, self.max_scroll());
        if top == self.scroll_y {
            return false;
        }
        self.scroll_y = top;
        self.scrolled = true;
        true
    }

    /// Whether the position moved since the last call. Programmatic
    /// scrolls dispatch a scroll event like user ones.
    pub fn take_scrolled(&mut self) -> bool {
        std::mem::take(&mut self.scrolled)
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Everything announced, oldest first.
    #[must_use]
    pub fn live_region_log(&self) -> &[String] {
        &self.live_region
    }

    /// Current live-region text.
    #[must_use]
    pub fn live_region(&self) -> Option<&str> {
        self.live_region.last().map(String::as_str)
    }

    #[must_use]
    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }
}

impl HostDocument for WebDocument {
    fn announce(&mut self, text: &str) {
        self.live_region.push(text.to_owned());
    }

    fn scroll_to(&mut self, top: f32, smooth: bool) {
        self.scroll_requests.push(ScrollRequest { top, smooth });
        self.move_to(top);
    }

    fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        if self.scroll_locked != locked {
            tracing::debug!(locked, "document scroll lock");
        }
        self.scroll_locked = locked;
    }

    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }
}
