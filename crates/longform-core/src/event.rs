#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! The host translates DOM events into these values. All events derive
//! `Clone` and `PartialEq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Pointer coordinates are viewport-relative CSS pixels.
//! - `KeyEventKind` defaults to `Press`; browsers report held keys as `Repeat`.
//! - `Modifiers` use bitflags for easy combination.
//! - Hit testing happens on the host; events only carry the resolved
//!   [`HitTarget`] so the runtime can ignore clicks on buttons and links.

use bitflags::bitflags;

use crate::geometry::{Point, Viewport};
use crate::pose::NodeId;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A pointer lifecycle event (mouse, touch, or pen).
    Pointer(PointerEvent),

    /// A completed click or tap.
    Click(ClickEvent),

    /// Mouse wheel or trackpad scroll intent.
    Wheel {
        /// Vertical delta in CSS pixels.
        delta_y: f32,
    },

    /// A touch-driven scroll gesture.
    TouchMove,

    /// The document scroll position changed.
    Scroll {
        /// New `scrollY` in CSS pixels.
        y: f32,
    },

    /// The viewport was resized.
    Resize(Viewport),

    /// Window focus gained or lost.
    ///
    /// `true` = focus gained, `false` = focus lost.
    Focus(bool),

    /// The `prefers-reduced-motion` media query flipped.
    ReducedMotionChanged(bool),
}

impl Event {
    /// Whether this event counts as a user gesture for media autoplay.
    ///
    /// Browsers unlock playback on click, keydown, touchstart and mousedown.
    #[must_use]
    pub fn is_user_gesture(&self) -> bool {
        match self {
            Self::Click(_) => true,
            Self::Key(key) => key.kind == KeyEventKind::Press,
            Self::Pointer(p) => p.kind == PointerEventKind::Down,
            _ => false,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Space or Enter: the two "activate" keys.
    #[must_use]
    pub fn is_activate(&self) -> bool {
        matches!(self.code, KeyCode::Enter | KeyCode::Char(' '))
    }

    /// Keys that scroll the document by default.
    #[must_use]
    pub fn is_scroll_key(&self) -> bool {
        matches!(
            self.code,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
        )
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key (`' '` is Space).
    Char(char),
    Enter,
    Escape,
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default).
    #[default]
    Press,
    /// Key is being held (auto-repeat).
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

/// Input device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerType {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// What the pointer landed on, as resolved by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitTarget {
    /// Plain page surface.
    #[default]
    Surface,
    /// A button, link, or other interactive control.
    Interactive,
    /// A node the runtime registered (e.g. a draggable card).
    Node(NodeId),
}

impl HitTarget {
    /// Buttons and links handle their own activation.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Pointer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Up,
    Move,
    /// Pointer entered the document.
    Enter,
    /// Pointer left the document.
    Leave,
    /// Platform cancelled the pointer (e.g. touch turned into a scroll).
    Cancel,
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub pointer_id: u32,
    pub pointer_type: PointerType,
    pub position: Point,
    pub target: HitTarget,
}

impl PointerEvent {
    /// Create a primary mouse pointer event on the page surface.
    #[must_use]
    pub const fn mouse(kind: PointerEventKind, position: Point) -> Self {
        Self {
            kind,
            pointer_id: 1,
            pointer_type: PointerType::Mouse,
            position,
            target: HitTarget::Surface,
        }
    }

    /// Set the hit target.
    #[must_use]
    pub const fn on(mut self, target: HitTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the pointer type.
    #[must_use]
    pub const fn with_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }
}

/// A completed click or tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub position: Point,
    pub target: HitTarget,
    pub pointer_type: PointerType,
}

impl ClickEvent {
    /// A mouse click on the page surface.
    #[must_use]
    pub const fn surface(position: Point) -> Self {
        Self {
            position,
            target: HitTarget::Surface,
            pointer_type: PointerType::Mouse,
        }
    }

    /// A click that landed on a button or link.
    #[must_use]
    pub const fn interactive(position: Point) -> Self {
        Self {
            position,
            target: HitTarget::Interactive,
            pointer_type: PointerType::Mouse,
        }
    }
}
