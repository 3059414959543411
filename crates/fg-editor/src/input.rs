//! Input abstraction layer.
//!
//! Normalizes browser pointer events into a unified `InputEvent` enum
//! consumed by the interaction state machine. Keys go straight to
//! `ShortcutMap`.

use fg_core::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event. Pointer positions are in whichever space the
/// receiver expects; the canvas host converts screen positions to canvas
/// space before handing events to a component's state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer moved.
    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer released.
    PointerUp { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer stream aborted (window blur, `pointercancel`, lost capture).
    Cancel,
}

impl InputEvent {
    pub fn pointer_down(at: Point, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x: at.x,
            y: at.y,
            modifiers,
        }
    }

    pub fn pointer_move(at: Point, modifiers: Modifiers) -> Self {
        Self::PointerMove {
            x: at.x,
            y: at.y,
            modifiers,
        }
    }

    pub fn pointer_up(at: Point, modifiers: Modifiers) -> Self {
        Self::PointerUp {
            x: at.x,
            y: at.y,
            modifiers,
        }
    }
}
