//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so it's shared across WASM and native.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Delete,
    Duplicate,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetZoom,
    /// Held Space: pointer-down on the canvas pans instead of selecting.
    PanStart,

    // ── Selection ──
    /// Leave edit mode, or clear the selection when not editing.
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"d"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" | "_" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetZoom),
                _ => None,
            };
        }

        match key {
            "Escape" => Some(ShortcutAction::Deselect),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }

    /// Whether releasing `key` ends panning.
    pub fn ends_pan(key: &str) -> bool {
        key == " "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> Modifiers {
        Modifiers {
            meta: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn command_combos() {
        assert_eq!(ShortcutMap::resolve("d", cmd()), Some(ShortcutAction::Duplicate));
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert_eq!(ShortcutMap::resolve("=", ctrl), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", cmd()), Some(ShortcutAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", cmd()), Some(ShortcutAction::ResetZoom));
        assert_eq!(ShortcutMap::resolve("Escape", cmd()), None);
    }

    #[test]
    fn single_keys() {
        assert_eq!(ShortcutMap::resolve("Escape", Modifiers::NONE), Some(ShortcutAction::Deselect));
        assert_eq!(ShortcutMap::resolve("Backspace", Modifiers::NONE), Some(ShortcutAction::Delete));
        assert_eq!(ShortcutMap::resolve(" ", Modifiers::NONE), Some(ShortcutAction::PanStart));
        assert_eq!(ShortcutMap::resolve("Space", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("d", Modifiers::NONE), None);
    }

    #[test]
    fn space_release_ends_pan() {
        assert!(ShortcutMap::ends_pan(" "));
        assert!(!ShortcutMap::ends_pan("Space"));
        assert!(!ShortcutMap::ends_pan("Escape"));
    }
}
