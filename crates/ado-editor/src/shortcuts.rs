//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so it's shared across WASM and native.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Delete,
    Duplicate,
    /// Move the selected layer by `(dx, dy)`.
    Nudge { dx: f64, dy: f64 },
    Deselect,
}

/// Where keyboard focus is when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// The page or the stage.
    #[default]
    Canvas,
    /// An `<input>`, `<textarea>` or content-editable element.
    TextInput,
}

impl FocusTarget {
    /// Classify a focused element by tag name and editability.
    pub fn from_element(tag: &str, content_editable: bool) -> Self {
        if content_editable
            || tag.eq_ignore_ascii_case("input")
            || tag.eq_ignore_ascii_case("textarea")
        {
            FocusTarget::TextInput
        } else {
            FocusTarget::Canvas
        }
    }
}

/// A `keydown` as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent<'a> {
    /// `KeyboardEvent.key`.
    pub key: &'a str,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub focus: FocusTarget,
}

impl<'a> KeyEvent<'a> {
    pub fn new(key: &'a str) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }
}

/// Nudge distances for arrow keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NudgeSteps {
    pub step: f64,
    /// With Shift held.
    pub large: f64,
}

impl Default for NudgeSteps {
    fn default() -> Self {
        Self {
            step: 1.0,
            large: 10.0,
        }
    }
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
        nudge: NudgeSteps,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd {
            let combo = match key {
                "z" | "Z" if shift => Some(ShortcutAction::Redo),
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                _ => None,
            };
            if combo.is_some() {
                return combo;
            }
        }

        // ── Plain keys: modifiers are ignored, Shift only widens the nudge ──
        let step = if shift { nudge.large } else { nudge.step };
        match key {
            "ArrowLeft" => Some(ShortcutAction::Nudge { dx: -step, dy: 0.0 }),
            "ArrowRight" => Some(ShortcutAction::Nudge { dx: step, dy: 0.0 }),
            "ArrowUp" => Some(ShortcutAction::Nudge { dx: 0.0, dy: -step }),
            "ArrowDown" => Some(ShortcutAction::Nudge { dx: 0.0, dy: step }),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }

    /// Like [`ShortcutMap::resolve`], but nothing resolves while a text
    /// field has focus.
    pub fn resolve_in(
        focus: FocusTarget,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        nudge: NudgeSteps,
    ) -> Option<ShortcutAction> {
        match focus {
            FocusTarget::TextInput => None,
            FocusTarget::Canvas => Self::resolve(key, ctrl, shift, alt, meta, nudge),
        }
    }

    pub fn resolve_event(event: &KeyEvent<'_>, nudge: NudgeSteps) -> Option<ShortcutAction> {
        Self::resolve_in(
            event.focus,
            event.key,
            event.ctrl,
            event.shift,
            event.alt,
            event.meta,
            nudge,
        )
    }

    /// True for actions that need a selected layer.
    pub fn needs_selection(action: ShortcutAction) -> bool {
        matches!(
            action,
            ShortcutAction::Delete | ShortcutAction::Duplicate | ShortcutAction::Nudge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(key: &str, ctrl: bool, shift: bool, meta: bool) -> Option<ShortcutAction> {
        ShortcutMap::resolve(key, ctrl, shift, false, meta, NudgeSteps::default())
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(resolve("z", false, false, true), Some(ShortcutAction::Undo));
        // Ctrl+Z → Undo
        assert_eq!(resolve("z", true, false, false), Some(ShortcutAction::Undo));
        // Cmd+Shift+Z → Redo (key arrives upper-cased)
        assert_eq!(resolve("Z", false, true, true), Some(ShortcutAction::Redo));
        // Ctrl+Y → Redo
        assert_eq!(resolve("y", true, false, false), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_delete_and_duplicate() {
        assert_eq!(resolve("Delete", false, false, false), Some(ShortcutAction::Delete));
        assert_eq!(resolve("Backspace", false, false, false), Some(ShortcutAction::Delete));
        assert_eq!(resolve("d", true, false, false), Some(ShortcutAction::Duplicate));
        assert_eq!(resolve("d", false, false, true), Some(ShortcutAction::Duplicate));
        // Bare "d" is just typing.
        assert_eq!(resolve("d", false, false, false), None);
    }

    #[test]
    fn resolve_nudges() {
        assert_eq!(
            resolve("ArrowLeft", false, false, false),
            Some(ShortcutAction::Nudge { dx: -1.0, dy: 0.0 })
        );
        assert_eq!(
            resolve("ArrowDown", false, true, false),
            Some(ShortcutAction::Nudge { dx: 0.0, dy: 10.0 })
        );
        let custom = NudgeSteps {
            step: 2.0,
            large: 25.0,
        };
        assert_eq!(
            ShortcutMap::resolve("ArrowUp", false, true, false, false, custom),
            Some(ShortcutAction::Nudge { dx: 0.0, dy: -25.0 })
        );
    }

    #[test]
    fn resolve_escape_deselects() {
        assert_eq!(resolve("Escape", false, false, false), Some(ShortcutAction::Deselect));
    }

    #[test]
    fn text_input_focus_swallows_everything() {
        for key in ["Delete", "Backspace", "ArrowLeft", "z"] {
            assert_eq!(
                ShortcutMap::resolve_in(
                    FocusTarget::TextInput,
                    key,
                    true,
                    false,
                    false,
                    false,
                    NudgeSteps::default()
                ),
                None
            );
        }
        assert_eq!(FocusTarget::from_element("TEXTAREA", false), FocusTarget::TextInput);
        assert_eq!(FocusTarget::from_element("div", true), FocusTarget::TextInput);
        assert_eq!(FocusTarget::from_element("canvas", false), FocusTarget::Canvas);
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        assert_eq!(resolve("q", false, false, false), None);
        assert_eq!(resolve("q", true, false, false), None);
        assert_eq!(resolve("q", false, true, false), None);
    }

    #[test]
    fn delete_and_nudge_ignore_modifiers() {
        assert_eq!(resolve("Delete", false, true, false), Some(ShortcutAction::Delete));
        assert_eq!(resolve("Backspace", true, false, false), Some(ShortcutAction::Delete));
        assert_eq!(
            resolve("ArrowLeft", true, false, false),
            Some(ShortcutAction::Nudge { dx: -1.0, dy: 0.0 })
        );
    }
}
