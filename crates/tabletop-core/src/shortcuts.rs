//! Keyboard shortcut registry and documentation.

/// What a key press asks the table to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CloneSelected,
    DeleteSelected,
    FlipSelected,
    ShuffleSelected,
    ClaimPlayerArea,
    /// Show or hide the front-end's add-item prompt.
    ToggleAddItemPrompt,
    /// Show the help text.
    ShowHelp,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub action: Action,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, action: Action, description: &'static str) -> Self {
        Self {
            key,
            action,
            description,
        }
    }
}

/// Pointer gestures listed in the help text.
const GESTURES: &[(&str, &str)] = &[
    ("Drag", "Move selection or pan the table"),
    ("Shift+Click", "Add or remove an item from the selection"),
    ("Wheel", "Zoom around the pointer"),
    ("Shift+Wheel", "Scale selected items"),
    ("Double-click", "Lock or unlock an item"),
];

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("h", Action::ShowHelp, "Show help"),
            Shortcut::new("c", Action::CloneSelected, "Clone selected items"),
            Shortcut::new("Delete", Action::DeleteSelected, "Delete selected items"),
            Shortcut::new("Backspace", Action::DeleteSelected, "Delete selected items"),
            Shortcut::new("f", Action::FlipSelected, "Flip selected items"),
            Shortcut::new("s", Action::ShuffleSelected, "Shuffle selected items into a pile"),
            Shortcut::new("m", Action::ClaimPlayerArea, "Claim selected item as your area"),
            Shortcut::new("a", Action::ToggleAddItemPrompt, "Add a new item"),
        ]
    }

    /// Action bound to `key`, if any.
    pub fn lookup(key: &str) -> Option<Action> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.key == key)
            .map(|shortcut| shortcut.action)
    }

    /// Help text listing every shortcut and gesture.
    pub fn help_text() -> String {
        let mut text = String::from("=== Keyboard Shortcuts ===\n");
        for shortcut in Self::all() {
            text.push_str(&format!("  {:20} {}\n", shortcut.key, shortcut.description));
        }
        text.push_str("=== Mouse ===\n");
        for (gesture, description) in GESTURES {
            text.push_str(&format!("  {:20} {}\n", gesture, description));
        }
        text
    }
}
