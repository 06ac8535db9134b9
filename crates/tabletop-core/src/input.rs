//! Normalized pointer and keyboard events.
//!
//! Front-ends translate their native events into these before handing them
//! to the session. Positions are canvas pixels.

use kurbo::Point;
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Modifier that extends the selection on click and scales items on wheel.
    pub fn group(&self) -> bool {
        self.shift
    }
}

/// Pointer event on the table surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// The pointer left the surface.
    Leave,
    Wheel {
        position: Point,
        delta_y: f64,
        modifiers: Modifiers,
    },
    /// Native double click, for front-ends that report one.
    DoubleClick {
        position: Point,
    },
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name as reported by the platform, e.g. `"c"` or `"Delete"`.
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
        }
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Detects double clicks from primary-button presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    /// Last click time for double-click detection.
    last_click_time: Option<Instant>,
    /// Last click position for double-click detection.
    last_click_position: Option<Point>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a primary press; returns true when it completes a double click.
    pub fn register_press(&mut self, position: Point) -> bool {
        let now = Instant::now();
        if let (Some(last_time), Some(last_pos)) =
            (self.last_click_time, self.last_click_position)
        {
            let elapsed = now.duration_since(last_time).as_millis();
            let close = position.distance(last_pos) < DOUBLE_CLICK_DISTANCE;
            if elapsed < DOUBLE_CLICK_TIME_MS && close {
                // Reset to prevent triple-click being detected as another double-click
                self.last_click_time = None;
                self.last_click_position = None;
                return true;
            }
        }
        self.last_click_time = Some(now);
        self.last_click_position = Some(position);
        false
    }

    /// Forget the last press.
    pub fn reset(&mut self) {
        self.last_click_time = None;
        self.last_click_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_detection() {
        let mut clicks = ClickTracker::new();
        let pos = Point::new(100.0, 100.0);
        assert!(!clicks.register_press(pos));
        assert!(clicks.register_press(pos));
        // A third press starts over.
        assert!(!clicks.register_press(pos));
    }

    #[test]
    fn test_double_click_too_far() {
        let mut clicks = ClickTracker::new();
        assert!(!clicks.register_press(Point::new(100.0, 100.0)));
        assert!(!clicks.register_press(Point::new(200.0, 200.0)));
    }

    #[test]
    fn test_reset_forgets_press() {
        let mut clicks = ClickTracker::new();
        clicks.register_press(Point::ZERO);
        clicks.reset();
        assert!(!clicks.register_press(Point::ZERO));
    }

    #[test]
    fn test_group_modifier_is_shift() {
        assert!(Modifiers::SHIFT.group());
        assert!(!Modifiers::default().group());
    }
}
