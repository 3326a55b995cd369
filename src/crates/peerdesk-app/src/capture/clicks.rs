//! Double-click classification for captured mouse buttons.
//!
//! The controller, not the receiver, decides what is a double click: a
//! second press of the same button within 500 ms and 5 px of the first is
//! reclassified as a single `double` event, and the release that follows it
//! is suppressed – the executor on the far side synthesizes the full
//! down-up-down-up sequence itself, so forwarding the real release would
//! inject a fifth transition.
//!
//! State is per button and belongs to one capture session; it must never
//! leak across sessions (a press at the end of one session must not turn
//! the first press of the next into a double).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use peerdesk_core::MouseButton;

/// Window within which a second press counts as a double click.  Matches
/// the Windows default double-click time.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Maximum cursor travel between the two presses, in pixels per axis.
pub const DOUBLE_CLICK_RADIUS: i32 = 5;

/// How a press should be reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy)]
struct LastPress {
    at: Instant,
    x: i32,
    y: i32,
}

/// Per-button double-click state machine.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last_press: HashMap<MouseButton, LastPress>,
    in_double_sequence: HashMap<MouseButton, bool>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a button press observed at `(x, y)` at time `now`.
    ///
    /// A `Double` result arms the suppression flag for the button's next
    /// release.
    pub fn classify_press(
        &mut self,
        button: MouseButton,
        x: i32,
        y: i32,
        now: Instant,
    ) -> PressKind {
        let is_double = self.last_press.get(&button).is_some_and(|prev| {
            now.duration_since(prev.at) < DOUBLE_CLICK_WINDOW
                && (x - prev.x).abs() < DOUBLE_CLICK_RADIUS
                && (y - prev.y).abs() < DOUBLE_CLICK_RADIUS
        });

        self.last_press.insert(button, LastPress { at: now, x, y });
        if is_double {
            self.in_double_sequence.insert(button, true);
            PressKind::Double
        } else {
            PressKind::Single
        }
    }

    /// Decides whether a button release should be emitted.
    ///
    /// Returns `false` exactly once after a `Double` classification: the
    /// down-stroke that completed the double click must not produce a lone
    /// release on the wire.
    pub fn should_emit_release(&mut self, button: MouseButton) -> bool {
        match self.in_double_sequence.get_mut(&button) {
            Some(armed) if *armed => {
                *armed = false;
                false
            }
            _ => true,
        }
    }

    /// Clears all state.  Called at session boundaries.
    pub fn reset(&mut self) {
        self.last_press.clear();
        self.in_double_sequence.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_press_is_single() {
        let mut tracker = ClickTracker::new();
        let kind = tracker.classify_press(MouseButton::Left, 10, 10, Instant::now());
        assert_eq!(kind, PressKind::Single);
    }

    #[test]
    fn test_quick_nearby_second_press_is_double() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        let kind = tracker.classify_press(
            MouseButton::Left,
            12,
            9,
            t0 + Duration::from_millis(200),
        );
        assert_eq!(kind, PressKind::Double);
    }

    #[test]
    fn test_slow_second_press_is_single() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        let kind = tracker.classify_press(
            MouseButton::Left,
            10,
            10,
            t0 + Duration::from_millis(600),
        );
        assert_eq!(kind, PressKind::Single);
    }

    #[test]
    fn test_distant_second_press_is_single() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        let kind = tracker.classify_press(
            MouseButton::Left,
            40,
            10,
            t0 + Duration::from_millis(100),
        );
        assert_eq!(kind, PressKind::Single);
    }

    #[test]
    fn test_release_after_double_is_suppressed_once() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        tracker.classify_press(MouseButton::Left, 10, 10, t0 + Duration::from_millis(100));

        assert!(!tracker.should_emit_release(MouseButton::Left));
        // The next release (of a later, single click) flows normally.
        assert!(tracker.should_emit_release(MouseButton::Left));
    }

    #[test]
    fn test_release_after_single_press_is_emitted() {
        let mut tracker = ClickTracker::new();
        tracker.classify_press(MouseButton::Right, 0, 0, Instant::now());
        assert!(tracker.should_emit_release(MouseButton::Right));
    }

    #[test]
    fn test_buttons_are_tracked_independently() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        // Right press between the two left presses does not interfere.
        let right = tracker.classify_press(
            MouseButton::Right,
            10,
            10,
            t0 + Duration::from_millis(50),
        );
        assert_eq!(right, PressKind::Single);
        let left = tracker.classify_press(
            MouseButton::Left,
            10,
            10,
            t0 + Duration::from_millis(100),
        );
        assert_eq!(left, PressKind::Double);
        // Only the left release is suppressed.
        assert!(tracker.should_emit_release(MouseButton::Right));
        assert!(!tracker.should_emit_release(MouseButton::Left));
    }

    #[test]
    fn test_triple_click_reads_as_double_then_single() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        assert_eq!(
            tracker.classify_press(MouseButton::Left, 5, 5, t0),
            PressKind::Single
        );
        assert_eq!(
            tracker.classify_press(MouseButton::Left, 5, 5, t0 + Duration::from_millis(150)),
            PressKind::Double
        );
        // The third press starts a new pair relative to the second.
        assert_eq!(
            tracker.classify_press(MouseButton::Left, 5, 5, t0 + Duration::from_millis(300)),
            PressKind::Double
        );
    }

    #[test]
    fn test_reset_clears_pending_double_state() {
        let mut tracker = ClickTracker::new();
        let t0 = Instant::now();
        tracker.classify_press(MouseButton::Left, 10, 10, t0);
        tracker.reset();

        // Without reset this would classify as a double.
        let kind = tracker.classify_press(
            MouseButton::Left,
            10,
            10,
            t0 + Duration::from_millis(200),
        );
        assert_eq!(kind, PressKind::Single);
        assert!(tracker.should_emit_release(MouseButton::Left));
    }
}
