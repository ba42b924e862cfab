//! Per-frame input snapshot
//!
//! The host fills a [`FrameInput`] once per tick; [`PointerTracker`] turns the
//! level-triggered button state into press and release edges.

use crate::domain::Point;

/// Keyboard events the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

/// Raw input gathered by the host for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub pointer: Point,
    pub down: bool,
    pub keys: Vec<KeyEvent>,
}

/// Pointer state for one frame with button edges resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerFrame {
    pub pos: Point,
    /// Primary button held
    pub down: bool,
    /// Button went down this frame
    pub pressed: bool,
    /// Button went up this frame
    pub released: bool,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    was_down: bool,
}

impl PointerTracker {
    pub fn frame(&mut self, pos: Point, down: bool) -> PointerFrame {
        let frame = PointerFrame {
            pos,
            down,
            pressed: down && !self.was_down,
            released: !down && self.was_down,
        };
        self.was_down = down;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_an_edge() {
        let mut tracker = PointerTracker::default();
        let p = Point::new(1, 1);
        let first = tracker.frame(p, true);
        assert!(first.pressed && !first.released);
        let held = tracker.frame(p, true);
        assert!(held.down && !held.pressed);
        let up = tracker.frame(p, false);
        assert!(up.released && !up.pressed);
        assert!(!tracker.frame(p, false).released);
    }
}
