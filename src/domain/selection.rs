//! Drag states of the crop box

/// Which part of the crop box the current gesture drives
///
/// Corners sit on even indices and edge midpoints on odd ones, walking
/// clockwise from the top-left corner.
#[repr(i8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    #[default]
    Idle = -1,
    /// North-West corner
    NW = 0,
    /// North edge
    N = 1,
    /// North-East corner
    NE = 2,
    /// East edge
    E = 3,
    /// South-East corner
    SE = 4,
    /// South edge
    S = 5,
    /// South-West corner
    SW = 6,
    /// West edge
    W = 7,
    /// Whole-box move
    Move = 8,
    /// Programmatic re-derivation from a suggestion, never entered by the pointer
    Reapply = 9,
}

impl Handle {
    /// The eight pointer-grabbable handles in index order
    pub const GRIPS: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::NW | Handle::NE | Handle::SE | Handle::SW)
    }

    pub fn is_edge(self) -> bool {
        matches!(self, Handle::N | Handle::E | Handle::S | Handle::W)
    }
}

impl From<i8> for Handle {
    fn from(index: i8) -> Self {
        match index {
            0 => Handle::NW,
            1 => Handle::N,
            2 => Handle::NE,
            3 => Handle::E,
            4 => Handle::SE,
            5 => Handle::S,
            6 => Handle::SW,
            7 => Handle::W,
            8 => Handle::Move,
            9 => Handle::Reapply,
            _ => Handle::Idle,
        }
    }
}

impl From<Handle> for i8 {
    fn from(handle: Handle) -> Self {
        handle as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for i in -1..=9i8 {
            assert_eq!(i8::from(Handle::from(i)), i);
        }
        assert_eq!(Handle::from(42), Handle::Idle);
    }

    #[test]
    fn test_corners_are_even() {
        for h in Handle::GRIPS {
            assert_eq!(h.is_corner(), i8::from(h) % 2 == 0);
            assert_eq!(h.is_edge(), !h.is_corner());
        }
        assert!(!Handle::Move.is_corner());
        assert!(!Handle::Reapply.is_edge());
    }
}
