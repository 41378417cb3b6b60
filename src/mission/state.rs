//! Navigation state

use crate::core::types::Heading;

/// Current heading and route index.
///
/// Owned by the mission sequencer and passed by value: each completed move
/// consumes the previous state and yields the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub heading: Heading,
    pub index: usize,
}

impl NavigationState {
    /// Mission start: facing East at the first waypoint
    pub fn start() -> Self {
        Self {
            heading: Heading::East,
            index: 0,
        }
    }

    /// State after moving to the next waypoint facing `heading`
    pub fn advance(self, heading: Heading) -> Self {
        Self {
            heading,
            index: self.index + 1,
        }
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let state = NavigationState::start().advance(Heading::North).advance(Heading::West);
        assert_eq!(state.index, 2);
        assert_eq!(state.heading, Heading::West);
    }
}
