//! Draft moves and their fixed action-space indexing.

use crate::game::position::NUM_FACTORIES;
use crate::game::tile::{Color, NUM_COLORS, WALL_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of tile sources: every factory plus the center pool.
pub const NUM_SOURCES: usize = NUM_FACTORIES + 1;
/// Number of destinations: every pattern line plus the floor.
pub const NUM_DESTINATIONS: usize = WALL_SIZE + 1;
/// Size of the policy head: one slot per (source, color, destination).
pub const ACTION_SPACE: usize = NUM_SOURCES * NUM_COLORS * NUM_DESTINATIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    Factory(usize),
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Destination {
    PatternLine(usize),
    Floor,
}

/// A drafting move. `pattern_line_dest == None` sends every tile to the floor.
///
/// The derived ordering (factories before the center, then factory id, color,
/// destination) is the lexicographic order used for deterministic tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Move {
    TakeFromFactory {
        factory_id: usize,
        color: Color,
        pattern_line_dest: Option<usize>,
        count_to_line: u8,
        count_to_floor: u8,
    },
    TakeFromCenter {
        color: Color,
        pattern_line_dest: Option<usize>,
        count_to_line: u8,
        count_to_floor: u8,
    },
}

impl Move {
    pub fn new(
        source: Source,
        color: Color,
        destination: Destination,
        count_to_line: u8,
        count_to_floor: u8,
    ) -> Self {
        let pattern_line_dest = match destination {
            Destination::PatternLine(line) => Some(line),
            Destination::Floor => None,
        };
        match source {
            Source::Factory(factory_id) => Move::TakeFromFactory {
                factory_id,
                color,
                pattern_line_dest,
                count_to_line,
                count_to_floor,
            },
            Source::Center => Move::TakeFromCenter {
                color,
                pattern_line_dest,
                count_to_line,
                count_to_floor,
            },
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Move::TakeFromFactory { factory_id, .. } => Source::Factory(*factory_id),
            Move::TakeFromCenter { .. } => Source::Center,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Move::TakeFromFactory { color, .. } | Move::TakeFromCenter { color, .. } => *color,
        }
    }

    pub fn pattern_line_dest(&self) -> Option<usize> {
        match self {
            Move::TakeFromFactory {
                pattern_line_dest, ..
            }
            | Move::TakeFromCenter {
                pattern_line_dest, ..
            } => *pattern_line_dest,
        }
    }

    pub fn destination(&self) -> Destination {
        match self.pattern_line_dest() {
            Some(line) => Destination::PatternLine(line),
            None => Destination::Floor,
        }
    }

    pub fn count_to_line(&self) -> u8 {
        match self {
            Move::TakeFromFactory { count_to_line, .. }
            | Move::TakeFromCenter { count_to_line, .. } => *count_to_line,
        }
    }

    /// Tiles (not counting the first-player marker) that land on the floor.
    pub fn count_to_floor(&self) -> u8 {
        match self {
            Move::TakeFromFactory { count_to_floor, .. }
            | Move::TakeFromCenter { count_to_floor, .. } => *count_to_floor,
        }
    }

    pub fn tiles_taken(&self) -> u8 {
        self.count_to_line() + self.count_to_floor()
    }

    /// Index of this move in the `ACTION_SPACE`-sized policy vector.
    pub fn action_index(&self) -> usize {
        let source = match self.source() {
            Source::Factory(id) => id,
            Source::Center => NUM_FACTORIES,
        };
        let destination = match self.destination() {
            Destination::PatternLine(line) => line,
            Destination::Floor => WALL_SIZE,
        };
        (source * NUM_COLORS + self.color().index()) * NUM_DESTINATIONS + destination
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source() {
            Source::Factory(id) => format!("F{}", id + 1),
            Source::Center => "C".to_string(),
        };
        let destination = match self.destination() {
            Destination::PatternLine(line) => format!("L{}", line + 1),
            Destination::Floor => "floor".to_string(),
        };
        write!(
            f,
            "{}:{}->{} [{}|{}]",
            source,
            self.color().letter(),
            destination,
            self.count_to_line(),
            self.count_to_floor()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_action_indices_are_unique_and_bounded() {
        let mut seen = HashSet::new();
        for source in (0..NUM_FACTORIES)
            .map(Source::Factory)
            .chain(std::iter::once(Source::Center))
        {
            for color in crate::game::tile::ALL_COLORS {
                for dest in (0..WALL_SIZE)
                    .map(Destination::PatternLine)
                    .chain(std::iter::once(Destination::Floor))
                {
                    let idx = Move::new(source, color, dest, 1, 0).action_index();
                    assert!(idx < ACTION_SPACE);
                    assert!(seen.insert(idx), "duplicate action index {}", idx);
                }
            }
        }
        assert_eq!(seen.len(), ACTION_SPACE);
    }

    #[test]
    fn test_factory_moves_order_before_center_moves() {
        let factory = Move::new(Source::Factory(4), Color::White, Destination::Floor, 0, 1);
        let center = Move::new(Source::Center, Color::Blue, Destination::PatternLine(0), 1, 0);
        assert!(factory < center);
    }

    #[test]
    fn test_display() {
        let mv = Move::new(Source::Factory(1), Color::Red, Destination::PatternLine(3), 2, 1);
        assert_eq!(mv.to_string(), "F2:R->L4 [2|1]");
        let mv = Move::new(Source::Center, Color::Black, Destination::Floor, 0, 3);
        assert_eq!(mv.to_string(), "C:K->floor [0|3]");
    }
}
