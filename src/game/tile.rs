use serde::{Deserialize, Serialize};
use std::fmt;

pub const NUM_COLORS: usize = 5;
pub const WALL_SIZE: usize = 5;
pub const TILES_PER_COLOR: u8 = 20;

/// Tile colors, in the fixed order used by notation, hashing and feature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue,
    Yellow,
    Red,
    Black,
    White,
}

pub const ALL_COLORS: [Color; NUM_COLORS] = [
    Color::Blue,
    Color::Yellow,
    Color::Red,
    Color::Black,
    Color::White,
];

impl Color {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Color> {
        ALL_COLORS.get(idx).copied()
    }

    pub fn letter(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Red => 'R',
            Color::Black => 'K',
            Color::White => 'W',
        }
    }

    pub fn from_letter(c: char) -> Option<Color> {
        match c {
            'B' => Some(Color::Blue),
            'Y' => Some(Color::Yellow),
            'R' => Some(Color::Red),
            'K' => Some(Color::Black),
            'W' => Some(Color::White),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Color that wall cell (row, col) accepts: `colors[(col - row) mod 5]`.
pub fn wall_color(row: usize, col: usize) -> Color {
    ALL_COLORS[(col + WALL_SIZE - row % WALL_SIZE) % WALL_SIZE]
}

/// Column of `color` in wall row `row` (inverse of [`wall_color`]).
pub fn wall_column(row: usize, color: Color) -> usize {
    (color.index() + row) % WALL_SIZE
}

/// Something that occupies a floor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FloorTile {
    Tile(Color),
    FirstPlayerMarker,
}

impl FloorTile {
    pub fn letter(self) -> char {
        match self {
            FloorTile::Tile(color) => color.letter(),
            FloorTile::FirstPlayerMarker => 'F',
        }
    }

    pub fn color(self) -> Option<Color> {
        match self {
            FloorTile::Tile(color) => Some(color),
            FloorTile::FirstPlayerMarker => None,
        }
    }

    /// Index into per-slot hashing tables: colors first, marker last.
    pub fn hash_index(self) -> usize {
        match self {
            FloorTile::Tile(color) => color.index(),
            FloorTile::FirstPlayerMarker => NUM_COLORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_scheme_is_latin_square() {
        for row in 0..WALL_SIZE {
            let mut seen_row = [false; NUM_COLORS];
            let mut seen_col = [false; NUM_COLORS];
            for col in 0..WALL_SIZE {
                seen_row[wall_color(row, col).index()] = true;
                seen_col[wall_color(col, row).index()] = true;
            }
            assert!(seen_row.iter().all(|&s| s));
            assert!(seen_col.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_wall_column_inverts_wall_color() {
        for row in 0..WALL_SIZE {
            for color in ALL_COLORS {
                assert_eq!(wall_color(row, wall_column(row, color)), color);
            }
        }
        assert_eq!(wall_color(0, 0), Color::Blue);
        assert_eq!(wall_color(1, 0), Color::White);
        assert_eq!(wall_color(4, 4), Color::Blue);
    }

    #[test]
    fn test_letters_round_trip() {
        for color in ALL_COLORS {
            assert_eq!(Color::from_letter(color.letter()), Some(color));
        }
        assert_eq!(Color::from_letter('X'), None);
        assert_eq!(FloorTile::FirstPlayerMarker.letter(), 'F');
    }
}
