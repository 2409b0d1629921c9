//! Fixed-size feature encoding of a position, from the point of view of the
//! player to move.
//!
//! Layout (335 floats):
//! - factories: 5 factories × 5 colors × one-hot count 0..=4 (125)
//! - center: 5 colors × one-hot count 0..=15, saturating (80), marker flag (1)
//! - per player, player to move first (2 × 64):
//!   wall bitmap (25), pattern lines as color one-hot + fill ratio (30),
//!   floor occupancy one-hot 0..=7 saturating (8), score / 100 (1)
//! - round / 10 (1)

use crate::game::position::{PatternLine, PlayerBoard, Position, NUM_FACTORIES, NUM_PLAYERS};
use crate::game::tile::{NUM_COLORS, WALL_SIZE};

const FACTORY_COUNT_SLOTS: usize = 5;
const CENTER_COUNT_SLOTS: usize = 16;
const FLOOR_SLOTS: usize = 8;

const FACTORY_FEATURES: usize = NUM_FACTORIES * NUM_COLORS * FACTORY_COUNT_SLOTS;
const CENTER_FEATURES: usize = NUM_COLORS * CENTER_COUNT_SLOTS + 1;
const PLAYER_FEATURES: usize = WALL_SIZE * WALL_SIZE + WALL_SIZE * (NUM_COLORS + 1) + FLOOR_SLOTS + 1;

pub const FEATURE_SIZE: usize = FACTORY_FEATURES + CENTER_FEATURES + NUM_PLAYERS * PLAYER_FEATURES + 1;

fn encode_player(board: &PlayerBoard, out: &mut Vec<f32>) {
    for row in board.wall.iter() {
        out.extend(row.iter().map(|&cell| if cell { 1.0 } else { 0.0 }));
    }
    for (line, pattern) in board.pattern_lines.iter().enumerate() {
        let mut color = [0.0f32; NUM_COLORS];
        if let Some(c) = pattern.color {
            color[c.index()] = 1.0;
        }
        out.extend_from_slice(&color);
        out.push(pattern.count as f32 / PatternLine::capacity(line) as f32);
    }
    let mut floor = [0.0f32; FLOOR_SLOTS];
    floor[board.floor.len().min(FLOOR_SLOTS - 1)] = 1.0;
    out.extend_from_slice(&floor);
    out.push(board.score as f32 / 100.0);
}

pub fn encode(position: &Position) -> Vec<f32> {
    let mut out = Vec::with_capacity(FEATURE_SIZE);

    for factory in position.factories() {
        for &count in factory {
            let mut one_hot = [0.0f32; FACTORY_COUNT_SLOTS];
            one_hot[(count as usize).min(FACTORY_COUNT_SLOTS - 1)] = 1.0;
            out.extend_from_slice(&one_hot);
        }
    }

    for &count in position.center() {
        let mut one_hot = [0.0f32; CENTER_COUNT_SLOTS];
        one_hot[(count as usize).min(CENTER_COUNT_SLOTS - 1)] = 1.0;
        out.extend_from_slice(&one_hot);
    }
    out.push(if position.first_player_marker_available() { 1.0 } else { 0.0 });

    let me = position.current_player();
    for offset in 0..NUM_PLAYERS {
        encode_player(position.player((me + offset) % NUM_PLAYERS), &mut out);
    }

    out.push(position.round() as f32 / 10.0);
    debug_assert_eq!(out.len(), FEATURE_SIZE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    #[test]
    fn test_feature_size() {
        assert_eq!(FEATURE_SIZE, 335);
        let position = parse(
            "BBYR|----|KKWW|YRRR|----/FBYYK/B----|-----|-----|-K---|-----/R|--|YYY|----|-----/K/-----|W----|-----|-----|-----/-|BB|---|RR--|-----/-/7,3/2/0",
        )
        .unwrap();
        let features = encode(&position);
        assert_eq!(features.len(), FEATURE_SIZE);
        // factory 1, blue count 2
        assert_eq!(features[2], 1.0);
        // marker flag
        assert_eq!(features[FACTORY_FEATURES + CENTER_FEATURES - 1], 1.0);
        // player to move's wall (0,0)
        assert_eq!(features[FACTORY_FEATURES + CENTER_FEATURES], 1.0);
    }

    #[test]
    fn test_perspective_swaps_with_player_to_move() {
        let p0 = parse(
            "BBYY|----|----|----|----/F/B----|-----|-----|-----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        let p1 = parse(
            "BBYY|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/B----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/1",
        )
        .unwrap();
        assert_eq!(encode(&p0), encode(&p1));
    }
}
