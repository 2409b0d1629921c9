//! Static evaluation in centi-points.
//!
//! The value of a board is its banked score plus what the wall is about to
//! earn: full pattern lines are counted at their placement score, partial
//! lines by how likely they are to fill this round, wall bonuses by their
//! progress, minus the floor penalty, plus a small tempo term for holding the
//! first-player marker.

use crate::game::position::{PatternLine, PlayerBoard, Position, NUM_PLAYERS};
use crate::game::tile::{wall_column, ALL_COLORS, WALL_SIZE};
use crate::scoring::scoring::{self, COLOR_SET_BONUS, COLUMN_BONUS, ROW_BONUS};
use serde::{Deserialize, Serialize};

/// Centi-points per game point.
pub const POINT: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalWeights {
    /// Weight of points a full pattern line will score at round end.
    pub pending_tiling: f64,
    /// Weight of partial lines whose color is still available in sufficient numbers.
    pub line_progress_live: f64,
    /// Weight of partial lines that cannot fill this round.
    pub line_progress_stalled: f64,
    /// Weight of partial progress towards row, column and color bonuses.
    pub wall_potential: f64,
    /// Weight of the (negative) floor penalty.
    pub floor: f64,
    /// Flat bonus, in points, for holding the first-player marker.
    pub tempo: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            pending_tiling: 1.0,
            line_progress_live: 0.6,
            line_progress_stalled: 0.2,
            wall_potential: 0.5,
            floor: 1.0,
            tempo: 0.6,
        }
    }
}

fn bonus_progress(filled: usize, bonus: i32) -> f64 {
    let ratio = filled as f64 / WALL_SIZE as f64;
    bonus as f64 * ratio * ratio
}

fn board_value(position: &Position, board: &PlayerBoard, weights: &EvalWeights) -> f64 {
    let mut value = board.score as f64;

    let mut wall = board.wall;
    for (line, pattern) in board.pattern_lines.iter().enumerate() {
        let Some(color) = pattern.color else { continue };
        let col = wall_column(line, color);
        let placement = scoring::placement_score(&wall, line, col) as f64;
        let capacity = PatternLine::capacity(line);
        if pattern.count == capacity {
            value += weights.pending_tiling * placement;
            wall[line][col] = true;
        } else {
            let fill = pattern.count as f64 / capacity as f64;
            let live = position.available(color) >= capacity - pattern.count;
            let weight = if live {
                weights.line_progress_live
            } else {
                weights.line_progress_stalled
            };
            value += weight * fill * placement;
        }
    }

    // Bonus progress on the wall as it will stand after tiling full lines.
    let mut potential = 0.0;
    for row in 0..WALL_SIZE {
        let filled = (0..WALL_SIZE).filter(|&c| wall[row][c]).count();
        potential += bonus_progress(filled, ROW_BONUS);
    }
    for col in 0..WALL_SIZE {
        let filled = (0..WALL_SIZE).filter(|&r| wall[r][col]).count();
        potential += bonus_progress(filled, COLUMN_BONUS);
    }
    for color in ALL_COLORS {
        let filled = (0..WALL_SIZE)
            .filter(|&r| wall[r][wall_column(r, color)])
            .count();
        potential += bonus_progress(filled, COLOR_SET_BONUS);
    }
    value += weights.wall_potential * potential;

    value += weights.floor * board.floor_penalty() as f64;
    if board.has_first_player_marker() {
        value += weights.tempo;
    }
    value
}

/// Evaluation of `position` from `player`'s point of view, in centi-points.
pub fn evaluate(position: &Position, player: usize, weights: &EvalWeights) -> i32 {
    let opponent = (player + 1) % NUM_PLAYERS;
    let mine = board_value(position, position.player(player), weights);
    let theirs = board_value(position, position.player(opponent), weights);
    ((mine - theirs) * POINT as f64).round() as i32
}

/// Evaluation of a finished game: the final score difference.
pub fn evaluate_final(position: &Position, player: usize) -> i32 {
    position.score_difference(player) * POINT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    #[test]
    fn test_symmetric_position_is_zero() {
        let position = parse(
            "BBYY|----|----|----|----/F/B----|-----|-----|-----|-----/-|--|---|----|-----/-/B----|-----|-----|-----|-----/-|--|---|----|-----/-/3,3/2/0",
        )
        .unwrap();
        let weights = EvalWeights::default();
        assert_eq!(evaluate(&position, 0, &weights), 0);
        assert_eq!(evaluate(&position, 1, &weights), 0);
    }

    #[test]
    fn test_floor_tiles_hurt() {
        let clean = parse(
            "BBYY|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        let dirty = parse(
            "BBYY|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/KK/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        let weights = EvalWeights::default();
        assert!(evaluate(&dirty, 0, &weights) < evaluate(&clean, 0, &weights));
        assert_eq!(evaluate(&dirty, 0, &weights), -evaluate(&dirty, 1, &weights));
    }

    #[test]
    fn test_full_line_counts_as_pending_points() {
        let position = parse(
            "----|----|----|----|----/F/-----|-----|-----|-----|-----/R|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        assert!(evaluate(&position, 0, &EvalWeights::default()) >= POINT);
    }
}
