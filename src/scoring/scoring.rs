use crate::game::tile::{wall_color, Color, WALL_SIZE};

/// Penalty of each penalized floor slot. Slots beyond the seventh are free.
pub const FLOOR_PENALTY: [i32; 7] = [-1, -1, -2, -2, -2, -3, -3];

/// Points for a completed pattern line, indexed by line (capacity - 1).
/// Triangular numbers: the best case when every tile lands on a growing run.
pub const COMPLETION_VALUES: [i32; WALL_SIZE] = [1, 3, 6, 10, 15];

pub const ROW_BONUS: i32 = 2;
pub const COLUMN_BONUS: i32 = 7;
pub const COLOR_SET_BONUS: i32 = 10;

pub type Wall = [[bool; WALL_SIZE]; WALL_SIZE];

/// Sum of floor penalties for `floor_count` occupied slots (tiles and marker).
/// Always <= 0, saturating after seven slots.
pub fn floor_penalty(floor_count: usize) -> i32 {
    FLOOR_PENALTY
        .iter()
        .take(floor_count.min(FLOOR_PENALTY.len()))
        .sum()
}

/// Length of the occupied run through (row, col) along the row and along the
/// column, not counting the cell itself.
fn neighbour_runs(wall: &Wall, row: usize, col: usize) -> (i32, i32) {
    let mut horizontal = 0;
    let mut c = col;
    while c > 0 && wall[row][c - 1] {
        horizontal += 1;
        c -= 1;
    }
    c = col;
    while c + 1 < WALL_SIZE && wall[row][c + 1] {
        horizontal += 1;
        c += 1;
    }

    let mut vertical = 0;
    let mut r = row;
    while r > 0 && wall[r - 1][col] {
        vertical += 1;
        r -= 1;
    }
    r = row;
    while r + 1 < WALL_SIZE && wall[r + 1][col] {
        vertical += 1;
        r += 1;
    }

    (horizontal, vertical)
}

/// Static value of a wall: every occupied cell is worth one point plus the
/// occupied runs it touches in its row and column.
pub fn score_wall(wall: &Wall) -> i32 {
    let mut total = 0;
    for row in 0..WALL_SIZE {
        for col in 0..WALL_SIZE {
            if wall[row][col] {
                let (h, v) = neighbour_runs(wall, row, col);
                total += 1 + h + v;
            }
        }
    }
    total
}

/// Points earned by tiling (row, col) on `wall` during round resolution.
/// `wall` must not yet contain the tile.
pub fn placement_score(wall: &Wall, row: usize, col: usize) -> i32 {
    let (h, v) = neighbour_runs(wall, row, col);
    match (h, v) {
        (0, 0) => 1,
        (h, 0) => h + 1,
        (0, v) => v + 1,
        (h, v) => (h + 1) + (v + 1),
    }
}

pub fn row_complete(wall: &Wall, row: usize) -> bool {
    wall[row].iter().all(|&cell| cell)
}

pub fn column_complete(wall: &Wall, col: usize) -> bool {
    (0..WALL_SIZE).all(|row| wall[row][col])
}

pub fn color_complete(wall: &Wall, color: Color) -> bool {
    (0..WALL_SIZE).all(|row| {
        (0..WALL_SIZE).any(|col| wall[row][col] && wall_color(row, col) == color)
    })
}

/// End-of-game bonus: +2 per complete row, +7 per complete column and +10 per
/// color placed five times.
pub fn endgame_bonus(wall: &Wall) -> i32 {
    let rows = (0..WALL_SIZE).filter(|&r| row_complete(wall, r)).count() as i32;
    let cols = (0..WALL_SIZE).filter(|&c| column_complete(wall, c)).count() as i32;
    let colors = crate::game::tile::ALL_COLORS
        .iter()
        .filter(|&&color| color_complete(wall, color))
        .count() as i32;
    rows * ROW_BONUS + cols * COLUMN_BONUS + colors * COLOR_SET_BONUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tile::wall_column;

    #[test]
    fn test_floor_penalty_table_and_saturation() {
        assert_eq!(floor_penalty(0), 0);
        assert_eq!(floor_penalty(1), -1);
        assert_eq!(floor_penalty(3), -4);
        assert_eq!(floor_penalty(7), -14);
        assert_eq!(floor_penalty(8), -14);
        assert_eq!(floor_penalty(30), -14);
    }

    #[test]
    fn test_score_wall_isolated_and_adjacent() {
        let mut wall: Wall = [[false; WALL_SIZE]; WALL_SIZE];
        assert_eq!(score_wall(&wall), 0);
        wall[0][0] = true;
        assert_eq!(score_wall(&wall), 1);
        wall[0][1] = true;
        // each of the two cells: 1 + one horizontal neighbour
        assert_eq!(score_wall(&wall), 4);
        wall[1][0] = true;
        // (0,0): 1+1+1, (0,1): 1+1, (1,0): 1+1
        assert_eq!(score_wall(&wall), 7);
    }

    #[test]
    fn test_score_wall_is_monotone_under_tile_addition() {
        let mut wall: Wall = [[false; WALL_SIZE]; WALL_SIZE];
        let mut previous = score_wall(&wall);
        // fill in a scattered but deterministic order
        for step in 0..WALL_SIZE * WALL_SIZE {
            let cell = (step * 7) % (WALL_SIZE * WALL_SIZE);
            wall[cell / WALL_SIZE][cell % WALL_SIZE] = true;
            let current = score_wall(&wall);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_placement_score_follows_adjacency_rules() {
        let mut wall: Wall = [[false; WALL_SIZE]; WALL_SIZE];
        assert_eq!(placement_score(&wall, 2, 2), 1);
        wall[2][0] = true;
        wall[2][1] = true;
        assert_eq!(placement_score(&wall, 2, 2), 3);
        wall[1][2] = true;
        assert_eq!(placement_score(&wall, 2, 2), 3 + 2);
    }

    #[test]
    fn test_endgame_bonus() {
        let mut wall: Wall = [[false; WALL_SIZE]; WALL_SIZE];
        for col in 0..WALL_SIZE {
            wall[0][col] = true;
        }
        assert_eq!(endgame_bonus(&wall), ROW_BONUS);
        for row in 1..WALL_SIZE {
            wall[row][0] = true;
        }
        assert_eq!(endgame_bonus(&wall), ROW_BONUS + COLUMN_BONUS);
        for row in 0..WALL_SIZE {
            wall[row][wall_column(row, Color::Red)] = true;
        }
        assert!(color_complete(&wall, Color::Red));
        assert_eq!(endgame_bonus(&wall), ROW_BONUS + COLUMN_BONUS + COLOR_SET_BONUS);
    }
}
