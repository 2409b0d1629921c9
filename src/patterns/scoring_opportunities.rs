//! Scoring optimization: pattern-line completions, wall bonuses and
//! placements that complete several bonuses at once.

use super::{cheapest_moves, Opportunity, OpportunityKind, RiskLevel, Target};
use crate::game::position::{PatternLine, PlayerBoard, Position};
use crate::game::tile::{wall_color, wall_column, Color, WALL_SIZE};
use crate::scoring::scoring::{COLOR_SET_BONUS, COLUMN_BONUS, COMPLETION_VALUES, ROW_BONUS};
use std::cmp::Ordering;

/// Largest value a single placement can unlock (row + column + color set).
const MAX_PLACEMENT_VALUE: f64 = (ROW_BONUS + COLUMN_BONUS + COLOR_SET_BONUS) as f64;

/// Kind priority for ties on discounted value. Higher sorts first.
fn kind_priority(kind: OpportunityKind) -> u8 {
    match kind {
        OpportunityKind::MultiplierSetup => 5,
        OpportunityKind::ColorSetCompletion => 4,
        OpportunityKind::ColumnCompletion => 3,
        OpportunityKind::RowCompletion => 2,
        OpportunityKind::PatternLineCompletion => 1,
        _ => 0,
    }
}

fn wall_cell(opportunity: &Opportunity) -> (usize, usize) {
    match opportunity.target {
        Target::WallCell { row, col } => (row, col),
        Target::PatternLine(line) => (
            line,
            opportunity.color.map_or(WALL_SIZE, |c| wall_column(line, c)),
        ),
        Target::WallRow(row) => (row, WALL_SIZE),
        Target::WallColumn(col) => (WALL_SIZE, col),
        _ => (WALL_SIZE, WALL_SIZE),
    }
}

/// Discounted value descending, then kind priority, then lowest wall row,
/// then lowest wall column.
pub fn compare(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.discounted_value()
        .total_cmp(&a.discounted_value())
        .then_with(|| kind_priority(b.kind).cmp(&kind_priority(a.kind)))
        .then_with(|| wall_cell(a).cmp(&wall_cell(b)))
}

/// Tiles still required to tile `color` on wall row `row`, or `None` when the
/// pattern line is busy with another color.
fn tiles_to_tile(board: &PlayerBoard, row: usize, color: Color) -> Option<u8> {
    let line = &board.pattern_lines[row];
    match line.color {
        Some(c) if c != color => None,
        Some(_) => Some(PatternLine::capacity(row) - line.count),
        None => Some(PatternLine::capacity(row)),
    }
}

fn risk_for(needed: u8, available: u8) -> RiskLevel {
    match needed.cmp(&available) {
        Ordering::Greater => RiskLevel::High,
        Ordering::Equal => RiskLevel::Medium,
        Ordering::Less => RiskLevel::Low,
    }
}

/// A wall cell whose tiling would finish at least one bonus.
struct Finisher {
    row: usize,
    col: usize,
    completes_row: bool,
    completes_column: bool,
    completes_color: bool,
}

impl Finisher {
    fn value(&self) -> i32 {
        let mut value = 0;
        if self.completes_row {
            value += ROW_BONUS;
        }
        if self.completes_column {
            value += COLUMN_BONUS;
        }
        if self.completes_color {
            value += COLOR_SET_BONUS;
        }
        value
    }

    fn count(&self) -> usize {
        [self.completes_row, self.completes_column, self.completes_color]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}

fn finishers(board: &PlayerBoard) -> Vec<Finisher> {
    let mut cells = Vec::new();
    for row in 0..WALL_SIZE {
        for col in 0..WALL_SIZE {
            if board.wall[row][col] {
                continue;
            }
            let color = wall_color(row, col);
            let completes_row = (0..WALL_SIZE).all(|c| c == col || board.wall[row][c]);
            let completes_column = (0..WALL_SIZE).all(|r| r == row || board.wall[r][col]);
            let completes_color = (0..WALL_SIZE).all(|r| r == row || board.wall_has(r, color));
            if completes_row || completes_column || completes_color {
                cells.push(Finisher {
                    row,
                    col,
                    completes_row,
                    completes_column,
                    completes_color,
                });
            }
        }
    }
    cells
}

pub fn detect(position: &Position, player: usize) -> Vec<Opportunity> {
    let board = position.player(player);
    let mut found = Vec::new();

    // Pattern lines already started.
    for (line, pattern) in board.pattern_lines.iter().enumerate() {
        let Some(color) = pattern.color else { continue };
        let capacity = PatternLine::capacity(line);
        if pattern.count == 0 || pattern.count >= capacity {
            continue;
        }
        let needed = capacity - pattern.count;
        let available = position.available(color);
        if available == 0 {
            continue;
        }
        let value = COMPLETION_VALUES[line] as f64;
        found.push(Opportunity {
            kind: OpportunityKind::PatternLineCompletion,
            target_player: player,
            target: Target::PatternLine(line),
            color: Some(color),
            urgency: 0.0,
            tiles_needed: needed,
            tiles_available: available,
            risk: risk_for(needed, available),
            value,
            description: format!(
                "Complete pattern line {} with {} more {} ({} in play)",
                line + 1,
                needed,
                color,
                available
            ),
            suggested_moves: cheapest_moves(position, player, |mv| {
                mv.color() == color && mv.pattern_line_dest() == Some(line)
            }),
        });
    }

    // Wall bonuses finished by a single placement.
    for cell in finishers(board) {
        let color = wall_color(cell.row, cell.col);
        let Some(needed) = tiles_to_tile(board, cell.row, color) else { continue };
        let available = position.available(color);
        let suggested_moves = cheapest_moves(position, player, |mv| {
            mv.color() == color && mv.pattern_line_dest() == Some(cell.row)
        });

        let mut push = |kind: OpportunityKind, target: Target, value: i32, what: String| {
            found.push(Opportunity {
                kind,
                target_player: player,
                target,
                color: Some(color),
                urgency: 0.0,
                tiles_needed: needed,
                tiles_available: available,
                risk: risk_for(needed, available),
                value: value as f64,
                description: format!(
                    "{} by tiling {} at row {} column {} ({} needed, {} in play)",
                    what,
                    color,
                    cell.row + 1,
                    cell.col + 1,
                    needed,
                    available
                ),
                suggested_moves: suggested_moves.clone(),
            });
        };

        if cell.count() >= 2 {
            push(
                OpportunityKind::MultiplierSetup,
                Target::WallCell { row: cell.row, col: cell.col },
                cell.value(),
                format!("Multiplier: {} bonuses at once", cell.count()),
            );
        }
        if cell.completes_color {
            push(
                OpportunityKind::ColorSetCompletion,
                Target::ColorSet(color),
                COLOR_SET_BONUS,
                format!("Color set {} (+{})", color, COLOR_SET_BONUS),
            );
        }
        if cell.completes_column {
            push(
                OpportunityKind::ColumnCompletion,
                Target::WallColumn(cell.col),
                COLUMN_BONUS,
                format!("Column {} (+{})", cell.col + 1, COLUMN_BONUS),
            );
        }
        if cell.completes_row {
            push(
                OpportunityKind::RowCompletion,
                Target::WallRow(cell.row),
                ROW_BONUS,
                format!("Row {} (+{})", cell.row + 1, ROW_BONUS),
            );
        }
    }

    for opportunity in found.iter_mut() {
        opportunity.urgency = (opportunity.discounted_value() / MAX_PLACEMENT_VALUE).clamp(0.0, 1.0);
    }
    found.sort_by(compare);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    #[test]
    fn test_column_completion_ranks_at_least_as_high_as_row_completion() {
        // Row 1 misses only column 5 (white); column 1 misses only row 5 (yellow).
        // Both colors are equally available.
        let position = parse(
            "YYWW|----|----|----|----/F/BYRK-|W----|K----|R----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/3/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        let row = found
            .iter()
            .position(|o| o.kind == OpportunityKind::RowCompletion)
            .unwrap();
        let column = found
            .iter()
            .position(|o| o.kind == OpportunityKind::ColumnCompletion)
            .unwrap();
        assert!(column < row);
        assert!(found[column].discounted_value() >= found[row].discounted_value());
    }

    #[test]
    fn test_pattern_line_completion_value_table() {
        let position = parse(
            "BBYY|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|B---|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        let line = found
            .iter()
            .find(|o| o.kind == OpportunityKind::PatternLineCompletion)
            .unwrap();
        assert_eq!(line.value, 10.0);
        assert_eq!(line.tiles_needed, 3);
        assert_eq!(line.tiles_available, 2);
        assert_eq!(line.risk, RiskLevel::High);
        assert!((line.discounted_value() - 10.0 * 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_setup_detected() {
        // (0,4) finishes row 1 and column 5.
        let position = parse(
            "WWBB|----|----|----|----/F/BYRK-|----K|----R|----Y|----B/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/3/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        assert_eq!(found[0].kind, OpportunityKind::MultiplierSetup);
        assert_eq!(found[0].target, Target::WallCell { row: 0, col: 4 });
        assert_eq!(found[0].value, (ROW_BONUS + COLUMN_BONUS) as f64);
    }
}
