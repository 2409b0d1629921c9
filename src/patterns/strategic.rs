//! Strategic / factory control: factory domination, first-player timing and
//! endgame tile counting.

use super::{cheapest_moves, opponent_of, Opportunity, OpportunityKind, RiskLevel, Target};
use crate::game::moves::Source;
use crate::game::position::{PatternLine, PlayerBoard, Position, NUM_FACTORIES};
use crate::game::tile::{Color, ALL_COLORS, TILES_PER_COLOR, WALL_SIZE};
use crate::scoring::scoring::COLOR_SET_BONUS;

/// Tiles of one color in a single factory that count as domination.
pub const DOMINATION_THRESHOLD: u8 = 3;
/// Center size from which taking the first-player marker is worth flagging.
pub const TIMING_CENTER_THRESHOLD: u8 = 3;
/// Wall tiles of one color from which a color set is treated as planned.
pub const PLANNED_SET_THRESHOLD: usize = 3;

/// Whether `board` is collecting `color` on an unfinished pattern line.
fn wants(board: &PlayerBoard, color: Color) -> Option<(usize, u8)> {
    board
        .pattern_lines
        .iter()
        .enumerate()
        .find(|(line, p)| p.color == Some(color) && p.count < PatternLine::capacity(*line))
        .map(|(line, p)| (line, PatternLine::capacity(line) - p.count))
}

/// Tiles of `color` that can still reach anyone's wall this game:
/// everything not on a wall and not staged on a pattern line.
pub fn remaining_for_endgame(position: &Position, color: Color) -> u8 {
    let committed: u32 = position
        .players()
        .iter()
        .map(|board| {
            let on_wall = (0..WALL_SIZE).filter(|&row| board.wall_has(row, color)).count() as u32;
            let staged: u32 = board
                .pattern_lines
                .iter()
                .filter(|p| p.color == Some(color))
                .map(|p| p.count as u32)
                .sum();
            on_wall + staged
        })
        .sum();
    (TILES_PER_COLOR as u32).saturating_sub(committed) as u8
}

pub fn detect(position: &Position, player: usize) -> Vec<Opportunity> {
    let mut found = Vec::new();
    found.extend(factory_control(position, player));
    found.extend(timing_control(position, player));
    found.extend(endgame_counting(position, player));
    found
}

fn factory_control(position: &Position, player: usize) -> Vec<Opportunity> {
    let opponent = position.player(opponent_of(player));
    let mut found = Vec::new();
    for id in 0..NUM_FACTORIES {
        for color in ALL_COLORS {
            let count = position.factory(id)[color.index()];
            if count < DOMINATION_THRESHOLD {
                continue;
            }
            let Some((line, needed)) = wants(opponent, color) else { continue };
            let closeness = if needed <= count { 0.2 } else { 0.0 };
            let suggested_moves = cheapest_moves(position, player, |mv| {
                mv.source() == Source::Factory(id) && mv.color() == color
            });
            found.push(Opportunity {
                kind: OpportunityKind::FactoryControl,
                target_player: opponent_of(player),
                target: Target::Factory(id),
                color: Some(color),
                urgency: (0.5 + 0.1 * (count - DOMINATION_THRESHOLD) as f64 + closeness).min(1.0),
                tiles_needed: needed,
                tiles_available: count,
                risk: if suggested_moves.first().map_or(0, |m| m.count_to_floor()) > 1 {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                },
                value: count as f64,
                description: format!(
                    "Factory {} holds {} {}, which the opponent needs for pattern line {}",
                    id + 1,
                    count,
                    color,
                    line + 1
                ),
                suggested_moves,
            });
        }
    }
    found
}

fn timing_control(position: &Position, player: usize) -> Option<Opportunity> {
    if !position.first_player_marker_available() {
        return None;
    }
    let center_total: u8 = position.center().iter().sum();
    if center_total < TIMING_CENTER_THRESHOLD {
        return None;
    }
    let suggested_moves = cheapest_moves(position, player, |mv| mv.source() == Source::Center);
    let floor = position.player(player).floor.len();
    Some(Opportunity {
        kind: OpportunityKind::TimingControl,
        target_player: player,
        target: Target::Center,
        color: None,
        urgency: (center_total as f64 / 10.0).min(1.0) * 0.6,
        tiles_needed: 0,
        tiles_available: center_total,
        risk: if floor < 2 { RiskLevel::Low } else { RiskLevel::Medium },
        value: 1.0,
        description: format!(
            "Take from the center ({} tiles) to start next round, at the cost of one floor slot",
            center_total
        ),
        suggested_moves,
    })
}

fn endgame_counting(position: &Position, player: usize) -> Vec<Opportunity> {
    let board = position.player(player);
    let mut found = Vec::new();
    for color in ALL_COLORS {
        let placed = (0..WALL_SIZE).filter(|&row| board.wall_has(row, color)).count();
        if placed < PLANNED_SET_THRESHOLD || placed == WALL_SIZE {
            continue;
        }
        let mut needed: u8 = 0;
        let mut first_row = None;
        for row in (0..WALL_SIZE).filter(|&r| !board.wall_has(r, color)) {
            let line = &board.pattern_lines[row];
            let staged = if line.color == Some(color) { line.count } else { 0 };
            needed += PatternLine::capacity(row) - staged;
            first_row.get_or_insert(row);
        }
        let remaining = remaining_for_endgame(position, color);
        let feasible = remaining >= needed;
        found.push(Opportunity {
            kind: OpportunityKind::EndgameCount,
            target_player: player,
            target: Target::ColorSet(color),
            color: Some(color),
            urgency: if feasible {
                0.3 * (needed as f64 / remaining.max(1) as f64).min(1.0)
            } else {
                0.8
            },
            tiles_needed: needed,
            tiles_available: remaining,
            risk: if feasible { RiskLevel::Low } else { RiskLevel::High },
            value: COLOR_SET_BONUS as f64,
            description: if feasible {
                format!("{} of {} remain for the {} set ({} needed)", remaining, TILES_PER_COLOR, color, needed)
            } else {
                format!("{} set is out of reach: {} needed, {} remain", color, needed, remaining)
            },
            suggested_moves: match first_row {
                Some(row) => cheapest_moves(position, player, |mv| {
                    mv.color() == color && mv.pattern_line_dest() == Some(row)
                }),
                None => Vec::new(),
            },
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    #[test]
    fn test_factory_domination_of_a_needed_color() {
        let position = parse(
            "RRRB|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|R--|----|-----/-/0,0/1/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        let control = found
            .iter()
            .find(|o| o.kind == OpportunityKind::FactoryControl)
            .unwrap();
        assert_eq!(control.target, Target::Factory(0));
        assert_eq!(control.tiles_available, 3);
        assert_eq!(control.tiles_needed, 2);
        assert!(control.urgency > 0.69);
    }

    #[test]
    fn test_timing_control_needs_marker_and_center() {
        let with_marker = parse(
            "----|----|----|----|----/FBYK/-----|-----|-----|-----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        assert!(detect(&with_marker, 0)
            .iter()
            .any(|o| o.kind == OpportunityKind::TimingControl));

        let without = parse(
            "----|----|----|----|----/BYK/-----|-----|-----|-----|-----/-|--|---|----|-----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        assert!(!detect(&without, 0)
            .iter()
            .any(|o| o.kind == OpportunityKind::TimingControl));
    }

    #[test]
    fn test_endgame_count_flags_unreachable_set() {
        // Player 0 has blue in rows 1-3 and needs 9 more for rows 4 and 5.
        // Player 1 has walled four blue and stages five, leaving only eight.
        let position = parse(
            "----|----|----|----|----/FR/B----|-B---|--B--|-----|-----/-|--|---|----|-----/-/B----|-B---|--B--|---B-|-----/-|--|---|----|BBBBB/-/0,0/4/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        let count = found
            .iter()
            .find(|o| o.kind == OpportunityKind::EndgameCount)
            .unwrap();
        assert_eq!(count.color, Some(Color::Blue));
        assert_eq!(count.tiles_needed, 9);
        assert_eq!(count.tiles_available, 20 - 3 - 4 - 5);
        assert_eq!(count.risk, RiskLevel::High);
    }
}
