//! Blocking: deny the opponent the color that would finish a pattern line.

use super::{cheapest_moves, opponent_of, Opportunity, OpportunityKind, RiskLevel, Target};
use crate::game::position::{PatternLine, Position};
use crate::game::tile::WALL_SIZE;
use crate::scoring::scoring::COMPLETION_VALUES;

/// Severity bands, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyBand {
    High,
    Medium,
    Low,
}

impl UrgencyBand {
    pub fn classify(tiles_needed: u8, tiles_available: u8) -> UrgencyBand {
        if tiles_needed <= 2 && tiles_available <= 2 {
            UrgencyBand::High
        } else if tiles_needed <= 3 && tiles_available <= 5 {
            UrgencyBand::Medium
        } else {
            UrgencyBand::Low
        }
    }

    /// Urgency interval `[floor, floor + span]` of the band.
    fn range(self) -> (f64, f64) {
        match self {
            UrgencyBand::High => (0.75, 0.25),
            UrgencyBand::Medium => (0.45, 0.25),
            UrgencyBand::Low => (0.1, 0.3),
        }
    }
}

/// Urgency rises as the line gets closer to full and as the color gets scarcer.
pub fn blocking_urgency(tiles_needed: u8, tiles_available: u8) -> f64 {
    let closeness = 1.0 - (tiles_needed.saturating_sub(1) as f64 / (WALL_SIZE - 1) as f64);
    let scarcity = 1.0 - (tiles_available.min(10) as f64 / 10.0);
    let (floor, span) = UrgencyBand::classify(tiles_needed, tiles_available).range();
    (floor + span * (0.5 * closeness + 0.5 * scarcity)).clamp(0.0, 1.0)
}

pub fn detect(position: &Position, player: usize) -> Vec<Opportunity> {
    let opponent = opponent_of(player);
    let board = position.player(opponent);
    let mut found = Vec::new();

    for (line, pattern) in board.pattern_lines.iter().enumerate() {
        let capacity = PatternLine::capacity(line);
        let Some(color) = pattern.color else { continue };
        if pattern.count == 0 || pattern.count >= capacity {
            continue;
        }
        let available = position.available(color);
        if available == 0 {
            continue;
        }

        let needed = capacity - pattern.count;
        let band = UrgencyBand::classify(needed, available);
        let suggested_moves = cheapest_moves(position, player, |mv| mv.color() == color);
        let forced_floor = suggested_moves.first().map_or(0, |mv| mv.count_to_floor());
        let risk = match forced_floor {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        };

        found.push(Opportunity {
            kind: OpportunityKind::Blocking,
            target_player: opponent,
            target: Target::PatternLine(line),
            color: Some(color),
            urgency: blocking_urgency(needed, available),
            tiles_needed: needed,
            tiles_available: available,
            risk,
            value: COMPLETION_VALUES[line] as f64,
            description: format!(
                "{:?} block: opponent needs {} more {} for pattern line {}, {} left in play",
                band,
                needed,
                color,
                line + 1,
                available
            ),
            suggested_moves,
        });
    }

    found.sort_by(|a, b| b.urgency.total_cmp(&a.urgency));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;
    use crate::game::tile::Color;

    #[test]
    fn test_bands() {
        assert_eq!(UrgencyBand::classify(1, 1), UrgencyBand::High);
        assert_eq!(UrgencyBand::classify(2, 2), UrgencyBand::High);
        assert_eq!(UrgencyBand::classify(3, 4), UrgencyBand::Medium);
        assert_eq!(UrgencyBand::classify(2, 5), UrgencyBand::Medium);
        assert_eq!(UrgencyBand::classify(4, 2), UrgencyBand::Low);
        assert_eq!(UrgencyBand::classify(1, 9), UrgencyBand::Low);
    }

    #[test]
    fn test_urgency_monotone_in_scarcity_and_closeness() {
        assert!(blocking_urgency(1, 1) >= blocking_urgency(2, 1));
        assert!(blocking_urgency(1, 1) >= blocking_urgency(1, 2));
        assert!(blocking_urgency(1, 2) >= 0.75);
        assert!(blocking_urgency(4, 9) < 0.45);
    }

    #[test]
    fn test_one_red_left_is_high_urgency() {
        // opponent (player 1) holds 3 of 4 red on line 4; a single red tile is left in the center
        let position = parse(
            "BBYY|KKWW|----|----|----/R/-----|-----|-----|-----|-----/-|--|---|----|-----/F/-----|-----|-----|-----|-----/-|--|---|RRR-|-----/-/0,0/1/0",
        )
        .unwrap();
        let found = detect(&position, 0);
        assert_eq!(found.len(), 1);
        let block = &found[0];
        assert_eq!(block.color, Some(Color::Red));
        assert_eq!(block.tiles_needed, 1);
        assert_eq!(block.tiles_available, 1);
        assert!(block.urgency >= 0.75);
        assert_eq!(block.target, Target::PatternLine(3));
        assert!(block.suggested_moves.iter().all(|m| m.color() == Color::Red));
        assert!(!block.suggested_moves.is_empty());
    }

    #[test]
    fn test_no_block_when_color_is_gone() {
        let position = parse(
            "BBYY|KKWW|----|----|----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/F/-----|-----|-----|-----|-----/-|--|---|RRR-|-----/-/0,0/1/0",
        )
        .unwrap();
        assert!(detect(&position, 0).is_empty());
    }
}
