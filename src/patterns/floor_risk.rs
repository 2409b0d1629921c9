//! Floor-line risk: how many penalty slots the player is about to fill, and
//! which moves keep the floor quiet or pay for it.

use super::{cheapest_moves, Opportunity, OpportunityKind, RiskLevel, Target};
use crate::game::get_legal_moves::legal_moves_for;
use crate::game::position::{PatternLine, Position};
use crate::scoring::scoring::{floor_penalty, COMPLETION_VALUES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FloorRiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl FloorRiskLevel {
    pub fn from_occupancy(slots: usize) -> FloorRiskLevel {
        match slots {
            0 => FloorRiskLevel::None,
            1 => FloorRiskLevel::Low,
            2..=3 => FloorRiskLevel::Medium,
            4..=5 => FloorRiskLevel::High,
            _ => FloorRiskLevel::Critical,
        }
    }

    pub fn urgency(self) -> f64 {
        match self {
            FloorRiskLevel::None => 0.0,
            FloorRiskLevel::Low => 0.2,
            FloorRiskLevel::Medium => 0.4,
            FloorRiskLevel::High => 0.7,
            FloorRiskLevel::Critical => 0.95,
        }
    }

    pub fn risk(self) -> RiskLevel {
        match self {
            FloorRiskLevel::None | FloorRiskLevel::Low => RiskLevel::Low,
            FloorRiskLevel::Medium => RiskLevel::Medium,
            FloorRiskLevel::High | FloorRiskLevel::Critical => RiskLevel::High,
        }
    }
}

/// Current floor slots plus the fewest slots any legal move would add.
pub fn projected_occupancy(position: &Position, player: usize) -> usize {
    let current = position.player(player).floor.len();
    let forced = legal_moves_for(position, player)
        .iter()
        .map(|mv| floor_slots_added(position, mv))
        .min()
        .unwrap_or(0);
    current + forced
}

/// Floor slots a move fills, counting the first-player marker.
pub fn floor_slots_added(position: &Position, mv: &crate::game::moves::Move) -> usize {
    let marker = matches!(mv.source(), crate::game::moves::Source::Center)
        && position.first_player_marker_available();
    mv.count_to_floor() as usize + usize::from(marker)
}

pub fn floor_risk_level(position: &Position, player: usize) -> FloorRiskLevel {
    FloorRiskLevel::from_occupancy(projected_occupancy(position, player))
}

pub fn detect(position: &Position, player: usize) -> Vec<Opportunity> {
    let current = position.player(player).floor.len();
    let projected = projected_occupancy(position, player);
    let level = FloorRiskLevel::from_occupancy(projected);
    if level == FloorRiskLevel::None {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut safest: Vec<_> = legal_moves_for(position, player);
    safest.sort_by_key(|mv| (floor_slots_added(position, mv), *mv));
    safest.truncate(super::MAX_SUGGESTIONS);

    let at_stake = -floor_penalty(projected) as f64;
    found.push(Opportunity {
        kind: OpportunityKind::FloorRisk,
        target_player: player,
        target: Target::Floor,
        color: None,
        urgency: level.urgency(),
        tiles_needed: 0,
        tiles_available: projected as u8,
        risk: level.risk(),
        value: at_stake,
        description: format!(
            "{:?} floor risk: {} slots filled, at least {} after this move",
            level, current, projected
        ),
        suggested_moves: safest,
    });

    // Recovery: finishing a pattern line offsets part of the penalty.
    if level >= FloorRiskLevel::Medium {
        let board = position.player(player);
        let recovery = cheapest_moves(position, player, |mv| match mv.pattern_line_dest() {
            Some(line) => {
                board.pattern_lines[line].count + mv.count_to_line() == PatternLine::capacity(line)
            }
            None => false,
        });
        if let Some(best) = recovery.first() {
            let line = best.pattern_line_dest().unwrap_or(0);
            found.push(Opportunity {
                kind: OpportunityKind::FloorRecovery,
                target_player: player,
                target: Target::PatternLine(line),
                color: Some(best.color()),
                urgency: level.urgency() * 0.8,
                tiles_needed: 0,
                tiles_available: best.tiles_taken(),
                risk: level.risk(),
                value: COMPLETION_VALUES[line] as f64,
                description: format!(
                    "Recover from the floor by completing pattern line {} with {}",
                    line + 1,
                    best.color()
                ),
                suggested_moves: recovery,
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    #[test]
    fn test_levels() {
        assert_eq!(FloorRiskLevel::from_occupancy(0), FloorRiskLevel::None);
        assert_eq!(FloorRiskLevel::from_occupancy(1), FloorRiskLevel::Low);
        assert_eq!(FloorRiskLevel::from_occupancy(3), FloorRiskLevel::Medium);
        assert_eq!(FloorRiskLevel::from_occupancy(5), FloorRiskLevel::High);
        assert_eq!(FloorRiskLevel::from_occupancy(6), FloorRiskLevel::Critical);
        assert_eq!(FloorRiskLevel::from_occupancy(12), FloorRiskLevel::Critical);
    }

    #[test]
    fn test_quiet_floor_has_no_risk() {
        let position = parse(
            "BBYY|----|----|----|----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        assert!(detect(&position, 0).is_empty());
    }

    #[test]
    fn test_crowded_floor_is_critical_with_recovery() {
        // marker plus five tiles already on the floor
        let position = parse(
            "RRRR|----|----|----|----/-/-----|-----|-----|-----|-----/R|--|---|----|-----/FKKKKK/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/0",
        )
        .unwrap();
        assert_eq!(floor_risk_level(&position, 0), FloorRiskLevel::Critical);
        let found = detect(&position, 0);
        assert_eq!(found[0].kind, OpportunityKind::FloorRisk);
        assert_eq!(found[0].risk, RiskLevel::High);
        // fewest floor tiles first: RRRR onto line 5 leaves nothing on the floor
        assert_eq!(found[0].suggested_moves[0].count_to_floor(), 0);
        assert!(found.iter().any(|o| o.kind == OpportunityKind::FloorRecovery));
    }
}
