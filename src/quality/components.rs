//! Per-move component scores, each in [0, 100].
//!
//! `blocking`, `scoring` and `floor_line` come from the pattern detectors and
//! are 0 when no opportunity matches the move. Together they form the
//! tactical bucket (40%). `strategic` (30%) blends factory control, timing,
//! endgame counting and the floor cost of the move. `positional` (20%) fuses
//! the engines. `opponent_impact` (10%) measures how much the move shrinks
//! the opponent's best scoring chance.

use crate::game::moves::{Move, Source};
use crate::game::position::Position;
use crate::patterns::floor_risk::floor_slots_added;
use crate::patterns::{DetectorCategory, Opportunity, OpportunityKind, RiskLevel, Target};
use serde::{Deserialize, Serialize};

pub const TACTICAL_WEIGHT: f64 = 0.4;
pub const STRATEGIC_WEIGHT: f64 = 0.3;
pub const POSITIONAL_WEIGHT: f64 = 0.2;
pub const OPPONENT_WEIGHT: f64 = 0.1;

/// Engine shares inside the positional component.
pub const ALPHA_BETA_SHARE: f64 = 0.5;
pub const MCTS_SHARE: f64 = 0.3;
pub const NEURAL_SHARE: f64 = 0.2;

/// Discounted points at which a scoring opportunity saturates the component.
const SCORING_SATURATION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub blocking: f64,
    pub scoring: f64,
    pub floor_line: f64,
    pub strategic: f64,
    pub positional: f64,
    pub opponent_impact: f64,
}

impl ComponentScores {
    /// Strongest tactical signal plus a quarter of the others, capped at 100.
    pub fn tactical(&self) -> f64 {
        let parts = [self.blocking, self.scoring, self.floor_line];
        let max = parts.iter().copied().fold(0.0, f64::max);
        let sum: f64 = parts.iter().sum();
        (max + 0.25 * (sum - max)).min(100.0)
    }

    pub fn quality_score(&self) -> f64 {
        (TACTICAL_WEIGHT * self.tactical()
            + STRATEGIC_WEIGHT * self.strategic
            + POSITIONAL_WEIGHT * self.positional
            + OPPONENT_WEIGHT * self.opponent_impact)
            .clamp(0.0, 100.0)
    }
}

/// Engine opinions on one move, each normalised to [0, 100]; `None` when the
/// engine did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineScores {
    pub alpha_beta: Option<f64>,
    pub mcts: Option<f64>,
    pub neural: Option<f64>,
}

impl EngineScores {
    /// Weighted mean over the engines that ran; missing engines' shares are
    /// redistributed proportionally. Neutral 50 when none ran.
    pub fn positional(&self) -> f64 {
        let parts = [
            (self.alpha_beta, ALPHA_BETA_SHARE),
            (self.mcts, MCTS_SHARE),
            (self.neural, NEURAL_SHARE),
        ];
        let total_weight: f64 = parts.iter().filter(|(s, _)| s.is_some()).map(|(_, w)| w).sum();
        if total_weight == 0.0 {
            return 50.0;
        }
        parts
            .iter()
            .filter_map(|(s, w)| s.map(|s| s * w))
            .sum::<f64>()
            / total_weight
    }
}

/// Whether `opportunity` speaks about `mv`.
pub fn matches(opportunity: &Opportunity, mv: &Move) -> bool {
    let same_color = opportunity.color.map_or(true, |c| c == mv.color());
    match opportunity.kind {
        OpportunityKind::Blocking | OpportunityKind::EndgameCount => same_color,
        OpportunityKind::FloorRisk => true,
        OpportunityKind::TimingControl => mv.source() == Source::Center,
        OpportunityKind::FactoryControl => match opportunity.target {
            Target::Factory(id) => mv.source() == Source::Factory(id) && same_color,
            _ => false,
        },
        OpportunityKind::PatternLineCompletion
        | OpportunityKind::RowCompletion
        | OpportunityKind::ColumnCompletion
        | OpportunityKind::ColorSetCompletion
        | OpportunityKind::MultiplierSetup
        | OpportunityKind::FloorRecovery => opportunity.suggested_moves.iter().any(|s| {
            s.color() == mv.color() && s.pattern_line_dest() == mv.pattern_line_dest()
        }),
    }
}

/// How strongly a matched opportunity argues for the move, in [0, 100].
pub fn strength(opportunity: &Opportunity, position: &Position, mv: &Move) -> f64 {
    match opportunity.kind {
        OpportunityKind::PatternLineCompletion
        | OpportunityKind::RowCompletion
        | OpportunityKind::ColumnCompletion
        | OpportunityKind::ColorSetCompletion
        | OpportunityKind::MultiplierSetup => {
            100.0 * (opportunity.discounted_value() / SCORING_SATURATION).min(1.0)
        }
        OpportunityKind::FloorRisk => {
            let cheapest = opportunity
                .suggested_moves
                .first()
                .map_or(0, |m| floor_slots_added(position, m));
            let extra = floor_slots_added(position, mv).saturating_sub(cheapest) as f64;
            100.0 * opportunity.urgency * (1.0 - extra / 3.0).max(0.0)
        }
        OpportunityKind::EndgameCount => {
            if opportunity.risk == RiskLevel::High || mv.pattern_line_dest().is_none() {
                0.0
            } else {
                60.0
            }
        }
        _ => 100.0 * opportunity.urgency,
    }
}

fn best_of<'a>(
    matched: &[(&'a Opportunity, f64)],
    filter: impl Fn(&Opportunity) -> bool,
) -> Option<(&'a Opportunity, f64)> {
    matched
        .iter()
        .filter(|(o, _)| filter(*o))
        .fold(None, |best: Option<(&Opportunity, f64)>, &(o, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((o, s)),
        })
}

/// Component scores plus the evidence behind them.
#[derive(Debug, Clone)]
pub struct MoveScoring<'a> {
    pub components: ComponentScores,
    pub risk: RiskLevel,
    /// Strongest tactical opportunity backing the move
    pub tactical_driver: Option<&'a Opportunity>,
    /// Strongest strategic opportunity backing the move
    pub strategic_driver: Option<&'a Opportunity>,
    /// Committing tiles to a color set that can no longer be completed
    pub dead_commitment: bool,
}

/// Scores `mv` against the detector output. `positional` and
/// `opponent_impact` are supplied by the caller.
pub fn score_move<'a>(
    position: &Position,
    opportunities: &'a [Opportunity],
    mv: &Move,
    engines: &EngineScores,
    opponent_impact: f64,
) -> MoveScoring<'a> {
    let matched: Vec<(&Opportunity, f64)> = opportunities
        .iter()
        .filter(|o| matches(o, mv))
        .map(|o| (o, strength(o, position, mv)))
        .collect();

    let category = |c: DetectorCategory| move |o: &Opportunity| o.kind.category() == c;
    let blocking = best_of(&matched, category(DetectorCategory::Blocking));
    let scoring = best_of(&matched, category(DetectorCategory::Scoring));
    let floor = best_of(&matched, category(DetectorCategory::FloorLine));
    let strategic_opp = best_of(&matched, category(DetectorCategory::Strategic));

    let dead_commitment = mv.pattern_line_dest().is_some()
        && matched
            .iter()
            .any(|(o, _)| o.kind == OpportunityKind::EndgameCount && o.risk == RiskLevel::High);

    let slots = floor_slots_added(position, mv);
    let risk_reward = (100.0 - 20.0 * slots as f64).clamp(0.0, 100.0);
    let strategic_signal = strategic_opp.map_or(0.0, |(_, s)| s);
    let penalty = if dead_commitment { 30.0 } else { 0.0 };
    let strategic = (0.7 * strategic_signal + 0.3 * risk_reward - penalty).clamp(0.0, 100.0);

    let risk = if slots >= 3 || dead_commitment {
        RiskLevel::High
    } else if slots == 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let tactical_driver = [blocking, scoring, floor]
        .into_iter()
        .flatten()
        .fold(None, |best: Option<(&Opportunity, f64)>, (o, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((o, s)),
        })
        .map(|(o, _)| o);

    MoveScoring {
        components: ComponentScores {
            blocking: blocking.map_or(0.0, |(_, s)| s),
            scoring: scoring.map_or(0.0, |(_, s)| s),
            floor_line: floor.map_or(0.0, |(_, s)| s),
            strategic,
            positional: engines.positional(),
            opponent_impact: opponent_impact.clamp(0.0, 100.0),
        },
        risk,
        tactical_driver,
        strategic_driver: strategic_opp.map(|(o, _)| o),
        dead_commitment,
    }
}

/// 50 when the move leaves the opponent's best chance unchanged, +10 per
/// point taken away.
pub fn opponent_impact(best_before: f64, best_after: f64) -> f64 {
    (50.0 + 10.0 * (best_before - best_after)).clamp(0.0, 100.0)
}

/// Maps raw scores to [0, 100] by min-max normalisation; all-equal maps to 50.
pub fn normalise(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return vec![50.0; values.len()];
    }
    values.iter().map(|v| 100.0 * (v - min) / (max - min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::moves::Destination;
    use crate::game::tile::Color;

    #[test]
    fn test_tactical_combination() {
        let c = ComponentScores {
            blocking: 80.0,
            scoring: 40.0,
            floor_line: 20.0,
            ..ComponentScores::default()
        };
        assert!((c.tactical() - (80.0 + 0.25 * 60.0)).abs() < 1e-9);
        let capped = ComponentScores {
            blocking: 100.0,
            scoring: 100.0,
            floor_line: 100.0,
            ..ComponentScores::default()
        };
        assert_eq!(capped.tactical(), 100.0);
    }

    #[test]
    fn test_quality_score_weights() {
        let c = ComponentScores {
            blocking: 100.0,
            scoring: 0.0,
            floor_line: 0.0,
            strategic: 100.0,
            positional: 100.0,
            opponent_impact: 100.0,
        };
        assert!((c.quality_score() - 100.0).abs() < 1e-9);
        let only_positional = ComponentScores {
            positional: 100.0,
            ..ComponentScores::default()
        };
        assert!((only_positional.quality_score() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_positional_redistributes_missing_engines() {
        let all = EngineScores {
            alpha_beta: Some(100.0),
            mcts: Some(0.0),
            neural: Some(0.0),
        };
        assert!((all.positional() - 50.0).abs() < 1e-9);
        let no_neural = EngineScores {
            alpha_beta: Some(100.0),
            mcts: Some(0.0),
            neural: None,
        };
        assert!((no_neural.positional() - 62.5).abs() < 1e-9);
        assert_eq!(EngineScores::default().positional(), 50.0);
    }

    #[test]
    fn test_blocking_matches_by_color() {
        let opportunity = Opportunity {
            kind: OpportunityKind::Blocking,
            target_player: 1,
            target: Target::PatternLine(3),
            color: Some(Color::Red),
            urgency: 0.9,
            tiles_needed: 1,
            tiles_available: 1,
            risk: RiskLevel::Low,
            value: 10.0,
            description: String::new(),
            suggested_moves: Vec::new(),
        };
        let red = Move::new(Source::Center, Color::Red, Destination::Floor, 0, 1);
        let blue = Move::new(Source::Center, Color::Blue, Destination::Floor, 0, 1);
        assert!(matches(&opportunity, &red));
        assert!(!matches(&opportunity, &blue));
    }

    #[test]
    fn test_normalise_and_opponent_impact() {
        assert_eq!(normalise(&[1.0, 3.0, 2.0]), vec![0.0, 100.0, 50.0]);
        assert_eq!(normalise(&[4.0, 4.0]), vec![50.0, 50.0]);
        assert_eq!(opponent_impact(5.0, 5.0), 50.0);
        assert_eq!(opponent_impact(10.0, 0.0), 100.0);
        assert_eq!(opponent_impact(0.0, 2.0), 30.0);
    }
}
