//! Deterministic pattern detectors.
//!
//! Each detector is a pure function `(Position, player) -> Vec<Opportunity>`.
//! [`detect_all`] runs the four of them in parallel over the same immutable
//! position and concatenates their output in a fixed order.

pub mod blocking;
pub mod floor_risk;
pub mod scoring_opportunities;
pub mod strategic;

use crate::game::get_legal_moves::legal_moves_for;
use crate::game::moves::Move;
use crate::game::position::Position;
use crate::game::tile::Color;
use serde::{Deserialize, Serialize};

/// Maximum number of suggested moves attached to one opportunity.
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DetectorCategory {
    Blocking,
    Scoring,
    FloorLine,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityKind {
    Blocking,
    PatternLineCompletion,
    RowCompletion,
    ColumnCompletion,
    ColorSetCompletion,
    MultiplierSetup,
    FloorRisk,
    FloorRecovery,
    FactoryControl,
    TimingControl,
    EndgameCount,
}

impl OpportunityKind {
    pub fn category(self) -> DetectorCategory {
        match self {
            OpportunityKind::Blocking => DetectorCategory::Blocking,
            OpportunityKind::PatternLineCompletion
            | OpportunityKind::RowCompletion
            | OpportunityKind::ColumnCompletion
            | OpportunityKind::ColorSetCompletion
            | OpportunityKind::MultiplierSetup => DetectorCategory::Scoring,
            OpportunityKind::FloorRisk | OpportunityKind::FloorRecovery => DetectorCategory::FloorLine,
            OpportunityKind::FactoryControl
            | OpportunityKind::TimingControl
            | OpportunityKind::EndgameCount => DetectorCategory::Strategic,
        }
    }
}

/// What an opportunity is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    PatternLine(usize),
    WallRow(usize),
    WallColumn(usize),
    ColorSet(Color),
    WallCell { row: usize, col: usize },
    Floor,
    Factory(usize),
    Center,
    Supply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    /// Player whose board the opportunity concerns (the opponent for blocking).
    pub target_player: usize,
    pub target: Target,
    pub color: Option<Color>,
    /// In [0, 1].
    pub urgency: f64,
    pub tiles_needed: u8,
    pub tiles_available: u8,
    pub risk: RiskLevel,
    /// Points at stake, before any availability discount.
    pub value: f64,
    pub description: String,
    pub suggested_moves: Vec<Move>,
}

impl Opportunity {
    /// `value × min(1, available / needed)`.
    pub fn discounted_value(&self) -> f64 {
        if self.tiles_needed == 0 {
            return self.value;
        }
        self.value * (self.tiles_available as f64 / self.tiles_needed as f64).min(1.0)
    }

    pub fn suggests(&self, mv: &Move) -> bool {
        self.suggested_moves.contains(mv)
    }
}

/// Runs every detector for `player` and concatenates the results in
/// blocking, scoring, floor-line, strategic order.
pub fn detect_all(position: &Position, player: usize) -> Vec<Opportunity> {
    let ((blocking, scoring), (floor, strategic)) = rayon::join(
        || {
            rayon::join(
                || blocking::detect(position, player),
                || scoring_opportunities::detect(position, player),
            )
        },
        || {
            rayon::join(
                || floor_risk::detect(position, player),
                || strategic::detect(position, player),
            )
        },
    );

    let mut all = blocking;
    all.extend(scoring);
    all.extend(floor);
    all.extend(strategic);
    all
}

/// `player`'s legal moves matching `filter`, fewest floor tiles first.
pub(crate) fn cheapest_moves<F>(position: &Position, player: usize, filter: F) -> Vec<Move>
where
    F: Fn(&Move) -> bool,
{
    let mut moves: Vec<Move> = legal_moves_for(position, player)
        .into_iter()
        .filter(|mv| filter(mv))
        .collect();
    moves.sort_by_key(|mv| (mv.count_to_floor(), *mv));
    moves.truncate(MAX_SUGGESTIONS);
    moves
}

pub(crate) fn opponent_of(player: usize) -> usize {
    (player + 1) % crate::game::position::NUM_PLAYERS
}
