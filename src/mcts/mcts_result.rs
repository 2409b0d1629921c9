use crate::game::moves::Move;
use serde::Serialize;

/// Visit statistics of one root move.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MoveStats {
    pub mv: Move,
    pub visits: u32,
    /// Mean value in [-1, 1] from the searching player's point of view
    pub mean_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MctsResult {
    /// Most visited root move
    pub best_move: Option<Move>,
    /// Mean value of `best_move`
    pub score: f64,
    /// Most-visited line from the root
    pub principal_variation: Vec<Move>,
    pub rollouts: u32,
    pub time_spent_ms: u64,
    /// Root moves in move order
    pub move_stats: Vec<MoveStats>,
    /// Whether the cancel token cut the search short
    pub stopped: bool,
}

impl MctsResult {
    pub fn visit_share(&self, mv: &Move) -> f64 {
        let total: u32 = self.move_stats.iter().map(|s| s.visits).sum();
        if total == 0 {
            return 0.0;
        }
        self.move_stats
            .iter()
            .find(|s| s.mv == *mv)
            .map_or(0.0, |s| s.visits as f64 / total as f64)
    }

    pub fn stats_for(&self, mv: &Move) -> Option<&MoveStats> {
        self.move_stats.iter().find(|s| s.mv == *mv)
    }
}
