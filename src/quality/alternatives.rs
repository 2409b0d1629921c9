//! Ranked alternatives to the best move, each with a one-line trade-off.

use crate::patterns::RiskLevel;
use crate::quality::aggregator::{Candidate, QualityAssessment};
use crate::quality::components::ComponentScores;
use serde::{Deserialize, Serialize};

/// Point differences below this read as "about the same".
const POINT_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    #[serde(flatten)]
    pub assessment: QualityAssessment,
    /// Quality points behind the best move.
    pub quality_gap: f64,
    pub trade_off: String,
}

/// Takes the first `max` of `ranked` (already sorted by quality) and explains
/// each against `best`.
pub(crate) fn build_alternatives(best: &Candidate, ranked: &[Candidate], max: usize) -> Vec<Alternative> {
    ranked
        .iter()
        .take(max)
        .map(|alt| Alternative {
            assessment: alt.assessment.clone(),
            quality_gap: best.assessment.quality_score - alt.assessment.quality_score,
            trade_off: trade_off(best, alt),
        })
        .collect()
}

fn components(c: &ComponentScores) -> [(f64, &'static str, &'static str); 6] {
    [
        (c.blocking, "blocks the opponent harder", "blocking"),
        (c.scoring, "builds more wall points", "scoring"),
        (c.floor_line, "avoids floor-line risk", "floor safety"),
        (c.strategic, "keeps better strategic options", "strategy"),
        (c.positional, "is preferred by the search engines", "position"),
        (c.opponent_impact, "hurts the opponent's scoring more", "opponent impact"),
    ]
}

pub(crate) fn trade_off(best: &Candidate, alt: &Candidate) -> String {
    let points = match (best.search_points, alt.search_points) {
        (Some(b), Some(a)) if b - a > POINT_EPSILON => format!("scores {:.1} fewer points", b - a),
        (Some(b), Some(a)) if a - b > POINT_EPSILON => format!("scores {:.1} more points", a - b),
        (Some(_), Some(_)) => "scores about the same".to_string(),
        _ => format!(
            "rates {:.1} quality points lower",
            best.assessment.quality_score - alt.assessment.quality_score
        ),
    };

    let best_parts = components(&best.assessment.component_scores);
    let alt_parts = components(&alt.assessment.component_scores);
    let mut advantage: Option<(f64, &'static str)> = None;
    let mut weakness: Option<(f64, &'static str)> = None;
    for ((b, _, name), (a, phrase, _)) in best_parts.iter().zip(alt_parts.iter()) {
        let delta = a - b;
        if delta > advantage.map_or(0.0, |(d, _)| d) {
            advantage = Some((delta, *phrase));
        }
        if -delta > weakness.map_or(0.0, |(d, _)| d) {
            weakness = Some((-delta, *name));
        }
    }

    let mut line = match (advantage, weakness) {
        (Some((_, phrase)), _) => format!("{} but {}", points, phrase),
        (None, Some((_, name))) => format!("{} and is weaker on {}", points, name),
        (None, None) => points,
    };
    if alt.assessment.risk_level > best.assessment.risk_level {
        let risk = match alt.assessment.risk_level {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        };
        line.push_str(&format!(", with {} floor risk", risk));
    }
    line
}
