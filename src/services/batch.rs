//! Batch requests: analysis mode presets and the positions a batch runs over.

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::notation;
use crate::game::position::Position;
use crate::mcts::MctsConfig;
use crate::quality::aggregator::{AnalysisConfig, AnalysisResponse};
use crate::search::SearchConfig;
use crate::{AnalyzerError, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most random moves played from the opening when sampling a position.
const MAX_SAMPLE_PLIES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Quick,
    Standard,
    Deep,
    Exhaustive,
}

impl AnalysisMode {
    /// Budget preset for the mode.
    pub fn config(self) -> AnalysisConfig {
        let base = AnalysisConfig::default();
        match self {
            AnalysisMode::Quick => AnalysisConfig {
                search: SearchConfig {
                    max_depth: 1,
                    root_scoring_depth: 1,
                    ..SearchConfig::default()
                },
                mcts: MctsConfig::with_rollouts(100),
                ..base
            },
            AnalysisMode::Standard => base,
            AnalysisMode::Deep => AnalysisConfig {
                search: SearchConfig {
                    max_depth: 4,
                    time_limit_ms: Some(2_000),
                    tt_entries: 1 << 18,
                    ..SearchConfig::default()
                },
                mcts: MctsConfig::with_rollouts(1_500),
                max_alternatives: 4,
                ..base
            },
            AnalysisMode::Exhaustive => AnalysisConfig {
                search: SearchConfig {
                    max_depth: 6,
                    time_limit_ms: Some(5_000),
                    tt_entries: 1 << 20,
                    root_scoring_depth: 3,
                    ..SearchConfig::default()
                },
                mcts: MctsConfig::with_rollouts(5_000),
                max_alternatives: 5,
                ..base
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AnalysisMode::Quick => "quick",
            AnalysisMode::Standard => "standard",
            AnalysisMode::Deep => "deep",
            AnalysisMode::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisMode {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(AnalysisMode::Quick),
            "standard" => Ok(AnalysisMode::Standard),
            "deep" => Ok(AnalysisMode::Deep),
            "exhaustive" => Ok(AnalysisMode::Exhaustive),
            other => Err(AnalyzerError::InvalidRequest(format!("unknown analysis mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRequest {
    /// Number of positions to analyse. Sampled from random play when
    /// `positions` is empty, otherwise the first `position_count` given.
    pub position_count: usize,
    pub mode: AnalysisMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<String>,
    #[serde(default)]
    pub seed: u64,
}

impl BatchRequest {
    pub fn new(position_count: usize, mode: AnalysisMode) -> Self {
        Self {
            position_count,
            mode,
            max_workers: None,
            positions: Vec::new(),
            seed: 0,
        }
    }

    /// The positions to analyse, keyed by their notation.
    ///
    /// A line that does not parse stays in the batch as a failed entry so the
    /// rest of the batch still runs.
    pub fn resolve_positions(&self) -> Result<Vec<BatchPosition>> {
        if self.position_count == 0 {
            return Err(AnalyzerError::InvalidRequest(
                "a batch needs at least one position".to_string(),
            ));
        }
        if self.positions.is_empty() {
            return Ok(sample_positions(self.position_count, self.seed)
                .into_iter()
                .map(|p| BatchPosition {
                    key: notation::serialize(&p),
                    position: Ok(p),
                })
                .collect());
        }
        Ok(self
            .positions
            .iter()
            .take(self.position_count)
            .map(|text| match notation::parse(text) {
                Ok(position) => BatchPosition {
                    key: notation::serialize(&position),
                    position: Ok(position),
                },
                Err(e) => {
                    warn!("⚠️ Skipping unparsable batch position '{}': {}", text.trim(), e);
                    BatchPosition {
                        key: text.trim().to_string(),
                        position: Err(e.to_string()),
                    }
                }
            })
            .collect())
    }
}

/// One entry of a batch: its notation key and the parsed position, or the
/// reason the notation was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPosition {
    pub key: String,
    pub position: std::result::Result<Position, String>,
}

/// `count` first-round positions reached by random play from seeded openings.
/// Every position has the player to move still holding a legal move.
pub fn sample_positions(count: usize, seed: u64) -> Vec<Position> {
    (0..count as u64)
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i));
            let mut position = Position::new_game(&mut rng);
            let plies = rng.gen_range(0..=MAX_SAMPLE_PLIES);
            for _ in 0..plies {
                let moves = get_legal_moves(&position);
                if moves.is_empty() {
                    break;
                }
                let mv = moves[rng.gen_range(0..moves.len())];
                match position.apply(&mv) {
                    Ok(next) if !next.is_round_over() => position = next,
                    _ => break,
                }
            }
            position
        })
        .collect()
}

/// Outcome of one position in a batch, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionResult {
    /// Index of the position in the request.
    pub index: usize,
    pub position_key: String,
    pub response: Option<AnalysisResponse>,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_sampled_positions_are_playable_and_seeded() {
        let a = sample_positions(8, 5);
        let b = sample_positions(8, 5);
        assert_eq!(a, b);
        for position in &a {
            assert!(!position.is_round_over());
            assert!(!get_legal_moves(position).is_empty());
        }
    }

    #[test]
    fn test_mode_presets_scale_up() {
        let quick = AnalysisMode::Quick.config();
        let deep = AnalysisMode::Deep.config();
        assert!(quick.search.max_depth < deep.search.max_depth);
        assert_eq!(AnalysisMode::Standard.config(), AnalysisConfig::default());
        assert_eq!(AnalysisMode::Exhaustive.config().max_alternatives, 5);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Deep".parse::<AnalysisMode>().unwrap(), AnalysisMode::Deep);
        assert_matches!("fast".parse::<AnalysisMode>(), Err(AnalyzerError::InvalidRequest(_)));
        let request: BatchRequest =
            serde_json::from_str(r#"{"position_count":3,"mode":"exhaustive"}"#).unwrap();
        assert_eq!(request.mode, AnalysisMode::Exhaustive);
        assert_eq!(request.max_workers, None);
    }

    #[test]
    fn test_resolve_positions() {
        let request = BatchRequest::new(4, AnalysisMode::Quick);
        let positions = request.resolve_positions().unwrap();
        assert_eq!(positions.len(), 4);
        for entry in &positions {
            let position = entry.position.as_ref().unwrap();
            assert_eq!(&notation::serialize(position), &entry.key);
        }

        let empty = BatchRequest::new(0, AnalysisMode::Quick);
        assert_matches!(empty.resolve_positions(), Err(AnalyzerError::InvalidRequest(_)));
    }

    #[test]
    fn test_bad_notation_does_not_sink_the_batch() {
        let good = notation::serialize(&sample_positions(1, 3)[0]);
        let mut request = BatchRequest::new(3, AnalysisMode::Quick);
        request.positions = vec![good.clone(), " nonsense ".to_string(), good.clone()];
        let positions = request.resolve_positions().unwrap();
        assert_eq!(positions.len(), 3);
        assert!(positions[0].position.is_ok());
        assert_eq!(positions[1].key, "nonsense");
        assert!(positions[1].position.is_err());
        assert!(positions[2].position.is_ok());
    }
}
