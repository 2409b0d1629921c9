//! Quality aggregator: runs the detectors and the engines over one position
//! and turns their output into a ranked verdict for every legal move.

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::notation;
use crate::game::position::{Position, NUM_PLAYERS};
use crate::mcts::rollout::build_policy;
use crate::mcts::{mcts_search, MctsBudget, MctsConfig, MctsResult};
use crate::neural::{NeuralConfig, NeuralEvaluator, NeuralOutput};
use crate::patterns::floor_risk::floor_slots_added;
use crate::patterns::{detect_all, opponent_of, scoring_opportunities, Opportunity, RiskLevel};
use crate::quality::alternatives::{build_alternatives, Alternative};
use crate::quality::components::{
    normalise, opponent_impact, score_move, ComponentScores, EngineScores, MoveScoring,
    OPPONENT_WEIGHT, POSITIONAL_WEIGHT, STRATEGIC_WEIGHT, TACTICAL_WEIGHT,
};
use crate::quality::tier::QualityTier;
use crate::search::eval::POINT;
use crate::search::{AlphaBetaResult, CancelToken, RootMoveScore, SearchConfig, Searcher};
use crate::{AnalyzerError, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Alternatives returned when neither the config nor the request says otherwise.
pub const DEFAULT_ALTERNATIVES: usize = 3;
pub const MAX_ALTERNATIVES: usize = 5;

/// Confidence multiplier applied per engine that could not run.
const UNAVAILABLE_ENGINE_FACTOR: f64 = 0.85;
/// Confidence multiplier when alpha-beta stopped short of its target depth.
const SHALLOW_SEARCH_FACTOR: f64 = 0.9;

// ============================================================================
// CONFIGURATION AND DATA CONTRACT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub search: SearchConfig,
    pub mcts: MctsConfig,
    pub neural: NeuralConfig,
    pub include_alternatives: bool,
    pub max_alternatives: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            // Rollout budgets keep the verdict reproducible.
            mcts: MctsConfig::with_rollouts(400),
            neural: NeuralConfig::default(),
            include_alternatives: true,
            max_alternatives: DEFAULT_ALTERNATIVES,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Copy of this configuration with the request's overrides applied.
    pub fn with_request(&self, request: &AnalysisRequest) -> Self {
        let mut config = self.clone();
        if let Some(budget) = &request.search_budget {
            if let Some(depth) = budget.max_depth {
                config.search.max_depth = depth;
            }
            if let Some(ms) = budget.time_limit_ms {
                config.search.time_limit_ms = Some(ms);
            }
            if let Some(rollouts) = budget.mcts_rollouts {
                config.mcts.budget = MctsBudget::Rollouts(rollouts);
            }
        }
        if let Some(include) = request.include_alternatives {
            config.include_alternatives = include;
        }
        if let Some(max) = request.max_alternatives {
            config.max_alternatives = max;
        }
        config.max_alternatives = config.max_alternatives.min(MAX_ALTERNATIVES);
        config
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_depth: Option<u8>,
    pub time_limit_ms: Option<u64>,
    pub mcts_rollouts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    /// Position in notation form.
    pub position: String,
    pub player_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_budget: Option<SearchBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_alternatives: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_alternatives: Option<usize>,
}

impl AnalysisRequest {
    pub fn new(position: impl Into<String>, player_index: usize) -> Self {
        Self {
            position: position.into(),
            player_index,
            search_budget: None,
            include_alternatives: None,
            max_alternatives: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityAssessment {
    #[serde(rename = "move")]
    pub mv: Move,
    pub quality_tier: QualityTier,
    pub quality_score: f64,
    pub component_scores: ComponentScores,
    pub primary_reason: String,
    pub risk_level: RiskLevel,
    pub confidence: f64,
}

/// What one engine contributed to the verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineReport {
    pub engine: String,
    pub available: bool,
    pub best_move: Option<Move>,
    /// Centi-points for alpha-beta, mean value for MCTS, value head for neural.
    pub score: Option<f64>,
    /// Completed depth for alpha-beta, rollouts for MCTS.
    pub effort: u64,
    pub time_spent_ms: u64,
    pub stopped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EngineReport {
    fn unavailable(engine: &str, reason: String) -> Self {
        Self {
            engine: engine.to_string(),
            available: false,
            best_move: None,
            score: None,
            effort: 0,
            time_spent_ms: 0,
            stopped: false,
            note: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    pub best: QualityAssessment,
    pub alternatives: Vec<Alternative>,
    pub legal_moves_analyzed: usize,
    pub analysis_time_ms: u64,
    pub engines: Vec<EngineReport>,
}

/// An assessed move together with the raw search evaluation behind it.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub assessment: QualityAssessment,
    /// Alpha-beta root score in points, when alpha-beta ran.
    pub search_points: Option<f64>,
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Parses and validates the request, then analyses the position.
pub fn analyze(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
    evaluator: Option<Arc<NeuralEvaluator>>,
) -> Result<AnalysisResponse> {
    let position = notation::parse(&request.position)?;
    let config = config.with_request(request);
    analyze_position(&position, request.player_index, &config, evaluator, &CancelToken::new())
}

pub fn analyze_position(
    position: &Position,
    player: usize,
    config: &AnalysisConfig,
    evaluator: Option<Arc<NeuralEvaluator>>,
    cancel: &CancelToken,
) -> Result<AnalysisResponse> {
    if player >= NUM_PLAYERS {
        return Err(AnalyzerError::InvalidRequest(format!(
            "player index {} out of range",
            player
        )));
    }
    if player != position.current_player() {
        return Err(AnalyzerError::InvalidRequest(format!(
            "player {} is not to move (player {} is)",
            player,
            position.current_player()
        )));
    }
    let moves = get_legal_moves(position);
    if moves.is_empty() {
        return Err(AnalyzerError::InvalidRequest(
            "no legal moves: the round is over".to_string(),
        ));
    }

    let start = Instant::now();
    info!("🔍 Analyzing {} legal moves for player {}", moves.len(), player);

    let evaluator = evaluator.filter(|e| e.is_available());
    let (opportunities, (alpha_beta, (mcts, neural))) = rayon::join(
        || detect_all(position, player),
        || {
            rayon::join(
                || run_alpha_beta(position, &config.search, cancel),
                || {
                    rayon::join(
                        || run_mcts(position, &config.mcts, evaluator.clone(), cancel),
                        || run_neural(position, &moves, evaluator.as_deref()),
                    )
                },
            )
        },
    );
    debug!("📊 {} opportunities detected", opportunities.len());

    let mut engines = Vec::with_capacity(3);
    let mut unavailable = 0;
    let ab_scores = match &alpha_beta {
        Some((result, roots)) => {
            engines.push(alpha_beta_report(result));
            Some(root_scores(roots))
        }
        None => {
            unavailable += 1;
            engines.push(EngineReport::unavailable("alpha_beta", "no search result".to_string()));
            None
        }
    };
    let mcts_scores = match mcts {
        Ok(result) => {
            engines.push(mcts_report(&result));
            Some(visit_scores(&result))
        }
        Err(e) => {
            warn!("⚠️ MCTS unavailable, redistributing its weight: {}", e);
            unavailable += 1;
            engines.push(EngineReport::unavailable("mcts", e.to_string()));
            None
        }
    };
    let neural_scores = match neural {
        Ok((root, scores)) => {
            engines.push(EngineReport {
                engine: "neural".to_string(),
                available: true,
                best_move: root
                    .policy
                    .iter()
                    .fold(None, |best: Option<&(Move, f32)>, entry| match best {
                        Some(b) if b.1 >= entry.1 => best,
                        _ => Some(entry),
                    })
                    .map(|(mv, _)| *mv),
                score: Some(root.value as f64),
                effort: moves.len() as u64,
                time_spent_ms: 0,
                stopped: false,
                note: None,
            });
            Some(scores)
        }
        Err(e) => {
            warn!("⚠️ Neural evaluator unavailable, redistributing its weight: {}", e);
            unavailable += 1;
            engines.push(EngineReport::unavailable("neural", e.to_string()));
            None
        }
    };

    let mut confidence = UNAVAILABLE_ENGINE_FACTOR.powi(unavailable);
    if let Some((result, _)) = &alpha_beta {
        if result.completed_depth < config.search.max_depth {
            confidence *= SHALLOW_SEARCH_FACTOR;
        }
    }

    let opponent = opponent_of(player);
    let opponent_before = best_scoring_chance(position, opponent);

    let mut candidates: Vec<Candidate> = moves
        .par_iter()
        .map(|mv| {
            let engine_scores = EngineScores {
                alpha_beta: ab_scores.as_ref().and_then(|s| s.get(mv)).map(|(n, _)| *n),
                mcts: mcts_scores.as_ref().and_then(|s| s.get(mv)).copied(),
                neural: neural_scores.as_ref().and_then(|s| s.get(mv)).copied(),
            };
            let search_points = ab_scores.as_ref().and_then(|s| s.get(mv)).map(|(_, p)| *p);
            let opponent_after = position
                .apply(mv)
                .map(|child| best_scoring_chance(&child, opponent))
                .unwrap_or(opponent_before);
            let impact = opponent_impact(opponent_before, opponent_after);
            let scoring = score_move(position, &opportunities, mv, &engine_scores, impact);
            let primary_reason = primary_reason(
                position,
                mv,
                &scoring,
                search_points,
                opponent_before,
                opponent_after,
            );
            let quality_score = scoring.components.quality_score();
            Candidate {
                assessment: QualityAssessment {
                    mv: *mv,
                    quality_tier: QualityTier::from_score(quality_score),
                    quality_score,
                    component_scores: scoring.components,
                    primary_reason,
                    risk_level: scoring.risk,
                    confidence,
                },
                search_points,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.assessment
            .quality_score
            .total_cmp(&a.assessment.quality_score)
            .then_with(|| a.assessment.mv.cmp(&b.assessment.mv))
    });

    let legal_moves_analyzed = candidates.len();
    let mut ranked = candidates.into_iter();
    let best = ranked
        .next()
        .ok_or_else(|| AnalyzerError::InvalidRequest("no legal moves to assess".to_string()))?;
    let rest: Vec<Candidate> = ranked.collect();
    let alternatives = if config.include_alternatives {
        build_alternatives(&best, &rest, config.max_alternatives)
    } else {
        Vec::new()
    };

    let analysis_time_ms = start.elapsed().as_millis() as u64;
    info!(
        "✅ Best move {} ({}, {:.1}) in {} ms",
        best.assessment.mv, best.assessment.quality_tier, best.assessment.quality_score, analysis_time_ms
    );

    Ok(AnalysisResponse {
        best: best.assessment,
        alternatives,
        legal_moves_analyzed,
        analysis_time_ms,
        engines,
    })
}

// ============================================================================
// ENGINE RUNS
// ============================================================================

fn run_alpha_beta(
    position: &Position,
    config: &SearchConfig,
    cancel: &CancelToken,
) -> Option<(AlphaBetaResult, Vec<RootMoveScore>)> {
    let mut searcher = Searcher::new(config.clone(), cancel.clone());
    let result = searcher.search(position);
    let roots = searcher.score_root_moves(position, config.root_scoring_depth);
    if roots.is_empty() {
        return None;
    }
    Some((result, roots))
}

fn run_mcts(
    position: &Position,
    config: &MctsConfig,
    evaluator: Option<Arc<NeuralEvaluator>>,
    cancel: &CancelToken,
) -> Result<MctsResult> {
    let policy = build_policy(config.rollout_policy, evaluator);
    mcts_search(position, config, policy.as_ref(), cancel)
}

/// Root policy plus a per-move score: the child value from the mover's point
/// of view blended with the move's policy share.
fn run_neural(
    position: &Position,
    moves: &[Move],
    evaluator: Option<&NeuralEvaluator>,
) -> Result<(NeuralOutput, HashMap<Move, f64>)> {
    let evaluator = evaluator.ok_or_else(|| {
        AnalyzerError::EngineUnavailable("neural weights not loaded".to_string())
    })?;
    let root = evaluator.evaluate(position)?;
    let mover = position.current_player();
    let children: Vec<(Move, Position)> = moves
        .iter()
        .filter_map(|mv| position.apply(mv).ok().map(|child| (*mv, child)))
        .collect();
    let child_positions: Vec<Position> = children.iter().map(|(_, p)| p.clone()).collect();
    let outputs = evaluator.evaluate_batch(&child_positions)?;

    let max_prob = root.policy.iter().map(|(_, p)| *p).fold(0.0f32, f32::max);
    let scores = children
        .iter()
        .zip(outputs)
        .map(|((mv, child), out)| {
            let value = f64::from(if child.current_player() == mover {
                out.value
            } else {
                -out.value
            });
            let prior = if max_prob > 0.0 {
                (root.probability(mv) / max_prob) as f64
            } else {
                0.0
            };
            (*mv, 50.0 * (value + 1.0) / 2.0 + 50.0 * prior)
        })
        .collect();
    Ok((root, scores))
}

/// Normalised score and raw points per root move.
fn root_scores(roots: &[RootMoveScore]) -> HashMap<Move, (f64, f64)> {
    let raw: Vec<f64> = roots.iter().map(|r| r.score as f64).collect();
    roots
        .iter()
        .zip(normalise(&raw))
        .map(|(r, n)| (r.mv, (n, r.score as f64 / POINT as f64)))
        .collect()
}

fn visit_scores(result: &MctsResult) -> HashMap<Move, f64> {
    let max_visits = result.move_stats.iter().map(|s| s.visits).max().unwrap_or(0);
    result
        .move_stats
        .iter()
        .map(|s| {
            let score = if max_visits == 0 {
                50.0
            } else {
                100.0 * s.visits as f64 / max_visits as f64
            };
            (s.mv, score)
        })
        .collect()
}

fn alpha_beta_report(result: &AlphaBetaResult) -> EngineReport {
    EngineReport {
        engine: "alpha_beta".to_string(),
        available: true,
        best_move: result.best_move,
        score: Some(result.score as f64),
        effort: result.completed_depth as u64,
        time_spent_ms: result.time_spent_ms,
        stopped: result.stopped,
        note: None,
    }
}

fn mcts_report(result: &MctsResult) -> EngineReport {
    EngineReport {
        engine: "mcts".to_string(),
        available: true,
        best_move: result.best_move,
        score: Some(result.score),
        effort: result.rollouts as u64,
        time_spent_ms: result.time_spent_ms,
        stopped: result.stopped,
        note: None,
    }
}

// ============================================================================
// EXPLANATIONS
// ============================================================================

/// The opponent's most valuable scoring opportunity, in discounted points.
fn best_scoring_chance(position: &Position, opponent: usize) -> f64 {
    scoring_opportunities::detect(position, opponent)
        .iter()
        .map(Opportunity::discounted_value)
        .fold(0.0, f64::max)
}

fn primary_reason(
    position: &Position,
    mv: &Move,
    scoring: &MoveScoring<'_>,
    search_points: Option<f64>,
    opponent_before: f64,
    opponent_after: f64,
) -> String {
    let c = &scoring.components;
    let contributions = [
        TACTICAL_WEIGHT * c.tactical(),
        STRATEGIC_WEIGHT * c.strategic,
        POSITIONAL_WEIGHT * c.positional,
        OPPONENT_WEIGHT * c.opponent_impact,
    ];
    let top = contributions
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if *v > contributions[best] { i } else { best });

    match top {
        0 => match scoring.tactical_driver {
            Some(opportunity) => opportunity.description.clone(),
            None => format!("Takes {} {} safely", mv.tiles_taken(), mv.color()),
        },
        1 => {
            if scoring.dead_commitment {
                format!("Commits {} to a color set that can no longer be completed", mv.color())
            } else if let Some(opportunity) = scoring.strategic_driver {
                opportunity.description.clone()
            } else if floor_slots_added(position, mv) == 0 {
                "Keeps the floor line clean".to_string()
            } else {
                "Limits floor-line exposure".to_string()
            }
        }
        2 => match search_points {
            Some(points) => format!("Search evaluation {:+.1} points", points),
            None => "Preferred by the search engines".to_string(),
        },
        _ => format!(
            "Cuts the opponent's best scoring chance from {:.1} to {:.1} points",
            opponent_before, opponent_after
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quick_config() -> AnalysisConfig {
        AnalysisConfig {
            search: SearchConfig {
                max_depth: 2,
                root_scoring_depth: 1,
                ..SearchConfig::default()
            },
            mcts: MctsConfig::with_rollouts(60),
            ..AnalysisConfig::default()
        }
    }

    fn opening() -> Position {
        let mut rng = StdRng::seed_from_u64(3);
        Position::new_game(&mut rng)
    }

    #[test]
    fn test_analysis_is_reproducible() {
        let position = opening();
        let config = quick_config();
        let a = analyze_position(&position, 0, &config, None, &CancelToken::new()).unwrap();
        let b = analyze_position(&position, 0, &config, None, &CancelToken::new()).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.alternatives, b.alternatives);
        assert_eq!(a.legal_moves_analyzed, get_legal_moves(&position).len());
    }

    #[test]
    fn test_best_is_top_ranked_and_alternatives_bounded() {
        let position = opening();
        let response =
            analyze_position(&position, 0, &quick_config(), None, &CancelToken::new()).unwrap();
        assert_eq!(response.alternatives.len(), DEFAULT_ALTERNATIVES);
        for alt in &response.alternatives {
            assert!(alt.assessment.quality_score <= response.best.quality_score);
            assert!(!alt.trade_off.is_empty());
        }
        assert!((0.0..=100.0).contains(&response.best.quality_score));
        assert_eq!(
            response.best.quality_tier,
            QualityTier::from_score(response.best.quality_score)
        );
    }

    #[test]
    fn test_missing_neural_reduces_confidence() {
        let position = opening();
        let response =
            analyze_position(&position, 0, &quick_config(), None, &CancelToken::new()).unwrap();
        let neural = response.engines.iter().find(|e| e.engine == "neural").unwrap();
        assert!(!neural.available);
        assert!(response.best.confidence <= UNAVAILABLE_ENGINE_FACTOR + 1e-9);
    }

    #[test]
    fn test_wrong_player_is_rejected() {
        let position = opening();
        let result = analyze_position(&position, 1, &quick_config(), None, &CancelToken::new());
        assert_matches!(result, Err(AnalyzerError::InvalidRequest(_)));
        let result = analyze_position(&position, 7, &quick_config(), None, &CancelToken::new());
        assert_matches!(result, Err(AnalyzerError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_overrides_and_clamps() {
        let mut request = AnalysisRequest::new("x", 0);
        request.max_alternatives = Some(9);
        request.search_budget = Some(SearchBudget {
            max_depth: Some(1),
            time_limit_ms: None,
            mcts_rollouts: Some(10),
        });
        let config = AnalysisConfig::default().with_request(&request);
        assert_eq!(config.max_alternatives, MAX_ALTERNATIVES);
        assert_eq!(config.search.max_depth, 1);
        assert_eq!(config.mcts.budget, MctsBudget::Rollouts(10));
    }

    #[test]
    fn test_small_alternative_requests_are_honoured() {
        let position = opening();
        let mut request = AnalysisRequest::new(position.to_string(), 0);
        request.max_alternatives = Some(1);
        let config = quick_config().with_request(&request);
        assert_eq!(config.max_alternatives, 1);
        let response = analyze_position(&position, 0, &config, None, &CancelToken::new()).unwrap();
        assert_eq!(response.alternatives.len(), 1);

        request.max_alternatives = Some(0);
        let response = analyze(&request, &quick_config(), None).unwrap();
        assert!(response.alternatives.is_empty());

        request.max_alternatives = None;
        let config = quick_config().with_request(&request);
        assert_eq!(config.max_alternatives, DEFAULT_ALTERNATIVES);
    }

    #[test]
    fn test_malformed_notation_is_rejected() {
        let request = AnalysisRequest::new("not a position", 0);
        let result = analyze(&request, &quick_config(), None);
        assert_matches!(result, Err(AnalyzerError::MalformedPosition(_)));
    }

    #[test]
    fn test_request_json_contract() {
        let json = r#"{"position":"p","player_index":1,"max_alternatives":4}"#;
        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.player_index, 1);
        assert_eq!(request.max_alternatives, Some(4));
        assert!(request.search_budget.is_none());
    }
}
