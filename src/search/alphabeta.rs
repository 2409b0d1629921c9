//! Alpha-Beta search with iterative deepening and a transposition table.
//!
//! # Features
//!
//! - Iterative deepening from depth 1; the previous iteration's best move is
//!   searched first
//! - Transposition table keyed by the structural hash, owned by the searcher
//! - The end of a round is a terminal node: the round is resolved and scored
//! - Time budget and [`CancelToken`] polled every 1024 nodes; an interrupted
//!   iteration is discarded and the last completed depth is reported
//!
//! Scores are in centi-points from the point of view of the player to move.

use super::cancel::CancelToken;
use super::eval::{evaluate, evaluate_final, EvalWeights};
use super::tt::{EntryType, TranspositionTable};
use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::position::Position;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::{Duration, Instant};

/// Infinity score for alpha-beta bounds
pub const INF: i32 = 1_000_000_000;

/// Nodes between two polls of the clock and the cancel token.
const CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Target depth of iterative deepening.
    pub max_depth: u8,
    /// Wall-clock budget; `None` searches to `max_depth`.
    pub time_limit_ms: Option<u64>,
    /// Minimum transposition table size, in entries.
    pub tt_entries: usize,
    /// Depth used to score every root move for the quality aggregator.
    pub root_scoring_depth: u8,
    pub weights: EvalWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            time_limit_ms: None,
            tt_entries: 1 << 16,
            root_scoring_depth: 2,
            weights: EvalWeights::default(),
        }
    }
}

/// Search statistics for diagnostics and tuning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub beta_cutoffs: u64,
    pub tt_probes: u64,
    pub tt_score_hits: u64,
    pub terminal_nodes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlphaBetaResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub principal_variation: Vec<Move>,
    pub nodes: u64,
    pub time_spent_ms: u64,
    /// Deepest fully searched iteration (0 when only the static fallback ran).
    pub completed_depth: u8,
    /// Whether the budget or the cancel token cut the search short.
    pub stopped: bool,
    pub stats: SearchStats,
}

/// Score of one root move at a fixed depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RootMoveScore {
    pub mv: Move,
    pub score: i32,
    /// Depth actually searched; 0 means static evaluation only.
    pub depth: u8,
}

pub struct Searcher {
    config: SearchConfig,
    tt: TranspositionTable,
    cancel: CancelToken,
    nodes: u64,
    stats: SearchStats,
    start: Instant,
    deadline: Option<Instant>,
    stopped: bool,
}

impl Searcher {
    pub fn new(config: SearchConfig, cancel: CancelToken) -> Self {
        let tt = TranspositionTable::new(config.tt_entries);
        Self {
            config,
            tt,
            cancel,
            nodes: 0,
            stats: SearchStats::default(),
            start: Instant::now(),
            deadline: None,
            stopped: false,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn begin(&mut self) {
        self.nodes = 0;
        self.stats = SearchStats::default();
        self.start = Instant::now();
        self.deadline = self
            .config
            .time_limit_ms
            .map(|ms| self.start + Duration::from_millis(ms));
        self.stopped = false;
        self.check_limits();
    }

    fn check_limits(&mut self) {
        if self.cancel.is_cancelled() {
            self.stopped = true;
        } else if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.stopped = true;
            }
        }
    }

    /// Iterative deepening up to `max_depth`.
    pub fn search(&mut self, position: &Position) -> AlphaBetaResult {
        self.begin();
        let mut best_move = None;
        let mut best_score = 0;
        let mut completed_depth = 0;
        let mut principal_variation = Vec::new();

        if !position.is_round_over() {
            for depth in 1..=self.config.max_depth {
                self.check_limits();
                if self.stopped {
                    break;
                }
                self.tt.new_generation();
                let (score, mv) = self.search_root(position, depth);
                if self.stopped {
                    break;
                }
                best_move = mv;
                best_score = score;
                completed_depth = depth;
                principal_variation = self.extract_pv(position, depth);
                debug!(
                    "🔍 depth {} score {} nodes {} best {}",
                    depth,
                    score,
                    self.nodes,
                    mv.map_or_else(|| "-".to_string(), |m| m.to_string())
                );
            }

            if best_move.is_none() {
                // nothing completed: fall back to the best move by static evaluation
                if let Some((mv, score)) = self.static_best(position) {
                    best_move = Some(mv);
                    best_score = score;
                    principal_variation = vec![mv];
                }
            }
        }

        AlphaBetaResult {
            best_move,
            score: best_score,
            principal_variation,
            nodes: self.nodes,
            time_spent_ms: self.start.elapsed().as_millis() as u64,
            completed_depth,
            stopped: self.stopped,
            stats: self.stats.clone(),
        }
    }

    /// Scores every legal root move at `depth` with a full window. Moves the
    /// budget did not reach are scored statically and reported at depth 0.
    pub fn score_root_moves(&mut self, position: &Position, depth: u8) -> Vec<RootMoveScore> {
        self.begin();
        self.tt.new_generation();
        let mut scores = Vec::new();
        for mv in get_legal_moves(position) {
            let Ok(child) = position.apply(&mv) else { continue };
            if depth > 0 && !self.stopped {
                let score = -self.negamax(&child, depth - 1, -INF, INF);
                if !self.stopped {
                    scores.push(RootMoveScore { mv, score, depth });
                    continue;
                }
            }
            scores.push(RootMoveScore {
                mv,
                score: -self.static_value(&child),
                depth: 0,
            });
        }
        scores
    }

    fn static_value(&mut self, position: &Position) -> i32 {
        if position.is_round_over() {
            self.terminal_score(position)
        } else {
            evaluate(position, position.current_player(), &self.config.weights)
        }
    }

    fn static_best(&mut self, position: &Position) -> Option<(Move, i32)> {
        let mut best: Option<(Move, i32)> = None;
        for mv in self.ordered_moves(position, None) {
            let Ok(child) = position.apply(&mv) else { continue };
            let score = -self.static_value(&child);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        best
    }

    /// Value of a position whose round has ended, for its player to move.
    fn terminal_score(&mut self, position: &Position) -> i32 {
        self.stats.terminal_nodes += 1;
        let pov = position.current_player();
        let resolution = position.resolve_round();
        if resolution.game_over {
            evaluate_final(&resolution.position, pov)
        } else {
            evaluate(&resolution.position, pov, &self.config.weights)
        }
    }

    /// Legal moves, fewest floor tiles and most tiles staged first, with the
    /// hash move (if any) in front.
    fn ordered_moves(&self, position: &Position, hash_move: Option<Move>) -> Vec<Move> {
        let mut moves = get_legal_moves(position);
        moves.sort_by_key(|mv| (mv.count_to_floor(), Reverse(mv.count_to_line())));
        if let Some(hm) = hash_move {
            if let Some(idx) = moves.iter().position(|m| *m == hm) {
                let mv = moves.remove(idx);
                moves.insert(0, mv);
            }
        }
        moves
    }

    fn search_root(&mut self, position: &Position, depth: u8) -> (i32, Option<Move>) {
        let hash = position.structural_hash();
        let moves = self.ordered_moves(position, self.tt.best_move(hash));
        let mut alpha = -INF;
        let beta = INF;
        let mut best_score = -INF;
        let mut best_move = None;

        for mv in moves {
            let Ok(child) = position.apply(&mv) else { continue };
            let score = -self.negamax(&child, depth - 1, -beta, -alpha);
            if self.stopped {
                return (best_score, best_move);
            }
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_score);
        }

        self.tt.store(hash, depth, best_score, EntryType::Exact, best_move);
        (best_score, best_move)
    }

    fn negamax(&mut self, position: &Position, depth: u8, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if self.nodes % CHECK_INTERVAL == 0 {
            self.check_limits();
        }
        if self.stopped {
            return 0;
        }

        if position.is_round_over() {
            return self.terminal_score(position);
        }
        if depth == 0 {
            return evaluate(position, position.current_player(), &self.config.weights);
        }

        let hash = position.structural_hash();
        self.stats.tt_probes += 1;
        let probe = self.tt.probe(hash, depth, alpha, beta);
        if let Some(score) = probe.score {
            self.stats.tt_score_hits += 1;
            return score;
        }

        let alpha_orig = alpha;
        let mut best_score = -INF;
        let mut best_move = None;
        for mv in self.ordered_moves(position, probe.best_move) {
            let Ok(child) = position.apply(&mv) else { continue };
            let score = -self.negamax(&child, depth - 1, -beta, -alpha);
            if self.stopped {
                return 0;
            }
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_score);
            if alpha >= beta {
                self.stats.beta_cutoffs += 1;
                break;
            }
        }

        let entry_type = if best_score <= alpha_orig {
            EntryType::UpperBound
        } else if best_score >= beta {
            EntryType::LowerBound
        } else {
            EntryType::Exact
        };
        self.tt.store(hash, depth, best_score, entry_type, best_move);
        best_score
    }

    fn extract_pv(&self, position: &Position, depth: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut current = position.clone();
        for _ in 0..depth {
            if current.is_round_over() {
                break;
            }
            let Some(mv) = self.tt.best_move(current.structural_hash()) else { break };
            match current.apply(&mv) {
                Ok(next) => {
                    pv.push(mv);
                    current = next;
                }
                Err(_) => break,
            }
        }
        pv
    }
}

/// One-shot alpha-beta search with a fresh table.
pub fn search(position: &Position, config: &SearchConfig, cancel: CancelToken) -> AlphaBetaResult {
    Searcher::new(config.clone(), cancel).search(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse;

    const POSITION: &str =
        "BBYR|----|KKWW|YRRR|----/FBYYK/B----|-----|-----|-K---|-----/R|--|YYY|----|-----/K/-----|W----|-----|-----|-----/-|BB|---|RR--|-----/-/7,3/2/0";

    fn config(depth: u8) -> SearchConfig {
        SearchConfig {
            max_depth: depth,
            tt_entries: 1 << 12,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_search_returns_legal_move_and_pv() {
        let position = parse(POSITION).unwrap();
        let result = search(&position, &config(2), CancelToken::new());
        let best = result.best_move.unwrap();
        assert!(get_legal_moves(&position).contains(&best));
        assert_eq!(result.completed_depth, 2);
        assert!(!result.stopped);
        assert_eq!(result.principal_variation.first(), Some(&best));
        assert!(result.nodes > 0);
    }

    #[test]
    fn test_search_is_deterministic() {
        let position = parse(POSITION).unwrap();
        let a = search(&position, &config(3), CancelToken::new());
        let b = search(&position, &config(3), CancelToken::new());
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
        assert_eq!(a.principal_variation, b.principal_variation);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn test_cancelled_search_still_returns_a_move() {
        let position = parse(POSITION).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let result = search(&position, &config(4), token);
        assert!(result.stopped);
        assert_eq!(result.completed_depth, 0);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn test_depth_one_matches_root_scores() {
        let position = parse(POSITION).unwrap();
        let mut searcher = Searcher::new(config(1), CancelToken::new());
        let result = searcher.search(&position);
        let scores = searcher.score_root_moves(&position, 1);
        let best = scores.iter().map(|s| s.score).max().unwrap();
        assert_eq!(result.score, best);
        assert!(scores.iter().all(|s| s.depth == 1));
    }

    #[test]
    fn test_round_end_is_terminal() {
        // one move left in the round: the only tiles are two blue in the center
        let position = parse(
            "----|----|----|----|----/BB/-----|-----|-----|-----|-----/-|--|---|----|-----/F/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/1/1",
        )
        .unwrap();
        let result = search(&position, &config(3), CancelToken::new());
        assert_eq!(result.completed_depth, 3);
        assert_eq!(result.principal_variation.len(), 1);
        // line 2 takes both tiles and tiles one blue: the best outcome
        assert_eq!(result.best_move.and_then(|m| m.pattern_line_dest()), Some(1));
    }
}
