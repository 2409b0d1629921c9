//! Rollout policies used in the simulation step.
//!
//! A rollout plays the round out from a leaf and scores the resolved
//! position; values are `tanh(points / 10)` so they stay in [-1, 1].

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::position::{PatternLine, Position};
use crate::neural::NeuralEvaluator;
use crate::search::eval::{evaluate, evaluate_final, EvalWeights, POINT};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Points at which the value saturates to about ±0.76.
const VALUE_SCALE: f64 = 10.0;

pub trait RolloutPolicy: Send + Sync {
    /// Picks one of `moves` (never empty) in `position`.
    fn choose(&self, position: &Position, moves: &[Move], rng: &mut StdRng) -> Move;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutKind {
    Random,
    Heuristic,
    Neural,
}

/// Uniform random moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRollout;

impl RolloutPolicy for RandomRollout {
    fn choose(&self, _position: &Position, moves: &[Move], rng: &mut StdRng) -> Move {
        moves[rng.gen_range(0..moves.len())]
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Greedy on a cheap move score with ε-random exploration.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicRollout {
    pub epsilon: f64,
}

impl Default for HeuristicRollout {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

/// Tiles staged, a bonus for finishing a line, minus floor tiles.
pub fn quick_move_score(position: &Position, mv: &Move) -> i32 {
    let board = position.player(position.current_player());
    let mut score = 2 * mv.count_to_line() as i32 - 3 * mv.count_to_floor() as i32;
    if let Some(line) = mv.pattern_line_dest() {
        let filled = board.pattern_lines[line].count + mv.count_to_line();
        if filled == PatternLine::capacity(line) {
            score += 3 + line as i32;
        }
    }
    score
}

impl RolloutPolicy for HeuristicRollout {
    fn choose(&self, position: &Position, moves: &[Move], rng: &mut StdRng) -> Move {
        if rng.gen::<f64>() < self.epsilon {
            return moves[rng.gen_range(0..moves.len())];
        }
        let scores: Vec<i32> = moves.iter().map(|mv| quick_move_score(position, mv)).collect();
        let best = scores.iter().copied().max().unwrap_or(0);
        let candidates: Vec<usize> = (0..moves.len()).filter(|&i| scores[i] == best).collect();
        moves[candidates[rng.gen_range(0..candidates.len())]]
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Samples moves from the network policy; falls back to the heuristic when
/// the network is unavailable.
#[derive(Clone)]
pub struct NeuralRollout {
    pub evaluator: Arc<NeuralEvaluator>,
    pub fallback: HeuristicRollout,
}

impl NeuralRollout {
    pub fn new(evaluator: Arc<NeuralEvaluator>) -> Self {
        Self {
            evaluator,
            fallback: HeuristicRollout::default(),
        }
    }
}

impl RolloutPolicy for NeuralRollout {
    fn choose(&self, position: &Position, moves: &[Move], rng: &mut StdRng) -> Move {
        let Ok(output) = self.evaluator.evaluate(position) else {
            return self.fallback.choose(position, moves, rng);
        };
        let mut threshold = rng.gen::<f32>();
        for (mv, p) in &output.policy {
            if threshold < *p {
                return *mv;
            }
            threshold -= p;
        }
        output
            .policy
            .last()
            .map_or_else(|| self.fallback.choose(position, moves, rng), |(mv, _)| *mv)
    }

    fn name(&self) -> &'static str {
        "neural"
    }
}

pub fn to_value(centi_points: i32) -> f64 {
    (centi_points as f64 / (POINT as f64 * VALUE_SCALE)).tanh()
}

/// Value of a position whose round has ended, from `player`'s point of view.
pub fn terminal_value(position: &Position, player: usize, weights: &EvalWeights) -> f64 {
    let resolution = position.resolve_round();
    let centi = if resolution.game_over {
        evaluate_final(&resolution.position, player)
    } else {
        evaluate(&resolution.position, player, weights)
    };
    to_value(centi)
}

/// Plays the round out with `policy` and returns the value for `player`.
pub fn rollout(
    position: &Position,
    policy: &dyn RolloutPolicy,
    rng: &mut StdRng,
    player: usize,
    weights: &EvalWeights,
) -> f64 {
    let mut current = position.clone();
    while !current.is_round_over() {
        let moves = get_legal_moves(&current);
        if moves.is_empty() {
            break;
        }
        let mv = policy.choose(&current, &moves, rng);
        match current.apply(&mv) {
            Ok(next) => current = next,
            Err(_) => break,
        }
    }
    if current.is_round_over() {
        terminal_value(&current, player, weights)
    } else {
        to_value(evaluate(&current, player, weights))
    }
}

pub fn build_policy(kind: RolloutKind, evaluator: Option<Arc<NeuralEvaluator>>) -> Box<dyn RolloutPolicy> {
    match kind {
        RolloutKind::Random => Box::new(RandomRollout),
        RolloutKind::Heuristic => Box::new(HeuristicRollout::default()),
        RolloutKind::Neural => match evaluator {
            Some(evaluator) => Box::new(NeuralRollout::new(evaluator)),
            None => Box::new(HeuristicRollout::default()),
        },
    }
}
