//! UCT Monte-Carlo tree search.
//!
//! Each iteration selects a path with UCT, expands one new child when the
//! reached node is not fully expanded, simulates the round to its end with the
//! rollout policy and backpropagates the value along the path. The result is
//! the most visited root child (ties go to the smaller move).

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::position::Position;
use crate::mcts::hyperparameters::{MctsBudget, MctsConfig};
use crate::mcts::mcts_result::{MctsResult, MoveStats};
use crate::mcts::node::MctsNode;
use crate::mcts::rollout::{rollout, terminal_value, RolloutPolicy};
use crate::mcts::selection::{backpropagate, select_leaf_path};
use crate::search::cancel::CancelToken;
use crate::Result;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

pub fn mcts_search(
    position: &Position,
    config: &MctsConfig,
    policy: &dyn RolloutPolicy,
    cancel: &CancelToken,
) -> Result<MctsResult> {
    let start = Instant::now();
    let root_player = position.current_player();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut root = MctsNode::new_root(position.clone());

    let (max_rollouts, deadline) = match config.budget {
        MctsBudget::Rollouts(n) => (n, None),
        MctsBudget::TimeMs(ms) => (u32::MAX, Some(start + Duration::from_millis(ms))),
    };

    let mut rollouts = 0u32;
    let mut stopped = false;
    if !root.is_terminal() {
        while rollouts < max_rollouts {
            if cancel.is_cancelled() {
                stopped = true;
                break;
            }
            if deadline.map_or(false, |d| Instant::now() >= d) {
                break;
            }

            let mut path = select_leaf_path(&root, config.exploration_constant);
            let node = root.node_at_mut(&path);
            if !node.is_terminal() && !node.is_fully_expanded() {
                if let Some(idx) = node.expand_one()? {
                    path.push(idx);
                }
            }

            let leaf = root.node_at(&path);
            let value = if leaf.is_terminal() {
                terminal_value(&leaf.position, root_player, &config.weights)
            } else {
                rollout(&leaf.position, policy, &mut rng, root_player, &config.weights)
            };
            backpropagate(&mut root, &path, value, root_player);
            rollouts += 1;
        }
    }

    let mut move_stats: Vec<MoveStats> = root
        .children
        .iter()
        .filter_map(|child| {
            child.mv.map(|mv| MoveStats {
                mv,
                visits: child.visit_count,
                mean_value: child.average_value(),
            })
        })
        .collect();
    move_stats.sort_by(|a, b| a.mv.cmp(&b.mv));

    let best = root.most_visited_child();
    // Stopped before the first rollout: fall back to the smallest legal move.
    let best_move = match best.and_then(|c| c.mv) {
        Some(mv) => Some(mv),
        None if !root.is_terminal() => get_legal_moves(position).into_iter().min(),
        None => None,
    };
    let score = best.map_or(0.0, |c| c.average_value());

    let time_spent_ms = start.elapsed().as_millis() as u64;
    debug!(
        "🌲 MCTS ({}) {} rollouts in {} ms, best {}",
        policy.name(),
        rollouts,
        time_spent_ms,
        best_move.map_or_else(|| "-".to_string(), |m| m.to_string())
    );

    Ok(MctsResult {
        best_move,
        score,
        principal_variation: principal_variation(&root),
        rollouts,
        time_spent_ms,
        move_stats,
        stopped,
    })
}

fn principal_variation(root: &MctsNode) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut node = root;
    while let Some(child) = node.most_visited_child() {
        if child.visit_count == 0 {
            break;
        }
        if let Some(mv) = child.mv {
            pv.push(mv);
        }
        node = child;
    }
    pv
}
