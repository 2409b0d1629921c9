//! UCT selection and backpropagation.
//!
//! Selection score: `Q + C · sqrt(ln N_parent / N_child)`, where `Q` is the
//! child's mean value from the parent's point of view.

use crate::mcts::node::MctsNode;

pub fn uct_score(child: &MctsNode, parent_visits: u32, exploration: f64) -> f64 {
    if child.visit_count == 0 {
        return f64::INFINITY;
    }
    let exploit = child.average_value();
    let explore = ((parent_visits.max(1) as f64).ln() / child.visit_count as f64).sqrt();
    exploit + exploration * explore
}

/// Index of the child with the highest UCT score; ties go to the earlier child.
pub fn select_best_child(node: &MctsNode, exploration: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, child) in node.children.iter().enumerate() {
        let score = uct_score(child, node.visit_count, exploration);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Descends from the root through fully expanded nodes.
///
/// # Returns
/// Path from root to selected node (indices of children at each level)
pub fn select_leaf_path(root: &MctsNode, exploration: f64) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = root;

    loop {
        if current.is_terminal() || !current.is_fully_expanded() || current.is_leaf() {
            break;
        }
        match select_best_child(current, exploration) {
            Some(child_idx) => {
                path.push(child_idx);
                current = &current.children[child_idx];
            }
            None => break,
        }
    }

    path
}

/// Adds `value`, given from `root_player`'s point of view, to every node on
/// the path, flipping the sign for nodes whose mover is the opponent.
pub fn backpropagate(root: &mut MctsNode, path: &[usize], value: f64, root_player: usize) {
    root.visit_count += 1;
    let mut node = root;
    for &idx in path {
        node = &mut node.children[idx];
        node.visit_count += 1;
        let signed = match node.mover {
            Some(p) if p == root_player => value,
            Some(_) => -value,
            None => value,
        };
        node.total_value += signed;
    }
}
