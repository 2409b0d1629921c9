//! MCTS tree nodes.
//!
//! The tree is owned top-down: every node owns its children in a `Vec`, and
//! the search addresses nodes by the path of child indices from the root.
//! Each node stores values from the point of view of the player who made the
//! move leading to it, so a parent simply maximizes over its children.

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::position::Position;
use crate::Result;

#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Position after `mv` was played
    pub position: Position,

    /// Move that led here (`None` at the root)
    pub mv: Option<Move>,

    /// Player who played `mv`; values are stored from their point of view
    pub mover: Option<usize>,

    /// Legal moves not yet expanded, largest first so `pop` yields the smallest
    pub untried: Vec<Move>,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of all values backpropagated through this node
    pub total_value: f64,

    /// Child nodes, in expansion order
    pub children: Vec<MctsNode>,
}

impl MctsNode {
    pub fn new_root(position: Position) -> Self {
        Self::new(position, None, None)
    }

    fn new(position: Position, mv: Option<Move>, mover: Option<usize>) -> Self {
        let mut untried = if position.is_round_over() {
            Vec::new()
        } else {
            get_legal_moves(&position)
        };
        untried.reverse();
        MctsNode {
            position,
            mv,
            mover,
            untried,
            visit_count: 0,
            total_value: 0.0,
            children: Vec::new(),
        }
    }

    /// Returns the average value of this node
    pub fn average_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / self.visit_count as f64
        }
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The round is over: no drafting move is left.
    pub fn is_terminal(&self) -> bool {
        self.position.is_round_over()
    }

    /// Adds one child for the smallest untried move and returns its index.
    pub fn expand_one(&mut self) -> Result<Option<usize>> {
        let Some(mv) = self.untried.pop() else {
            return Ok(None);
        };
        let mover = self.position.current_player();
        let child_position = self.position.apply(&mv)?;
        self.children
            .push(MctsNode::new(child_position, Some(mv), Some(mover)));
        Ok(Some(self.children.len() - 1))
    }

    pub fn node_at(&self, path: &[usize]) -> &MctsNode {
        path.iter().fold(self, |node, &idx| &node.children[idx])
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> &mut MctsNode {
        let mut node = self;
        for &idx in path {
            node = &mut node.children[idx];
        }
        node
    }

    /// Most visited child; ties go to the smaller move.
    pub fn most_visited_child(&self) -> Option<&MctsNode> {
        self.children.iter().max_by(|a, b| {
            a.visit_count
                .cmp(&b.visit_count)
                .then_with(|| b.mv.cmp(&a.mv))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_expansion_follows_move_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let position = Position::new_game(&mut rng);
        let legal = get_legal_moves(&position);
        let mut root = MctsNode::new_root(position);
        assert_eq!(root.untried.len(), legal.len());
        let first = root.expand_one().unwrap().unwrap();
        let second = root.expand_one().unwrap().unwrap();
        assert_eq!(root.children[first].mv, Some(legal[0]));
        assert_eq!(root.children[second].mv, Some(legal[1]));
        assert_eq!(root.children[first].mover, Some(0));
    }

    #[test]
    fn test_most_visited_breaks_ties_by_move() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut root = MctsNode::new_root(Position::new_game(&mut rng));
        root.expand_one().unwrap();
        root.expand_one().unwrap();
        root.children[0].visit_count = 3;
        root.children[1].visit_count = 3;
        let best = root.most_visited_child().unwrap();
        assert_eq!(best.mv, root.children[0].mv);
        root.children[1].visit_count = 4;
        assert_eq!(root.most_visited_child().unwrap().mv, root.children[1].mv);
    }
}
