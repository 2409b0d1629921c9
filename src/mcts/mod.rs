pub mod algorithm;
pub mod hyperparameters;
pub mod mcts_result;
pub mod node;
pub mod rollout;
pub mod selection;

pub use algorithm::mcts_search;
pub use hyperparameters::{MctsBudget, MctsConfig};
pub use mcts_result::{MctsResult, MoveStats};
pub use rollout::{RolloutKind, RolloutPolicy};
