//! MCTS configuration.

use crate::mcts::rollout::RolloutKind;
use crate::search::eval::EvalWeights;
use serde::{Deserialize, Serialize};

/// When to stop iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MctsBudget {
    /// Fixed number of rollouts; with a fixed seed the search is reproducible
    Rollouts(u32),
    /// Wall-clock limit in milliseconds
    TimeMs(u64),
}

/// MCTS hyperparameters configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MctsConfig {
    /// UCT exploration constant `C`
    /// Default: √2
    pub exploration_constant: f64,

    /// Seed of the rollout RNG
    pub seed: u64,

    pub budget: MctsBudget,

    pub rollout_policy: RolloutKind,

    /// Weights used to score positions at the end of a rollout
    pub weights: EvalWeights,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            seed: 42,
            budget: MctsBudget::TimeMs(150),
            rollout_policy: RolloutKind::Heuristic,
            weights: EvalWeights::default(),
        }
    }
}

impl MctsConfig {
    pub fn with_rollouts(rollouts: u32) -> Self {
        Self {
            budget: MctsBudget::Rollouts(rollouts),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_json_roundtrip() {
        let config = MctsConfig::with_rollouts(500);
        let json = serde_json::to_string(&config).unwrap();
        let back: MctsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.budget, MctsBudget::Rollouts(500));
    }
}
