//! Neural evaluator: feature encoding, inference and legal-move masking.
//!
//! Weights are immutable after load. The network sits behind an
//! `Arc<Mutex<..>>`, so one evaluator serves every worker of a batch session
//! with one forward pass at a time.

use crate::game::get_legal_moves::get_legal_moves;
use crate::game::moves::Move;
use crate::game::position::Position;
use crate::neural::features::encode;
use crate::neural::model_io::load_weights;
use crate::neural::network::{NetOutput, PolicyValueNet};
use crate::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Configuration for neural network initialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeuralConfig {
    /// Safetensors weight file; `None` leaves the evaluator unavailable
    /// unless `allow_untrained` is set
    pub weights_path: Option<String>,
    /// Fall back to a seeded, untrained network when no weights are loaded
    pub allow_untrained: bool,
    /// Seed of the untrained network
    pub seed: u64,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            weights_path: None,
            allow_untrained: false,
            seed: 42,
        }
    }
}

/// Masked policy and value for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralOutput {
    /// Legal moves with renormalised probabilities, in move order.
    pub policy: Vec<(Move, f32)>,
    /// Value in [-1, 1] for the player to move.
    pub value: f32,
}

impl NeuralOutput {
    pub fn probability(&self, mv: &Move) -> f32 {
        self.policy
            .iter()
            .find(|(m, _)| m == mv)
            .map_or(0.0, |(_, p)| *p)
    }
}

#[derive(Clone, Default)]
pub struct NeuralEvaluator {
    net: Option<Arc<Mutex<PolicyValueNet>>>,
}

impl NeuralEvaluator {
    /// Builds an evaluator from the configuration. A missing or unreadable
    /// weight file is not fatal: the evaluator is simply unavailable.
    pub fn from_config(config: &NeuralConfig) -> Self {
        log::info!("🧠 Initializing neural evaluator...");
        if let Some(path) = &config.weights_path {
            if Path::new(path).exists() {
                match load_weights(path) {
                    Ok(net) => return Self::with_network(net),
                    Err(e) => log::warn!("⚠️ Failed to load weights from {}: {}", path, e),
                }
            } else {
                log::warn!("⚠️ Weight file {} not found", path);
            }
        }
        if config.allow_untrained {
            log::warn!("⚠️ Using an untrained network (seed {})", config.seed);
            return Self::with_network(PolicyValueNet::new_seeded(config.seed));
        }
        Self::unavailable()
    }

    pub fn with_network(net: PolicyValueNet) -> Self {
        Self {
            net: Some(Arc::new(Mutex::new(net))),
        }
    }

    pub fn unavailable() -> Self {
        Self { net: None }
    }

    pub fn is_available(&self) -> bool {
        self.net.is_some()
    }

    fn network(&self) -> Result<MutexGuard<'_, PolicyValueNet>> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| AnalyzerError::EngineUnavailable("neural weights not loaded".to_string()))?;
        net.lock()
            .map_err(|_| AnalyzerError::EngineUnavailable("neural network lock poisoned".to_string()))
    }

    pub fn evaluate(&self, position: &Position) -> Result<NeuralOutput> {
        let features = encode(position);
        let raw = self.network()?.forward(&features)?;
        Ok(mask_policy(position, raw))
    }

    /// Batched inference; each output equals what [`evaluate`](Self::evaluate)
    /// returns for the same position.
    pub fn evaluate_batch(&self, positions: &[Position]) -> Result<Vec<NeuralOutput>> {
        let features: Vec<Vec<f32>> = positions.iter().map(encode).collect();
        let raw = self.network()?.forward_batch(&features)?;
        Ok(raw
            .into_iter()
            .zip(positions)
            .map(|(raw, position)| mask_policy(position, raw))
            .collect())
    }
}

/// Softmax over the logits of legal moves only.
fn mask_policy(position: &Position, raw: NetOutput) -> NeuralOutput {
    let moves = get_legal_moves(position);
    let max_logit = moves
        .iter()
        .map(|mv| raw.logits[mv.action_index()])
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = moves
        .iter()
        .map(|mv| (raw.logits[mv.action_index()] - max_logit).exp())
        .collect();
    let total: f32 = exps.iter().sum();
    let policy = moves
        .into_iter()
        .zip(exps)
        .map(|(mv, e)| (mv, if total > 0.0 { e / total } else { 0.0 }))
        .collect();
    NeuralOutput {
        policy,
        value: raw.value,
    }
}
