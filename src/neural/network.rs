//! Policy/value MLP used for inference.
//!
//! `FEATURE_SIZE → 128 → 64` with ReLU, then a linear policy head over the
//! action space and a tanh value head, held in a `tch` VarStore on the CPU.
//!
//! Every forward pass runs on a chunk of exactly [`INFERENCE_CHUNK`] rows,
//! zero-padded when short. The matmul shapes never change, so a position
//! gets bit-identical outputs whether it is evaluated alone or in a batch.

use crate::game::moves::ACTION_SPACE;
use crate::neural::features::FEATURE_SIZE;
use crate::{AnalyzerError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tch::{nn, Device, Tensor};

pub const HIDDEN_1: usize = 128;
pub const HIDDEN_2: usize = 64;
pub const INFERENCE_CHUNK: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct NetOutput {
    /// Raw policy logits over the action space.
    pub logits: Vec<f32>,
    /// Value in [-1, 1] for the player to move.
    pub value: f32,
}

/// One named parameter tensor copied out of the VarStore.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

#[derive(Debug)]
pub struct PolicyValueNet {
    vs: nn::VarStore,
    hidden1: nn::Linear,
    hidden2: nn::Linear,
    policy_head: nn::Linear,
    value_head: nn::Linear,
}

impl PolicyValueNet {
    fn build() -> Self {
        let vs = nn::VarStore::new(Device::Cpu);
        let (hidden1, hidden2, policy_head, value_head) = {
            let root = vs.root();
            (
                nn::linear(&root / "hidden1", FEATURE_SIZE as i64, HIDDEN_1 as i64, Default::default()),
                nn::linear(&root / "hidden2", HIDDEN_1 as i64, HIDDEN_2 as i64, Default::default()),
                nn::linear(&root / "policy_head", HIDDEN_2 as i64, ACTION_SPACE as i64, Default::default()),
                nn::linear(&root / "value_head", HIDDEN_2 as i64, 1, Default::default()),
            )
        };
        Self {
            vs,
            hidden1,
            hidden2,
            policy_head,
            value_head,
        }
    }

    /// Randomly initialised network, reproducible from `seed`: Xavier/Glorot
    /// uniform weights drawn in parameter-name order, zero biases.
    pub fn new_seeded(seed: u64) -> Self {
        let net = Self::build();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut variables: Vec<(String, Tensor)> = net.vs.variables().into_iter().collect();
        variables.sort_by(|a, b| a.0.cmp(&b.0));
        tch::no_grad(|| {
            for (_, var) in variables.iter_mut() {
                let shape = var.size();
                let values: Vec<f32> = match shape[..] {
                    [outputs, inputs] => {
                        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
                        (0..outputs * inputs).map(|_| rng.gen_range(-limit..limit)).collect()
                    }
                    _ => vec![0.0; shape.iter().product::<i64>() as usize],
                };
                var.copy_(&Tensor::from_slice(&values).reshape(shape.as_slice()));
            }
        });
        net
    }

    /// Network with the expected layer shapes and all-zero parameters,
    /// filled in by the weight loader.
    pub fn zeros() -> Self {
        let net = Self::build();
        tch::no_grad(|| {
            for (_, mut var) in net.vs.variables() {
                let _ = var.zero_();
            }
        });
        net
    }

    pub(crate) fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    pub fn num_parameters(&self) -> usize {
        self.vs
            .variables()
            .values()
            .map(|t| t.size().iter().product::<i64>() as usize)
            .sum()
    }

    /// Every parameter tensor, sorted by name.
    pub fn parameters(&self) -> Result<Vec<Parameter>> {
        let mut parameters = self
            .vs
            .variables()
            .into_iter()
            .map(|(name, tensor)| -> Result<Parameter> {
                let shape = tensor.size().iter().map(|&d| d as usize).collect();
                let values = Vec::<f32>::try_from(&tensor.flatten(0, -1).contiguous())?;
                Ok(Parameter { name, shape, values })
            })
            .collect::<Result<Vec<_>>>()?;
        parameters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parameters)
    }

    pub fn forward(&self, features: &[f32]) -> Result<NetOutput> {
        self.forward_chunk(&[features])?
            .pop()
            .ok_or_else(|| AnalyzerError::Model("forward pass returned no output".to_string()))
    }

    pub fn forward_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<NetOutput>> {
        let mut outputs = Vec::with_capacity(batch.len());
        for chunk in batch.chunks(INFERENCE_CHUNK) {
            outputs.extend(self.forward_chunk(chunk)?);
        }
        Ok(outputs)
    }

    fn forward_chunk<R: AsRef<[f32]>>(&self, rows: &[R]) -> Result<Vec<NetOutput>> {
        let mut input = vec![0.0f32; INFERENCE_CHUNK * FEATURE_SIZE];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != FEATURE_SIZE {
                return Err(AnalyzerError::Model(format!(
                    "feature vector has {} entries, expected {}",
                    row.len(),
                    FEATURE_SIZE
                )));
            }
            input[i * FEATURE_SIZE..(i + 1) * FEATURE_SIZE].copy_from_slice(row);
        }

        let xs = Tensor::from_slice(&input).reshape([INFERENCE_CHUNK as i64, FEATURE_SIZE as i64]);
        let (logits, values) = tch::no_grad(|| {
            let h = xs.apply(&self.hidden1).relu().apply(&self.hidden2).relu();
            (h.apply(&self.policy_head), h.apply(&self.value_head).tanh())
        });
        let logits = Vec::<f32>::try_from(&logits.flatten(0, -1).contiguous())?;
        let values = Vec::<f32>::try_from(&values.flatten(0, -1).contiguous())?;

        Ok((0..rows.len())
            .map(|i| NetOutput {
                logits: logits[i * ACTION_SPACE..(i + 1) * ACTION_SPACE].to_vec(),
                value: values[i],
            })
            .collect())
    }
}
