pub mod features;
pub mod manager;
pub mod model_io;
pub mod network;

pub use manager::{NeuralConfig, NeuralEvaluator, NeuralOutput};
