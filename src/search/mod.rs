pub mod alphabeta;
pub mod cancel;
pub mod eval;
pub mod tt;

pub use alphabeta::{AlphaBetaResult, RootMoveScore, SearchConfig, Searcher};
pub use cancel::CancelToken;
pub use eval::EvalWeights;
