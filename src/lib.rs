//! # Azul Analyzer
//!
//! Move-quality analysis for the Azul tile-drafting game.
//!
//! ## Features
//!
//! - **Game Model**: immutable positions with an incremental Zobrist hash,
//!   one-line notation and a reference move generator
//! - **Pattern Detection**: blocking, scoring, floor-risk and strategic detectors
//! - **Search**: iterative-deepening alpha-beta and UCT Monte-Carlo tree search
//! - **Neural Evaluation**: small policy/value MLP with safetensors weights
//! - **Quality Aggregation**: 5-tier verdicts with explained alternatives
//! - **Batch Sessions**: worker-pool analysis with progress and cancellation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use azul_analyzer::{analyze, AnalysisConfig, AnalysisRequest};
//!
//! let request = AnalysisRequest::new(
//!     "BBYR|----|KKWW|YRRR|----/FBYYK/B----|-----|-----|-K---|-----/R|--|YYY|----|-----/K/-----|W----|-----|-----|-----/-|BB|---|RR--|-----/-/7,3/2/0",
//!     0,
//! );
//! let response = analyze(&request, &AnalysisConfig::default(), None).unwrap();
//! println!("{} {}", response.best.mv, response.best.quality_tier.symbol());
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Position model, moves and notation
pub mod game;

/// Wall, floor and bonus scoring rules
pub mod scoring;

/// Deterministic pattern detectors
pub mod patterns;

/// Iterative-deepening alpha-beta search
pub mod search;

/// Monte Carlo Tree Search engine
pub mod mcts;

/// Neural policy/value evaluator
pub mod neural;

/// Move-quality aggregation
pub mod quality;

/// Batch analysis sessions
pub mod services;

/// CSV export of analysis results
pub mod recording;

/// Logger initialisation for binaries
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use game::moves::Move;
pub use game::position::Position;
pub use quality::aggregator::{analyze, AnalysisConfig, AnalysisRequest, AnalysisResponse};
pub use quality::tier::QualityTier;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the analyzer
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Malformed position: {0}")]
    MalformedPosition(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Batch worker failed on position {position_key}: {reason}")]
    BatchWorkerFailure { position_key: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tensor error: {0}")]
    Tensor(#[from] tch::TchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Logging error: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AnalyzerError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
