pub mod aggregator;
pub mod alternatives;
pub mod components;
pub mod tier;

pub use aggregator::{
    analyze, analyze_position, AnalysisConfig, AnalysisRequest, AnalysisResponse, EngineReport,
    QualityAssessment, SearchBudget,
};
pub use alternatives::Alternative;
pub use components::ComponentScores;
pub use tier::QualityTier;
