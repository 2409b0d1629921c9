pub mod batch;
pub mod session_manager;

pub use batch::{AnalysisMode, BatchPosition, BatchRequest, PositionResult};
pub use session_manager::{SessionManager, SessionProgress, SessionStatus};
