//! Advisor framework: prompt construction, response parsing, fallback rules,
//! the advisor registry, and the concurrent manager.

mod advisor;
mod fallback;
pub mod insight;
pub mod kind;
pub mod manager;
mod parser;
mod prompt;
mod registry;

pub use advisor::{Advisor, AdvisorError, DEFAULT_ADVISOR_TIMEOUT};
pub use fallback::fallback_insight;
pub use insight::{ActionPlan, AdvisorFailure, AdvisorInsight, AdvisorOutcome, InsightSource};
pub use kind::{AdvisorConfig, AdvisorKind, DEFAULT_PROMPT_TEMPLATE};
pub use manager::{
    AdvisorManager, AnalysisError, AnalysisSummary, ComprehensiveAnalysis, CrossCuttingTheme,
    OverallAssessment, ThemePriority,
};
pub use parser::{parse_response, parse_response_value, ParsedResponse};
pub use prompt::PromptError;
pub use registry::{AdvisorRegistry, AdvisorSummary, ConfigurationError};
