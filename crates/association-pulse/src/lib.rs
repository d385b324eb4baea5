pub mod advisors;
pub mod cache;
pub mod completion;
pub mod config;
pub mod error;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod survey;
pub mod telemetry;

pub use router::analysis_router;
pub use service::{AnalysisService, AnalysisServiceError};
