use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::advisors::{AdvisorManager, AnalysisError, ComprehensiveAnalysis};
use crate::cache::AnalysisCache;
use crate::repository::{RepositoryError, SubmissionRepository};
use crate::scoring::{OrganizationId, PerformanceEngine, PerformanceSnapshot, QuestionFilter, Submission};

/// Service composing the submission store, scoring engine, advisor manager,
/// and analysis cache.
pub struct AnalysisService<R> {
    repository: Arc<R>,
    engine: Arc<PerformanceEngine>,
    manager: Arc<AdvisorManager>,
    cache: Arc<AnalysisCache>,
    filter: QuestionFilter,
}

impl<R> AnalysisService<R>
where
    R: SubmissionRepository + 'static,
{
    pub fn new(repository: Arc<R>, manager: AdvisorManager, cache: AnalysisCache) -> Self {
        Self {
            repository,
            engine: Arc::new(PerformanceEngine::standard()),
            manager: Arc::new(manager),
            cache: Arc::new(cache),
            filter: QuestionFilter::All,
        }
    }

    pub fn with_engine(mut self, engine: PerformanceEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Question filter applied to submissions and analyses unless a caller
    /// asks for another.
    pub fn with_filter(mut self, filter: QuestionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn engine(&self) -> &PerformanceEngine {
        &self.engine
    }

    pub fn manager(&self) -> &AdvisorManager {
        &self.manager
    }

    /// Store a submission, drop any cached analysis for its organization, and
    /// return the fresh snapshot.
    pub fn submit(
        &self,
        submission: Submission,
    ) -> Result<PerformanceSnapshot, AnalysisServiceError> {
        if submission.organization_id.as_str().trim().is_empty() {
            return Err(AnalysisServiceError::InvalidSubmission(
                "organization id is required".to_string(),
            ));
        }

        let stored = self.repository.insert(submission)?;
        self.cache.invalidate(&stored.organization_id);

        let snapshot = self.engine.score(&stored, self.filter);
        tracing::info!(
            organization_id = %snapshot.organization_id,
            responses = stored.responses.len(),
            percentage = snapshot.percentage,
            tier = snapshot.performance_tier.label(),
            "submission scored"
        );
        Ok(snapshot)
    }

    pub fn snapshot(
        &self,
        organization_id: &OrganizationId,
        filter: Option<QuestionFilter>,
    ) -> Result<PerformanceSnapshot, AnalysisServiceError> {
        let submission = self.latest(organization_id)?;
        Ok(self.engine.score(&submission, filter.unwrap_or(self.filter)))
    }

    /// Cached report when fresh, otherwise a new run. Cancelled runs are
    /// never cached.
    pub async fn comprehensive_analysis(
        &self,
        organization_id: &OrganizationId,
        cancel: &CancellationToken,
    ) -> Result<Arc<ComprehensiveAnalysis>, AnalysisServiceError> {
        if let Some(cached) = self.cache.get(organization_id) {
            return Ok(cached);
        }

        // Taken before reading the submission: any later `submit` retires it.
        let ticket = self.cache.ticket(organization_id);
        let submission = self.latest(organization_id)?;
        let snapshot = self.engine.score(&submission, self.filter);
        let analysis = Arc::new(
            self.manager
                .generate_comprehensive_analysis(&snapshot, cancel)
                .await?,
        );

        if !self
            .cache
            .put_if_current(organization_id.clone(), Arc::clone(&analysis), ticket)
        {
            tracing::debug!(
                organization_id = %organization_id,
                "submission changed during analysis; result not cached"
            );
        }
        Ok(analysis)
    }

    /// Explicit invalidation, e.g. when the caller switches organizations.
    pub fn invalidate(&self, organization_id: &OrganizationId) -> bool {
        self.cache.invalidate(organization_id)
    }

    pub fn history(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Submission>, AnalysisServiceError> {
        Ok(self.repository.history(organization_id)?)
    }

    fn latest(&self, organization_id: &OrganizationId) -> Result<Submission, AnalysisServiceError> {
        let submission = self
            .repository
            .latest(organization_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(submission)
    }
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
