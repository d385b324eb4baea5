use association_pulse::advisors::{AdvisorManager, AdvisorRegistry};
use association_pulse::cache::AnalysisCache;
use association_pulse::completion::{CompletionClient, HttpCompletionClient};
use association_pulse::config::AppConfig;
use association_pulse::error::AppError;
use association_pulse::repository::{RepositoryError, SubmissionRepository};
use association_pulse::scoring::{OrganizationId, QuestionFilter, Submission};
use association_pulse::AnalysisService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionRepository {
    records: Arc<Mutex<HashMap<OrganizationId, Vec<Submission>>>>,
}

impl InMemorySubmissionRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<OrganizationId, Vec<Submission>>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("submission store poisoned".to_string()))
    }
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut guard = self.lock()?;
        let history = guard
            .entry(submission.organization_id.clone())
            .or_default();
        let position = history.partition_point(|existing| existing.timestamp <= submission.timestamp);
        history.insert(position, submission.clone());
        Ok(submission)
    }

    fn latest(&self, organization_id: &OrganizationId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .get(organization_id)
            .and_then(|history| history.last())
            .cloned())
    }

    fn history(&self, organization_id: &OrganizationId) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(organization_id).cloned().unwrap_or_default())
    }
}

/// Completion client from configuration; `None` runs advisors on fallback rules.
pub(crate) fn completion_client(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CompletionClient>>, AppError> {
    match &config.completion {
        Some(completion) => {
            let client: Arc<dyn CompletionClient> =
                Arc::new(HttpCompletionClient::new(completion)?);
            Ok(Some(client))
        }
        None => Ok(None),
    }
}

pub(crate) fn advisor_manager(config: &AppConfig) -> Result<AdvisorManager, AppError> {
    let client = completion_client(config)?;
    let manager = AdvisorManager::new(Arc::new(AdvisorRegistry::standard()), client);
    Ok(match &config.completion {
        Some(completion) => manager.with_timeout(completion.timeout),
        None => manager,
    })
}

pub(crate) fn analysis_service(
    config: &AppConfig,
    filter: QuestionFilter,
) -> Result<AnalysisService<InMemorySubmissionRepository>, AppError> {
    let repository = Arc::new(InMemorySubmissionRepository::default());
    let service = AnalysisService::new(
        repository,
        advisor_manager(config)?,
        AnalysisCache::from_config(&config.cache),
    )
    .with_filter(filter);
    Ok(service)
}

pub(crate) fn parse_filter(raw: &str) -> Result<QuestionFilter, String> {
    QuestionFilter::parse(raw).ok_or_else(|| {
        format!(
            "unknown filter '{raw}' (expected all, restricted-access-only, or unrestricted-access-only)"
        )
    })
}
