//! Fan-out over every registered advisor and assembly of the combined report.

mod assessment;
mod plan;
mod themes;

pub use assessment::OverallAssessment;
pub use themes::{CrossCuttingTheme, ThemePriority};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::advisor::{AdvisorError, DEFAULT_ADVISOR_TIMEOUT};
use super::insight::{ActionPlan, AdvisorFailure, AdvisorOutcome, InsightSource};
use super::registry::AdvisorRegistry;
use crate::completion::CompletionClient;
use crate::scoring::{OrganizationId, PerformanceSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_advisors: usize,
    pub successful_analyses: usize,
    pub fallback_analyses: usize,
    pub failed_analyses: usize,
}

impl AnalysisSummary {
    fn tally<'a>(outcomes: impl Iterator<Item = &'a AdvisorOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.total_advisors += 1;
            match outcome.source() {
                InsightSource::CompletionService => summary.successful_analyses += 1,
                InsightSource::FallbackRules => summary.fallback_analyses += 1,
                InsightSource::Error => summary.failed_analyses += 1,
            }
        }
        summary
    }
}

/// Immutable report combining every advisor's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalysis {
    pub organization_id: OrganizationId,
    pub timestamp: DateTime<Utc>,
    pub overall_assessment: OverallAssessment,
    pub advisor_insights: BTreeMap<String, AdvisorOutcome>,
    pub cross_cutting_themes: Vec<CrossCuttingTheme>,
    pub master_action_plan: ActionPlan,
    pub summary: AnalysisSummary,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("comprehensive analysis cancelled")]
    Cancelled,
}

/// Runs advisors concurrently; a failing advisor is recorded, never propagated.
#[derive(Clone)]
pub struct AdvisorManager {
    registry: Arc<AdvisorRegistry>,
    client: Option<Arc<dyn CompletionClient>>,
    timeout: Duration,
}

impl std::fmt::Debug for AdvisorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorManager")
            .field("advisors", &self.registry.list())
            .field("has_client", &self.client.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AdvisorManager {
    pub fn new(registry: Arc<AdvisorRegistry>, client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            registry,
            client,
            timeout: DEFAULT_ADVISOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &AdvisorRegistry {
        &self.registry
    }

    pub fn has_completion_client(&self) -> bool {
        self.client.is_some()
    }

    pub async fn generate_comprehensive_analysis(
        &self,
        snapshot: &PerformanceSnapshot,
        cancel: &CancellationToken,
    ) -> Result<ComprehensiveAnalysis, AnalysisError> {
        let started = Instant::now();
        let overall_assessment = OverallAssessment::from_snapshot(snapshot);
        let shared = Arc::new(snapshot.clone());

        let runs = self.registry.list().into_iter().map(|id| {
            let id = id.to_string();
            let advisor = self.registry.get(&id, self.client.clone());
            let snapshot = Arc::clone(&shared);
            let cancel = cancel.clone();
            let timeout = self.timeout;
            async move {
                let advisor = match advisor {
                    Ok(advisor) => advisor.with_timeout(timeout),
                    Err(error) => return (id, Err(RunFailure::Failed(error.to_string()))),
                };
                let task =
                    tokio::spawn(async move { advisor.analyze(&snapshot, &cancel).await });
                let outcome = match task.await {
                    Ok(Ok(insight)) => Ok(insight),
                    Ok(Err(AdvisorError::Cancelled)) => Err(RunFailure::Cancelled),
                    Ok(Err(error)) => Err(RunFailure::Failed(error.to_string())),
                    Err(join_error) => Err(RunFailure::Failed(format!(
                        "advisor task aborted: {join_error}"
                    ))),
                };
                (id, outcome)
            }
        });

        let mut advisor_insights = BTreeMap::new();
        for (id, outcome) in join_all(runs).await {
            let outcome = match outcome {
                Ok(insight) => AdvisorOutcome::Insight(insight),
                Err(RunFailure::Cancelled) => continue,
                Err(RunFailure::Failed(message)) => {
                    tracing::error!(
                        organization_id = %snapshot.organization_id,
                        advisor = %id,
                        error = %message,
                        "advisor failed; recording error entry"
                    );
                    AdvisorOutcome::Failed(AdvisorFailure::new(message))
                }
            };
            advisor_insights.insert(id, outcome);
        }

        if cancel.is_cancelled() {
            tracing::info!(
                organization_id = %snapshot.organization_id,
                "comprehensive analysis cancelled"
            );
            return Err(AnalysisError::Cancelled);
        }

        let summary = AnalysisSummary::tally(advisor_insights.values());
        let cross_cutting_themes =
            themes::cross_cutting_themes(advisor_insights.values().filter_map(AdvisorOutcome::insight));

        tracing::info!(
            organization_id = %snapshot.organization_id,
            advisors = summary.total_advisors,
            successful = summary.successful_analyses,
            fallback = summary.fallback_analyses,
            failed = summary.failed_analyses,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "comprehensive analysis complete"
        );

        Ok(ComprehensiveAnalysis {
            organization_id: snapshot.organization_id.clone(),
            timestamp: Utc::now(),
            master_action_plan: plan::master_action_plan(overall_assessment.support_needed),
            overall_assessment,
            advisor_insights,
            cross_cutting_themes,
            summary,
        })
    }
}

enum RunFailure {
    Cancelled,
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisors::kind::{AdvisorConfig, AdvisorKind};
    use crate::scoring::{PerformanceEngine, QuestionFilter, Submission};

    fn snapshot() -> PerformanceSnapshot {
        let responses = [("OP.SR.001", "Yes"), ("FI.CR.001", "Yes")]
            .into_iter()
            .collect();
        PerformanceEngine::standard().score(
            &Submission::new(OrganizationId::new("ymca-900"), responses),
            QuestionFilter::All,
        )
    }

    #[tokio::test]
    async fn fallback_only_run_is_complete() {
        let manager = AdvisorManager::new(Arc::new(AdvisorRegistry::standard()), None);
        let analysis = manager
            .generate_comprehensive_analysis(&snapshot(), &CancellationToken::new())
            .await
            .expect("analysis completes");

        assert_eq!(analysis.advisor_insights.len(), 5);
        assert_eq!(analysis.summary.total_advisors, 5);
        assert_eq!(analysis.summary.fallback_analyses, 5);
        assert_eq!(analysis.summary.successful_analyses, 0);
        assert!(analysis.master_action_plan.is_complete());
        assert_eq!(analysis.overall_assessment.score, 7);
    }

    #[tokio::test]
    async fn one_broken_advisor_is_isolated() {
        let mut registry = AdvisorRegistry::new();
        for kind in AdvisorKind::ordered() {
            let config = AdvisorConfig::standard(kind);
            let config = if kind == AdvisorKind::MemberEngagement {
                config.with_template("{not_a_placeholder}")
            } else {
                config
            };
            registry.register(config).expect("unique ids");
        }

        let manager = AdvisorManager::new(Arc::new(registry), None);
        let analysis = manager
            .generate_comprehensive_analysis(&snapshot(), &CancellationToken::new())
            .await
            .expect("analysis completes");

        assert_eq!(analysis.summary.failed_analyses, 1);
        assert_eq!(
            analysis.summary.successful_analyses + analysis.summary.fallback_analyses,
            4
        );
        let failed = &analysis.advisor_insights["member-engagement"];
        assert_eq!(failed.source(), InsightSource::Error);
        assert!(failed.insight().is_none());
    }

    #[tokio::test]
    async fn cancelled_run_returns_no_report() {
        let manager = AdvisorManager::new(Arc::new(AdvisorRegistry::standard()), None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = manager
            .generate_comprehensive_analysis(&snapshot(), &cancel)
            .await;
        assert_eq!(result, Err(AnalysisError::Cancelled));
    }
}
