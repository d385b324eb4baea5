//! Deterministic scoring: survey responses to metric points, category totals,
//! performance tier, and support designation.

mod aggregator;
mod calculator;
pub mod domain;
mod rubric;
pub mod thresholds;

pub use aggregator::PerformanceAggregator;
pub use calculator::ScoreCalculator;
pub use domain::{
    CategoryTotals, MetricCategory, MetricScore, OrganizationId, PerformanceSnapshot,
    QuestionAccess, QuestionFilter, ResponseSet, Submission,
};
pub use rubric::{MetricDefinition, MetricRubric, QualifyingRule, QuestionView};
pub use thresholds::{PerformanceTier, SupportDesignation, ThresholdBand, ThresholdTable};

use std::sync::Arc;

/// Calculator and aggregator sharing one rubric and one threshold table.
#[derive(Debug, Clone)]
pub struct PerformanceEngine {
    calculator: ScoreCalculator,
    aggregator: PerformanceAggregator,
}

impl PerformanceEngine {
    pub fn new(rubric: Arc<MetricRubric>, thresholds: ThresholdTable) -> Self {
        Self {
            calculator: ScoreCalculator::new(rubric.clone(), thresholds.clone()),
            aggregator: PerformanceAggregator::new(rubric, thresholds),
        }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(MetricRubric::standard()), ThresholdTable::canonical())
    }

    pub fn rubric(&self) -> &MetricRubric {
        self.calculator.rubric()
    }

    pub fn score(&self, submission: &Submission, filter: QuestionFilter) -> PerformanceSnapshot {
        let responses = submission.responses.restricted_to(self.rubric(), filter);
        let metric_scores = self.calculator.compute_metric_scores(&responses);
        self.aggregator
            .aggregate(submission.organization_id.clone(), &metric_scores)
    }
}

impl Default for PerformanceEngine {
    fn default() -> Self {
        Self::standard()
    }
}
