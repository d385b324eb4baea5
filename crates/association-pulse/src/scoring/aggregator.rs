use std::sync::Arc;

use super::calculator::percentage_of;
use super::domain::{CategoryTotals, MetricScore, OrganizationId, PerformanceSnapshot};
use super::rubric::MetricRubric;
use super::thresholds::ThresholdTable;

/// Rolls metric scores up into category totals, tier, and support designation.
#[derive(Debug, Clone)]
pub struct PerformanceAggregator {
    rubric: Arc<MetricRubric>,
    thresholds: ThresholdTable,
}

impl PerformanceAggregator {
    pub fn new(rubric: Arc<MetricRubric>, thresholds: ThresholdTable) -> Self {
        Self { rubric, thresholds }
    }

    /// Never fails: rubric metrics missing from `metric_scores` count as zero,
    /// scores for metrics outside the rubric are ignored.
    pub fn aggregate(
        &self,
        organization_id: OrganizationId,
        metric_scores: &[MetricScore],
    ) -> PerformanceSnapshot {
        let metric_scores: Vec<MetricScore> = self
            .rubric
            .definitions()
            .iter()
            .map(|definition| {
                let points = metric_scores
                    .iter()
                    .find(|score| score.metric_id == definition.id)
                    .map(|score| score.points.min(definition.max_points))
                    .unwrap_or(0);

                MetricScore {
                    metric_id: definition.id.to_string(),
                    label: definition.label.to_string(),
                    category: definition.category,
                    points,
                    max_points: definition.max_points,
                    tier: self
                        .thresholds
                        .tier(percentage_of(points, definition.max_points)),
                }
            })
            .collect();

        let mut category_totals = CategoryTotals::default();
        for score in &metric_scores {
            category_totals.add(score.category, score.points);
        }

        let total_points = category_totals.total();
        let max_points = self.rubric.max_points();
        let percentage = percentage_of(total_points, max_points);
        let band = self.thresholds.band(percentage);

        PerformanceSnapshot {
            organization_id,
            category_totals,
            total_points,
            max_points,
            percentage,
            performance_tier: band.tier,
            support_designation: band.designation,
            metric_scores,
        }
    }
}
