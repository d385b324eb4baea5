use std::sync::Arc;

use super::domain::{MetricScore, ResponseSet};
use super::rubric::{MetricDefinition, MetricRubric};
use super::thresholds::ThresholdTable;

/// Stateless scorer that applies the rubric to a set of survey responses.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    rubric: Arc<MetricRubric>,
    thresholds: ThresholdTable,
}

impl ScoreCalculator {
    pub fn new(rubric: Arc<MetricRubric>, thresholds: ThresholdTable) -> Self {
        Self { rubric, thresholds }
    }

    pub fn rubric(&self) -> &MetricRubric {
        &self.rubric
    }

    /// One score per rubric metric, in catalog order. Missing or unexpected
    /// answers earn nothing; an empty response set scores zero everywhere.
    pub fn compute_metric_scores(&self, responses: &ResponseSet) -> Vec<MetricScore> {
        self.rubric
            .definitions()
            .iter()
            .map(|definition| self.score_metric(definition, responses))
            .collect()
    }

    fn score_metric(&self, definition: &MetricDefinition, responses: &ResponseSet) -> MetricScore {
        let earned: u32 = definition
            .rules
            .iter()
            .filter(|rule| rule.is_satisfied_by(responses))
            .map(|rule| rule.points)
            .sum();
        let points = earned.clamp(0, definition.max_points);

        MetricScore {
            metric_id: definition.id.to_string(),
            label: definition.label.to_string(),
            category: definition.category,
            points,
            max_points: definition.max_points,
            tier: self.thresholds.tier(percentage_of(points, definition.max_points)),
        }
    }
}

pub(crate) fn percentage_of(points: u32, max_points: u32) -> f64 {
    if max_points == 0 {
        0.0
    } else {
        f64::from(points) / f64::from(max_points) * 100.0
    }
}
