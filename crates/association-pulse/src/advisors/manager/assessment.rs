use serde::{Deserialize, Serialize};

use crate::scoring::{PerformanceSnapshot, PerformanceTier, SupportDesignation};

/// Headline result, independent of any advisor output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub performance_tier: PerformanceTier,
    pub support_needed: SupportDesignation,
    pub label: String,
}

impl OverallAssessment {
    pub fn from_snapshot(snapshot: &PerformanceSnapshot) -> Self {
        Self {
            score: snapshot.total_points,
            max_score: snapshot.max_points,
            percentage: snapshot.percentage,
            performance_tier: snapshot.performance_tier,
            support_needed: snapshot.support_designation,
            label: assessment_label(snapshot.performance_tier, snapshot.support_designation),
        }
    }
}

fn assessment_label(tier: PerformanceTier, designation: SupportDesignation) -> String {
    match tier {
        PerformanceTier::High => "Sustain Excellence".to_string(),
        _ => format!("{} performance: {}", tier.label(), designation.label()),
    }
}
