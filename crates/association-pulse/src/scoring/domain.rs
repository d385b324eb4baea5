use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::thresholds::{PerformanceTier, SupportDesignation};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub String);

impl OrganizationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Survey answers keyed by dotted question code (`FI.LQ.001`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet(BTreeMap<String, String>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, answer: impl Into<String>) {
        self.0.insert(code.into(), answer.into());
    }

    pub fn answer(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(code, answer)| (code.as_str(), answer.as_str()))
    }

    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.0.retain(|code, _| keep(code));
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, answer)| (code.into(), answer.into()))
                .collect(),
        )
    }
}

/// Immutable survey record. Later submissions supersede, never overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub organization_id: OrganizationId,
    pub responses: ResponseSet,
    pub timestamp: DateTime<Utc>,
}

impl Submission {
    pub fn new(organization_id: OrganizationId, responses: ResponseSet) -> Self {
        Self {
            organization_id,
            responses,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Operational,
    Financial,
}

impl MetricCategory {
    pub const fn ordered() -> [Self; 2] {
        [Self::Operational, Self::Financial]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Operational => "Operational",
            Self::Financial => "Financial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    pub metric_id: String,
    pub label: String,
    pub category: MetricCategory,
    pub points: u32,
    pub max_points: u32,
    pub tier: PerformanceTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub operational: u32,
    pub financial: u32,
}

impl CategoryTotals {
    pub fn total(&self) -> u32 {
        self.operational + self.financial
    }

    pub fn get(&self, category: MetricCategory) -> u32 {
        match category {
            MetricCategory::Operational => self.operational,
            MetricCategory::Financial => self.financial,
        }
    }

    pub(crate) fn add(&mut self, category: MetricCategory, points: u32) {
        match category {
            MetricCategory::Operational => self.operational += points,
            MetricCategory::Financial => self.financial += points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub organization_id: OrganizationId,
    pub category_totals: CategoryTotals,
    pub total_points: u32,
    pub max_points: u32,
    pub percentage: f64,
    pub performance_tier: PerformanceTier,
    pub support_designation: SupportDesignation,
    pub metric_scores: Vec<MetricScore>,
}

impl PerformanceSnapshot {
    /// Metrics sorted by their share of available points, weakest first.
    pub fn weakest_metrics(&self, limit: usize) -> Vec<&MetricScore> {
        let mut metrics: Vec<&MetricScore> = self.metric_scores.iter().collect();
        metrics.sort_by(|left, right| {
            share(left)
                .partial_cmp(&share(right))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        metrics.truncate(limit);
        metrics
    }

    pub fn metric(&self, metric_id: &str) -> Option<&MetricScore> {
        self.metric_scores
            .iter()
            .find(|score| score.metric_id == metric_id)
    }
}

fn share(score: &MetricScore) -> f64 {
    if score.max_points == 0 {
        0.0
    } else {
        f64::from(score.points) / f64::from(score.max_points)
    }
}

/// Which survey questions are asked of an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionFilter {
    #[default]
    All,
    RestrictedAccessOnly,
    UnrestrictedAccessOnly,
}

impl QuestionFilter {
    pub fn includes(self, access: QuestionAccess) -> bool {
        match self {
            Self::All => true,
            Self::RestrictedAccessOnly => access == QuestionAccess::Restricted,
            Self::UnrestrictedAccessOnly => access == QuestionAccess::Unrestricted,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "restricted-access-only" | "restricted" => Some(Self::RestrictedAccessOnly),
            "unrestricted-access-only" | "unrestricted" => Some(Self::UnrestrictedAccessOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionAccess {
    Restricted,
    Unrestricted,
}
