use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightSource {
    CompletionService,
    FallbackRules,
    Error,
}

impl InsightSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CompletionService => "completion-service",
            Self::FallbackRules => "fallback-rules",
            Self::Error => "error",
        }
    }
}

/// Actions bucketed by horizon. Shared by advisor insights and the master plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub immediate: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.short_term.is_empty() && self.long_term.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.immediate.is_empty() && !self.short_term.is_empty() && !self.long_term.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorInsight {
    pub advisor_id: String,
    pub executive_summary: String,
    pub key_insights: Vec<String>,
    pub recommended_actions: ActionPlan,
    pub success_metrics: Vec<String>,
    pub special_considerations: Vec<String>,
    pub source: InsightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Recorded in place of an insight when an advisor fails outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorFailure {
    pub error: String,
    pub source: InsightSource,
}

impl AdvisorFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            source: InsightSource::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdvisorOutcome {
    Insight(AdvisorInsight),
    Failed(AdvisorFailure),
}

impl AdvisorOutcome {
    pub fn source(&self) -> InsightSource {
        match self {
            Self::Insight(insight) => insight.source,
            Self::Failed(failure) => failure.source,
        }
    }

    pub fn insight(&self) -> Option<&AdvisorInsight> {
        match self {
            Self::Insight(insight) => Some(insight),
            Self::Failed(_) => None,
        }
    }
}
