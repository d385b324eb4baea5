use serde::{Deserialize, Serialize};

/// Fixed catalog of advisor specialties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisorKind {
    Financial,
    StaffRetention,
    MembershipGrowth,
    MemberEngagement,
    RiskGovernance,
}

impl AdvisorKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Financial,
            Self::StaffRetention,
            Self::MembershipGrowth,
            Self::MemberEngagement,
            Self::RiskGovernance,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::StaffRetention => "staff-retention",
            Self::MembershipGrowth => "membership-growth",
            Self::MemberEngagement => "member-engagement",
            Self::RiskGovernance => "risk-governance",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Financial => "Financial Sustainability Advisor",
            Self::StaffRetention => "Staff Retention Advisor",
            Self::MembershipGrowth => "Membership Growth Advisor",
            Self::MemberEngagement => "Member Engagement Advisor",
            Self::RiskGovernance => "Risk & Governance Advisor",
        }
    }

    /// Role statement used as the system prompt.
    pub const fn role(self) -> &'static str {
        match self {
            Self::Financial => "You are a nonprofit CFO advising YMCA associations on liquidity, operating margin, debt, and revenue diversification.",
            Self::StaffRetention => "You are a human resources leader advising YMCA associations on staff turnover, compensation, and workplace culture.",
            Self::MembershipGrowth => "You are a membership strategist advising YMCA associations on acquisition, retention, and growth planning.",
            Self::MemberEngagement => "You are a member experience expert advising YMCA associations on engagement, net promoter score, and volunteer involvement.",
            Self::RiskGovernance => "You are a governance and risk advisor to YMCA boards covering child protection, insurance, emergency readiness, and board practice.",
        }
    }

    pub const fn focus(self) -> &'static str {
        match self {
            Self::Financial => "financial sustainability",
            Self::StaffRetention => "staff retention and workforce stability",
            Self::MembershipGrowth => "membership growth",
            Self::MemberEngagement => "member engagement and experience",
            Self::RiskGovernance => "risk mitigation and board governance",
        }
    }

    /// Rubric metric ids this advisor reads most closely.
    pub const fn focus_metrics(self) -> &'static [&'static str] {
        match self {
            Self::Financial => &[
                "months_of_liquidity",
                "operating_margin",
                "debt_ratio",
                "charitable_revenue",
                "operating_revenue_mix",
            ],
            Self::StaffRetention => &["staff_retention", "governance"],
            Self::MembershipGrowth => &["membership_growth", "member_engagement"],
            Self::MemberEngagement => &["member_engagement", "membership_growth"],
            Self::RiskGovernance => &["risk_mitigation", "governance"],
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|kind| kind.id() == id)
    }
}

/// Static per-advisor settings held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorConfig {
    pub id: String,
    pub kind: AdvisorKind,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub prompt_template: String,
}

impl AdvisorConfig {
    pub fn standard(kind: AdvisorKind) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            display_name: kind.label().to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }
}

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
As the {display_name}, review the self-assessment results for association {organization_id} with a focus on {focus}.

Overall score: {total_points}/{max_points} ({percentage}%)
Performance tier: {performance_tier}
Support designation: {support_designation}
Operational points: {operational_total}
Financial points: {financial_total}

Metric results:
{metric_lines}

Metrics in your focus area:
{focus_metric_lines}

{response_format}";
