use serde::Serialize;

use super::domain::{MetricCategory, QuestionAccess, QuestionFilter, ResponseSet};

/// A question/answer pair that earns `points` when the response matches.
#[derive(Debug, Clone, Serialize)]
pub struct QualifyingRule {
    pub question_code: &'static str,
    pub prompt: &'static str,
    pub expected_answer: &'static str,
    pub points: u32,
    pub access: QuestionAccess,
}

impl QualifyingRule {
    pub fn is_satisfied_by(&self, responses: &ResponseSet) -> bool {
        responses
            .answer(self.question_code)
            .map(|answer| answer.trim().eq_ignore_ascii_case(self.expected_answer))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: MetricCategory,
    pub max_points: u32,
    pub rules: Vec<QualifyingRule>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub metric_id: &'static str,
    pub question_code: &'static str,
    pub prompt: &'static str,
    pub access: QuestionAccess,
}

/// Read-only catalog of scored metrics.
#[derive(Debug, Clone)]
pub struct MetricRubric {
    metrics: Vec<MetricDefinition>,
}

impl MetricRubric {
    pub fn standard() -> Self {
        Self {
            metrics: standard_metric_definitions(),
        }
    }

    pub fn from_definitions(metrics: Vec<MetricDefinition>) -> Self {
        Self { metrics }
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn definition(&self, metric_id: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|metric| metric.id == metric_id)
    }

    pub fn max_points(&self) -> u32 {
        self.metrics.iter().map(|metric| metric.max_points).sum()
    }

    pub fn category_max_points(&self, category: MetricCategory) -> u32 {
        self.metrics
            .iter()
            .filter(|metric| metric.category == category)
            .map(|metric| metric.max_points)
            .sum()
    }

    pub fn question_access(&self, question_code: &str) -> Option<QuestionAccess> {
        self.metrics
            .iter()
            .flat_map(|metric| metric.rules.iter())
            .find(|rule| rule.question_code == question_code)
            .map(|rule| rule.access)
    }

    pub fn questions(&self, filter: QuestionFilter) -> Vec<QuestionView> {
        self.metrics
            .iter()
            .flat_map(|metric| {
                metric
                    .rules
                    .iter()
                    .filter(move |rule| filter.includes(rule.access))
                    .map(move |rule| QuestionView {
                        metric_id: metric.id,
                        question_code: rule.question_code,
                        prompt: rule.prompt,
                        access: rule.access,
                    })
            })
            .collect()
    }
}

impl Default for MetricRubric {
    fn default() -> Self {
        Self::standard()
    }
}

impl ResponseSet {
    /// Drops answers to catalog questions the filter does not ask.
    pub fn restricted_to(&self, rubric: &MetricRubric, filter: QuestionFilter) -> ResponseSet {
        let mut restricted = self.clone();
        restricted.retain(|code| {
            rubric
                .question_access(code)
                .map(|access| filter.includes(access))
                .unwrap_or(true)
        });
        restricted
    }
}

fn rule(
    question_code: &'static str,
    prompt: &'static str,
    expected_answer: &'static str,
    points: u32,
    access: QuestionAccess,
) -> QualifyingRule {
    QualifyingRule {
        question_code,
        prompt,
        expected_answer,
        points,
        access,
    }
}

#[rustfmt::skip]
fn standard_metric_definitions() -> Vec<MetricDefinition> {
    use QuestionAccess::{Restricted, Unrestricted};

    vec![
        MetricDefinition {
            id: "membership_growth",
            label: "Membership Growth",
            category: MetricCategory::Operational,
            max_points: 8,
            rules: vec![
                rule("OP.MG.001", "Did total membership units grow year over year?", "Yes", 3, Unrestricted),
                rule("OP.MG.002", "Did the twelve-month member retention rate exceed 60%?", "Yes", 3, Unrestricted),
                rule("OP.MG.003", "Is a documented membership growth plan in place?", "Yes", 2, Unrestricted),
                rule("OP.MG.004", "Did new-member joins exceed the prior year?", "Yes", 2, Unrestricted),
            ],
        },
        MetricDefinition {
            id: "staff_retention",
            label: "Staff Retention",
            category: MetricCategory::Operational,
            max_points: 8,
            rules: vec![
                rule("OP.SR.001", "Was full-time staff turnover below 25% last year?", "Yes", 4, Restricted),
                rule("OP.SR.002", "Are exit interviews conducted for departing staff?", "Yes", 2, Unrestricted),
                rule("OP.SR.003", "Was compensation benchmarked within the last three years?", "Yes", 2, Restricted),
            ],
        },
        MetricDefinition {
            id: "member_engagement",
            label: "Member Engagement",
            category: MetricCategory::Operational,
            max_points: 8,
            rules: vec![
                rule("OP.ME.001", "Was net promoter score measured in the last twelve months?", "Yes", 2, Unrestricted),
                rule("OP.ME.002", "Was the most recent net promoter score above 40?", "Yes", 3, Unrestricted),
                rule("OP.ME.003", "Did the member survey response rate exceed 20%?", "Yes", 2, Unrestricted),
                rule("OP.ME.004", "Are volunteers engaged in program delivery?", "Yes", 2, Unrestricted),
            ],
        },
        MetricDefinition {
            id: "risk_mitigation",
            label: "Risk Mitigation",
            category: MetricCategory::Operational,
            max_points: 8,
            rules: vec![
                rule("OP.RM.001", "Have all staff completed child protection training?", "Yes", 3, Restricted),
                rule("OP.RM.002", "Are emergency action plans reviewed annually?", "Yes", 2, Unrestricted),
                rule("OP.RM.003", "Was insurance coverage reviewed in the last year?", "Yes", 2, Restricted),
                rule("OP.RM.004", "Is an incident reporting system in use?", "Yes", 1, Unrestricted),
            ],
        },
        MetricDefinition {
            id: "governance",
            label: "Governance",
            category: MetricCategory::Operational,
            max_points: 8,
            rules: vec![
                rule("OP.GV.001", "Did the board meet at least quarterly?", "Yes", 2, Unrestricted),
                rule("OP.GV.002", "Did the board complete a CEO evaluation this year?", "Yes", 2, Restricted),
                rule("OP.GV.003", "Was a strategic plan approved within the last three years?", "Yes", 2, Unrestricted),
                rule("OP.GV.004", "Did every board member make a personal gift?", "Yes", 2, Unrestricted),
            ],
        },
        MetricDefinition {
            id: "months_of_liquidity",
            label: "Months of Liquidity",
            category: MetricCategory::Financial,
            max_points: 12,
            rules: vec![
                rule("FI.LQ.001", "Does unrestricted cash cover at least one month of expenses?", "Yes", 4, Unrestricted),
                rule("FI.LQ.002", "Does unrestricted cash cover at least two months of expenses?", "Yes", 4, Unrestricted),
                rule("FI.LQ.003", "Does unrestricted cash cover at least three months of expenses?", "Yes", 4, Unrestricted),
                rule("FI.LQ.004", "Has the board adopted a cash reserve policy?", "Yes", 4, Restricted),
            ],
        },
        MetricDefinition {
            id: "operating_margin",
            label: "Operating Margin",
            category: MetricCategory::Financial,
            max_points: 8,
            rules: vec![
                rule("FI.OM.001", "Was the operating margin positive last fiscal year?", "Yes", 4, Unrestricted),
                rule("FI.OM.002", "Was the operating margin at or above 3%?", "Yes", 2, Unrestricted),
                rule("FI.OM.003", "Is budget variance reviewed monthly by finance committee?", "Yes", 2, Restricted),
            ],
        },
        MetricDefinition {
            id: "debt_ratio",
            label: "Debt Ratio",
            category: MetricCategory::Financial,
            max_points: 6,
            rules: vec![
                rule("FI.DR.001", "Is the debt-to-asset ratio below 40%?", "Yes", 3, Unrestricted),
                rule("FI.DR.002", "Were all debt covenants met last year?", "Yes", 2, Restricted),
                rule("FI.DR.003", "What is the debt service coverage ratio?", "Above 1.25", 2, Restricted),
            ],
        },
        MetricDefinition {
            id: "charitable_revenue",
            label: "Charitable Revenue",
            category: MetricCategory::Financial,
            max_points: 8,
            rules: vec![
                rule("FI.CR.001", "Did the annual campaign meet its goal?", "Yes", 3, Unrestricted),
                rule("FI.CR.002", "Is charitable revenue at least 10% of total revenue?", "Yes", 3, Unrestricted),
                rule("FI.CR.003", "Is donor retention above 45%?", "Yes", 2, Restricted),
            ],
        },
        MetricDefinition {
            id: "operating_revenue_mix",
            label: "Operating Revenue Mix",
            category: MetricCategory::Financial,
            max_points: 6,
            rules: vec![
                rule("FI.RM.001", "What share of revenue comes from the largest single source?", "Under 50%", 3, Unrestricted),
                rule("FI.RM.002", "Is program revenue spread across at least three lines?", "Yes", 2, Unrestricted),
                rule("FI.RM.003", "Are government grants under 30% of revenue?", "Yes", 1, Restricted),
            ],
        },
    ]
}
