use super::insight::{ActionPlan, AdvisorInsight, InsightSource};
use super::kind::AdvisorKind;
use crate::scoring::{PerformanceSnapshot, PerformanceTier};

struct FallbackCopy {
    outlook: &'static str,
    key_insights: &'static [&'static str],
    immediate: &'static [&'static str],
    short_term: &'static [&'static str],
    long_term: &'static [&'static str],
}

/// Deterministic insight used when the completion service is unavailable or
/// its output cannot be read. Every list carries at least one entry.
pub fn fallback_insight(
    advisor_id: &str,
    kind: AdvisorKind,
    snapshot: &PerformanceSnapshot,
) -> AdvisorInsight {
    let tier = snapshot.performance_tier;
    let copy = copy_for(kind, tier);

    let executive_summary = format!(
        "{} scored {}/{} ({:.0}%), a {} performance tier with a {} designation. {}",
        snapshot.organization_id,
        snapshot.total_points,
        snapshot.max_points,
        snapshot.percentage,
        tier.label().to_lowercase(),
        snapshot.support_designation.label(),
        copy.outlook
    );

    let mut key_insights = to_owned(copy.key_insights);
    if let Some(weakest) = weakest_focus_metric(kind, snapshot) {
        key_insights.push(format!(
            "Weakest {} metric: {} at {}/{} points",
            kind.focus(),
            weakest.0,
            weakest.1,
            weakest.2
        ));
    }

    AdvisorInsight {
        advisor_id: advisor_id.to_string(),
        executive_summary,
        key_insights,
        recommended_actions: ActionPlan {
            immediate: to_owned(copy.immediate),
            short_term: to_owned(copy.short_term),
            long_term: to_owned(copy.long_term),
        },
        success_metrics: to_owned(success_metrics(kind)),
        special_considerations: to_owned(special_considerations(kind, tier)),
        source: InsightSource::FallbackRules,
        model: None,
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn weakest_focus_metric(
    kind: AdvisorKind,
    snapshot: &PerformanceSnapshot,
) -> Option<(String, u32, u32)> {
    let focus = kind.focus_metrics();
    snapshot
        .weakest_metrics(snapshot.metric_scores.len())
        .into_iter()
        .find(|score| focus.contains(&score.metric_id.as_str()))
        .filter(|score| score.points < score.max_points)
        .map(|score| (score.label.clone(), score.points, score.max_points))
}

fn success_metrics(kind: AdvisorKind) -> &'static [&'static str] {
    match kind {
        AdvisorKind::Financial => &[
            "Months of unrestricted liquidity",
            "Operating margin percentage",
            "Charitable revenue as a share of total revenue",
        ],
        AdvisorKind::StaffRetention => &[
            "Full-time staff turnover rate",
            "Exit interview completion rate",
            "Share of roles paid at or above market benchmark",
        ],
        AdvisorKind::MembershipGrowth => &[
            "Net membership units year over year",
            "Twelve-month member retention rate",
            "New-member joins per month",
        ],
        AdvisorKind::MemberEngagement => &[
            "Net promoter score",
            "Member survey response rate",
            "Active volunteer count",
        ],
        AdvisorKind::RiskGovernance => &[
            "Child protection training completion rate",
            "Board meeting attendance",
            "Open incident reports older than 30 days",
        ],
    }
}

fn special_considerations(kind: AdvisorKind, tier: PerformanceTier) -> &'static [&'static str] {
    match (kind, tier) {
        (AdvisorKind::Financial, PerformanceTier::Low) => &[
            "Engage Y-USA financial consultants before taking on new debt or capital projects",
        ],
        (AdvisorKind::Financial, _) => &[
            "Restricted funds cannot be used to close operating gaps; confirm donor intent first",
        ],
        (AdvisorKind::StaffRetention, _) => &[
            "Compensation changes need board finance committee review before budget adoption",
        ],
        (AdvisorKind::MembershipGrowth, _) => &[
            "Growth targets should account for facility capacity and local market saturation",
        ],
        (AdvisorKind::MemberEngagement, _) => &[
            "Survey fatigue lowers response rates; keep member surveys short and infrequent",
        ],
        (AdvisorKind::RiskGovernance, PerformanceTier::Low) => &[
            "Child protection gaps are a mandatory escalation to the Y-USA risk team",
        ],
        (AdvisorKind::RiskGovernance, _) => &[
            "Board policy changes should be recorded in minutes to satisfy audit requirements",
        ],
    }
}

fn copy_for(kind: AdvisorKind, tier: PerformanceTier) -> FallbackCopy {
    match (kind, tier) {
        (AdvisorKind::Financial, PerformanceTier::Low) => FallbackCopy {
            outlook: "Financial fundamentals need stabilization before growth investments.",
            key_insights: &[
                "Cash reserves are below the level needed to absorb a revenue shortfall",
                "Operating results are not generating a surplus to rebuild reserves",
            ],
            immediate: &[
                "Produce a 13-week cash flow forecast and review it weekly",
                "Pause non-essential capital spending",
            ],
            short_term: &["Set a board-approved operating reserve target"],
            long_term: &["Diversify revenue so no single source exceeds half of income"],
        },
        (AdvisorKind::Financial, PerformanceTier::Moderate) => FallbackCopy {
            outlook: "Finances are stable with room to strengthen reserves and margin.",
            key_insights: &[
                "Liquidity is adequate but thin against a major disruption",
                "Charitable revenue is an underused lever for financial resilience",
            ],
            immediate: &["Review monthly budget variance with the finance committee"],
            short_term: &["Grow the annual campaign goal by at least 5%"],
            long_term: &["Build unrestricted reserves toward three months of expenses"],
        },
        (AdvisorKind::Financial, PerformanceTier::High) => FallbackCopy {
            outlook: "Financial position is strong; focus on sustaining discipline.",
            key_insights: &[
                "Reserves and margin support strategic investment",
                "Revenue mix is healthy and resilient",
            ],
            immediate: &["Document the practices behind current financial results"],
            short_term: &["Evaluate mission investments funded from surplus"],
            long_term: &["Mentor peer associations on financial management"],
        },
        (AdvisorKind::StaffRetention, PerformanceTier::Low) => FallbackCopy {
            outlook: "Staff turnover is a material risk to program delivery.",
            key_insights: &[
                "Turnover is above the level that sustains program quality",
                "Departure reasons are not being captured systematically",
            ],
            immediate: &["Start exit interviews for every departing staff member"],
            short_term: &["Benchmark compensation for the highest-turnover roles"],
            long_term: &["Build career pathways for front-line staff"],
        },
        (AdvisorKind::StaffRetention, PerformanceTier::Moderate) => FallbackCopy {
            outlook: "Workforce stability is fair with specific gaps to close.",
            key_insights: &[
                "Retention practices exist but are applied unevenly",
                "Compensation benchmarking may be out of date",
            ],
            immediate: &["Review turnover by department to find hot spots"],
            short_term: &["Refresh the compensation benchmark study"],
            long_term: &["Introduce a staff engagement survey cycle"],
        },
        (AdvisorKind::StaffRetention, PerformanceTier::High) => FallbackCopy {
            outlook: "Staff retention is a strength worth protecting.",
            key_insights: &[
                "Turnover is below benchmark",
                "Retention practices are established and consistent",
            ],
            immediate: &["Recognize managers with the strongest retention"],
            short_term: &["Share retention practices across departments"],
            long_term: &["Develop succession plans for key leadership roles"],
        },
        (AdvisorKind::MembershipGrowth, PerformanceTier::Low) => FallbackCopy {
            outlook: "Membership is declining or flat and needs a focused recovery plan.",
            key_insights: &[
                "Membership units are not growing year over year",
                "Retention losses are offsetting new joins",
            ],
            immediate: &["Launch a win-back campaign for recently lapsed members"],
            short_term: &["Write a documented membership growth plan"],
            long_term: &["Align programs with underserved community segments"],
        },
        (AdvisorKind::MembershipGrowth, PerformanceTier::Moderate) => FallbackCopy {
            outlook: "Membership is steady with clear opportunities to accelerate growth.",
            key_insights: &[
                "Growth is modest and depends on a few programs",
                "Retention is near the network benchmark",
            ],
            immediate: &["Review join and cancel trends by membership type"],
            short_term: &["Pilot a referral incentive for current members"],
            long_term: &["Expand community partnerships that feed membership"],
        },
        (AdvisorKind::MembershipGrowth, PerformanceTier::High) => FallbackCopy {
            outlook: "Membership growth is strong; focus on sustaining momentum.",
            key_insights: &[
                "Membership is growing faster than the prior year",
                "Retention supports durable growth",
            ],
            immediate: &["Confirm facility capacity for continued growth"],
            short_term: &["Segment growth to find the fastest-growing audiences"],
            long_term: &["Plan program expansion for new member segments"],
        },
        (AdvisorKind::MemberEngagement, PerformanceTier::Low) => FallbackCopy {
            outlook: "Member engagement is weak and not consistently measured.",
            key_insights: &[
                "Member feedback is not collected on a regular cycle",
                "Volunteer involvement in programs is limited",
            ],
            immediate: &["Run a short net promoter score survey"],
            short_term: &["Recruit volunteers for two signature programs"],
            long_term: &["Build a member experience improvement cycle"],
        },
        (AdvisorKind::MemberEngagement, PerformanceTier::Moderate) => FallbackCopy {
            outlook: "Engagement is measured but results are mixed.",
            key_insights: &[
                "Net promoter score is tracked but below target",
                "Survey response rates limit confidence in results",
            ],
            immediate: &["Share survey results with front-line staff"],
            short_term: &["Close the loop with detractors within two weeks"],
            long_term: &["Tie engagement goals to staff performance plans"],
        },
        (AdvisorKind::MemberEngagement, PerformanceTier::High) => FallbackCopy {
            outlook: "Members are highly engaged and advocating for the Y.",
            key_insights: &[
                "Net promoter score is strong",
                "Volunteers are active in program delivery",
            ],
            immediate: &["Thank promoters and invite them to refer friends"],
            short_term: &["Create volunteer leadership roles"],
            long_term: &["Use engaged members as community ambassadors"],
        },
        (AdvisorKind::RiskGovernance, PerformanceTier::Low) => FallbackCopy {
            outlook: "Risk and governance gaps need board attention now.",
            key_insights: &[
                "Child protection and emergency practices are incomplete",
                "Board oversight routines are irregular",
            ],
            immediate: &["Complete child protection training for all staff"],
            short_term: &["Set a quarterly board meeting calendar with risk review"],
            long_term: &["Adopt a board-approved strategic plan"],
        },
        (AdvisorKind::RiskGovernance, PerformanceTier::Moderate) => FallbackCopy {
            outlook: "Core risk practices exist with governance gaps to close.",
            key_insights: &[
                "Risk practices are in place but reviewed irregularly",
                "Board evaluation of the CEO is not routine",
            ],
            immediate: &["Schedule an insurance coverage review"],
            short_term: &["Institute an annual CEO evaluation"],
            long_term: &["Refresh the strategic plan on a three-year cycle"],
        },
        (AdvisorKind::RiskGovernance, PerformanceTier::High) => FallbackCopy {
            outlook: "Risk management and governance are well established.",
            key_insights: &[
                "Risk practices are reviewed on schedule",
                "The board is engaged and giving",
            ],
            immediate: &["Audit incident reports for recurring patterns"],
            short_term: &["Run a tabletop emergency exercise with leadership"],
            long_term: &["Share governance practices with peer associations"],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        CategoryTotals, OrganizationId, PerformanceEngine, QuestionFilter, ResponseSet,
        Submission, SupportDesignation,
    };

    fn snapshot_at(tier: PerformanceTier) -> PerformanceSnapshot {
        let mut snapshot = PerformanceEngine::standard().score(
            &Submission::new(OrganizationId::new("ymca-fallback"), ResponseSet::new()),
            QuestionFilter::All,
        );
        snapshot.performance_tier = tier;
        snapshot.support_designation = match tier {
            PerformanceTier::Low => SupportDesignation::YUsaSupport,
            _ => SupportDesignation::IndependentImprovement,
        };
        snapshot
    }

    #[test]
    fn every_kind_and_tier_is_well_formed() {
        for kind in AdvisorKind::ordered() {
            for tier in PerformanceTier::ordered() {
                let insight = fallback_insight(kind.id(), kind, &snapshot_at(tier));

                assert!(!insight.executive_summary.is_empty(), "{kind:?}/{tier:?}");
                assert!(!insight.key_insights.is_empty(), "{kind:?}/{tier:?}");
                assert!(insight.recommended_actions.is_complete(), "{kind:?}/{tier:?}");
                assert!(!insight.success_metrics.is_empty(), "{kind:?}/{tier:?}");
                assert!(!insight.special_considerations.is_empty(), "{kind:?}/{tier:?}");
                assert_eq!(insight.source, InsightSource::FallbackRules);
            }
        }
    }

    #[test]
    fn summary_reflects_snapshot_numbers() {
        let mut snapshot = snapshot_at(PerformanceTier::Moderate);
        snapshot.total_points = 36;
        snapshot.percentage = 45.0;
        snapshot.category_totals = CategoryTotals {
            operational: 20,
            financial: 16,
        };

        let insight = fallback_insight("financial", AdvisorKind::Financial, &snapshot);
        assert!(insight.executive_summary.contains("36/80 (45%)"));
        assert!(insight.executive_summary.contains("Independent Improvement"));
    }

    #[test]
    fn weakest_focus_metric_is_called_out() {
        let insight = fallback_insight(
            "staff-retention",
            AdvisorKind::StaffRetention,
            &snapshot_at(PerformanceTier::Low),
        );
        assert!(insight
            .key_insights
            .iter()
            .any(|line| line.starts_with("Weakest staff retention")));
    }
}
