use serde::{Deserialize, Serialize};

use crate::advisors::insight::AdvisorInsight;

/// Keywords scanned for in every advisor's key insights, in tie-break order.
const THEME_VOCABULARY: &[&str] = &[
    "retention",
    "revenue",
    "engagement",
    "governance",
    "liquidity",
    "reserves",
    "volunteer",
    "compensation",
    "growth",
    "board",
    "community",
    "staff",
];

const HIGH_PRIORITY_MENTIONS: usize = 3;
const MIN_MENTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCuttingTheme {
    pub theme: String,
    pub frequency: usize,
    pub priority: ThemePriority,
    pub advisors: Vec<String>,
}

/// Each advisor counts at most once per keyword.
pub(crate) fn cross_cutting_themes<'a, I>(insights: I) -> Vec<CrossCuttingTheme>
where
    I: IntoIterator<Item = &'a AdvisorInsight>,
{
    let lowered: Vec<(&str, Vec<String>)> = insights
        .into_iter()
        .map(|insight| {
            (
                insight.advisor_id.as_str(),
                insight
                    .key_insights
                    .iter()
                    .map(|line| line.to_lowercase())
                    .collect(),
            )
        })
        .collect();

    let mut themes: Vec<CrossCuttingTheme> = THEME_VOCABULARY
        .iter()
        .filter_map(|keyword| {
            let advisors: Vec<String> = lowered
                .iter()
                .filter(|(_, lines)| lines.iter().any(|line| line.contains(keyword)))
                .map(|(advisor_id, _)| advisor_id.to_string())
                .collect();
            let frequency = advisors.len();
            (frequency >= MIN_MENTIONS).then(|| CrossCuttingTheme {
                theme: keyword.to_string(),
                frequency,
                priority: if frequency >= HIGH_PRIORITY_MENTIONS {
                    ThemePriority::High
                } else {
                    ThemePriority::Medium
                },
                advisors,
            })
        })
        .collect();

    themes.sort_by(|left, right| right.frequency.cmp(&left.frequency));
    themes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisors::insight::{ActionPlan, InsightSource};

    fn insight(id: &str, lines: &[&str]) -> AdvisorInsight {
        AdvisorInsight {
            advisor_id: id.to_string(),
            executive_summary: "summary".to_string(),
            key_insights: lines.iter().map(|line| line.to_string()).collect(),
            recommended_actions: ActionPlan::default(),
            success_metrics: Vec::new(),
            special_considerations: Vec::new(),
            source: InsightSource::FallbackRules,
            model: None,
        }
    }

    #[test]
    fn keeps_shared_keywords_sorted_by_frequency() {
        let insights = vec![
            insight("a", &["Staff RETENTION is slipping", "Revenue is flat"]),
            insight("b", &["Member retention is strong", "revenue mix is narrow"]),
            insight("c", &["Retention drives growth"]),
            insight("d", &["Liquidity is thin"]),
        ];

        let themes = cross_cutting_themes(&insights);
        let names: Vec<&str> = themes.iter().map(|theme| theme.theme.as_str()).collect();
        assert_eq!(names, vec!["retention", "revenue"]);

        assert_eq!(themes[0].frequency, 3);
        assert_eq!(themes[0].priority, ThemePriority::High);
        assert_eq!(themes[0].advisors, vec!["a", "b", "c"]);
        assert_eq!(themes[1].priority, ThemePriority::Medium);
    }

    #[test]
    fn repeated_mentions_by_one_advisor_count_once() {
        let insights = vec![
            insight("a", &["board turnover", "board attendance", "board giving"]),
            insight("b", &["nothing shared"]),
        ];
        assert!(cross_cutting_themes(&insights).is_empty());
    }
}
