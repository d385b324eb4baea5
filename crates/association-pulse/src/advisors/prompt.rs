use serde_json::json;
use std::fmt::Write as _;

use super::kind::AdvisorConfig;
use crate::completion::{CompletionRequest, PromptPair};
use crate::scoring::PerformanceSnapshot;

pub(crate) const RESPONSE_FORMAT: &str = "\
Respond using exactly these sections, in this order:
Executive Summary: one paragraph.
Key Insights: bulleted list.
Recommended Actions: with Immediate, Short-term, and Long-term bulleted sub-lists.
Success Metrics: bulleted list.
Special Considerations: bulleted list.";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("unknown placeholder {{{0}}} in prompt template")]
    UnknownPlaceholder(String),
    #[error("unterminated placeholder in prompt template")]
    Unterminated,
}

pub(crate) fn build_request(
    config: &AdvisorConfig,
    snapshot: &PerformanceSnapshot,
) -> Result<CompletionRequest, PromptError> {
    let user = render(&config.prompt_template, |name| {
        placeholder_value(name, config, snapshot)
    })?;

    Ok(CompletionRequest {
        prompt: PromptPair {
            system: config.kind.role().to_string(),
            user,
        },
        context: json!({
            "advisorId": config.id,
            "advisorKind": config.kind,
            "organizationId": snapshot.organization_id,
            "percentage": round_one(snapshot.percentage),
            "performanceTier": snapshot.performance_tier,
        }),
    })
}

fn placeholder_value(
    name: &str,
    config: &AdvisorConfig,
    snapshot: &PerformanceSnapshot,
) -> Option<String> {
    let value = match name {
        "display_name" => config.display_name.clone(),
        "organization_id" => snapshot.organization_id.to_string(),
        "focus" => config.kind.focus().to_string(),
        "total_points" => snapshot.total_points.to_string(),
        "max_points" => snapshot.max_points.to_string(),
        "percentage" => format!("{:.1}", snapshot.percentage),
        "performance_tier" => snapshot.performance_tier.label().to_string(),
        "support_designation" => snapshot.support_designation.label().to_string(),
        "operational_total" => snapshot.category_totals.operational.to_string(),
        "financial_total" => snapshot.category_totals.financial.to_string(),
        "metric_lines" => metric_lines(snapshot, |_| true),
        "focus_metric_lines" => {
            let focus = config.kind.focus_metrics();
            metric_lines(snapshot, |metric_id| focus.contains(&metric_id))
        }
        "response_format" => RESPONSE_FORMAT.to_string(),
        _ => return None,
    };
    Some(value)
}

fn metric_lines<F>(snapshot: &PerformanceSnapshot, include: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut lines = String::new();
    for score in snapshot
        .metric_scores
        .iter()
        .filter(|score| include(&score.metric_id))
    {
        let _ = writeln!(
            lines,
            "- {} ({}): {}/{} ({})",
            score.label,
            score.category.label(),
            score.points,
            score.max_points,
            score.tier.label()
        );
    }
    if lines.is_empty() {
        lines.push_str("- none reported\n");
    }
    lines.trim_end().to_string()
}

/// `{name}` substitution; `{{` and `}}` are literal braces.
fn render<F>(template: &str, lookup: F) -> Result<String, PromptError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(PromptError::Unterminated),
                    }
                }
                let value = lookup(name.trim())
                    .ok_or_else(|| PromptError::UnknownPlaceholder(name.trim().to_string()))?;
                output.push_str(&value);
            }
            other => output.push(other),
        }
    }

    Ok(output)
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
