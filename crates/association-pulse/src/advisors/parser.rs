//! Best-effort reader for free-form completion text.
//!
//! The parser is total: any input, including degenerate input, produces a
//! [`ParsedResponse`]. Sections are located by case-insensitive heading match
//! and a section runs until the next recognized heading. Within a section only
//! bulleted or numbered lines become list items.

use super::insight::ActionPlan;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub executive_summary: String,
    pub key_insights: Vec<String>,
    pub recommended_actions: ActionPlan,
    pub success_metrics: Vec<String>,
    pub special_considerations: Vec<String>,
}

impl ParsedResponse {
    pub fn empty_shell() -> Self {
        Self::default()
    }

    fn has_populated_section(&self) -> bool {
        !self.key_insights.is_empty()
            || !self.recommended_actions.is_empty()
            || !self.success_metrics.is_empty()
            || !self.special_considerations.is_empty()
    }

    /// A summary plus at least one populated section.
    pub fn is_usable(&self) -> bool {
        !self.executive_summary.trim().is_empty() && self.has_populated_section()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ExecutiveSummary,
    KeyInsights,
    RecommendedActions,
    SuccessMetrics,
    SpecialConsiderations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Horizon {
    Immediate,
    ShortTerm,
    LongTerm,
}

const SECTION_HEADINGS: &[(Section, &[&str])] = &[
    (
        Section::ExecutiveSummary,
        &["executive summary", "summary", "overview"],
    ),
    (
        Section::KeyInsights,
        &["key insights", "insights", "key findings"],
    ),
    (
        Section::RecommendedActions,
        &["recommended actions", "recommendations", "action plan"],
    ),
    (
        Section::SuccessMetrics,
        &[
            "success metrics",
            "metrics for success",
            "key performance indicators",
            "kpis",
        ],
    ),
    (
        Section::SpecialConsiderations,
        &[
            "special considerations",
            "considerations",
            "risks and considerations",
        ],
    ),
];

const HORIZON_HEADINGS: &[(Horizon, &[&str])] = &[
    (
        Horizon::Immediate,
        &["immediate", "immediate actions", "immediate priorities"],
    ),
    (
        Horizon::ShortTerm,
        &[
            "short-term",
            "short term",
            "short-term actions",
            "short term actions",
            "short-term priorities",
        ],
    ),
    (
        Horizon::LongTerm,
        &[
            "long-term",
            "long term",
            "long-term actions",
            "long term actions",
            "long-term priorities",
        ],
    ),
];

/// Parses completion text. Empty or whitespace-only input yields the empty shell.
pub fn parse_response(text: &str) -> ParsedResponse {
    if text.trim().is_empty() {
        return ParsedResponse::empty_shell();
    }

    let mut parsed = ParsedResponse::default();
    let mut summary_lines: Vec<String> = Vec::new();
    let mut current: Option<Section> = None;
    let mut horizon: Option<Horizon> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((section, inline)) =
            match_heading(line, SECTION_HEADINGS, Numbered::BareOnly)
        {
            current = Some(section);
            horizon = None;
            if let Some(inline) = inline {
                absorb_inline(&mut parsed, &mut summary_lines, section, inline);
            }
            continue;
        }

        match current {
            None => {}
            Some(Section::ExecutiveSummary) => {
                summary_lines.push(strip_bullet(line).unwrap_or(line).to_string());
            }
            Some(Section::RecommendedActions) => {
                let label = strip_bullet(line).unwrap_or(line);
                if let Some((next, inline)) =
                    match_heading(label, HORIZON_HEADINGS, Numbered::Any)
                {
                    horizon = Some(next);
                    if let Some(item) = inline.and_then(|text| clean_item(&text)) {
                        horizon_list(&mut parsed.recommended_actions, next).push(item);
                    }
                    continue;
                }
                if let Some(item) = list_item(line) {
                    let bucket = horizon.unwrap_or(Horizon::Immediate);
                    horizon_list(&mut parsed.recommended_actions, bucket).push(item);
                }
            }
            Some(section) => {
                if let Some(item) = list_item(line) {
                    if let Some(list) = section_list(&mut parsed, section) {
                        list.push(item);
                    }
                }
            }
        }
    }

    parsed.executive_summary = summary_lines.join(" ").trim().to_string();
    parsed
}

/// Accepts any JSON value; only strings are parsed.
pub fn parse_response_value(value: &serde_json::Value) -> ParsedResponse {
    match value.as_str() {
        Some(text) => parse_response(text),
        None => ParsedResponse::empty_shell(),
    }
}

fn absorb_inline(
    parsed: &mut ParsedResponse,
    summary_lines: &mut Vec<String>,
    section: Section,
    inline: String,
) {
    match section {
        Section::ExecutiveSummary => summary_lines.push(inline),
        Section::RecommendedActions => {}
        other => {
            if let Some(list) = section_list(parsed, other) {
                if let Some(item) = clean_item(&inline) {
                    list.push(item);
                }
            }
        }
    }
}

fn section_list(parsed: &mut ParsedResponse, section: Section) -> Option<&mut Vec<String>> {
    match section {
        Section::KeyInsights => Some(&mut parsed.key_insights),
        Section::SuccessMetrics => Some(&mut parsed.success_metrics),
        Section::SpecialConsiderations => Some(&mut parsed.special_considerations),
        Section::ExecutiveSummary | Section::RecommendedActions => None,
    }
}

fn horizon_list(plan: &mut ActionPlan, horizon: Horizon) -> &mut Vec<String> {
    match horizon {
        Horizon::Immediate => &mut plan.immediate,
        Horizon::ShortTerm => &mut plan.short_term,
        Horizon::LongTerm => &mut plan.long_term,
    }
}

/// How a number prefix on a heading line is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbered {
    /// `1. Overview: text` is a list item; `1. Overview` and `## 1. Overview:`
    /// are headings.
    BareOnly,
    Any,
}

/// Matches `## Key Insights`, `**Key Insights:**`, `3. KEY INSIGHTS`,
/// `## 1. Executive Summary`, `Immediate (0-30 days):` and similar. Returns
/// trailing text after a colon.
fn match_heading<T: Copy>(
    line: &str,
    table: &[(T, &[&str])],
    numbered: Numbered,
) -> Option<(T, Option<String>)> {
    if is_plain_bullet(line) {
        return None;
    }

    let decorated = line.starts_with(['#', '*', '_']);
    let undecorated =
        line.trim_start_matches(|c: char| matches!(c, '#' | '*' | '_') || c.is_whitespace());
    let (stripped, has_number) = match strip_number_prefix(undecorated) {
        Some(rest) => (rest, true),
        None => (undecorated, false),
    };

    let (head, rest) = match stripped.split_once(':') {
        Some((head, rest)) => (head, Some(rest)),
        None => (stripped, None),
    };

    let normalized = normalize_heading(head);
    if normalized.is_empty() {
        return None;
    }

    let (kind, _) = table
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| *alias == normalized))?;

    let inline = rest
        .map(|text| {
            strip_emphasis(text)
                .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace())
                .to_string()
        })
        .filter(|text| !text.is_empty());

    if numbered == Numbered::BareOnly && has_number && !decorated && inline.is_some() {
        return None;
    }

    Some((*kind, inline))
}

fn normalize_heading(head: &str) -> String {
    let mut text = String::with_capacity(head.len());
    let mut depth = 0usize;
    for ch in head.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '*' | '_' | '#' | '`' => {}
            _ if depth == 0 => text.push(ch.to_ascii_lowercase()),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_plain_bullet(line: &str) -> bool {
    line.starts_with("- ")
        || line.starts_with("• ")
        || line.starts_with("* ")
        || line.starts_with("+ ")
}

fn strip_number_prefix(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Strips a recognized bullet or number prefix; `None` when there is none.
fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ["-", "•", "*", "+"] {
        if let Some(rest) = line.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim_start());
            }
        }
    }
    strip_number_prefix(line)
}

fn list_item(line: &str) -> Option<String> {
    strip_bullet(line).and_then(clean_item)
}

fn clean_item(text: &str) -> Option<String> {
    let cleaned = strip_emphasis(text).trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "")
}
