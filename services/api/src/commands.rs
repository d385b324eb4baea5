use crate::infra::{advisor_manager, parse_filter};
use association_pulse::advisors::{AdvisorOutcome, ComprehensiveAnalysis};
use association_pulse::config::AppConfig;
use association_pulse::error::AppError;
use association_pulse::scoring::{
    MetricCategory, OrganizationId, PerformanceEngine, PerformanceSnapshot, QuestionFilter,
};
use association_pulse::survey::SurveyImporter;
use association_pulse::telemetry;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Survey export with `Question Code,Answer` columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Organization the survey belongs to
    #[arg(long)]
    pub(crate) organization: String,
    /// Question filter: all, restricted-access-only, unrestricted-access-only
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    pub(crate) filter: QuestionFilter,
    /// Print JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Survey export with `Question Code,Answer` columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Organization the survey belongs to
    #[arg(long)]
    pub(crate) organization: String,
    /// Question filter: all, restricted-access-only, unrestricted-access-only
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    pub(crate) filter: QuestionFilter,
    /// Print JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RubricArgs {
    /// Question filter: all, restricted-access-only, unrestricted-access-only
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    pub(crate) filter: QuestionFilter,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        csv,
        organization,
        filter,
        json,
    } = args;

    let submission = SurveyImporter::from_path(&csv, OrganizationId::new(organization))?;
    let snapshot = PerformanceEngine::standard().score(&submission, filter);

    if json {
        print_json(&snapshot);
    } else {
        render_snapshot(&snapshot);
    }
    Ok(())
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        csv,
        organization,
        filter,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let submission = SurveyImporter::from_path(&csv, OrganizationId::new(organization))?;
    let snapshot = PerformanceEngine::standard().score(&submission, filter);
    let manager = advisor_manager(&config)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let analysis = match manager
        .generate_comprehensive_analysis(&snapshot, &cancel)
        .await
    {
        Ok(analysis) => analysis,
        Err(error) => {
            eprintln!("{error}");
            return Ok(());
        }
    };

    if json {
        print_json(&analysis);
    } else {
        render_snapshot(&snapshot);
        render_analysis(&analysis);
    }
    Ok(())
}

pub(crate) fn run_rubric(args: RubricArgs) -> Result<(), AppError> {
    let engine = PerformanceEngine::standard();
    let rubric = engine.rubric();

    println!("Rubric questions ({:?})", args.filter);
    for definition in rubric.definitions() {
        let questions: Vec<_> = definition
            .rules
            .iter()
            .filter(|rule| args.filter.includes(rule.access))
            .collect();
        if questions.is_empty() {
            continue;
        }
        println!(
            "\n{} [{}] max {} pts",
            definition.label,
            definition.category.label(),
            definition.max_points
        );
        for rule in questions {
            println!(
                "  {:<11} {:>2} pts  expects '{}'  {}",
                rule.question_code, rule.points, rule.expected_answer, rule.prompt
            );
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(error) => eprintln!("could not serialize output: {error}"),
    }
}

fn render_snapshot(snapshot: &PerformanceSnapshot) {
    println!("Performance snapshot for {}", snapshot.organization_id);
    println!(
        "- Score: {}/{} ({:.1}%)",
        snapshot.total_points, snapshot.max_points, snapshot.percentage
    );
    println!("- Tier: {}", snapshot.performance_tier.label());
    println!(
        "- Support designation: {}",
        snapshot.support_designation.label()
    );
    for category in MetricCategory::ordered() {
        println!(
            "- {} points: {}",
            category.label(),
            snapshot.category_totals.get(category)
        );
    }

    println!("\nMetric scores");
    for score in &snapshot.metric_scores {
        println!(
            "  {:<28} {:>2}/{:<2} {}",
            score.label,
            score.points,
            score.max_points,
            score.tier.label()
        );
    }
}

fn render_analysis(analysis: &ComprehensiveAnalysis) {
    let summary = &analysis.summary;
    println!("\nAdvisory analysis ({})", analysis.overall_assessment.label);
    println!(
        "- Advisors: {} total, {} completion service, {} fallback, {} failed",
        summary.total_advisors,
        summary.successful_analyses,
        summary.fallback_analyses,
        summary.failed_analyses
    );

    for (advisor_id, outcome) in &analysis.advisor_insights {
        match outcome {
            AdvisorOutcome::Insight(insight) => {
                println!("\n[{advisor_id}] ({})", insight.source.label());
                println!("  {}", insight.executive_summary);
                for line in &insight.key_insights {
                    println!("  * {line}");
                }
                if let Some(action) = insight.recommended_actions.immediate.first() {
                    println!("  Next step: {action}");
                }
            }
            AdvisorOutcome::Failed(failure) => {
                println!("\n[{advisor_id}] failed: {}", failure.error);
            }
        }
    }

    if !analysis.cross_cutting_themes.is_empty() {
        println!("\nCross-cutting themes");
        for theme in &analysis.cross_cutting_themes {
            println!(
                "  {:<14} {} advisors ({:?})",
                theme.theme, theme.frequency, theme.priority
            );
        }
    }

    println!("\nMaster action plan");
    let plan = &analysis.master_action_plan;
    for (horizon, items) in [
        ("Immediate", &plan.immediate),
        ("Short-term", &plan.short_term),
        ("Long-term", &plan.long_term),
    ] {
        println!("  {horizon}:");
        for item in items {
            println!("    - {item}");
        }
    }
}
