use crate::commands::{run_analyze, run_rubric, run_score, AnalyzeArgs, RubricArgs, ScoreArgs};
use crate::server;
use association_pulse::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Association Pulse",
    about = "Score association self-assessments and generate advisory analyses",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a survey export and print the performance snapshot
    Score(ScoreArgs),
    /// Score a survey export and run every advisor over the result
    Analyze(AnalyzeArgs),
    /// List the rubric questions asked under a filter
    Rubric(RubricArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Analyze(args) => run_analyze(args).await,
        Command::Rubric(args) => run_rubric(args),
    }
}
