//! apiprobe CLI - run API test suites against a configured environment.
//!
//! # Commands
//!
//! - `apiprobe run` - Run the suite and write a report
//! - `apiprobe list` - List registered cases

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod error;
mod output;
mod scenarios;

use apiprobe_report::ReportFormat;
use commands::{list, run};
use error::{CliResult, EXIT_FAILURE};

/// apiprobe - API test automation
#[derive(Parser)]
#[command(name = "apiprobe")]
#[command(version)]
#[command(about = "Run API test suites with retries, assertions and reports")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} apiprobe run --env dev\n  {} apiprobe run -m \"smoke and not users\" --report xml\n  {} apiprobe run -n 4 --reruns 1\n  {} apiprobe list -m login",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Show request detail on the console
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print the summary
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite
    #[command(alias = "r")]
    Run(RunArgs),

    /// List registered test cases
    #[command(alias = "ls")]
    List(ListArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Target environment (dev, test, prod); unknown names fall back to test
    #[arg(short, long, env = "API_TEST_ENV")]
    env: Option<String>,

    /// Only run cases whose name contains one of these
    #[arg(short, long, num_args = 1..)]
    tests: Vec<String>,

    /// Tag expression, e.g. "smoke and not slow"
    #[arg(short, long)]
    mark: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "html")]
    report: ReportFormatArg,

    /// Parallel workers (0 runs sequentially)
    #[arg(short = 'n', long, default_value = "0")]
    parallel: usize,

    /// Extra runs for a failing case
    #[arg(long, default_value = "0")]
    reruns: u32,

    /// Settings override file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL override for the selected environment
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    /// Only list cases whose name contains one of these
    #[arg(short, long, num_args = 1..)]
    tests: Vec<String>,

    /// Tag expression
    #[arg(short, long)]
    mark: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    /// Single HTML page
    Html,
    /// JUnit XML
    Xml,
    /// Allure results directory
    Allure,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Html => ReportFormat::Html,
            ReportFormatArg::Xml => ReportFormat::Xml,
            ReportFormatArg::Allure => ReportFormat::Allure,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let result: CliResult<bool> = match cli.command {
        Commands::Run(args) => {
            run::execute(run::RunOptions {
                environment: args.env,
                tests: args.tests,
                mark: args.mark,
                report: args.report.into(),
                parallel: args.parallel,
                reruns: args.reruns,
                config: args.config,
                base_url: args.base_url,
                verbose: cli.verbose,
                quiet: cli.quiet,
            })
            .await
        }

        Commands::List(args) => list::execute(&args.tests, args.mark.as_deref()).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FAILURE),
        Err(e) => {
            eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}
