//! Run command - execute the built-in scenarios and write a report.

use apiprobe_config::{LoadOptions, Settings};
use apiprobe_log::{LogConfig, LogLevel};
use apiprobe_report::{ReportFormat, ReportWriter};
use apiprobe_testing::{RunConfig, Runner};
use colored::Colorize;
use std::path::PathBuf;

use crate::error::CliResult;
use crate::output;
use crate::scenarios;

/// Options for `apiprobe run`.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub environment: Option<String>,
    pub tests: Vec<String>,
    pub mark: Option<String>,
    pub report: ReportFormat,
    pub parallel: usize,
    pub reruns: u32,
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
}

/// Run the suite; `Ok(false)` means at least one case failed.
pub async fn execute(options: RunOptions) -> CliResult<bool> {
    let settings = load_settings(&options)?;
    let mut config = RunConfig::new()
        .workers(options.parallel)
        .reruns(options.reruns)
        .name_filters(options.tests.iter().cloned());
    if let Some(mark) = &options.mark {
        config = config.with_mark(mark)?;
    }

    let _guard = LogConfig::new()
        .console_level(console_level(options.verbose, options.quiet))
        .log_dir(&settings.log_dir)
        .init()?;

    tracing::info!(
        environment = %settings.environment(),
        workers = options.parallel,
        reruns = options.reruns,
        report = ?options.report,
        "Run requested"
    );

    if !options.quiet {
        output::print_mini_banner();
        output::info(&format!(
            "Environment {} at {}",
            settings.environment().as_str().cyan(),
            settings.active_profile().base_url
        ));
        println!();
    }

    let report_dir = settings.report_dir.clone();
    let runner = Runner::new(settings, config);
    let report = runner.run(scenarios::all()).await?;

    if !options.quiet {
        for case in &report.cases {
            output::print_case(case);
        }
    }
    if report.skipped() == report.total() {
        output::warn("No cases matched the filters");
    }
    output::print_summary(&report);

    let path = ReportWriter::new(report_dir).write(&report, options.report)?;
    if !options.quiet {
        output::success(&format!("Report written to {}", path.display()));
    }

    Ok(report.all_passed())
}

/// Console shows the run summary at info; the log file always gets debug.
fn console_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else if quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    }
}

fn load_settings(options: &RunOptions) -> CliResult<Settings> {
    let mut load = LoadOptions::default().with_dotenv(true);
    if let Some(env) = &options.environment {
        load = load.environment(env);
    }
    if let Some(path) = &options.config {
        load = load.config_file(path);
    }
    if let Some(url) = &options.base_url {
        load = load.base_url(url);
    }
    Ok(Settings::load(&load)?)
}
