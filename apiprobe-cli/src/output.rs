//! Console output helpers.

use apiprobe_report::{CaseReport, Outcome, TestReport};
use colored::Colorize;

pub fn success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn warn(msg: &str) {
    println!("  {} {}", "⚠".yellow().bold(), msg.yellow());
}

pub fn info(msg: &str) {
    println!("  {} {}", "→".cyan(), msg);
}

pub fn print_mini_banner() {
    println!(
        "\n  {} {} {}\n",
        "⚡".bright_yellow(),
        "apiprobe".bright_white().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// One line per case, followed by the failure message if any.
pub fn print_case(case: &CaseReport) {
    let marker = match case.outcome {
        Outcome::Passed => "✓".green().bold(),
        Outcome::Failed => "✗".red().bold(),
        Outcome::Error => "!".bright_red().bold(),
        Outcome::Skipped => "-".dimmed(),
    };
    let name = match case.outcome {
        Outcome::Passed => case.name.normal(),
        Outcome::Skipped => case.name.dimmed(),
        _ => case.name.red(),
    };

    let mut line = format!("  {} {}", marker, name);
    if case.outcome != Outcome::Skipped {
        line.push_str(&format!(" {}", format!("({:.2}s)", case.duration_secs).dimmed()));
    }
    if case.runs > 1 {
        line.push_str(&format!(" {}", format!("[{} runs]", case.runs).yellow()));
    }
    println!("{}", line);

    if let Some(message) = &case.message {
        for text in message.lines() {
            println!("      {}", text.dimmed());
        }
    }
}

pub fn print_summary(report: &TestReport) {
    println!();
    let counts = format!(
        "{} passed, {} failed, {} errors, {} skipped in {:.2}s",
        report.passed(),
        report.failed(),
        report.errored(),
        report.skipped(),
        report.duration_secs
    );
    if report.all_passed() {
        println!("  {} {}", "PASSED".green().bold(), counts);
    } else {
        println!("  {} {}", "FAILED".red().bold(), counts);
    }
}
