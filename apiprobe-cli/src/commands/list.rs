//! List command - show registered cases and whether the filters select them.

use apiprobe_testing::RunConfig;
use colored::Colorize;

use crate::error::CliResult;
use crate::scenarios;

pub fn execute(tests: &[String], mark: Option<&str>) -> CliResult<()> {
    let mut config = RunConfig::new().name_filters(tests.iter().cloned());
    if let Some(mark) = mark {
        config = config.with_mark(mark)?;
    }

    let cases = scenarios::all();
    let selected = cases.iter().filter(|c| config.selects(c)).count();

    println!();
    for case in &cases {
        let tags = format!("[{}]", case.tags().join(", "));
        if config.selects(case) {
            println!("  {} {}", case.name().bright_white(), tags.cyan());
        } else {
            println!("  {} {}", case.name().dimmed(), tags.dimmed());
        }
    }
    println!();
    println!("  {} of {} cases selected", selected, cases.len());

    Ok(())
}
