//! Rendering of sync reports

use colored::Colorize;
use hub_core::{Action, ResourceAction, ResourceFailure, SyncReport};

use crate::error::Result;

/// Print a report as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a report for humans.
///
/// Unchanged resources are summarized unless `verbose` is set.
pub fn print_report(report: &SyncReport, verbose: bool) {
    for action in &report.actions {
        if matches!(action.action, Action::Unchanged) && !verbose {
            continue;
        }
        println!("   {}", action_line(action));
    }

    for failure in &report.failures {
        println!("   {}", failure_line(failure));
    }

    println!();
    println!("{}", summary(report));
}

fn action_line(action: &ResourceAction) -> String {
    let subject = format!("{} {}", action.kind.as_str().dimmed(), action.filename.cyan());
    match action.action {
        Action::Created => format!("{} {subject} (id {})", "+".green(), action.id),
        Action::Updated => format!("{} {subject}", "~".green()),
        Action::Unchanged => format!("{} {subject}", "=".dimmed()),
        Action::Pushed { version } => format!("{} {subject} (now version {version})", "^".green()),
        Action::Forgotten => format!("{} {subject} (no longer tracked)", "-".yellow()),
        Action::Skipped { reason } => format!("{} {subject}: {}", "-".yellow(), reason.describe()),
    }
}

fn failure_line(failure: &ResourceFailure) -> String {
    let subject = match &failure.filename {
        Some(filename) => filename.cyan().to_string(),
        None => format!("id {}", failure.id),
    };
    format!(
        "{} {} {}: {}",
        "!".red(),
        failure.kind.as_str().dimmed(),
        subject,
        failure.message
    )
}

fn summary(report: &SyncReport) -> String {
    let changed = report.count(|a| {
        matches!(
            a,
            Action::Created | Action::Updated | Action::Pushed { .. } | Action::Forgotten
        )
    });
    let unchanged = report.count(|a| matches!(a, Action::Unchanged));
    let skipped = report.count(|a| matches!(a, Action::Skipped { .. }));

    let counts = format!("{changed} changed, {unchanged} unchanged, {skipped} skipped");
    if report.is_clean() {
        format!("{} {counts}", "OK".green().bold())
    } else {
        format!(
            "{} {counts}, {} failed",
            "WARN".yellow().bold(),
            report.failures.len()
        )
    }
}
