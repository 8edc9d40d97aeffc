//! Display functions for the provision operation
//!
//! Passwords are never printed; they only go to the report file.

use std::fmt::Write;
use std::path::Path;

use console::Style;

use crate::config::Settings;
use crate::pipeline::{Admission, RunSummary, Status};

/// Plan shown by `--dry-run`
pub fn render_plan(settings: &Settings, admissions: &[Admission<'_>]) -> String {
    let mut out = String::new();
    let mut accepted = 0;

    let _ = writeln!(out, "{}", Style::new().bold().apply_to("Provisioning plan:"));
    for admission in admissions {
        match admission {
            Admission::Accepted { normalized, .. } => {
                accepted += 1;
                let identity = &normalized.identity;
                let _ = write!(
                    out,
                    "  {}  {}  {}",
                    Style::new().green().apply_to(&identity.id),
                    identity.display_name,
                    settings.home_of(&identity.id).display()
                );
                if let Some(url) = settings.web_url_of(&identity.id) {
                    let _ = write!(out, "  {url}");
                }
                out.push('\n');
            }
            Admission::Rejected { row, reason } => {
                let _ = writeln!(
                    out,
                    "  {} line {} ({:?}): {reason}",
                    Style::new().yellow().apply_to("skip"),
                    row.line,
                    row.student_id()
                );
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{accepted} account(s) would be provisioned, {} row(s) skipped. Nothing was changed.",
        admissions.len() - accepted
    );
    out
}

/// Counts and web URLs after a run
pub fn print_summary(settings: &Settings, summary: &RunSummary) {
    println!(
        "\n{} {}  {} {}  {} {}  {} {}",
        Style::new().bold().apply_to("Created:"),
        summary.count(Status::Created),
        Style::new().bold().apply_to("Updated:"),
        summary.count(Status::Updated),
        Style::new().bold().apply_to("Failed:"),
        summary.count(Status::Failed),
        Style::new().bold().apply_to("Skipped:"),
        summary.skipped()
    );

    let urls: Vec<String> = summary
        .provisioned()
        .filter(|outcome| outcome.status != Status::Failed)
        .filter_map(|outcome| settings.web_url_of(&outcome.identity.id))
        .collect();
    if !urls.is_empty() {
        println!("{}", Style::new().bold().apply_to("Web URLs:"));
        for url in urls {
            println!("  {url}");
        }
    }
}

pub fn print_report_location(path: &Path, rows: usize) {
    println!(
        "{} {} ({rows} row(s), readable by the owner only)",
        Style::new().bold().apply_to("Report:"),
        path.display()
    );
}
