//! UI/Progress presentation layer
//!
//! The pipeline reports through the [`ProgressReporter`] trait and never
//! prints directly. [`InteractiveProgressReporter`] draws an `indicatif` bar
//! on a terminal and falls back to plain lines on stderr otherwise.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{RowOutcome, Status};

/// Progress and announcements of a provisioning run
pub trait ProgressReporter {
    /// The run is about to process `total` rows
    fn begin(&mut self, total: usize);

    fn row_started(&mut self, student_id: &str);

    /// Announces skips and failures; advances the progress
    fn row_finished(&mut self, outcome: &RowOutcome);

    /// Non-fatal information, e.g. an identifier that had to be normalized
    fn notice(&mut self, message: &str);

    fn finish(&mut self);

    /// Stop after a fatal error
    fn abandon(&mut self, message: &str);
}

/// Progress bar reporter for operators at a terminal
pub struct InteractiveProgressReporter {
    bar: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        Self { bar }
    }

    /// Print above the bar, or to stderr when no bar is drawn
    fn announce(&self, line: String) {
        if self.bar.is_hidden() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }
}

impl Default for InteractiveProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn begin(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn row_started(&mut self, student_id: &str) {
        self.bar.set_message(student_id.to_string());
    }

    fn row_finished(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Skipped {
                line,
                student_id,
                reason,
            } => self.announce(format!(
                "{} line {line} ({student_id:?}): {reason}",
                Style::new().yellow().apply_to("skipped")
            )),
            RowOutcome::Provisioned(outcome) if outcome.status == Status::Failed => {
                self.announce(format!(
                    "{} {}: {}",
                    Style::new().red().apply_to("failed"),
                    outcome.identity.id,
                    outcome.note()
                ));
            }
            RowOutcome::Provisioned(_) => {}
        }
        self.bar.inc(1);
    }

    fn notice(&mut self, message: &str) {
        self.announce(format!("{} {message}", Style::new().cyan().apply_to("note")));
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }

    fn abandon(&mut self, message: &str) {
        self.bar.abandon();
        self.announce(format!(
            "{} {message}",
            Style::new().red().bold().apply_to("aborted")
        ));
    }
}
