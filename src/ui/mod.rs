//! UI/Progress presentation layer
//!
//! This module handles:
//! - Progress bars for a running explosion, using indicatif
//! - Human-readable rendering of an [`ExplosionResult`](crate::pipeline::ExplosionResult)
//!
//! Bars draw to stderr and hide themselves when stderr is not a terminal, so
//! piping `--json` output stays clean.

pub mod display;

use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::ProgressSink;

/// Interactive progress reporter with visual progress bars
///
/// One bar tracks files, a second one tracks objects of the current file.
/// Extracted applications are counted on a spinner.
pub struct InteractiveProgressReporter {
    file_pb: ProgressBar,
    object_pb: Option<ProgressBar>,
    app_pb: Option<ProgressBar>,
}

impl Default for InteractiveProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        let file_pb = ProgressBar::new(0);
        file_pb.set_style(style("[{bar:40.cyan/blue}] {pos}/{len} {msg}", "#>-"));
        Self {
            file_pb,
            object_pb: None,
            app_pb: None,
        }
    }

    /// Finish and clear all bars
    pub fn finish(&mut self) {
        if let Some(pb) = self.object_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.app_pb.take() {
            pb.finish_and_clear();
        }
        self.file_pb.finish_and_clear();
    }

    /// Abandon on error, leaving the bars where they stopped
    pub fn abandon(&mut self) {
        if let Some(pb) = self.object_pb.take() {
            pb.abandon();
        }
        if let Some(pb) = self.app_pb.take() {
            pb.abandon();
        }
        self.file_pb.abandon();
    }
}

impl ProgressSink for InteractiveProgressReporter {
    fn file_started(&mut self, index: usize, total: usize, name: &str) {
        self.file_pb.set_length(total as u64);
        self.file_pb.set_position(index.saturating_sub(1) as u64);
        self.file_pb.set_message(truncate(name, 50));
        if let Some(pb) = self.object_pb.take() {
            pb.finish_and_clear();
        }
    }

    fn object_parsed(&mut self, index: usize, total: usize) {
        let pb = self.object_pb.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(style("  [{bar:40.green/yellow}] {pos}/{len} objects", "█▉▊▋▌▍▎▏  "));
            pb
        });
        pb.set_length(total as u64);
        pb.set_position(index as u64);
        if index == total {
            self.file_pb.inc(1);
        }
    }

    fn application_extracted(&mut self, entry_point: &str, _elapsed_micros: u64) {
        if let Some(pb) = self.object_pb.take() {
            pb.finish_and_clear();
        }
        let pb = self.app_pb.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {pos} applications {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        });
        pb.inc(1);
        pb.set_message(truncate(entry_point, 50));
    }
}

fn style(template: &str, chars: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}

/// Truncate long names from the left for display
fn truncate(name: &str, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max - 3)).collect();
    format!("...{tail}")
}
