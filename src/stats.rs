//! Run statistics and recovered-error records
//!
//! Everything that goes wrong below the bundle level is recorded here as data
//! instead of aborting the run: malformed statements, identity conflicts,
//! dangling references and applications that could not be materialized.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::LineRange;

/// Longest statement excerpt kept in a [`ParseError`]
pub const SNIPPET_MAX_CHARS: usize = 120;

/// A statement that could not be parsed; the rest of the file still was
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{file}:{lines}: {reason}")]
pub struct ParseError {
    pub file: String,
    pub lines: LineRange,
    pub reason: String,
    /// Leading text of the broken statement
    pub snippet: String,
}

impl ParseError {
    pub fn new(
        file: impl Into<String>,
        lines: LineRange,
        reason: impl Into<String>,
        statement: &str,
    ) -> Self {
        Self {
            file: file.into(),
            lines,
            reason: reason.into(),
            snippet: snippet(statement),
        }
    }
}

/// Two definitions share a full path but disagree on the object kind
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{full_path} is already a '{kept_type}', rejected '{rejected_type}' from {file}")]
pub struct TypeConflict {
    pub full_path: String,
    pub kept_type: String,
    pub rejected_type: String,
    pub file: String,
}

/// An application that could not be materialized
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("failed to extract application {entry_point}: {cause}")]
pub struct ExtractionError {
    pub entry_point: String,
    pub cause: String,
}

/// Wall-clock time spent per stage, in microseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub load: u64,
    pub parse: u64,
    pub resolve: u64,
    pub extract: u64,
    pub total: u64,
}

/// Counters and recovered errors of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Files parsed to the end
    pub files_processed: usize,
    /// Objects parsed successfully (including redefinitions)
    pub objects_parsed: usize,
    pub objects_by_type: BTreeMap<String, usize>,
    /// Definitions merged into an existing object
    pub objects_merged: usize,
    pub parse_errors: Vec<ParseError>,
    pub type_conflicts: Vec<TypeConflict>,
    pub edges: usize,
    pub unresolved_references: usize,
    /// Distinct dangling targets, sorted
    pub unresolved_targets: BTreeSet<String>,
    pub applications_extracted: usize,
    pub extraction_errors: Vec<ExtractionError>,
    pub orphan_count: usize,
    pub timings: StageTimings,
}

impl Stats {
    pub fn record_object(&mut self, type_tag: &str) {
        self.objects_parsed += 1;
        *self.objects_by_type.entry(type_tag.to_string()).or_insert(0) += 1;
    }

    pub fn record_parse_error(&mut self, error: ParseError) {
        tracing::warn!(file = %error.file, lines = %error.lines, "{}", error.reason);
        self.parse_errors.push(error);
    }

    pub fn record_type_conflict(&mut self, conflict: TypeConflict) {
        tracing::warn!("type conflict: {}", conflict);
        self.type_conflicts.push(conflict);
    }

    pub fn record_unresolved(&mut self, target: &str) {
        self.unresolved_references += 1;
        self.unresolved_targets.insert(target.to_string());
    }

    pub fn record_extraction_error(&mut self, error: ExtractionError) {
        tracing::warn!("{}", error);
        self.extraction_errors.push(error);
    }

    /// Total number of recovered problems
    pub fn issue_count(&self) -> usize {
        self.parse_errors.len()
            + self.type_conflicts.len()
            + self.unresolved_references
            + self.extraction_errors.len()
    }
}

/// Saturating conversion used for every recorded duration
pub fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn snippet(statement: &str) -> String {
    let first_line = statement.trim_start().lines().next().unwrap_or("").trim_end();
    if first_line.chars().count() > SNIPPET_MAX_CHARS {
        let cut: String = first_line.chars().take(SNIPPET_MAX_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_object_counts_by_type() {
        let mut stats = Stats::default();
        stats.record_object("ltm pool");
        stats.record_object("ltm pool");
        stats.record_object("ltm virtual");
        assert_eq!(stats.objects_parsed, 3);
        assert_eq!(stats.objects_by_type.get("ltm pool"), Some(&2));
        assert_eq!(stats.objects_by_type.get("ltm virtual"), Some(&1));
    }

    #[test]
    fn test_unresolved_targets_are_distinct_but_counted() {
        let mut stats = Stats::default();
        stats.record_unresolved("/Common/http");
        stats.record_unresolved("/Common/http");
        assert_eq!(stats.unresolved_references, 2);
        assert_eq!(stats.unresolved_targets.len(), 1);
        assert_eq!(stats.issue_count(), 2);
    }

    #[test]
    fn test_parse_error_snippet_is_first_line_truncated() {
        let long = format!("ltm virtual /Common/{} {{\n    pool x\n}}", "v".repeat(200));
        let err = ParseError::new("bigip.conf", LineRange::new(3, 5), "unbalanced", &long);
        assert!(err.snippet.ends_with("..."));
        assert_eq!(err.snippet.chars().count(), SNIPPET_MAX_CHARS);
        assert!(!err.snippet.contains('\n'));
    }

    #[test]
    fn test_record_display() {
        let err = ParseError::new("bigip.conf", LineRange::new(7, 7), "unexpected '}'", "}");
        assert_eq!(err.to_string(), "bigip.conf:7: unexpected '}'");

        let conflict = TypeConflict {
            full_path: "/Common/x".into(),
            kept_type: "ltm pool".into(),
            rejected_type: "ltm node".into(),
            file: "b.conf".into(),
        };
        assert!(conflict.to_string().contains("rejected 'ltm node'"));
    }

    #[test]
    fn test_micros_saturates() {
        assert_eq!(micros(Duration::from_millis(2)), 2000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
