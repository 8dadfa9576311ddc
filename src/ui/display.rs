//! Human-readable rendering of explosion results

use std::fmt::Write;

use console::Style;

use crate::pipeline::{ExplosionResult, RunStatus};

macro_rules! opt_field {
    ($out:expr, $label:expr, $value:expr) => {
        if let Some(ref v) = $value {
            let _ = writeln!($out, "{} {}", Style::new().bold().apply_to($label), v);
        }
    };
}

/// Render the summary printed by `bigip-explode explode`
///
/// With `detailed` every application lists its members and every issue is
/// spelled out; otherwise only counts are shown.
pub fn render_summary(result: &ExplosionResult, detailed: bool) -> String {
    let mut out = String::new();
    let bold = Style::new().bold();

    let _ = writeln!(out, "{} {}", bold.apply_to("Bundle:"), result.bundle_kind);
    let _ = writeln!(out, "{} {}", bold.apply_to("Id:"), result.id);
    if result.bundle_kind.is_container() {
        let names: Vec<&str> = result.sources.iter().map(|s| s.name.as_str()).collect();
        let _ = writeln!(out, "{} {}", bold.apply_to("Files:"), names.join(", "));
    }
    opt_field!(out, "Hostname:", result.hostname);
    opt_field!(out, "TMOS version:", result.tmos_version);
    if let RunStatus::Cancelled { stage } = result.status {
        let _ = writeln!(
            out,
            "{}",
            Style::new()
                .yellow()
                .apply_to(format!("Cancelled during {stage:?} stage").to_lowercase())
        );
    }

    let stats = &result.stats;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} {} files, {} objects ({} merged)",
        bold.apply_to("Parsed:"),
        stats.files_processed,
        stats.objects_parsed,
        stats.objects_merged
    );
    let _ = writeln!(
        out,
        "{} {} edges, {} unresolved",
        bold.apply_to("References:"),
        stats.edges,
        stats.unresolved_references
    );

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} ({}):",
        bold.apply_to("Applications"),
        result.applications.len()
    );
    for app in &result.applications {
        let _ = writeln!(
            out,
            "  {} {} ({} objects)",
            Style::new().bold().yellow().apply_to(&app.entry_point),
            Style::new().dim().apply_to(&app.kind),
            app.members.len()
        );
        if detailed {
            for member in app.members.iter().skip(1) {
                let _ = writeln!(out, "    {member}");
            }
        }
    }
    let _ = writeln!(
        out,
        "{} {}",
        bold.apply_to("Orphan objects:"),
        result.orphan_objects.len()
    );

    if stats.issue_count() == 0 {
        return out;
    }
    let warn = Style::new().yellow();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} {} parse errors, {} type conflicts, {} extraction errors",
        warn.apply_to("Issues:"),
        stats.parse_errors.len(),
        stats.type_conflicts.len(),
        stats.extraction_errors.len()
    );
    if detailed {
        for error in &stats.parse_errors {
            let _ = writeln!(
                out,
                "  {}:{}-{}: {}",
                error.file, error.lines.start, error.lines.end, error.reason
            );
        }
        for conflict in &stats.type_conflicts {
            let _ = writeln!(
                out,
                "  {}: '{}' kept, '{}' rejected ({})",
                conflict.full_path, conflict.kept_type, conflict.rejected_type, conflict.file
            );
        }
        for error in &stats.extraction_errors {
            let _ = writeln!(out, "  {}: {}", error.entry_point, error.cause);
        }
        for target in &stats.unresolved_targets {
            let _ = writeln!(out, "  unresolved: {target}");
        }
    }
    out
}
