//! Report persistence at well-known paths under the document root, plus the
//! human-readable markdown renderings.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::audit::AuditReport;
use crate::error::Error;
use crate::repair::RepairReport;
use crate::types::DocumentId;

/// Markdown audit summary.
pub const AUDIT_MARKDOWN: &str = "LINK_AUDIT_REPORT.md";

/// Machine-readable audit report; the repair engine's input contract.
pub const AUDIT_JSON: &str = "link_audit_results.json";

/// Markdown repair summary.
pub const FIX_MARKDOWN: &str = "LINK_FIX_REPORT.md";

/// Machine-readable repair report.
pub const FIX_JSON: &str = "link_fix_results.json";

/// How many files the "most problematic" section lists.
const MOST_PROBLEMATIC_LIMIT: usize = 10;

/// Whether an identity is one of the persisted reports. These are never
/// indexed, so writing a report cannot change the next audit.
pub fn is_report_file(id: &DocumentId) -> bool {
    return [AUDIT_MARKDOWN, AUDIT_JSON, FIX_MARKDOWN, FIX_JSON].contains(&id.as_str());
}

/// Read the persisted audit report.
///
/// # Errors
///
/// Returns `Error::ReportNotFound` if no audit has been persisted,
/// `Error::Io` for other read failures, or `Error::ReportCorrupt` if the
/// JSON does not have the audit report shape.
pub fn read_audit(root: &Path) -> Result<AuditReport, Error> {
    let path = root.join(AUDIT_JSON);
    let content = match std::fs::read_to_string(&path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ReportNotFound { path });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(c) => c,
    };
    return serde_json::from_str(&content).map_err(|e| {
        return Error::ReportCorrupt {
            path,
            reason: e.to_string(),
        };
    });
}

/// Render the audit report as markdown.
pub fn render_audit_markdown(report: &AuditReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "\
# Documentation Link Audit Report

Generated: {}

## Summary

- **Total Files**: {}
- **Total Links**: {}
- **Broken Links**: {}
- **Valid Links**: {}
- **External Links**: {}
- **Anchor Links**: {}
",
        report.generated_at.to_rfc3339(),
        summary.total_files,
        summary.total_links,
        summary.broken_links,
        summary.valid_links,
        summary.external_links,
        summary.anchor_links,
    );

    if !report.errors.is_empty() {
        out.push_str("\n## Unreadable Files\n\n");
        for error in &report.errors {
            let _ = writeln!(out, "- `{}`: {}", error.file, error.message);
        }
    }

    if report.is_clean() {
        out.push_str("\n**No broken links found.** All documentation links are valid.\n");
        return out;
    }

    out.push_str("\n## Most Problematic Files\n");
    for file in report.most_problematic().take(MOST_PROBLEMATIC_LIMIT) {
        let _ = write!(
            out,
            "\n### {}\n\n- Broken Links: {}\n- Total Links: {}\n",
            file.file,
            file.broken_links.len(),
            file.total_links
        );
    }

    out.push_str("\n## Broken Links Details\n");
    for link in &report.broken_links {
        let _ = write!(
            out,
            "\n### {} (Line {})\n\n**Link Text**: {}\n**Target URL**: `{}`\n**Expected Target**: `{}`\n",
            link.source_file,
            link.line,
            link.text,
            link.url,
            link.expected_target.as_deref().unwrap_or("N/A"),
        );
    }

    return out;
}

/// Render the repair report as markdown.
pub fn render_repair_markdown(report: &RepairReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "\
# Documentation Link Fix Report

Generated: {}

## Summary

- **Files with broken links**: {}
- **Files processed**: {}
- **Total fixes made**: {}
- **Files with fixes**: {}
- **Errors encountered**: {}
",
        report.generated_at.to_rfc3339(),
        summary.files_with_broken_links,
        summary.files_processed,
        summary.total_fixes_made,
        summary.files_with_fixes,
        summary.errors,
    );

    if report.files_fixed.is_empty() {
        out.push_str("\nNo fixes were needed or possible.\n");
    } else {
        out.push_str("\n## Fixes Applied\n");
    }
    for file in &report.files_fixed {
        let _ = write!(out, "\n### {}\n\n**Fixes applied**: {}\n", file.file, file.total_fixes);
        if let Some(message) = &file.message {
            let _ = writeln!(out, "**Error**: {message}");
        }
        out.push('\n');
        for fix in &file.fixes {
            let _ = writeln!(out, "- **Line {}**: `{}` -> `{}`", fix.line, fix.original_url, fix.corrected_url);
            let _ = writeln!(out, "  - Text: {}", fix.text);
            let _ = writeln!(out, "  - Target: `{}` -> `{}`", fix.original_target, fix.correct_target);
        }
    }

    if !report.unfixable_links.is_empty() {
        out.push_str("\n## Unfixable Links\n\n");
        for link in &report.unfixable_links {
            let _ = writeln!(out, "- {}:{} `{}` ({})", link.source_file, link.line, link.url, link.reason);
        }
    }

    if !report.errors.is_empty() {
        out.push_str("\n## Errors\n\n");
        for error in &report.errors {
            let _ = writeln!(out, "- `{}`: {}", error.file, error.message);
        }
    }

    return out;
}

/// Persist the audit report as markdown and JSON.
/// Returns the paths written, markdown first.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails or `Error::Io` if a file
/// cannot be written.
pub fn write_audit(root: &Path, report: &AuditReport) -> Result<(PathBuf, PathBuf), Error> {
    let markdown = root.join(AUDIT_MARKDOWN);
    let json = root.join(AUDIT_JSON);
    std::fs::write(&markdown, render_audit_markdown(report))?;
    std::fs::write(&json, serde_json::to_string_pretty(report)?)?;
    return Ok((markdown, json));
}

/// Persist the repair report as markdown and JSON.
/// Returns the paths written, markdown first.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails or `Error::Io` if a file
/// cannot be written.
pub fn write_repair(root: &Path, report: &RepairReport) -> Result<(PathBuf, PathBuf), Error> {
    let markdown = root.join(FIX_MARKDOWN);
    let json = root.join(FIX_JSON);
    std::fs::write(&markdown, render_repair_markdown(report))?;
    std::fs::write(&json, serde_json::to_string_pretty(report)?)?;
    return Ok((markdown, json));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit;
    use crate::config::Config;

    #[test]
    fn persisted_audit_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), "[x](missing.md)\n").unwrap();
        let report = audit::audit(dir.path(), &Config::default()).unwrap();

        write_audit(dir.path(), &report).unwrap();
        let loaded = read_audit(dir.path()).unwrap();
        assert_eq!(loaded.summary, report.summary);
        assert_eq!(loaded.broken_links, report.broken_links);
    }

    #[test]
    fn written_reports_do_not_change_the_next_audit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), "[x](missing.md)\n").unwrap();
        let first = audit::audit(dir.path(), &Config::default()).unwrap();
        write_audit(dir.path(), &first).unwrap();

        let second = audit::audit(dir.path(), &Config::default()).unwrap();
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn missing_and_corrupt_reports_are_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_audit(dir.path()), Err(Error::ReportNotFound { .. })));

        std::fs::write(dir.path().join(AUDIT_JSON), "{\"summary\": 3}").unwrap();
        assert!(matches!(read_audit(dir.path()), Err(Error::ReportCorrupt { .. })));
    }

    #[test]
    fn markdown_lists_broken_link_details() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), "[Setup](setup)\n").unwrap();
        let report = audit::audit(dir.path(), &Config::default()).unwrap();

        let md = render_audit_markdown(&report);
        assert!(md.contains("## Most Problematic Files"));
        assert!(md.contains("### index.md (Line 1)"));
        assert!(md.contains("**Expected Target**: `setup.md`"));
    }
}
