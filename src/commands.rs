//! Core CLI commands for doclink: check, audit, fix.

use std::path::Path;
use std::process::ExitCode;

use crate::audit::{self, AuditReport};
use crate::config::Config;
use crate::error;
use crate::index;
use crate::repair::{self, RepairReport};
use crate::report;

/// Exit code when broken links remain.
const EXIT_BROKEN: u8 = 1;

/// Exit code when some documents could not be audited.
const EXIT_INCOMPLETE: u8 = 2;

/// Audit and persist the markdown and JSON audit reports.
///
/// # Errors
///
/// Returns errors from config loading, the audit, or report writing.
pub fn audit(root: &Path) -> Result<ExitCode, error::Error> {
    let config = load_config(root)?;
    let report = audit::audit(root, &config)?;
    let (markdown, json) = report::write_audit(root, &report)?;

    print_summary(&report);
    eprintln!("Wrote {} and {}", markdown.display(), json.display());
    return Ok(exit_code_for(&report));
}

/// Audit only. Writes nothing, so it is safe as a CI gate.
///
/// # Errors
///
/// Returns errors from config loading or the audit.
pub fn check(root: &Path, json: bool) -> Result<ExitCode, error::Error> {
    let config = load_config(root)?;
    let report = audit::audit(root, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for link in &report.broken_links {
            println!(
                "BROKEN  {}:{}  {} (expected: {})",
                link.source_file,
                link.line,
                link.url,
                link.expected_target.as_deref().unwrap_or("unresolvable")
            );
        }
        if !report.broken_links.is_empty() {
            println!();
        }
        print_summary(&report);
    }

    return Ok(exit_code_for(&report));
}

/// Exit code priority: unaudited documents (2) > broken (1) > clean (0).
/// A document that could not be read is never reported as clean.
fn exit_code_for(report: &AuditReport) -> ExitCode {
    if !report.is_complete() {
        return ExitCode::from(EXIT_INCOMPLETE);
    }
    if report.is_clean() {
        return ExitCode::SUCCESS;
    }
    return ExitCode::from(EXIT_BROKEN);
}

/// Repair broken links, then re-audit to decide the exit code.
///
/// With `from_report`, the broken links come from the persisted audit report
/// instead of a fresh audit. The post-repair audit is persisted so the next
/// `--from-report` run starts from the current state.
///
/// # Errors
///
/// Returns errors from config loading, the audit, a missing or corrupt
/// persisted report, or report writing.
pub fn fix(root: &Path, from_report: bool) -> Result<ExitCode, error::Error> {
    let config = load_config(root)?;

    let broken_links = if from_report {
        let previous = report::read_audit(root)?;
        tracing::info!("repairing from audit generated at {}", previous.generated_at.to_rfc3339());
        previous.broken_links
    } else {
        audit::audit(root, &config)?.broken_links
    };

    if broken_links.is_empty() {
        eprintln!("All links valid, nothing to fix.");
    }

    let repaired = repair::repair(root, &config, &broken_links)?;
    report::write_repair(root, &repaired)?;
    print_fix_report(&repaired);

    let after = audit::audit(root, &config)?;
    report::write_audit(root, &after)?;
    print_summary(&after);
    return Ok(exit_code_for(&after));
}

/// Validate the root before reading its config.
///
/// # Errors
///
/// Returns `Error::RootNotFound`, `Error::RootNotDirectory`, or config errors.
fn load_config(root: &Path) -> Result<Config, error::Error> {
    index::ensure_root_is_directory(root)?;
    return Config::load(root);
}

/// Print a markdown summary of fix results.
fn print_fix_report(repaired: &RepairReport) {
    let fixed: Vec<_> = repaired.files_fixed.iter().flat_map(|f| return &f.fixes).collect();
    if !fixed.is_empty() {
        eprintln!("## Fixed\n");
        for fix in fixed {
            eprintln!(
                "- {}:{}  `{}` -> `{}`",
                fix.source_file, fix.line, fix.original_url, fix.corrected_url,
            );
        }
        eprintln!();
    }

    if !repaired.unfixable_links.is_empty() {
        eprintln!("## Unfixable\n");
        for link in &repaired.unfixable_links {
            eprintln!("- {}:{}  `{}` ({})", link.source_file, link.line, link.url, link.reason);
        }
        eprintln!();
    }

    let summary = &repaired.summary;
    eprintln!(
        "{} fixes made across {} files, {} errors",
        summary.total_fixes_made, summary.files_with_fixes, summary.errors
    );
    return;
}

/// One-line audit summary on stdout.
fn print_summary(report: &AuditReport) {
    let s = &report.summary;
    if !report.is_clean() {
        println!(
            "{} broken links found out of {} total links in {} files",
            s.broken_links, s.total_links, s.total_files
        );
    } else if report.is_complete() {
        println!("All {} links valid across {} files", s.total_links, s.total_files);
    } else {
        println!(
            "No broken links in {} audited files, but {} files could not be audited",
            s.total_files,
            report.errors.len()
        );
    }
    for error in &report.errors {
        eprintln!("warning: skipped {}: {}", error.file, error.message);
    }
    return;
}
