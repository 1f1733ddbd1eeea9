//! Repair engine: locate the current target of each broken link and rewrite
//! the link occurrence in place.
//!
//! Every edit for a document is planned against its original content before
//! anything is written, so rewriting one link never moves another out from
//! under its recorded position. Writes are sequential.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::audit::{self, FileError};
use crate::config::Config;
use crate::error::Error;
use crate::index::FileIndex;
use crate::resolver::{self, join_and_normalize, relative_link, split_fragment, split_title, with_doc_extension};
use crate::scanner;
use crate::strategy::{Chain, Located};
use crate::types::{Classification, DocumentId, FixRecord, LinkStatus, ResolvedLink};

/// Replacement of one byte range of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    /// Byte range of the original `[text](target)` occurrence.
    range: Range<usize>,
    /// Full replacement occurrence.
    replacement: String,
}

/// Per-document outcome.
#[derive(Debug, Clone, Serialize)]
pub struct FileFixes {
    /// The rewritten document.
    pub file: DocumentId,
    /// Committed (or, on write failure, attempted) fixes.
    pub fixes: Vec<FixRecord>,
    /// Write failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the rewrite was committed.
    pub status: FileStatus,
    /// Number of fixes committed.
    pub total_fixes: usize,
}

/// Whether a document's rewrite was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// The document could not be written back; nothing changed.
    Error,
    /// The document was rewritten.
    Fixed,
}

/// Edits and outcomes planned for one document.
#[derive(Debug, Default)]
struct FilePlan {
    edits: BTreeMap<usize, Edit>,
    fixes: Vec<FixRecord>,
    unfixable: Vec<UnfixableLink>,
}

/// Repair output, persisted next to the audit report.
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    /// Documents that could not be read or written.
    pub errors: Vec<FileError>,
    /// Documents with planned fixes, in source-file order.
    pub files_fixed: Vec<FileFixes>,
    /// When the repair ran.
    pub generated_at: DateTime<Utc>,
    /// Global tallies.
    pub summary: RepairSummary,
    /// Broken links left as they were, with the reason.
    pub unfixable_links: Vec<UnfixableLink>,
}

/// Repair tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Documents that failed to read or write.
    pub errors: usize,
    /// Documents that were read and planned.
    pub files_processed: usize,
    /// Distinct source documents in the broken-link input.
    pub files_with_broken_links: usize,
    /// Documents actually rewritten.
    pub files_with_fixes: usize,
    /// Link occurrences rewritten.
    pub total_fixes_made: usize,
}

/// A broken link the engine declined to rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfixableLink {
    /// One-based line of the link.
    pub line: u32,
    /// Why it was left alone.
    pub reason: UnfixableReason,
    /// Document containing the link.
    pub source_file: DocumentId,
    /// Display text of the link.
    pub text: String,
    /// Raw target of the link.
    pub url: String,
}

/// Why a broken link was not rewritten. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfixableReason {
    /// Several candidates tied.
    Ambiguous(usize),
    /// The `[text](url)` occurrence is no longer on its line.
    LinkNotPresent,
    /// No strategy produced a candidate.
    NoCandidate,
    /// The referring document no longer exists.
    SourceMissing,
}

impl fmt::Display for UnfixableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Ambiguous(count) => write!(f, "ambiguous: {count} candidates"),
            Self::LinkNotPresent => f.write_str("link no longer present"),
            Self::NoCandidate => f.write_str("no candidate found"),
            Self::SourceMissing => f.write_str("source missing"),
        };
    }
}

impl Serialize for UnfixableReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.collect_str(self);
    }
}

impl UnfixableLink {
    /// Record a link as unfixable.
    fn new(link: &ResolvedLink, reason: UnfixableReason) -> Self {
        return Self {
            line: link.line,
            reason,
            source_file: link.source_file.clone(),
            text: link.text.clone(),
            url: link.url.clone(),
        };
    }
}

/// Rebuild content with every edit applied. Edits are keyed by start offset
/// into the original content and never overlap.
fn apply_edits(content: &str, edits: &BTreeMap<usize, Edit>) -> String {
    let mut output = String::with_capacity(content.len());
    let mut cursor = 0_usize;
    for edit in edits.values() {
        output.push_str(content.get(cursor..edit.range.start).unwrap_or_default());
        output.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    output.push_str(content.get(cursor..).unwrap_or_default());
    return output;
}

/// Find the byte ranges of `[text](url)` on a one-based line.
fn locate_occurrences(content: &str, line: u32, text: &str, url: &str) -> Vec<Range<usize>> {
    let idx = usize::try_from(line).unwrap_or(0).saturating_sub(1);
    let mut offset = 0_usize;
    for (i, segment) in content.split_inclusive('\n').enumerate() {
        if i == idx {
            let body = segment.trim_end_matches('\n').trim_end_matches('\r');
            return scanner::matches_in_line(body)
                .filter(|m| return m.text == text && m.target == url)
                .map(|m| return offset.saturating_add(m.range.start)..offset.saturating_add(m.range.end))
                .collect();
        }
        offset = offset.saturating_add(segment.len());
    }
    return Vec::new();
}

/// Decide what to do with each broken link of one document.
fn plan_file(
    file: &DocumentId,
    content: &str,
    links: &[&ResolvedLink],
    index: &FileIndex,
    chain: &Chain,
) -> FilePlan {
    let mut plan = FilePlan::default();
    let mut seen: BTreeSet<(u32, &str, &str)> = BTreeSet::new();

    for link in links {
        if !seen.insert((link.line, link.text.as_str(), link.url.as_str())) {
            continue;
        }

        // The tree may have changed since the links were reported.
        let current = resolver::classify(&link.url, file, index);
        if current.status != LinkStatus::Broken {
            tracing::debug!("{file}:{} `{}` is no longer broken", link.line, link.url);
            continue;
        }

        let ranges = locate_occurrences(content, link.line, &link.text, &link.url);
        if ranges.is_empty() {
            plan.unfixable.push(UnfixableLink::new(link, UnfixableReason::LinkNotPresent));
            continue;
        }

        let Some(seed) = seed_for(link, &current, index.suffix()) else {
            plan.unfixable.push(UnfixableLink::new(link, UnfixableReason::NoCandidate));
            continue;
        };

        let target = match chain.locate(&seed, index) {
            Located::Ambiguous(candidates) => {
                plan.unfixable.push(UnfixableLink::new(link, UnfixableReason::Ambiguous(candidates.len())));
                continue;
            },
            Located::Found { strategy, target } => {
                tracing::info!("{file}:{} `{}` -> {target} ({strategy})", link.line, link.url);
                target
            },
            Located::Miss => {
                plan.unfixable.push(UnfixableLink::new(link, UnfixableReason::NoCandidate));
                continue;
            },
        };

        let corrected_url = rewrite_url(&link.url, &relative_link(file.dir(), &target));
        if corrected_url == link.url {
            plan.unfixable.push(UnfixableLink::new(link, UnfixableReason::NoCandidate));
            continue;
        }

        // One record per rewritten occurrence, so the tallies count occurrences.
        let replacement = format!("[{}]({corrected_url})", link.text);
        let record = FixRecord {
            correct_target: target,
            corrected_url,
            line: link.line,
            original_target: seed,
            original_url: link.url.clone(),
            source_file: file.clone(),
            text: link.text.clone(),
        };
        for range in ranges {
            plan.edits.insert(
                range.start,
                Edit {
                    range,
                    replacement: replacement.clone(),
                },
            );
            plan.fixes.push(record.clone());
        }
    }

    return plan;
}

/// Repair the given broken links under `root`.
///
/// The links may come from a fresh audit or from a persisted report that is
/// out of date: each one is re-checked against the current tree first.
///
/// # Errors
///
/// Returns `Error::RootNotFound` or `Error::RootNotDirectory` for an unusable
/// root. Per-document read and write failures are recorded in the report.
pub fn repair(root: &Path, config: &Config, broken_links: &[ResolvedLink]) -> Result<RepairReport, Error> {
    let index = FileIndex::build(root, config)?;
    let chain = Chain::standard(config);

    let mut by_file: BTreeMap<&DocumentId, Vec<&ResolvedLink>> = BTreeMap::new();
    for link in broken_links {
        by_file.entry(&link.source_file).or_default().push(link);
    }

    let mut report = RepairReport {
        errors: Vec::new(),
        files_fixed: Vec::new(),
        generated_at: Utc::now(),
        summary: RepairSummary {
            files_with_broken_links: by_file.len(),
            ..RepairSummary::default()
        },
        unfixable_links: Vec::new(),
    };

    for (file, links) in by_file {
        repair_file(root, config, file, &links, &index, &chain, &mut report);
    }

    tracing::info!(
        "repair made {} fixes across {} files, {} unfixable",
        report.summary.total_fixes_made,
        report.summary.files_with_fixes,
        report.unfixable_links.len()
    );
    return Ok(report);
}

/// Plan and commit the fixes for one document.
fn repair_file(
    root: &Path,
    config: &Config,
    file: &DocumentId,
    links: &[&ResolvedLink],
    index: &FileIndex,
    chain: &Chain,
    report: &mut RepairReport,
) {
    let path = root.join(file.as_str());
    if !path.is_file() {
        report
            .unfixable_links
            .extend(links.iter().map(|l| return UnfixableLink::new(l, UnfixableReason::SourceMissing)));
        return;
    }

    let content = match audit::read_document(root, file, config.max_file_bytes) {
        Err(e) => {
            tracing::warn!("cannot repair {file}: {e}");
            report.summary.errors = report.summary.errors.saturating_add(1);
            report.errors.push(FileError {
                file: file.clone(),
                message: e.to_string(),
            });
            return;
        },
        Ok(c) => c,
    };
    report.summary.files_processed = report.summary.files_processed.saturating_add(1);

    let plan = plan_file(file, &content, links, index, chain);
    report.unfixable_links.extend(plan.unfixable);
    if plan.edits.is_empty() {
        return;
    }

    let updated = apply_edits(&content, &plan.edits);
    if let Err(source) = std::fs::write(&path, updated) {
        let e = Error::FileWrite { path, source };
        tracing::warn!("{e}");
        report.summary.errors = report.summary.errors.saturating_add(1);
        report.files_fixed.push(FileFixes {
            file: file.clone(),
            fixes: plan.fixes,
            message: Some(e.to_string()),
            status: FileStatus::Error,
            total_fixes: 0,
        });
        return;
    }

    let count = plan.fixes.len();
    tracing::info!("fixed {count} links in {file}");
    report.summary.files_with_fixes = report.summary.files_with_fixes.saturating_add(1);
    report.summary.total_fixes_made = report.summary.total_fixes_made.saturating_add(count);
    report.files_fixed.push(FileFixes {
        file: file.clone(),
        fixes: plan.fixes,
        message: None,
        status: FileStatus::Fixed,
        total_fixes: count,
    });
}

/// Swap the destination path of a raw target, keeping fragment and title.
/// A destination containing whitespace is wrapped in `<...>`.
fn rewrite_url(original: &str, new_path: &str) -> String {
    let (destination, title) = split_title(original);
    let destination = match split_fragment(destination) {
        (_, None) => new_path.to_string(),
        (_, Some(fragment)) => format!("{new_path}#{fragment}"),
    };
    if destination.contains(char::is_whitespace) {
        return format!("<{destination}>{title}");
    }
    return format!("{destination}{title}");
}

/// The root-relative path the repair strategies start from.
///
/// Normally the freshly computed expected target. Root-relative links have
/// none, so their path is read as relative to the root instead.
fn seed_for(link: &ResolvedLink, current: &Classification, suffix: &str) -> Option<String> {
    if let Some(expected) = &current.expected_target {
        return Some(expected.clone());
    }
    let (destination, _) = split_title(&link.url);
    let (path, _) = split_fragment(destination);
    let segments = join_and_normalize("", path.trim_start_matches('/'))?;
    if segments.is_empty() {
        return None;
    }
    return Some(with_doc_extension(&segments.join("/"), suffix));
}
