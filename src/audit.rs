//! Audit engine: index the tree, classify every link, aggregate a report.

use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::index::FileIndex;
use crate::resolver;
use crate::scanner;
use crate::types::{DocumentId, LinkCategory, LinkStatus, ResolvedLink};

/// Global tallies. Equal across runs on an unchanged tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Anchor-only links.
    pub anchor_links: usize,
    /// Internal links whose target is missing.
    pub broken_links: usize,
    /// Scheme links and links escaping the root.
    pub external_links: usize,
    /// Documents audited, including those with no links.
    pub total_files: usize,
    /// Every extracted link.
    pub total_links: usize,
    /// Internal links whose target exists.
    pub valid_links: usize,
}

/// Per-document results, links bucketed by outcome in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    /// Anchor-only links.
    pub anchor_links: Vec<ResolvedLink>,
    /// Broken internal links.
    pub broken_links: Vec<ResolvedLink>,
    /// External links.
    pub external_links: Vec<ResolvedLink>,
    /// The audited document.
    pub file: DocumentId,
    /// Number of links extracted from the document.
    pub total_links: usize,
    /// Valid internal links.
    pub valid_links: Vec<ResolvedLink>,
}

/// A document that could not be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// The document that failed.
    pub file: DocumentId,
    /// What went wrong.
    pub message: String,
}

/// Full audit output and the hand-off contract to the repair engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// All broken links, sorted by source file.
    pub broken_links: Vec<ResolvedLink>,
    /// Documents skipped because they could not be read.
    #[serde(default)]
    pub errors: Vec<FileError>,
    /// Documents ranked by descending broken-link count, ties in scan order.
    pub files: Vec<FileResult>,
    /// When the audit ran. Metadata, not part of the audited content.
    pub generated_at: DateTime<Utc>,
    /// Global tallies.
    pub summary: AuditSummary,
}

impl AuditReport {
    /// Whether the tree has no broken links.
    pub const fn is_clean(&self) -> bool {
        return self.summary.broken_links == 0;
    }

    /// Whether every document selected for the audit was actually read.
    pub fn is_complete(&self) -> bool {
        return self.errors.is_empty();
    }

    /// Files with at least one broken link, worst first.
    pub fn most_problematic(&self) -> impl Iterator<Item = &FileResult> {
        return self.files.iter().filter(|f| return !f.broken_links.is_empty());
    }
}

impl FileResult {
    /// Empty result for a document.
    const fn new(file: DocumentId) -> Self {
        return Self {
            anchor_links: Vec::new(),
            broken_links: Vec::new(),
            external_links: Vec::new(),
            file,
            total_links: 0,
            valid_links: Vec::new(),
        };
    }

    /// Sort one classified link into its bucket.
    fn push(&mut self, link: ResolvedLink) {
        self.total_links = self.total_links.saturating_add(1);
        match (link.status, link.category) {
            (LinkStatus::Broken, _) => self.broken_links.push(link),
            (LinkStatus::External, _) => self.external_links.push(link),
            (LinkStatus::Valid, LinkCategory::Anchor) => self.anchor_links.push(link),
            (LinkStatus::Valid, LinkCategory::External | LinkCategory::Internal) => self.valid_links.push(link),
        }
    }
}

/// Audit every document under `root`.
///
/// # Errors
///
/// Returns `Error::RootNotFound` or `Error::RootNotDirectory` for an unusable
/// root. Unreadable documents are recorded in `errors`, not propagated.
pub fn audit(root: &Path, config: &Config) -> Result<AuditReport, Error> {
    let index = FileIndex::build(root, config)?;
    return Ok(audit_with_index(root, config, &index));
}

/// Classify every link of one document's content.
pub fn audit_document(file: &DocumentId, content: &str, index: &FileIndex) -> FileResult {
    let mut result = FileResult::new(file.clone());
    for raw in scanner::extract(file, content) {
        let classification = resolver::classify(&raw.target, file, index);
        result.push(ResolvedLink::new(raw, classification));
    }
    return result;
}

/// Audit with an index that is already built and frozen.
///
/// Documents are read and classified in parallel; results are collected in
/// traversal order so the report does not depend on scheduling.
pub fn audit_with_index(root: &Path, config: &Config, index: &FileIndex) -> AuditReport {
    let outcomes: Vec<Result<FileResult, FileError>> = index
        .documents()
        .par_iter()
        .filter(|id| return config.should_scan(id.as_str()))
        .map(|id| {
            return read_document(root, id, config.max_file_bytes)
                .map(|content| return audit_document(id, &content, index))
                .map_err(|e| {
                    tracing::warn!("skipping {id}: {e}");
                    return FileError {
                        file: id.clone(),
                        message: e.to_string(),
                    };
                });
        })
        .collect();

    let mut summary = AuditSummary::default();
    let mut files = Vec::new();
    let mut errors = Vec::new();
    let mut broken_links = Vec::new();

    for outcome in outcomes {
        match outcome {
            Err(e) => errors.push(e),
            Ok(file) => {
                tally(&mut summary, &file);
                broken_links.extend(file.broken_links.iter().cloned());
                files.push(file);
            },
        }
    }

    files.sort_by(|a, b| return b.broken_links.len().cmp(&a.broken_links.len()));
    broken_links.sort_by(|a, b| return a.source_file.cmp(&b.source_file));

    tracing::info!(
        "audited {} files: {} links, {} broken",
        summary.total_files,
        summary.total_links,
        summary.broken_links
    );

    return AuditReport {
        broken_links,
        errors,
        files,
        generated_at: Utc::now(),
        summary,
    };
}

/// Read a document, refusing files above the size limit.
///
/// # Errors
///
/// Returns `Error::FileTooLarge` or `Error::FileRead`.
pub fn read_document(root: &Path, id: &DocumentId, max_bytes: u64) -> Result<String, Error> {
    let path = root.join(id.as_str());
    let metadata = std::fs::metadata(&path).map_err(|source| {
        return Error::FileRead {
            path: path.clone(),
            source,
        };
    })?;
    if metadata.len() > max_bytes {
        return Err(Error::FileTooLarge {
            max_bytes,
            path,
            size_bytes: metadata.len(),
        });
    }
    return std::fs::read_to_string(&path).map_err(|source| return Error::FileRead { path, source });
}

/// Add one document's counts to the global summary.
fn tally(summary: &mut AuditSummary, file: &FileResult) {
    summary.total_files = summary.total_files.saturating_add(1);
    summary.total_links = summary.total_links.saturating_add(file.total_links);
    summary.broken_links = summary.broken_links.saturating_add(file.broken_links.len());
    summary.valid_links = summary.valid_links.saturating_add(file.valid_links.len());
    summary.external_links = summary.external_links.saturating_add(file.external_links.len());
    summary.anchor_links = summary.anchor_links.saturating_add(file.anchor_links.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn every_link_lands_in_exactly_one_bucket() {
        let index = FileIndex::from_ids(["a.md", "b.md"], ".md");
        let content = "[b](b.md) [gone](gone.md) [web](https://x.io) [top](#top) [up](../../x.md)";
        let result = audit_document(&DocumentId::new("a.md"), content, &index);

        assert_eq!(result.total_links, 5);
        assert_eq!(result.valid_links.len(), 1);
        assert_eq!(result.broken_links.len(), 1);
        assert_eq!(result.external_links.len(), 2);
        assert_eq!(result.anchor_links.len(), 1);
    }

    #[test]
    fn files_are_ranked_by_broken_count_with_stable_ties() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "[x](nope.md)");
        write(dir.path(), "b.md", "no links here");
        write(dir.path(), "c.md", "[x](nope.md) [y](also-nope.md)");
        write(dir.path(), "d.md", "[x](missing.md)");

        let report = audit(dir.path(), &Config::default()).unwrap();
        let order: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(order, vec!["c.md", "a.md", "d.md", "b.md"]);
        assert_eq!(report.summary.total_files, 4);
        assert_eq!(report.summary.broken_links, 4);

        let sources: Vec<&str> = report.broken_links.iter().map(|l| l.source_file.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "c.md", "c.md", "d.md"]);
    }

    #[test]
    fn repeated_audits_agree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "[a](guide/a.md) [b](guide/missing.md)");
        write(dir.path(), "guide/a.md", "[home](../index.md)");

        let first = audit(dir.path(), &Config::default()).unwrap();
        let second = audit(dir.path(), &Config::default()).unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn oversized_document_is_a_per_file_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.md", "[x](y.md) padding padding padding");
        write(dir.path(), "small.md", "ok");
        let config = Config::parse("max_file_bytes = 10").unwrap();

        let report = audit(dir.path(), &config).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].file.as_str(), "big.md");
        assert!(!report.is_complete());
    }

    #[test]
    fn excluded_documents_are_not_audited_but_stay_linkable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "[old](archive/old.md)");
        write(dir.path(), "archive/old.md", "[broken](nowhere.md)");
        let config = Config::parse("exclude = [\"archive/\"]").unwrap();

        let report = audit(dir.path(), &config).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert!(report.is_clean());
    }
}
