//! File index: a frozen snapshot of every file under the document root.
//!
//! Lookups go through two explicit tiers: exact identity first, then a
//! case-folded map. A folded key shared by several differently-cased files is
//! reported as ambiguous instead of silently picking one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;
use crate::report;
use crate::types::DocumentId;

/// Result of looking a path up in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// More than one indexed file matched. Sorted for stable reporting.
    Ambiguous(Vec<DocumentId>),
    /// Exactly one indexed file matched.
    Found(DocumentId),
    /// Nothing matched.
    Miss,
}

impl Lookup {
    /// Collapse a candidate list: none, one, or several.
    pub fn from_candidates(mut candidates: Vec<DocumentId>) -> Self {
        candidates.sort();
        candidates.dedup();
        if candidates.len() > 1 {
            return Self::Ambiguous(candidates);
        }
        return candidates.pop().map_or(Self::Miss, Self::Found);
    }
}

/// Read-only snapshot of the files under a document root.
#[derive(Debug, Default)]
pub struct FileIndex {
    /// File name -> identities sharing it.
    by_name: HashMap<String, Vec<DocumentId>>,
    /// Documentation files in traversal order.
    documents: Vec<DocumentId>,
    /// Exact-case identities of every indexed file.
    exact: HashSet<DocumentId>,
    /// All indexed files (documents and assets) in traversal order.
    files: Vec<DocumentId>,
    /// Lowercased identity -> identities folding to it.
    folded: HashMap<String, Vec<DocumentId>>,
    /// Documentation suffix, e.g. `.md`.
    suffix: String,
}

impl FileIndex {
    /// Walk `root` recursively and index every regular file.
    ///
    /// Files with the documentation extension become documents; everything
    /// else is indexed as an asset that links may point at. Symlinks are
    /// followed, but each real file is indexed at most once and directory
    /// cycles are skipped. Hidden entries and persisted reports are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::RootNotFound` or `Error::RootNotDirectory` if the root
    /// is unusable. Unreadable entries below the root are logged and skipped.
    pub fn build(root: &Path, config: &Config) -> Result<Self, Error> {
        ensure_root_is_directory(root)?;

        let mut index = Self {
            suffix: config.suffix(),
            ..Self::default()
        };
        let mut seen_real: HashSet<PathBuf> = HashSet::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| return !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                },
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let real = std::fs::canonicalize(entry.path()).unwrap_or_else(|_err| return entry.path().to_path_buf());
            if !seen_real.insert(real) {
                tracing::debug!("already indexed through another link: {}", entry.path().display());
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let Some(id) = DocumentId::from_relative_path(relative) else {
                continue;
            };
            if report::is_report_file(&id) {
                continue;
            }
            index.insert(id);
        }

        tracing::info!(
            "indexed {} files ({} documents) under {}",
            index.files.len(),
            index.documents.len(),
            root.display()
        );
        return Ok(index);
    }

    /// Documentation files in traversal order.
    pub fn documents(&self) -> &[DocumentId] {
        return &self.documents;
    }

    /// Build an index from identities without touching the filesystem.
    #[cfg(test)]
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>, suffix: &str) -> Self {
        let mut index = Self {
            suffix: suffix.to_string(),
            ..Self::default()
        };
        for id in ids {
            index.insert(DocumentId::new(id));
        }
        return index;
    }

    /// Record one identity in every tier.
    fn insert(&mut self, id: DocumentId) {
        if !self.exact.insert(id.clone()) {
            return;
        }
        if id.as_str().ends_with(&self.suffix) {
            self.documents.push(id.clone());
        }
        self.by_name.entry(id.file_name().to_string()).or_default().push(id.clone());
        self.folded.entry(id.folded()).or_default().push(id.clone());
        self.files.push(id);
    }

    /// Look a root-relative path up: exact tier, then case-folded tier.
    pub fn lookup(&self, relative: &str) -> Lookup {
        let id = DocumentId::new(relative);
        if self.exact.contains(&id) {
            return Lookup::Found(id);
        }
        let Some(candidates) = self.folded.get(&relative.to_lowercase()) else {
            return Lookup::Miss;
        };
        return Lookup::from_candidates(candidates.clone());
    }

    /// Identities whose final segment is exactly `file_name`.
    pub fn named(&self, file_name: &str) -> &[DocumentId] {
        return self.by_name.get(file_name).map_or(&[], Vec::as_slice);
    }

    /// Documentation suffix this index was built with.
    pub fn suffix(&self) -> &str {
        return &self.suffix;
    }
}

/// Fail fast on a missing or non-directory root.
///
/// # Errors
///
/// Returns `Error::RootNotFound` or `Error::RootNotDirectory`.
pub fn ensure_root_is_directory(root: &Path) -> Result<(), Error> {
    let metadata = match std::fs::metadata(root) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::RootNotFound { path: root.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(m) => m,
    };
    if !metadata.is_dir() {
        return Err(Error::RootNotDirectory { path: root.to_path_buf() });
    }
    return Ok(());
}

/// Dot-prefixed entries below the root (`.git`, `.cache`, ...).
fn is_hidden(entry: &DirEntry) -> bool {
    return entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
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
    fn missing_root_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileIndex::build(&dir.path().join("nope"), &Config::default());
        assert!(matches!(result, Err(Error::RootNotFound { .. })));
    }

    #[test]
    fn indexes_documents_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "");
        write(dir.path(), "guide/intro.md", "");
        write(dir.path(), "api/openapi.yaml", "");
        write(dir.path(), ".git/HEAD.md", "");
        write(dir.path(), "LINK_AUDIT_REPORT.md", "");

        let index = FileIndex::build(dir.path(), &Config::default()).unwrap();
        let docs: Vec<&str> = index.documents().iter().map(DocumentId::as_str).collect();
        assert_eq!(docs, vec!["README.md", "guide/intro.md"]);
        assert_eq!(index.lookup("api/openapi.yaml"), Lookup::Found(DocumentId::new("api/openapi.yaml")));
        assert_eq!(index.lookup(".git/HEAD.md"), Lookup::Miss);
    }

    #[test]
    fn case_folded_tier_finds_single_candidate() {
        let index = FileIndex::from_ids(["Guide/Setup.md"], ".md");
        assert_eq!(index.lookup("guide/setup.md"), Lookup::Found(DocumentId::new("Guide/Setup.md")));
        assert_eq!(index.lookup("guide/other.md"), Lookup::Miss);
    }

    #[test]
    fn case_folded_collision_is_ambiguous() {
        let index = FileIndex::from_ids(["Notes.md", "NOTES.md"], ".md");
        assert_eq!(index.lookup("Notes.md"), Lookup::Found(DocumentId::new("Notes.md")));
        assert!(matches!(index.lookup("notes.md"), Lookup::Ambiguous(c) if c.len() == 2));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/page.md", "");
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("a/loop")).unwrap();

        let index = FileIndex::build(dir.path(), &Config::default()).unwrap();
        assert_eq!(index.documents().len(), 1);
    }
}
