/// Core domain types for doclink documents, links, and fixes.
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Canonical identity of a file under the document root: its root-relative
/// path with forward-slash separators. Never starts with `/` or `./`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(
    /// The normalized root-relative path string.
    String,
);

impl DocumentId {
    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Directory part of the identity, empty for files at the root.
    pub fn dir(&self) -> &str {
        return self.0.rsplit_once('/').map_or("", |(dir, _)| return dir);
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        return self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| return name);
    }

    /// Lowercased form used by the case-folded lookup tier.
    pub fn folded(&self) -> String {
        return self.0.to_lowercase();
    }

    /// Build an identity from an already-normalized, root-relative string.
    pub fn new(normalized: impl Into<String>) -> Self {
        return Self(normalized.into());
    }

    /// Build an identity from a filesystem path relative to the root.
    /// Returns `None` for paths that contain `..`, a root, or a prefix.
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let mut parts: Vec<String> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {},
                Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        return Some(Self(parts.join("/")));
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// One occurrence of `[text](target)` link syntax in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// One-based line number in the source document.
    pub line: u32,
    /// Document containing the link.
    pub source: DocumentId,
    /// Raw text between the parentheses, title included.
    pub target: String,
    /// Display text between the square brackets.
    pub text: String,
}

/// Closed set of link kinds, decided once per link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    /// In-document fragment such as `#setup`.
    Anchor,
    /// Scheme-prefixed URL or a path that escapes the root.
    External,
    /// Path expected to resolve to a file under the root.
    Internal,
}

/// Outcome of checking a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Internal link whose target is not in the index.
    Broken,
    /// Never checked for reachability.
    External,
    /// Anchor link, or internal link whose target exists.
    Valid,
}

/// Result of classifying a raw target against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Link kind.
    pub category: LinkCategory,
    /// Root-relative path the link was expected to point at, when computable.
    pub expected_target: Option<String>,
    /// Whether the target carried a `#fragment`.
    pub has_anchor: bool,
    /// Indexed file the link points at. Set only for valid internal links.
    pub resolved_target: Option<DocumentId>,
    /// Check outcome.
    pub status: LinkStatus,
}

impl Classification {
    /// Anchor-only link; always valid.
    pub const fn anchor() -> Self {
        return Self {
            category: LinkCategory::Anchor,
            expected_target: None,
            has_anchor: true,
            resolved_target: None,
            status: LinkStatus::Valid,
        };
    }

    /// External link, never checked.
    pub const fn external(has_anchor: bool) -> Self {
        return Self {
            category: LinkCategory::External,
            expected_target: None,
            has_anchor,
            resolved_target: None,
            status: LinkStatus::External,
        };
    }
}

/// A raw link plus its classification. This is the per-link record of the
/// audit report and the input contract of the repair engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    /// Link kind.
    #[serde(rename = "type")]
    pub category: LinkCategory,
    /// Expected root-relative target for internal links.
    #[serde(default, rename = "target")]
    pub expected_target: Option<String>,
    /// Whether the target carried a `#fragment`.
    #[serde(default)]
    pub has_anchor: bool,
    /// One-based line number in the source document.
    pub line: u32,
    /// Indexed file the link resolved to.
    #[serde(default)]
    pub resolved_target: Option<DocumentId>,
    /// Document containing the link.
    pub source_file: DocumentId,
    /// Check outcome.
    pub status: LinkStatus,
    /// Display text of the link.
    pub text: String,
    /// Raw target as written in the document.
    pub url: String,
}

impl ResolvedLink {
    /// Attach a classification to a raw link.
    pub fn new(raw: RawLink, classification: Classification) -> Self {
        return Self {
            category: classification.category,
            expected_target: classification.expected_target,
            has_anchor: classification.has_anchor,
            line: raw.line,
            resolved_target: classification.resolved_target,
            source_file: raw.source,
            status: classification.status,
            text: raw.text,
            url: raw.target,
        };
    }
}

/// A committed rewrite of one link occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecord {
    /// Indexed file the link now points at.
    pub correct_target: DocumentId,
    /// Replacement target written into the document.
    pub corrected_url: String,
    /// One-based line number of the rewritten link.
    pub line: u32,
    /// Expected target the broken link resolved to.
    pub original_target: String,
    /// Raw target before the rewrite.
    pub original_url: String,
    /// Document that was rewritten.
    pub source_file: DocumentId,
    /// Display text of the link.
    pub text: String,
}
