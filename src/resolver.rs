//! Link classification and root-relative path arithmetic.
//!
//! All resolution happens on forward-slash identity strings. The filesystem
//! is never consulted here; existence is answered by the frozen `FileIndex`.

use crate::index::{FileIndex, Lookup};
use crate::types::{Classification, DocumentId, LinkCategory, LinkStatus};

/// Scheme prefixes that mark a link as external. Reachability is never checked.
const EXTERNAL_SCHEMES: [&str; 4] = ["http://", "https://", "mailto:", "ftp://"];

/// Classify a raw link target found in `source`.
///
/// Decision order: anchor-only, scheme-prefixed external, then internal.
/// Internal targets resolve against the source document's directory; a
/// result that escapes the root is reclassified as external. A leading `/`
/// is never resolved and is reported broken without an expected target.
pub fn classify(target: &str, source: &DocumentId, index: &FileIndex) -> Classification {
    let (destination, _title) = split_title(target);

    if destination.starts_with('#') {
        return Classification::anchor();
    }

    let (path, fragment) = split_fragment(destination);
    let has_anchor = fragment.is_some();

    if is_external(destination) {
        return Classification::external(has_anchor);
    }

    if path.starts_with('/') || path.is_empty() {
        return broken(None, has_anchor);
    }

    let Some(segments) = join_and_normalize(source.dir(), path) else {
        return Classification::external(has_anchor);
    };
    if segments.is_empty() {
        return broken(None, has_anchor);
    }

    let as_written = segments.join("/");
    let expected = with_doc_extension(&as_written, index.suffix());

    if let Lookup::Found(id) = index.lookup(&expected) {
        return valid(id, expected, has_anchor);
    }
    if expected != as_written
        && let Lookup::Found(id) = index.lookup(&as_written)
    {
        return valid(id, as_written, has_anchor);
    }

    return broken(Some(expected), has_anchor);
}

/// Internal link that resolved to nothing usable.
const fn broken(expected_target: Option<String>, has_anchor: bool) -> Classification {
    return Classification {
        category: LinkCategory::Internal,
        expected_target,
        has_anchor,
        resolved_target: None,
        status: LinkStatus::Broken,
    };
}

/// Last path segment carries an extension (a dot that isn't leading).
fn has_extension(path: &str) -> bool {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| return name);
    return name.rfind('.').is_some_and(|dot| return dot > 0);
}

/// Whether a destination starts with one of the recognized schemes.
pub fn is_external(destination: &str) -> bool {
    let lowered = destination.to_ascii_lowercase();
    return EXTERNAL_SCHEMES.iter().any(|scheme| return lowered.starts_with(scheme));
}

/// `"..."`, `'...'` or `(...)`.
fn is_quoted_title(text: &str) -> bool {
    let mut chars = text.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    return matches!((open, close), ('"', '"') | ('\'', '\'') | ('(', ')'));
}

/// Join `path` onto `dir` and collapse `.` and `..` segments.
/// Returns `None` when the result would climb above the root.
pub fn join_and_normalize<'a>(dir: &'a str, path: &'a str) -> Option<Vec<&'a str>> {
    let mut segments: Vec<&str> = Vec::new();
    let all = dir.split('/').chain(path.split(['/', '\\']));
    for segment in all {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop()?;
            },
            other => segments.push(other),
        }
    }
    return Some(segments);
}

/// Path from the directory `from_dir` to `to`, in the form written into links.
///
/// Referrers at the root get the plain root-relative path. Elsewhere,
/// same-directory and descendant targets are prefixed with `./`, and targets
/// in other branches climb with `../`.
pub fn relative_link(from_dir: &str, to: &DocumentId) -> String {
    if from_dir.is_empty() {
        return to.as_str().to_string();
    }

    let from: Vec<&str> = from_dir.split('/').filter(|s| return !s.is_empty()).collect();
    let target: Vec<&str> = to.as_str().split('/').collect();

    // The last target segment is the file name and never part of the shared prefix.
    let dir_len = target.len().saturating_sub(1);
    let common = from
        .iter()
        .zip(target.iter().take(dir_len))
        .take_while(|(a, b)| return a == b)
        .count();

    let ups = from.len().saturating_sub(common);
    let rest = target.get(common..).unwrap_or_default().join("/");
    if ups == 0 {
        return format!("./{rest}");
    }
    return format!("{}{rest}", "../".repeat(ups));
}

/// Split `path#fragment`; the fragment excludes the `#`.
pub fn split_fragment(destination: &str) -> (&str, Option<&str>) {
    return match destination.split_once('#') {
        None => (destination, None),
        Some((path, fragment)) => (path, Some(fragment)),
    };
}

/// Split a raw target into its destination and a trailing title such as
/// ` "Setup guide"`. The title keeps its leading whitespace.
///
/// Only a quoted or parenthesized tail counts as a title; any other
/// whitespace belongs to the destination, so `My Notes.md` stays whole.
/// A `<...>` destination is returned without its angle brackets.
pub fn split_title(target: &str) -> (&str, &str) {
    let trimmed = target.trim();
    if let Some(inner) = trimmed.strip_prefix('<')
        && let Some((destination, title)) = inner.split_once('>')
    {
        return (destination, title);
    }
    for (at, _) in trimmed.match_indices(char::is_whitespace) {
        let destination = trimmed.get(..at).unwrap_or_default();
        let title = trimmed.get(at..).unwrap_or_default();
        if !destination.is_empty() && is_quoted_title(title.trim_start()) {
            return (destination, title);
        }
    }
    return (trimmed, "");
}

/// Internal link whose target exists.
const fn valid(id: DocumentId, expected: String, has_anchor: bool) -> Classification {
    return Classification {
        category: LinkCategory::Internal,
        expected_target: Some(expected),
        has_anchor,
        resolved_target: Some(id),
        status: LinkStatus::Valid,
    };
}

/// Append the documentation suffix unless some extension is already present.
pub fn with_doc_extension(path: &str, suffix: &str) -> String {
    if has_extension(path) {
        return path.to_string();
    }
    return format!("{path}{suffix}");
}

/// Drop the documentation suffix if present.
pub fn without_doc_extension<'a>(path: &'a str, suffix: &str) -> &'a str {
    return path.strip_suffix(suffix).unwrap_or(path);
}
