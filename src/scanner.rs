//! Link extraction: finds `[text](target)` occurrences line by line.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{DocumentId, RawLink};

/// Inline link syntax. Display text may be empty; the target may not.
/// Matching is per line, so multi-line links never match.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"));

/// One link occurrence within a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch<'a> {
    /// Byte range of the whole `[text](target)` occurrence within the line.
    pub range: Range<usize>,
    /// Raw target between the parentheses.
    pub target: &'a str,
    /// Display text between the brackets.
    pub text: &'a str,
}

/// Lazily extract every link in `content`, in file order.
///
/// Pure over its input: calling it again on the same text yields the same
/// sequence. Line numbers are one-based from the start of the raw text.
pub fn extract<'a>(source: &'a DocumentId, content: &'a str) -> impl Iterator<Item = RawLink> + 'a {
    return content.lines().zip(1_u32..).flat_map(move |(line, number)| {
        return matches_in_line(line).map(move |m| {
            return RawLink {
                line: number,
                source: source.clone(),
                target: m.target.to_string(),
                text: m.text.to_string(),
            };
        });
    });
}

/// Every link occurrence in one line, left to right.
pub fn matches_in_line(line: &str) -> impl Iterator<Item = LinkMatch<'_>> + '_ {
    return LINK_PATTERN.captures_iter(line).filter_map(|cap| {
        let whole = cap.get(0)?;
        let text = cap.get(1)?;
        let target = cap.get(2)?;
        return Some(LinkMatch {
            range: whole.range(),
            target: target.as_str(),
            text: text.as_str(),
        });
    });
}
