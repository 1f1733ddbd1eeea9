//! Repair strategies: an ordered chain of pure target lookups.
//!
//! Each strategy maps the expected target of a broken link to a candidate in
//! the index. The chain tries them in order; the first strategy that finds a
//! single candidate or an ambiguous set decides the outcome.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::index::{FileIndex, Lookup};
use crate::resolver::{with_doc_extension, without_doc_extension};
use crate::types::DocumentId;

/// One layer of the repair heuristic.
pub trait Strategy: Send + Sync {
    /// Find the current location of `seed`, a root-relative expected target.
    fn locate(&self, seed: &str, index: &FileIndex) -> Lookup;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Outcome of running the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Several candidates tied; never guessed.
    Ambiguous(Vec<DocumentId>),
    /// A single candidate and the strategy that found it.
    Found {
        /// Name of the deciding strategy.
        strategy: &'static str,
        /// The candidate.
        target: DocumentId,
    },
    /// No strategy produced anything.
    Miss,
}

/// Ordered list of strategies.
pub struct Chain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Chain {
    /// Run strategies in order until one of them decides.
    pub fn locate(&self, seed: &str, index: &FileIndex) -> Located {
        for strategy in &self.strategies {
            match strategy.locate(seed, index) {
                Lookup::Ambiguous(candidates) => {
                    tracing::debug!("{}: {seed} is ambiguous ({} candidates)", strategy.name(), candidates.len());
                    return Located::Ambiguous(candidates);
                },
                Lookup::Found(target) => {
                    tracing::debug!("{}: {seed} -> {target}", strategy.name());
                    return Located::Found {
                        strategy: strategy.name(),
                        target,
                    };
                },
                Lookup::Miss => {},
            }
        }
        return Located::Miss;
    }

    /// Exact, alias table, file name, then token prefix.
    pub fn standard(config: &Config) -> Self {
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(ExactMatch),
            Box::new(AliasTable::new(&config.aliases)),
            Box::new(FileNameMatch),
            Box::new(TokenPrefixMatch),
        ];
        return Self::with_strategies(strategies);
    }

    /// Build a chain from an explicit strategy list.
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        return Self { strategies };
    }
}

/// Known renames from the config's `[aliases]` table. A seed matches a key
/// with or without the documentation extension.
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    /// Normalize config aliases for lookup.
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let normalized = aliases
            .iter()
            .map(|(from, to)| {
                let key = from.trim_start_matches("./").trim_start_matches('/');
                return (key.to_string(), to.trim_start_matches("./").trim_start_matches('/').to_string());
            })
            .collect();
        return Self { aliases: normalized };
    }
}

impl Strategy for AliasTable {
    fn locate(&self, seed: &str, index: &FileIndex) -> Lookup {
        let bare = without_doc_extension(seed, index.suffix());
        let Some(to) = self.aliases.get(seed).or_else(|| {
            return self
                .aliases
                .iter()
                .find(|(from, _)| return without_doc_extension(from, index.suffix()) == bare)
                .map(|(_, to)| return to);
        }) else {
            return Lookup::Miss;
        };

        // An alias pointing at a file that no longer exists is no help.
        return ExactMatch.locate(to, index);
    }

    fn name(&self) -> &'static str {
        return "alias";
    }
}

/// The expected target itself, tried with and without the documentation
/// extension, through both lookup tiers.
pub struct ExactMatch;

impl Strategy for ExactMatch {
    fn locate(&self, seed: &str, index: &FileIndex) -> Lookup {
        let suffix = index.suffix();
        let bare = without_doc_extension(seed, suffix);
        let variants = [seed.to_string(), with_doc_extension(seed, suffix), bare.to_string()];
        for variant in &variants {
            match index.lookup(variant) {
                Lookup::Miss => {},
                decided => return decided,
            }
        }
        return Lookup::Miss;
    }

    fn name(&self) -> &'static str {
        return "exact";
    }
}

/// Any indexed file with the same base name, anywhere in the tree.
/// More than one candidate is ambiguous.
pub struct FileNameMatch;

impl Strategy for FileNameMatch {
    fn locate(&self, seed: &str, index: &FileIndex) -> Lookup {
        let name = seed.rsplit_once('/').map_or(seed, |(_, name)| return name);
        let stem = without_doc_extension(name, index.suffix());
        let with_suffix = format!("{stem}{}", index.suffix());

        let mut candidates: Vec<DocumentId> = Vec::new();
        for variant in [name, stem, with_suffix.as_str()] {
            candidates.extend(index.named(variant).iter().cloned());
        }
        return Lookup::from_candidates(candidates);
    }

    fn name(&self) -> &'static str {
        return "filename";
    }
}

/// Documents in the expected directory whose name tokens start with the
/// seed's tokens, in order: `02-start` finds `02-getting-started`.
pub struct TokenPrefixMatch;

impl TokenPrefixMatch {
    /// Every seed token is a prefix of a later candidate token, in order.
    fn tokens_match(seed: &[String], candidate: &[String]) -> bool {
        let mut remaining = candidate.iter();
        return seed.iter().all(|token| return remaining.any(|c| return c.starts_with(token.as_str())));
    }
}

impl Strategy for TokenPrefixMatch {
    fn locate(&self, seed: &str, index: &FileIndex) -> Lookup {
        let suffix = index.suffix();
        let (dir, name) = seed.rsplit_once('/').unwrap_or(("", seed));
        let seed_tokens = tokenize(without_doc_extension(name, suffix));
        if seed_tokens.is_empty() {
            return Lookup::Miss;
        }

        let candidates: Vec<DocumentId> = index
            .documents()
            .iter()
            .filter(|doc| return doc.dir() == dir)
            .filter(|doc| {
                let tokens = tokenize(without_doc_extension(doc.file_name(), suffix));
                return Self::tokens_match(&seed_tokens, &tokens);
            })
            .cloned()
            .collect();
        return Lookup::from_candidates(candidates);
    }

    fn name(&self) -> &'static str {
        return "token-prefix";
    }
}

/// Lowercased name tokens split on `-`, `_`, `.` and spaces.
fn tokenize(stem: &str) -> Vec<String> {
    return stem
        .split(['-', '_', '.', ' '])
        .filter(|t| return !t.is_empty())
        .map(str::to_lowercase)
        .collect();
}
