use std::path::{Path, PathBuf};

use crate::config::{self, CONFIG_FILE};
use crate::error;

// ── CLI commands ──────────────────────────────────────────────────────

/// Add an alias `from -> to` to the config file.
///
/// # Errors
///
/// Returns `Error::AliasExists` if `from` is already aliased,
/// or errors from config reading and writing.
pub fn cmd_add(root: &Path, from: &str, to: &str) -> Result<(), error::Error> {
    add_to_config(root, from, to)?;
    println!("Added alias: {from} -> {to}");
    return Ok(());
}

/// List all configured aliases, sorted by source path.
///
/// # Errors
///
/// Returns errors from config loading.
pub fn cmd_list(root: &Path) -> Result<(), error::Error> {
    let config = config::Config::load(root)?;

    if config.aliases.is_empty() {
        println!("No aliases configured.");
        return Ok(());
    }

    for (from, to) in &config.aliases {
        println!("{from} -> {to}");
    }
    return Ok(());
}

/// Remove an alias from the config file.
///
/// # Errors
///
/// Returns `Error::UnknownAlias` if `from` is not aliased,
/// or errors from config reading and writing.
pub fn cmd_remove(root: &Path, from: &str) -> Result<(), error::Error> {
    remove_from_config(root, from)?;
    println!("Removed alias: {from}");
    return Ok(());
}

// ── Config file editing ───────────────────────────────────────────────

/// Add an alias to `.doclink.toml`, creating the `[aliases]` table if needed.
///
/// # Errors
///
/// Returns `Error::AliasExists` for a duplicate source,
/// `Error::ConfigEdit` if the config can't be parsed,
/// or `Error::Io` if writing fails.
fn add_to_config(root: &Path, from: &str, to: &str) -> Result<(), error::Error> {
    let (config_path, mut doc) = read_config_doc(root)?;

    if !doc.contains_key("aliases") {
        doc["aliases"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    let aliases = doc
        .get_mut("aliases")
        .and_then(toml_edit::Item::as_table_mut)
        .ok_or_else(|| {
            return error::Error::ConfigEdit {
                path: config_path.clone(),
                reason: "`aliases` is not a table".to_string(),
            };
        })?;

    if let Some(existing) = aliases.get(from) {
        return Err(error::Error::AliasExists {
            from: from.to_string(),
            to: existing.as_str().unwrap_or_default().to_string(),
        });
    }

    aliases.insert(from, toml_edit::value(to));
    std::fs::write(&config_path, doc.to_string())?;
    return Ok(());
}

/// Parse `.doclink.toml` into a format-preserving document.
/// Returns an empty document if the file doesn't exist.
///
/// # Errors
///
/// Returns `Error::Io` on read failure or `Error::ConfigEdit` on parse failure.
fn read_config_doc(root: &Path) -> Result<(PathBuf, toml_edit::DocumentMut), error::Error> {
    let config_path = root.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(error::Error::Io(e)),
        Ok(c) => c,
    };

    let doc: toml_edit::DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
        return error::Error::ConfigEdit {
            path: config_path.clone(),
            reason: e.to_string(),
        };
    })?;

    return Ok((config_path, doc));
}

/// Remove an alias key from `.doclink.toml`.
///
/// # Errors
///
/// Returns `Error::UnknownAlias` if the source isn't aliased.
fn remove_from_config(root: &Path, from: &str) -> Result<(), error::Error> {
    let (config_path, mut doc) = read_config_doc(root)?;

    let aliases = doc
        .get_mut("aliases")
        .and_then(toml_edit::Item::as_table_mut)
        .ok_or_else(|| {
            return error::Error::UnknownAlias {
                from: from.to_string(),
            };
        })?;

    if aliases.remove(from).is_none() {
        return Err(error::Error::UnknownAlias {
            from: from.to_string(),
        });
    }

    std::fs::write(&config_path, doc.to_string())?;
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "# keep me\nexclude = [\"archive/\"]\n").unwrap();

        add_to_config(dir.path(), "old/setup", "guide/setup.md").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# keep me"));
        let config = config::Config::load(dir.path()).unwrap();
        assert_eq!(config.aliases.get("old/setup").map(String::as_str), Some("guide/setup.md"));
        assert!(!config.should_scan("archive/x.md"));
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        add_to_config(dir.path(), "a", "b.md").unwrap();
        let err = add_to_config(dir.path(), "a", "c.md").unwrap_err();
        assert!(matches!(err, error::Error::AliasExists { ref to, .. } if to == "b.md"));
    }

    #[test]
    fn remove_unknown_alias_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(remove_from_config(dir.path(), "a"), Err(error::Error::UnknownAlias { .. })));

        add_to_config(dir.path(), "a", "b.md").unwrap();
        remove_from_config(dir.path(), "a").unwrap();
        assert!(config::Config::load(dir.path()).unwrap().aliases.is_empty());
    }
}
