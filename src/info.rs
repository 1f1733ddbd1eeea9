use std::path::Path;

use serde::Serialize;

use crate::audit::AuditSummary;
use crate::config::{self, CONFIG_FILE};
use crate::report;

/// Output the doclink reference card and the state of `root`.
pub fn run(root: &Path, json: bool) {
    let state = gather_state(root);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

struct CurrentState {
    aliases: usize,
    config_error: Option<String>,
    config_found: bool,
    extension: String,
    last_audit: Option<AuditSummary>,
}

fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    let (config, config_error) = match config::Config::load(root) {
        Ok(config) => (config, None),
        Err(e) => (config::Config::default(), Some(e.to_string())),
    };
    let last_audit = report::read_audit(root).ok().map(|r| r.summary);

    CurrentState {
        aliases: config.aliases.len(),
        config_error,
        config_found,
        extension: config.extension,
        last_audit,
    }
}

// ── Markdown output ───────────────────────────────────────────────────

fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

fn print_markdown_header(version: &str) {
    print!(
        "\
# doclink {version}

Link-integrity audit and repair for markdown documentation trees.

## Link Classes

    [text](#section)             anchor, always valid
    [text](https://example.com)  external, never fetched
    [text](../guide/setup.md)    internal, resolved from the linking file's directory
    [text](setup)                internal, documentation extension appended

## Workflow

    doclink check                Audit without writing anything (exit 0/1)
    doclink audit                Audit and write {audit_md} + {audit_json}
    doclink fix                  Audit, repair broken links, write {fix_md} + {fix_json}
    doclink fix --from-report    Repair from the last persisted audit
    doclink alias add <OLD> <NEW>
                                 Record a known rename for the repair engine

## Repair Order

1. Exact target, with and without the extension
2. Alias table
3. Unique file with the same name anywhere in the tree
4. Unique sibling whose name tokens start with the target's tokens

Ties are never guessed; they are reported as unfixable.

## Configuration ({CONFIG_FILE})

    extension = \"md\"
    include = [\"guide/\"]        # only audit these paths
    exclude = [\"archive/\"]      # skip these paths
    max_file_bytes = 16777216

    [aliases]
    \"architecture/README\" = \"architecture.md\"

## Current State

",
        audit_md = report::AUDIT_MARKDOWN,
        audit_json = report::AUDIT_JSON,
        fix_md = report::FIX_MARKDOWN,
        fix_json = report::FIX_JSON,
    );
}

fn print_markdown_state(state: &CurrentState) {
    if let Some(error) = &state.config_error {
        println!("Config:     {CONFIG_FILE} (invalid: {error})");
    } else if state.config_found {
        println!("Config:     {CONFIG_FILE} (found, extension .{})", state.extension);
    } else {
        println!("Config:     {CONFIG_FILE} (not found)");
    }

    println!("Aliases:    {}", state.aliases);

    match &state.last_audit {
        Some(s) => println!(
            "Last audit: {} files, {} links, {} broken",
            s.total_files, s.total_links, s.broken_links
        ),
        None => println!("Last audit: (none)"),
    }
}

fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | No broken links |
| 1    | Broken links remain |
| 2    | Runtime error, or documents that could not be audited |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct InfoJson {
    current_state: StateJson,
    exit_codes: Vec<ExitCodeInfo>,
    reports: Vec<String>,
    version: String,
}

#[derive(Serialize)]
struct ExitCodeInfo {
    code: u8,
    meaning: String,
}

#[derive(Serialize)]
struct StateJson {
    aliases: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_error: Option<String>,
    config_found: bool,
    extension: String,
    last_audit: Option<AuditSummary>,
}

fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            aliases: state.aliases,
            config_error: state.config_error.clone(),
            config_found: state.config_found,
            extension: state.extension.clone(),
            last_audit: state.last_audit.clone(),
        },
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "No broken links".to_string() },
            ExitCodeInfo { code: 1, meaning: "Broken links remain".to_string() },
            ExitCodeInfo {
                code: 2,
                meaning: "Runtime error, or documents that could not be audited".to_string(),
            },
        ],
        reports: [report::AUDIT_MARKDOWN, report::AUDIT_JSON, report::FIX_MARKDOWN, report::FIX_JSON]
            .iter()
            .map(ToString::to_string)
            .collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
