use std::path::Path;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::AliasExists { from, to } => render_alias_exists(from, to),
        Error::ReportNotFound { path } => render_report_not_found(path),
        Error::RootNotDirectory { path } | Error::RootNotFound { path } => render_bad_root(e, path),
        Error::UnknownAlias { from } => render_unknown_alias(from),
        _ => render_generic(e),
    };
}

fn render_alias_exists(from: &str, to: &str) -> String {
    return format!(
        "\
# Error: Alias Exists

`{from}` is already aliased to `{to}`.

## Fix

Remove it first:

    doclink alias remove {from}
"
    );
}

fn render_bad_root(e: &Error, path: &Path) -> String {
    return format!(
        "\
# Error: Bad Document Root

{e}

## Fix

Point `--root` at the documentation directory:

    doclink --root {} check
",
        path.display()
    );
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::ConfigEdit { path, reason } => format!(
            "\
# Error: Config Not Editable

Could not parse `{}`: {reason}
",
            path.display()
        ),

        Error::ReportCorrupt { path, reason } => format!(
            "\
# Error: Report Corrupt

`{}` is not an audit report: {reason}

## Fix

Regenerate it:

    doclink audit
",
            path.display()
        ),

        Error::TomlDe(e) => format!(
            "\
# Error: Invalid Config

{e}
"
        ),

        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

fn render_report_not_found(path: &Path) -> String {
    return format!(
        "\
# Error: Audit Report Not Found

`{}` does not exist.

## Fix

Run an audit first, or repair straight from a fresh audit:

    doclink audit
    doclink fix
",
        path.display()
    );
}

fn render_unknown_alias(from: &str) -> String {
    return format!(
        "\
# Error: Unknown Alias

No alias is configured for `{from}`.

## Fix

List the configured aliases:

    doclink alias list
"
    );
}
