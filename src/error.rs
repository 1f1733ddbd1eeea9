/// Crate-level error types for doclink diagnostics.
use std::path::PathBuf;

/// All errors in doclink carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, alias, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An alias with this source already exists in the config.
    #[error("alias already exists: `{from}` -> `{to}`")]
    AliasExists {
        /// Alias source path.
        from: String,
        /// Target currently configured for the alias.
        to: String,
    },

    /// `.doclink.toml` exists but cannot be edited as a TOML document.
    #[error("config edit failed: {}: {reason}", path.display())]
    ConfigEdit {
        /// Path to the config file.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A document could not be read.
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Document exceeds the configured size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", path.display())]
    FileTooLarge {
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// File that exceeded the size limit.
        path: PathBuf,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// A document could not be written back.
    #[error("cannot write {}: {source}", path.display())]
    FileWrite {
        /// File that failed to write.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Persisted report exists but does not have the expected shape.
    #[error("report corrupt: {}: {reason}", path.display())]
    ReportCorrupt {
        /// Path to the report file.
        path: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// Expected persisted report does not exist on disk.
    #[error("report not found: {}", path.display())]
    ReportNotFound {
        /// Path to the missing report.
        path: PathBuf,
    },

    /// The document root does not exist.
    #[error("document root not found: {}", path.display())]
    RootNotFound {
        /// The configured root.
        path: PathBuf,
    },

    /// The document root exists but is not a directory.
    #[error("document root is not a directory: {}", path.display())]
    RootNotDirectory {
        /// The configured root.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No configured alias has this source path.
    #[error("unknown alias: `{from}`")]
    UnknownAlias {
        /// Alias source path that was not found.
        from: String,
    },
}
