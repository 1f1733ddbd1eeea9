use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Error;

/// Name of the optional config file at the document root.
pub const CONFIG_FILE: &str = ".doclink.toml";

/// Default documentation extension, without the leading dot.
const DEFAULT_EXTENSION: &str = "md";

/// Default per-file read limit (16 MiB).
const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Project configuration loaded from `.doclink.toml`.
/// Include/exclude patterns are path prefixes applied to audited documents.
#[derive(Debug, Clone)]
pub struct Config {
    /// Known renames: old root-relative target -> current root-relative target.
    pub aliases: BTreeMap<String, String>,
    /// Documentation extension without the leading dot.
    pub extension: String,
    exclude: Vec<String>,
    include: Vec<String>,
    /// Documents larger than this are recorded as per-file errors.
    pub max_file_bytes: u64,
}

/// Raw TOML structure for `.doclink.toml`.
#[derive(serde::Deserialize)]
struct DoclinkTomlConfig {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    exclude: Vec<String>,
    extension: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    max_file_bytes: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            aliases: BTreeMap::new(),
            extension: DEFAULT_EXTENSION.to_string(),
            exclude: Vec::new(),
            include: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        };
    }
}

impl Config {
    /// Load config from `.doclink.toml` in the given root directory.
    /// Returns the default if the file doesn't exist. A file that exists but
    /// is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: DoclinkTomlConfig = toml::from_str(content)?;
        let extension = raw
            .extension
            .map(|ext| return ext.trim_start_matches('.').to_string())
            .filter(|ext| return !ext.is_empty())
            .unwrap_or_else(|| return DEFAULT_EXTENSION.to_string());

        return Ok(Self {
            aliases: raw.aliases,
            extension,
            exclude: raw.exclude,
            include: raw.include,
            max_file_bytes: raw.max_file_bytes.unwrap_or(DEFAULT_MAX_FILE_BYTES),
        });
    }

    /// Check whether a document should be audited.
    ///
    /// A path is included if no include patterns are set, or if it starts with
    /// at least one include pattern. An included path is then excluded if it
    /// starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }

    /// The documentation suffix including the dot, e.g. `.md`.
    pub fn suffix(&self) -> String {
        return format!(".{}", self.extension);
    }
}
