// Colorful Logger - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every variant keeps its cause so the
// full chain can be logged.
//
// Note what is deliberately NOT here: an unclassifiable line, an unknown
// filter tag name and an empty search query are normal outcomes, not errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Colorful Logger operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ColorLoggerError {
    /// Tag table validation failed.
    Tag(TagError),

    /// A line source could not be opened or read.
    Source(SourceError),

    /// A search query could not be compiled.
    Search(SearchError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Writing rendered lines to the output stream failed.
    Output(io::Error),
}

impl fmt::Display for ColorLoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(e) => write!(f, "Tag table error: {e}"),
            Self::Source(e) => write!(f, "Line source error: {e}"),
            Self::Search(e) => write!(f, "Search error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Output(e) => write!(f, "Output error: {e}"),
        }
    }
}

impl std::error::Error for ColorLoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tag(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Search(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Output(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tag errors
// ---------------------------------------------------------------------------

/// Errors related to building a tag registry from a `(name, color)` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The table is empty or its first entry is not the sentinel tag.
    MissingSentinel {
        expected: &'static str,
        found: Option<String>,
    },

    /// The sentinel name appears at a rank other than 0.
    SentinelNotFirst { rank: usize },

    /// A tag name is empty.
    EmptyName { rank: usize },

    /// A tag name is longer than any header window could hold.
    NameTooLong {
        name: String,
        length: usize,
        max_length: usize,
    },

    /// Two tags share a name.
    DuplicateName { name: String },

    /// A tag colour is neither a known colour name nor `#rrggbb`.
    InvalidColor { tag: String, color: String },

    /// Maximum number of tags exceeded.
    TooManyTags { count: usize, max: usize },
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSentinel { expected, found } => match found {
                Some(name) => write!(
                    f,
                    "First tag must be the sentinel '{expected}', found '{name}'"
                ),
                None => write!(f, "Tag table is empty; the sentinel '{expected}' is required"),
            },
            Self::SentinelNotFirst { rank } => {
                write!(f, "Sentinel tag may only appear at rank 0, found at rank {rank}")
            }
            Self::EmptyName { rank } => write!(f, "Tag at rank {rank} has an empty name"),
            Self::NameTooLong {
                name,
                length,
                max_length,
            } => write!(
                f,
                "Tag '{name}' is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::DuplicateName { name } => write!(f, "Duplicate tag name '{name}'"),
            Self::InvalidColor { tag, color } => write!(
                f,
                "Tag '{tag}': colour '{color}' is not a known colour name or #rrggbb value"
            ),
            Self::TooManyTags { count, max } => {
                write!(f, "Too many tags ({count}), maximum is {max}")
            }
        }
    }
}

impl std::error::Error for TagError {}

impl From<TagError> for ColorLoggerError {
    fn from(e: TagError) -> Self {
        Self::Tag(e)
    }
}

// ---------------------------------------------------------------------------
// Source errors
// ---------------------------------------------------------------------------

/// Errors raised by line sources (file replay and serial streaming).
#[derive(Debug)]
pub enum SourceError {
    /// A log file could not be opened for replay.
    FileOpen { path: PathBuf, source: io::Error },

    /// Reading the next line failed.
    Read { source_name: String, source: io::Error },

    /// The serial port could not be opened.
    SerialOpen {
        port: String,
        source: serialport::Error,
    },

    /// Listing the system's serial ports failed.
    SerialEnumerate { source: serialport::Error },

    /// A serial setting string could not be interpreted.
    InvalidSetting {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileOpen { path, source } => {
                write!(f, "Cannot open '{}': {source}", path.display())
            }
            Self::Read {
                source_name,
                source,
            } => write!(f, "Read error on {source_name}: {source}"),
            Self::SerialOpen { port, source } => {
                write!(f, "Cannot open serial port '{port}': {source}")
            }
            Self::SerialEnumerate { source } => {
                write!(f, "Cannot list serial ports: {source}")
            }
            Self::InvalidSetting {
                field,
                value,
                expected,
            } => write!(
                f,
                "Serial {field} '{value}' is not supported. Expected: {expected}"
            ),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileOpen { source, .. } => Some(source),
            Self::Read { source, .. } => Some(source),
            Self::SerialOpen { source, .. } => Some(source),
            Self::SerialEnumerate { source } => Some(source),
            Self::InvalidSetting { .. } => None,
        }
    }
}

impl From<SourceError> for ColorLoggerError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Search errors
// ---------------------------------------------------------------------------

/// Errors related to search query compilation.
#[derive(Debug)]
pub enum SearchError {
    /// The whole-word pattern built from the query could not be compiled
    /// (in practice only when it exceeds the regex size limit).
    InvalidPattern { query: String, source: regex::Error },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { query, source } => {
                write!(f, "Cannot build whole-word search for '{query}': {source}")
            }
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
        }
    }
}

impl From<SearchError> for ColorLoggerError {
    fn from(e: SearchError) -> Self {
        Self::Search(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ColorLoggerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<io::Error> for ColorLoggerError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

/// Convenience type alias for Colorful Logger results.
pub type Result<T> = std::result::Result<T, ColorLoggerError>;
