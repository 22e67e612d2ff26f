// Colorful Logger - core/tags.rs
//
// Tag registry: the ordered, immutable list of severity tags.
// Built once from a `(name, color)` table and passed by reference to every
// component that needs it; there is no global tag list.

use crate::core::color::TagColor;
use crate::core::model::Tag;
use crate::util::constants::{
    DEFAULT_TAG_TABLE, MAX_TAGS, MAX_TAG_NAME_LENGTH, SENTINEL_TAG_NAME,
};
use crate::util::error::TagError;
use std::collections::HashSet;

/// Which lines a filter request selects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagSelection {
    /// The sentinel: every line is visible.
    #[default]
    All,
    /// Only lines classified with this tag.
    Tag(Tag),
    /// A name no registered tag carries. Nothing is visible.
    Unknown(String),
}

impl TagSelection {
    /// The name to show for this selection in a status line or picker.
    pub fn label(&self) -> &str {
        match self {
            Self::All => SENTINEL_TAG_NAME,
            Self::Tag(tag) => tag.name(),
            Self::Unknown(name) => name,
        }
    }
}

/// Ordered list of known tags. Rank 0 is always the "ALL" sentinel.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

impl TagRegistry {
    /// Registry built from the reference table
    /// (ALL, TRACE, DEBUG, INFO, WARN, ERROR, FATAL).
    pub fn builtin() -> Self {
        Self::from_table(DEFAULT_TAG_TABLE)
            .unwrap_or_else(|e| unreachable!("built-in tag table is invalid: {e}"))
    }

    /// Build a registry from an ordered `(name, color)` table.
    ///
    /// Validates:
    /// - the first entry is the sentinel and no other entry reuses its name
    /// - names are non-empty, unique and no longer than `MAX_TAG_NAME_LENGTH`
    /// - colours are known names or `#rrggbb`
    /// - at most `MAX_TAGS` entries
    pub fn from_table<N, C>(table: &[(N, C)]) -> Result<Self, TagError>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        if table.len() > MAX_TAGS {
            return Err(TagError::TooManyTags {
                count: table.len(),
                max: MAX_TAGS,
            });
        }

        match table.first() {
            Some((name, _)) if name.as_ref() == SENTINEL_TAG_NAME => {}
            other => {
                return Err(TagError::MissingSentinel {
                    expected: SENTINEL_TAG_NAME,
                    found: other.map(|(name, _)| name.as_ref().to_string()),
                })
            }
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(table.len());
        let mut tags = Vec::with_capacity(table.len());

        for (rank, (name, color)) in table.iter().enumerate() {
            let name = name.as_ref();
            let color = color.as_ref();

            if name.is_empty() {
                return Err(TagError::EmptyName { rank });
            }
            if rank > 0 && name == SENTINEL_TAG_NAME {
                return Err(TagError::SentinelNotFirst { rank });
            }
            let length = name.chars().count();
            if length > MAX_TAG_NAME_LENGTH {
                return Err(TagError::NameTooLong {
                    name: name.to_string(),
                    length,
                    max_length: MAX_TAG_NAME_LENGTH,
                });
            }
            if !seen.insert(name) {
                return Err(TagError::DuplicateName {
                    name: name.to_string(),
                });
            }
            let parsed = TagColor::parse(color).ok_or_else(|| TagError::InvalidColor {
                tag: name.to_string(),
                color: color.to_string(),
            })?;

            tags.push(Tag::new(name.to_string(), parsed, rank));
        }

        tracing::debug!(tags = tags.len(), "Tag registry built");
        Ok(Self { tags })
    }

    /// The built-in table followed by `extra` user-defined tags.
    pub fn with_extra_tags<N, C>(extra: &[(N, C)]) -> Result<Self, TagError>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let table: Vec<(&str, &str)> = DEFAULT_TAG_TABLE
            .iter()
            .copied()
            .chain(extra.iter().map(|(n, c)| (n.as_ref(), c.as_ref())))
            .collect();
        Self::from_table(&table)
    }

    /// Exact, case-sensitive lookup. `None` is the normal answer for an
    /// unknown name.
    pub fn lookup(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name() == name)
    }

    /// All tags in canonical order, sentinel first.
    pub fn all(&self) -> &[Tag] {
        &self.tags
    }

    /// The rank-0 "ALL" tag.
    pub fn sentinel(&self) -> &Tag {
        // from_table guarantees a non-empty table starting with the sentinel.
        &self.tags[0]
    }

    /// Tags that can classify a line: everything except the sentinel.
    pub fn classifying(&self) -> &[Tag] {
        &self.tags[1..]
    }

    /// Interpret a filter request. "" and the sentinel name select all lines;
    /// an unrecognised name is kept as `Unknown` rather than rejected.
    pub fn resolve_selection(&self, name: &str) -> TagSelection {
        if name.is_empty() || name == SENTINEL_TAG_NAME {
            return TagSelection::All;
        }
        match self.lookup(name) {
            Some(tag) => TagSelection::Tag(tag.clone()),
            None => {
                tracing::debug!(name, "Filter requested for unknown tag");
                TagSelection::Unknown(name.to_string())
            }
        }
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
