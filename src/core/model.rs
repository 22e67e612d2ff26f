// Colorful Logger - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies. These types are the shared vocabulary across
// all layers.

use crate::core::color::TagColor;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

// =============================================================================
// Tag
// =============================================================================

/// A named severity classification with its display colour and registry rank.
///
/// Tags are immutable once a registry is built. Identity is the name: two
/// tags with the same name are equal regardless of colour or rank.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    name: String,
    color: TagColor,
    rank: usize,
}

impl Tag {
    pub(crate) fn new(name: String, color: TagColor, rank: usize) -> Self {
        Self { name, color, rank }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &TagColor {
        &self.color
    }

    /// Position in the registry. Rank 0 is the "ALL" sentinel.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn is_sentinel(&self) -> bool {
        self.rank == 0
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// =============================================================================
// Classification (output of the matcher)
// =============================================================================

/// A tag found in a line's header window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub tag: Tag,
    /// Byte range of the tag name within the line.
    pub span: Range<usize>,
}

/// A timestamp found in a line's header window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum HeaderTimestamp {
    /// Date and time of day, e.g. `2020/03/02 14:05:09`.
    DateTime(NaiveDateTime),
    /// Date only, e.g. `2020/03/02`.
    Date(NaiveDate),
    /// Time of day only, e.g. `14:05:09`.
    Time(NaiveTime),
}

impl fmt::Display for HeaderTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// Everything the matcher extracts from one line's header window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub tag: Option<TagMatch>,
    pub timestamp: Option<HeaderTimestamp>,
}

// =============================================================================
// Log line
// =============================================================================

/// One stored line.
///
/// The tag is written once when the line is appended and has no setter:
/// a line that matched nothing stays untagged. `visible` is owned by the
/// visibility filter and only ever recomputed in full.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    sequence_number: u64,
    raw_text: String,
    #[serde(serialize_with = "serialize_tag_name")]
    tag: Option<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_span: Option<Range<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<HeaderTimestamp>,
    visible: bool,
}

impl LogLine {
    pub(crate) fn new(sequence_number: u64, raw_text: String, classification: Classification) -> Self {
        let (tag, tag_span) = match classification.tag {
            Some(m) => (Some(m.tag), Some(m.span)),
            None => (None, None),
        };
        Self {
            sequence_number,
            raw_text,
            tag,
            tag_span,
            timestamp: classification.timestamp,
            visible: true,
        }
    }

    /// Monotonic position in display order, assigned at append time.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Byte range of the tag keyword inside `raw_text`, for colourising.
    pub fn tag_span(&self) -> Option<Range<usize>> {
        self.tag_span.clone()
    }

    pub fn timestamp(&self) -> Option<HeaderTimestamp> {
        self.timestamp
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

fn serialize_tag_name<S: serde::Serializer>(tag: &Option<Tag>, s: S) -> Result<S::Ok, S::Error> {
    match tag {
        Some(t) => s.serialize_some(t.name()),
        None => s.serialize_none(),
    }
}

// =============================================================================
// Source events (worker thread -> control thread)
// =============================================================================

/// Messages sent from a line source worker to the control thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// The worker is running and reading from the described source.
    Started { description: String },

    /// One decoded line, trailing newline removed.
    Line(String),

    /// The queue was full and this many older events were discarded
    /// since the last report.
    Dropped { count: u64 },

    /// A non-fatal problem (e.g. a truncated over-long line).
    Warning { message: String },

    /// The source ended: `None` at end of stream, `Some` after a read failure.
    Closed { error: Option<String> },

    /// The worker stopped because it was cancelled.
    Stopped,
}
