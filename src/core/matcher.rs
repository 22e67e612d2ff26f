// Colorful Logger - core/matcher.rs
//
// Tag classification. Only the header window (the first H characters of a
// line) is scanned: tags are expected as a line prefix, and bounding the
// scan keeps tag-like words deep in a message body from classifying it.
//
// Tie-break: tags are tried in registry order and the first one found in
// the window wins, wherever in the window it occurs.
//
// Core layer: pure logic, no I/O.

use crate::core::model::{Classification, Tag, TagMatch};
use crate::core::tags::TagRegistry;
use crate::core::timestamp;
use crate::util::constants::{DEFAULT_HEADER_WINDOW, MAX_HEADER_WINDOW};

/// Classifies lines against a registry.
#[derive(Debug, Clone, Copy)]
pub struct TagMatcher<'r> {
    registry: &'r TagRegistry,
    header_window: usize,
}

impl<'r> TagMatcher<'r> {
    /// Matcher with the default header window.
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self::with_header_window(registry, DEFAULT_HEADER_WINDOW)
    }

    /// Matcher scanning the first `header_window` characters, clamped to
    /// `1..=MAX_HEADER_WINDOW`.
    pub fn with_header_window(registry: &'r TagRegistry, header_window: usize) -> Self {
        let clamped = header_window.clamp(1, MAX_HEADER_WINDOW);
        if clamped != header_window {
            tracing::warn!(
                requested = header_window,
                used = clamped,
                "Header window out of range; clamped"
            );
        }
        Self {
            registry,
            header_window: clamped,
        }
    }

    pub fn header_window(&self) -> usize {
        self.header_window
    }

    pub fn registry(&self) -> &'r TagRegistry {
        self.registry
    }

    /// The portion of `line` that is scanned: its first `header_window`
    /// characters, cut on a char boundary.
    pub fn header<'a>(&self, line: &'a str) -> &'a str {
        match line.char_indices().nth(self.header_window) {
            Some((end, _)) => &line[..end],
            None => line,
        }
    }

    /// Return the first registered tag whose name occurs in the header window.
    ///
    /// The sentinel never classifies a line. Matching is a case-sensitive
    /// substring test. `None` means the line is untagged.
    pub fn classify(&self, line: &str) -> Option<TagMatch> {
        let header = self.header(line);
        self.registry
            .classifying()
            .iter()
            .find_map(|tag| find_tag(header, tag))
    }

    /// Tag plus header timestamp for one line.
    pub fn classify_line(&self, line: &str) -> Classification {
        Classification {
            tag: self.classify(line),
            timestamp: timestamp::detect(self.header(line)),
        }
    }
}

fn find_tag(header: &str, tag: &Tag) -> Option<TagMatch> {
    header.find(tag.name()).map(|start| TagMatch {
        tag: tag.clone(),
        span: start..start + tag.name().len(),
    })
}
