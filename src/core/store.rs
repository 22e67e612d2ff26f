// Colorful Logger - core/store.rs
//
// Ordered collection of classified lines. The store exclusively owns its
// lines; callers get shared references or go through the filter, which is
// the only writer of `visible`.
//
// Sequence numbers start at 0, increase by one per append and are never
// reused until `clear` resets the counter. With a capacity bound the oldest
// lines are evicted from the front, so the first stored sequence number can
// be greater than 0.
//
// Core layer: pure logic, no I/O.

use crate::core::model::{Classification, LogLine, Tag};
use crate::core::tags::TagRegistry;
use std::collections::{vec_deque, VecDeque};

/// Per-tag line counts for a status summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCounts {
    /// Classifying tags in registry order, each with its line count.
    pub per_tag: Vec<(Tag, usize)>,
    /// Lines no tag matched.
    pub untagged: usize,
    /// All stored lines.
    pub total: usize,
}

impl TagCounts {
    pub fn count_for(&self, name: &str) -> usize {
        self.per_tag
            .iter()
            .find(|(tag, _)| tag.name() == name)
            .map_or(0, |(_, n)| *n)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineStore {
    lines: VecDeque<LogLine>,
    next_sequence: u64,
    /// 0 = unbounded.
    max_lines: usize,
    evicted: u64,
}

impl LineStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `max_lines` lines (0 = unbounded).
    pub fn with_capacity_limit(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Self::default()
        }
    }

    /// Append a classified line. Never fails; the line starts visible.
    pub fn append(&mut self, raw_text: String, classification: Classification) -> &LogLine {
        let seq = self.next_sequence;
        self.next_sequence += 1;

        if self.max_lines > 0 && self.lines.len() >= self.max_lines {
            self.lines.pop_front();
            self.evicted += 1;
        }

        self.lines
            .push_back(LogLine::new(seq, raw_text, classification));
        // Just pushed, so the back element exists.
        &self.lines[self.lines.len() - 1]
    }

    /// Discard every line and reset the sequence counter to zero.
    ///
    /// Any search position held elsewhere refers to discarded lines and must
    /// be reset by its owner.
    pub fn clear(&mut self) {
        tracing::debug!(lines = self.lines.len(), "Line store cleared");
        self.lines.clear();
        self.next_sequence = 0;
        self.evicted = 0;
    }

    /// Lines in ascending sequence order. Each call starts a fresh pass.
    pub fn iter(&self) -> vec_deque::Iter<'_, LogLine> {
        self.lines.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> vec_deque::IterMut<'_, LogLine> {
        self.lines.iter_mut()
    }

    /// Lines with `sequence_number >= seq`, in order.
    pub fn iter_from(&self, seq: u64) -> impl Iterator<Item = &LogLine> + '_ {
        let skip = self.index_of(seq).unwrap_or(match self.first_sequence_number() {
            Some(first) if seq < first => 0,
            _ => self.lines.len(),
        });
        self.lines.iter().skip(skip)
    }

    /// Lines currently marked visible, in order.
    pub fn visible_lines(&self) -> impl Iterator<Item = &LogLine> + '_ {
        self.lines.iter().filter(|l| l.is_visible())
    }

    pub fn get(&self, seq: u64) -> Option<&LogLine> {
        self.index_of(seq).and_then(|i| self.lines.get(i))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sequence number the next append will receive.
    pub fn next_sequence_number(&self) -> u64 {
        self.next_sequence
    }

    pub fn first_sequence_number(&self) -> Option<u64> {
        self.lines.front().map(LogLine::sequence_number)
    }

    /// Lines evicted by the capacity bound since the last clear.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Count lines per classifying tag of `registry`.
    pub fn tag_counts(&self, registry: &TagRegistry) -> TagCounts {
        let mut per_tag: Vec<(Tag, usize)> = registry
            .classifying()
            .iter()
            .map(|t| (t.clone(), 0))
            .collect();
        let mut untagged = 0;

        for line in &self.lines {
            match line.tag() {
                Some(tag) => {
                    if let Some((_, n)) = per_tag.iter_mut().find(|(t, _)| t == tag) {
                        *n += 1;
                    }
                }
                None => untagged += 1,
            }
        }

        TagCounts {
            per_tag,
            untagged,
            total: self.lines.len(),
        }
    }

    fn index_of(&self, seq: u64) -> Option<usize> {
        let first = self.first_sequence_number()?;
        let idx = usize::try_from(seq.checked_sub(first)?).ok()?;
        (idx < self.lines.len()).then_some(idx)
    }
}
