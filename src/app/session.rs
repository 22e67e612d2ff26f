// Colorful Logger - app/session.rs
//
// The viewing session: one window's worth of state. Owns the line store,
// the active filter and the search cursor, and borrows the tag registry.
// Front ends talk to the core through this type only.
//
// Invariant kept here: after every public mutating call returns, each
// line's `visible` flag equals `filter::is_visible(line, selection)`.
// New lines arrive visible, so whenever a non-sentinel filter is active
// the full recompute runs once per append call / drained batch.

use crate::app::listener::SourceListener;
use crate::core::filter::{self, FilterState};
use crate::core::matcher::TagMatcher;
use crate::core::model::{LogLine, SourceEvent};
use crate::core::search::{SearchCursor, SearchHit, SearchOptions};
use crate::core::store::{LineStore, TagCounts};
use crate::core::tags::{TagRegistry, TagSelection};
use crate::util::constants::{DEFAULT_HEADER_WINDOW, DEFAULT_MAX_LINES};
use crate::util::error::SearchError;
use crate::util::logging::preview;

/// Construction parameters for a `Session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub header_window: usize,
    /// 0 = unbounded.
    pub max_lines: usize,
    pub search: SearchOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            header_window: DEFAULT_HEADER_WINDOW,
            max_lines: DEFAULT_MAX_LINES,
            search: SearchOptions::default(),
        }
    }
}

/// How a line source finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEnd {
    EndOfStream,
    Failed(String),
    Stopped,
}

/// What one `pump` call consumed from a listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Description of a source that reported it started during this pump.
    pub started: Option<String>,
    /// Sequence numbers of the lines appended, in order.
    pub appended: Vec<u64>,
    /// Lines the worker discarded because the queue was full.
    pub dropped: u64,
    pub warnings: Vec<String>,
    /// Set when the source reported its final event.
    pub finished: Option<SourceEnd>,
}

pub struct Session<'r> {
    matcher: TagMatcher<'r>,
    store: LineStore,
    filter: FilterState,
    search: SearchCursor,
}

impl<'r> Session<'r> {
    pub fn new(registry: &'r TagRegistry, options: SessionOptions) -> Self {
        Self {
            matcher: TagMatcher::with_header_window(registry, options.header_window),
            store: LineStore::with_capacity_limit(options.max_lines),
            filter: FilterState::default(),
            search: SearchCursor::new(options.search),
        }
    }

    pub fn registry(&self) -> &'r TagRegistry {
        self.matcher.registry()
    }

    pub fn matcher(&self) -> &TagMatcher<'r> {
        &self.matcher
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn search(&self) -> &SearchCursor {
        &self.search
    }

    /// Classify and store one line. Returns its sequence number.
    pub fn append(&mut self, raw: impl Into<String>) -> u64 {
        let seq = self.push(raw.into());
        self.refilter_if_active();
        seq
    }

    /// Classify and store a batch of lines, recomputing visibility once.
    /// Returns the sequence numbers assigned.
    pub fn extend<I, S>(&mut self, lines: I) -> Vec<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let seqs: Vec<u64> = lines.into_iter().map(|l| self.push(l.into())).collect();
        if !seqs.is_empty() {
            self.refilter_if_active();
        }
        seqs
    }

    /// Change the tag filter by name and recompute visibility.
    /// "" or "ALL" shows everything; an unknown name shows nothing.
    /// Returns the number of visible lines.
    pub fn set_filter(&mut self, name: &str) -> usize {
        self.filter.select(self.matcher.registry(), name);
        filter::apply_filter(&mut self.store, self.filter.selected())
    }

    pub fn selection(&self) -> &TagSelection {
        self.filter.selected()
    }

    pub fn visible_lines(&self) -> impl Iterator<Item = &LogLine> + '_ {
        self.store.visible_lines()
    }

    /// "Find next": remember `query` (restarting if it changed) and step to
    /// the next line containing it.
    pub fn find_next(&mut self, query: &str) -> Result<Option<SearchHit>, SearchError> {
        self.search.set_query(query)?;
        Ok(self.search.find_next(&self.store))
    }

    pub fn set_search_options(&mut self, options: SearchOptions) -> Result<(), SearchError> {
        self.search.set_options(options)
    }

    /// Discard every line and invalidate the search position. The filter
    /// selection is kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.search.reset();
        tracing::info!("Session cleared");
    }

    /// Per-tag counts for a status line.
    pub fn summary(&self) -> TagCounts {
        self.store.tag_counts(self.matcher.registry())
    }

    /// Drain up to `max_events` events from `listener` into the store.
    pub fn pump(&mut self, listener: &mut SourceListener, max_events: usize) -> PumpReport {
        let mut report = PumpReport::default();

        for event in listener.poll_events(max_events) {
            match event {
                SourceEvent::Started { description } => report.started = Some(description),
                SourceEvent::Line(text) => report.appended.push(self.push(text)),
                SourceEvent::Dropped { count } => report.dropped += count,
                SourceEvent::Warning { message } => report.warnings.push(message),
                SourceEvent::Closed { error: None } => report.finished = Some(SourceEnd::EndOfStream),
                SourceEvent::Closed { error: Some(e) } => report.finished = Some(SourceEnd::Failed(e)),
                SourceEvent::Stopped => report.finished = Some(SourceEnd::Stopped),
            }
        }

        if !report.appended.is_empty() {
            self.refilter_if_active();
        }
        report
    }

    fn push(&mut self, raw: String) -> u64 {
        let classification = self.matcher.classify_line(&raw);
        let line = self.store.append(raw, classification);
        tracing::trace!(
            seq = line.sequence_number(),
            tag = line.tag().map(|t| t.name()),
            text = preview(line.raw_text()),
            "Line appended"
        );
        line.sequence_number()
    }

    fn refilter_if_active(&mut self) {
        if !self.filter.is_empty() {
            filter::apply_filter(&mut self.store, self.filter.selected());
        }
    }
}
