// Colorful Logger - core/search.rs
//
// Incremental forward search over the line store.
//
// State machine:
//   IDLE   - no query, or a query that has not been searched yet.
//   ACTIVE - a query is being stepped through; `resume_from` is the first
//            sequence number the next `find_next` will look at.
//
// A changed query (or changed options) always returns to IDLE, so typing a
// new term restarts from the top instead of resuming. Each hit moves the
// cursor past the matched line; running off the end reports "not found"
// and leaves the cursor at the end (no wrap-around).
//
// Core layer: pure logic, no I/O.

use crate::core::store::LineStore;
use crate::util::error::SearchError;
use regex::{Regex, RegexBuilder};

/// How a query is matched against a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Plain substring containment.
    #[default]
    Substring,
    /// The match must not touch a word character (alphanumeric or `_`)
    /// on either side.
    WholeWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub ignore_case: bool,
}

/// A located match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub sequence_number: u64,
    /// Byte offset of the match within the line's raw text.
    pub offset: usize,
    /// Byte length of the match.
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Active {
        resume_from: u64,
        last_hit: Option<SearchHit>,
    },
}

#[derive(Debug, Clone)]
pub struct SearchCursor {
    query: String,
    options: SearchOptions,
    /// Compiled form of the query; `None` for case-sensitive substring search.
    pattern: Option<Regex>,
    state: State,
}

impl Default for SearchCursor {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl SearchCursor {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            query: String::new(),
            options,
            pattern: None,
            state: State::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// The most recent hit, i.e. the line a renderer should highlight.
    pub fn current_hit(&self) -> Option<SearchHit> {
        match self.state {
            State::Active { last_hit, .. } => last_hit,
            State::Idle => None,
        }
    }

    /// Remember `query` as the search term. A query different from the
    /// remembered one (including becoming empty) resets the cursor to IDLE.
    pub fn set_query(&mut self, query: &str) -> Result<(), SearchError> {
        if query == self.query {
            return Ok(());
        }
        self.pattern = compile(query, self.options)?;
        self.query = query.to_string();
        self.state = State::Idle;
        tracing::debug!(query_len = query.len(), "Search query changed; cursor reset");
        Ok(())
    }

    /// Change matching options. Different options reset the cursor like a
    /// query change does.
    pub fn set_options(&mut self, options: SearchOptions) -> Result<(), SearchError> {
        if options == self.options {
            return Ok(());
        }
        self.pattern = compile(&self.query, options)?;
        self.options = options;
        self.state = State::Idle;
        Ok(())
    }

    /// Forget the query and position. Required after the store is cleared.
    pub fn reset(&mut self) {
        self.query.clear();
        self.pattern = None;
        self.state = State::Idle;
    }

    /// Find the next line containing the query, starting after the previous
    /// hit (or at the start of the store). `None` means not found; an empty
    /// query is a no-op that leaves the cursor IDLE.
    pub fn find_next(&mut self, store: &LineStore) -> Option<SearchHit> {
        if self.query.is_empty() {
            self.state = State::Idle;
            return None;
        }

        let resume_from = match self.state {
            State::Active { resume_from, .. } => resume_from,
            State::Idle => 0,
        };

        let hit = store.iter_from(resume_from).find_map(|line| {
            self.match_in(line.raw_text()).map(|(offset, len)| SearchHit {
                sequence_number: line.sequence_number(),
                offset,
                len,
            })
        });

        self.state = match hit {
            Some(h) => {
                tracing::debug!(seq = h.sequence_number, offset = h.offset, "Search hit");
                State::Active {
                    resume_from: h.sequence_number + 1,
                    last_hit: Some(h),
                }
            }
            None => {
                tracing::debug!("Search reached end of store");
                // Resume from the next sequence number so lines appended later are found.
                State::Active {
                    resume_from: store.next_sequence_number().max(resume_from),
                    last_hit: None,
                }
            }
        };
        hit
    }

    /// First match of the query in `text` as `(byte offset, byte length)`.
    fn match_in(&self, text: &str) -> Option<(usize, usize)> {
        match (&self.pattern, self.options.mode) {
            (None, _) => text.find(&self.query).map(|i| (i, self.query.len())),
            (Some(re), SearchMode::Substring) => re.find(text).map(|m| (m.start(), m.len())),
            (Some(re), SearchMode::WholeWord) => find_whole_word(re, text),
        }
    }
}

/// Build the regex used for case-insensitive or whole-word matching.
fn compile(query: &str, options: SearchOptions) -> Result<Option<Regex>, SearchError> {
    if query.is_empty() || (options.mode == SearchMode::Substring && !options.ignore_case) {
        return Ok(None);
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(options.ignore_case)
        .build()
        .map(Some)
        .map_err(|e| SearchError::InvalidPattern {
            query: query.to_string(),
            source: e,
        })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Leftmost match of `re` in `text` not adjacent to a word character.
/// Retries one character further on after a rejected candidate so
/// overlapping occurrences are not skipped.
fn find_whole_word(re: &Regex, text: &str) -> Option<(usize, usize)> {
    let mut pos = 0;
    while pos <= text.len() {
        let m = re.find_at(text, pos)?;
        let before_ok = !text[..m.start()].chars().next_back().is_some_and(is_word_char);
        let after_ok = !text[m.end()..].chars().next().is_some_and(is_word_char);
        if before_ok && after_ok {
            return Some((m.start(), m.len()));
        }
        pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}
