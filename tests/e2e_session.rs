// Colorful Logger - tests/e2e_session.rs
//
// End-to-end tests for the viewing pipeline.
//
// These tests replay a real log file from disk through the background
// listener thread into a session, then drive filtering and search the way
// a front end would. No mocks: real files, real threads, real channel
// hand-off, real config.toml parsing. The one synthetic source stands in
// for a serial device that outruns its reader.

use chrono::{NaiveDate, NaiveTime};
use colorful_logger::app::listener::SourceListener;
use colorful_logger::app::session::{Session, SessionOptions, SourceEnd};
use colorful_logger::core::model::{HeaderTimestamp, LogLine};
use colorful_logger::core::search::{SearchMode, SearchOptions};
use colorful_logger::core::source::{decode_line, LineSource, OverflowPolicy, ReadOutcome};
use colorful_logger::core::tags::{TagRegistry, TagSelection};
use colorful_logger::platform::config::load_config;
use colorful_logger::platform::fs::open_file_source;
use colorful_logger::util::error::SourceError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Everything the pumps reported between start and the final event.
struct Drained {
    end: SourceEnd,
    appended: Vec<u64>,
    dropped: u64,
}

/// Pump `listener` into `session`, `batch` events at a time, until the source
/// reports its final event.
fn pump_all(session: &mut Session<'_>, listener: &mut SourceListener, batch: usize) -> Drained {
    let deadline = Instant::now() + Duration::from_secs(30);
    let mut appended = Vec::new();
    let mut dropped = 0;
    while Instant::now() < deadline {
        let report = session.pump(listener, batch);
        appended.extend_from_slice(&report.appended);
        dropped += report.dropped;
        if let Some(end) = report.finished {
            return Drained {
                end,
                appended,
                dropped,
            };
        }
        if report.appended.is_empty() {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    panic!("source did not finish within the deadline");
}

/// Pump `listener` into `session` until the source reports its final event.
fn pump_to_end(session: &mut Session<'_>, listener: &mut SourceListener) -> SourceEnd {
    pump_all(session, listener, 5).end
}

/// Write `count` lines alternating ERROR / INFO to `path`.
fn write_numbered_log(path: &Path, count: usize) {
    let body: String = (0..count)
        .map(|i| {
            let tag = if i % 2 == 0 { "ERROR" } else { "INFO" };
            format!("{tag} - line {i}\n")
        })
        .collect();
    std::fs::write(path, body).unwrap();
}

/// Replay the fixture file into a fresh session.
fn replay_fixture<'r>(registry: &'r TagRegistry, options: SessionOptions) -> Session<'r> {
    let mut session = Session::new(registry, options);
    let mut listener = SourceListener::new();
    let source = open_file_source(&fixture("device_session.log")).unwrap();
    listener.start(Box::new(source));
    assert_eq!(
        pump_to_end(&mut session, &mut listener),
        SourceEnd::EndOfStream
    );
    session
}

fn visible(session: &Session<'_>) -> Vec<u64> {
    session.visible_lines().map(LogLine::sequence_number).collect()
}

fn tag_of(session: &Session<'_>, seq: u64) -> Option<String> {
    session
        .store()
        .get(seq)
        .and_then(|l| l.tag())
        .map(|t| t.name().to_string())
}

// =============================================================================
// Replay E2E
// =============================================================================

/// Every line of the fixture arrives, in order, with dense sequence numbers.
#[test]
fn e2e_replays_every_line_in_order() {
    let registry = TagRegistry::builtin();
    let session = replay_fixture(&registry, SessionOptions::default());

    let seqs: Vec<u64> = session.store().iter().map(LogLine::sequence_number).collect();
    assert_eq!(seqs, (0..12).collect::<Vec<u64>>());
    assert_eq!(
        session.store().get(4).map(LogLine::raw_text),
        Some("    00 11 22 33 44 55 66 77")
    );
}

/// Classification follows the header window and the registry order.
#[test]
fn e2e_classifies_fixture_lines() {
    let registry = TagRegistry::builtin();
    let session = replay_fixture(&registry, SessionOptions::default());

    assert_eq!(tag_of(&session, 0).as_deref(), Some("INFO"));
    assert_eq!(tag_of(&session, 3).as_deref(), Some("ERROR"));
    assert_eq!(tag_of(&session, 5).as_deref(), Some("FATAL"));
    // "WARNING" contains "WARN".
    assert_eq!(tag_of(&session, 9).as_deref(), Some("WARN"));
    // Both ERROR and INFO are in the header; INFO is registered first.
    assert_eq!(tag_of(&session, 8).as_deref(), Some("INFO"));
    // ERROR only appears past the header window.
    assert_eq!(tag_of(&session, 7), None);
    // VERBOSE is not a built-in tag.
    assert_eq!(tag_of(&session, 6), None);

    let counts = session.summary();
    assert_eq!(counts.total, 12);
    assert_eq!(counts.untagged, 3);
    assert_eq!(counts.count_for("INFO"), 3);
    assert_eq!(counts.count_for("WARN"), 2);
    assert_eq!(counts.count_for("ALL"), 0);
}

/// Header timestamps are picked up from the same window as the tag.
#[test]
fn e2e_detects_header_timestamps() {
    let registry = TagRegistry::builtin();
    let session = replay_fixture(&registry, SessionOptions::default());

    let boot = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(
        session.store().get(0).and_then(LogLine::timestamp),
        Some(HeaderTimestamp::DateTime(boot))
    );
    assert_eq!(
        session.store().get(5).and_then(LogLine::timestamp),
        Some(HeaderTimestamp::Time(NaiveTime::from_hms_opt(12, 0, 2).unwrap()))
    );
    assert_eq!(session.store().get(4).and_then(LogLine::timestamp), None);
}

// =============================================================================
// Filter E2E
// =============================================================================

#[test]
fn e2e_filter_by_tag_over_replayed_file() {
    let registry = TagRegistry::builtin();
    let mut session = replay_fixture(&registry, SessionOptions::default());

    assert_eq!(session.set_filter("ERROR"), 1);
    assert_eq!(visible(&session), vec![3]);

    assert_eq!(session.set_filter("INFO"), 3);
    assert_eq!(visible(&session), vec![0, 8, 11]);

    // Idempotent: same selection, same visibility.
    let before = visible(&session);
    session.set_filter("INFO");
    assert_eq!(visible(&session), before);

    assert_eq!(session.set_filter("NOPE"), 0);
    assert_eq!(
        session.selection(),
        &TagSelection::Unknown("NOPE".to_string())
    );

    assert_eq!(session.set_filter("ALL"), 12);
}

/// A filter chosen before the source starts applies to every streamed line.
#[test]
fn e2e_filter_set_before_replay_applies_to_streamed_lines() {
    let registry = TagRegistry::builtin();
    let mut session = Session::new(&registry, SessionOptions::default());
    session.set_filter("WARN");

    let mut listener = SourceListener::new();
    listener.start(Box::new(
        open_file_source(&fixture("device_session.log")).unwrap(),
    ));
    pump_to_end(&mut session, &mut listener);

    assert_eq!(visible(&session), vec![2, 9]);
}

// =============================================================================
// Search E2E
// =============================================================================

#[test]
fn e2e_find_next_walks_forward_without_wrapping() {
    let registry = TagRegistry::builtin();
    let mut session = replay_fixture(&registry, SessionOptions::default());

    let mut next = |q: &str| session.find_next(q).unwrap().map(|h| h.sequence_number);
    assert_eq!(next("alpha"), Some(10));
    assert_eq!(next("alpha"), Some(11));
    assert_eq!(next("alpha"), None);
    // A new query starts again from the first line.
    assert_eq!(next("ERROR"), Some(3));
    assert_eq!(next("ERROR"), Some(7));
}

#[test]
fn e2e_whole_word_search_skips_longer_words() {
    let registry = TagRegistry::builtin();
    let options = SessionOptions {
        search: SearchOptions {
            mode: SearchMode::WholeWord,
            ignore_case: false,
        },
        ..SessionOptions::default()
    };
    let mut session = replay_fixture(&registry, options);

    assert_eq!(
        session.find_next("alpha").unwrap().map(|h| h.sequence_number),
        Some(10)
    );
    assert_eq!(session.find_next("alpha").unwrap(), None);
}

// =============================================================================
// Session lifecycle E2E
// =============================================================================

/// The reference scenario: filter, clear, and search over appended lines.
#[test]
fn e2e_reference_scenario() {
    let registry = TagRegistry::builtin();
    let mut session = Session::new(&registry, SessionOptions::default());
    session.append("DEBUG - x");
    session.append("ERROR - y");
    session.append("no tag here");

    assert_eq!(session.set_filter("ALL"), 3);
    assert_eq!(session.set_filter("DEBUG"), 1);
    assert_eq!(visible(&session), vec![0]);
    assert_eq!(session.set_filter("ERROR"), 1);
    assert_eq!(visible(&session), vec![1]);
    assert_eq!(session.set_filter("WARN"), 0);

    session.clear();
    let seq = session.append("INFO - z");
    assert_eq!(seq, 0);
    assert_eq!(session.store().len(), 1);
}

// =============================================================================
// Config E2E
// =============================================================================

/// User tags from config.toml extend the registry and take part in matching.
#[test]
fn e2e_config_tags_and_window_drive_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[matcher]
header_window = 30

[[tags]]
name = "VERBOSE"
color = "#00aaff"
"##,
    )
    .unwrap();

    let (config, warnings) = load_config(&path);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let registry = config.tag_registry().unwrap();
    let options = SessionOptions {
        header_window: config.header_window,
        ..SessionOptions::default()
    };
    let session = replay_fixture(&registry, options);

    assert_eq!(tag_of(&session, 6).as_deref(), Some("VERBOSE"));
    // A 30-char window cuts "INFO" off line 8, leaving ERROR.
    assert_eq!(tag_of(&session, 8).as_deref(), Some("ERROR"));
}

// =============================================================================
// Backpressure E2E
// =============================================================================

/// A file far larger than the queue replays without losing a line, even
/// with a filter re-applied after every batch.
#[test]
fn e2e_large_file_replay_is_lossless() {
    const LINES: usize = 20_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.log");
    write_numbered_log(&path, LINES);

    let registry = TagRegistry::builtin();
    let mut session = Session::new(&registry, SessionOptions::default());
    session.set_filter("ERROR");

    let mut listener = SourceListener::with_queue_capacity(16);
    listener.start(Box::new(open_file_source(&path).unwrap()));
    let drained = pump_all(&mut session, &mut listener, 1_000);

    assert_eq!(drained.end, SourceEnd::EndOfStream);
    assert_eq!(drained.dropped, 0);
    assert_eq!(session.store().len(), LINES);
    assert_eq!(
        session.store().get(LINES as u64 - 1).map(LogLine::raw_text),
        Some("INFO - line 19999")
    );
    assert_eq!(session.visible_lines().count(), LINES / 2);
}

/// A device-like source that emits `total` lines as fast as it can, then
/// raises `done`.
struct Burst {
    next: usize,
    total: usize,
    done: Arc<AtomicBool>,
}

impl LineSource for Burst {
    fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
        if self.next == self.total {
            self.done.store(true, Ordering::SeqCst);
            return Ok(ReadOutcome::EndOfStream);
        }
        let text = format!("WARN - burst {}\n", self.next);
        self.next += 1;
        Ok(ReadOutcome::Line(decode_line(text.as_bytes())))
    }

    fn describe(&self) -> String {
        "burst".to_string()
    }

    fn overflow_policy(&self) -> OverflowPolicy {
        OverflowPolicy::DropOldest
    }
}

/// With nobody reading, a drop-oldest source loses lines, and the session
/// accounts for every one of them before the stream closes.
#[test]
fn e2e_dropped_lines_are_reported_through_pump() {
    const LINES: usize = 5_000;
    let done = Arc::new(AtomicBool::new(false));
    let mut listener = SourceListener::with_queue_capacity(16);
    listener.start(Box::new(Burst {
        next: 0,
        total: LINES,
        done: Arc::clone(&done),
    }));

    let deadline = Instant::now() + Duration::from_secs(10);
    while !done.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "burst source never finished");
        std::thread::sleep(Duration::from_millis(5));
    }

    let registry = TagRegistry::builtin();
    let mut session = Session::new(&registry, SessionOptions::default());
    let drained = pump_all(&mut session, &mut listener, 100);

    assert_eq!(drained.end, SourceEnd::EndOfStream);
    assert!(drained.dropped > 0);
    assert_eq!(session.store().len() as u64 + drained.dropped, LINES as u64);
    // The newest lines survive.
    let last = session.store().iter().last().map(LogLine::raw_text);
    assert_eq!(last, Some("WARN - burst 4999"));
}

/// A bounded store evicts while pumping; sequence numbers keep counting and
/// the evicted ones are gone.
#[test]
fn e2e_max_lines_evicts_during_pump() {
    const LINES: usize = 2_500;
    const LIMIT: usize = 1_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rolling.log");
    write_numbered_log(&path, LINES);

    let registry = TagRegistry::builtin();
    let options = SessionOptions {
        max_lines: LIMIT,
        ..SessionOptions::default()
    };
    let mut session = Session::new(&registry, options);
    session.set_filter("ERROR");

    let mut listener = SourceListener::new();
    listener.start(Box::new(open_file_source(&path).unwrap()));
    let drained = pump_all(&mut session, &mut listener, 300);

    assert_eq!(drained.end, SourceEnd::EndOfStream);
    assert_eq!(drained.appended.len(), LINES);
    assert_eq!(drained.appended.last(), Some(&(LINES as u64 - 1)));

    let store = session.store();
    assert_eq!(store.len(), LIMIT);
    assert_eq!(store.evicted(), (LINES - LIMIT) as u64);
    assert_eq!(store.first_sequence_number(), Some((LINES - LIMIT) as u64));
    assert!(store.get(drained.appended[0]).is_none());
    assert!(store.get((LINES - LIMIT) as u64).is_some());

    let shown = visible(&session);
    assert_eq!(shown.len(), LIMIT / 2);
    assert!(shown.iter().all(|seq| *seq >= (LINES - LIMIT) as u64));
}
