// Colorful Logger - app/listener.rs
//
// Live line streaming: reads a `LineSource` on a background thread and hands
// decoded lines to the control thread.
//
// Architecture:
//   - `SourceListener` lives on the control thread; `run_listener` runs on a
//     worker thread that owns the source.
//   - An `Arc<AtomicBool>` cancel flag allows the control thread to stop it.
//   - Lines travel as `SourceEvent::Line` over a bounded crossbeam channel.
//     The control thread drains it with `poll_events` (per-frame budget) or
//     `next_event` (blocking with timeout).
//
// Overflow policy comes from the source (`LineSource::overflow_policy`):
//   - Block: the worker waits for room. Files and stdin lose nothing.
//   - DropOldest: the worker keeps its own clone of the receiver and evicts
//     queued events to make room, then reports the number of lines lost as
//     `SourceEvent::Dropped` immediately ahead of the event it was sending.
//     Room for that report is reserved, so the final `Closed`/`Stopped` is
//     always preceded by an exact count.
//
// Stop semantics: `stop` raises the cancel flag and drops the control
// thread's receiver, so once `stop` returns no event from that worker can be
// observed. A blocked worker sees the channel disconnect; a reading worker
// notices the flag after its current read returns (serial reads time out
// every SERIAL_READ_TIMEOUT_MS).
//
// Read failures are reported once as `SourceEvent::Closed { error }` and
// end the worker; reconnecting is the caller's decision.

use crate::core::model::SourceEvent;
use crate::core::source::{LineSource, OverflowPolicy, ReadOutcome};
use crate::util::constants::{
    DEFAULT_LINE_QUEUE_CAPACITY, MAX_LINE_QUEUE_CAPACITY, MIN_LINE_QUEUE_CAPACITY,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// SourceListener
// =============================================================================

/// Manages one line source worker at a time.
pub struct SourceListener {
    events_rx: Option<Receiver<SourceEvent>>,
    cancel_flag: Option<Arc<AtomicBool>>,
    queue_capacity: usize,
}

impl SourceListener {
    /// Listener with the default queue capacity.
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_LINE_QUEUE_CAPACITY)
    }

    /// Listener whose hand-off queue holds at most `capacity` events
    /// (clamped to the configurable range).
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            events_rx: None,
            cancel_flag: None,
            queue_capacity: capacity.clamp(MIN_LINE_QUEUE_CAPACITY, MAX_LINE_QUEUE_CAPACITY),
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Start reading `source` on a new worker thread. A running worker is
    /// stopped first.
    pub fn start(&mut self, source: Box<dyn LineSource>) {
        self.stop();

        let (tx, rx) = crossbeam_channel::bounded(self.queue_capacity);
        let cancel = Arc::new(AtomicBool::new(false));

        let description = source.describe();
        let policy = source.overflow_policy();
        let queue = EventQueue::new(tx, &rx, self.queue_capacity, policy);
        self.events_rx = Some(rx);
        self.cancel_flag = Some(Arc::clone(&cancel));

        std::thread::spawn(move || {
            run_listener(source, queue, cancel);
        });

        tracing::info!(
            source = %description,
            queue_capacity = self.queue_capacity,
            ?policy,
            "Line source started"
        );
    }

    /// Stop the worker. No event it produces is observable after this returns.
    pub fn stop(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::SeqCst);
            tracing::info!("Line source stop requested");
        }
        self.events_rx = None;
    }

    /// Returns `true` while a worker is attached and has not reported
    /// `Closed` or `Stopped`.
    pub fn is_active(&self) -> bool {
        self.events_rx.is_some()
    }

    /// Drain up to `max` queued events without blocking.
    pub fn poll_events(&mut self, max: usize) -> Vec<SourceEvent> {
        let mut events = Vec::new();
        while events.len() < max {
            let Some(rx) = &self.events_rx else {
                break;
            };
            match rx.try_recv() {
                Ok(event) => {
                    let last = self.observe(&event);
                    events.push(event);
                    if last {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        events
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event(&mut self, timeout: Duration) -> Option<SourceEvent> {
        let rx = self.events_rx.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(event) => {
                self.observe(&event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Detach from a worker that has reported its final event.
    /// Returns true if `event` was final.
    fn observe(&mut self, event: &SourceEvent) -> bool {
        let last = matches!(event, SourceEvent::Closed { .. } | SourceEvent::Stopped);
        if last {
            self.events_rx = None;
            self.cancel_flag = None;
        }
        last
    }
}

impl Default for SourceListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SourceListener {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Bounded hand-off queue (worker side)
// =============================================================================

struct EventQueue {
    tx: Sender<SourceEvent>,
    capacity: usize,
    /// Worker-side receiver used only to evict the oldest events.
    /// `None` means the queue blocks instead of dropping.
    evict_rx: Option<Receiver<SourceEvent>>,
    /// Lines evicted since the last `Dropped` report.
    unreported: u64,
}

impl EventQueue {
    fn new(
        tx: Sender<SourceEvent>,
        rx: &Receiver<SourceEvent>,
        capacity: usize,
        policy: OverflowPolicy,
    ) -> Self {
        let evict_rx = match policy {
            OverflowPolicy::Block => None,
            OverflowPolicy::DropOldest => Some(rx.clone()),
        };
        Self {
            tx,
            capacity,
            evict_rx,
            unreported: 0,
        }
    }

    /// Enqueue `event`. Returns false if the control side is gone.
    fn send(&mut self, event: SourceEvent) -> bool {
        if self.evict_rx.is_none() {
            return self.tx.send(event).is_ok();
        }

        // One slot for the event, one more for a drop report if needed.
        let reserve = if self.unreported > 0 || self.tx.is_full() {
            2
        } else {
            1
        };
        if let Some(rx) = &self.evict_rx {
            while self.tx.len() + reserve > self.capacity {
                match rx.try_recv() {
                    Ok(evicted) => self.unreported += lines_in(&evicted),
                    Err(_) => break,
                }
            }
        }

        if self.unreported > 0 {
            let count = std::mem::take(&mut self.unreported);
            tracing::warn!(count, "Line queue full; oldest lines dropped");
            if !self.push(SourceEvent::Dropped { count }) {
                return false;
            }
        }
        self.push(event)
    }

    fn push(&mut self, event: SourceEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(lost)) => {
                // Room was reserved above; only reachable if capacity < 2.
                self.unreported += lines_in(&lost);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Number of source lines an event stands for when it is discarded.
fn lines_in(event: &SourceEvent) -> u64 {
    match event {
        SourceEvent::Line(_) => 1,
        SourceEvent::Dropped { count } => *count,
        _ => 0,
    }
}

// =============================================================================
// Worker loop
// =============================================================================

fn run_listener(
    mut source: Box<dyn LineSource>,
    mut queue: EventQueue,
    cancel: Arc<AtomicBool>,
) {
    macro_rules! send {
        ($msg:expr) => {
            if !queue.send($msg) {
                return;
            }
        };
    }

    let description = source.describe();
    send!(SourceEvent::Started {
        description: description.clone()
    });

    let mut lines: u64 = 0;
    loop {
        if cancel.load(Ordering::SeqCst) {
            tracing::debug!(source = %description, lines, "Line source cancelled");
            send!(SourceEvent::Stopped);
            return;
        }

        match source.read_line() {
            Ok(ReadOutcome::Line(line)) => {
                // Re-check so a line read during `stop` is not queued.
                if cancel.load(Ordering::SeqCst) {
                    send!(SourceEvent::Stopped);
                    return;
                }
                if let Some(original) = line.truncated_from {
                    send!(SourceEvent::Warning {
                        message: format!(
                            "Line {} from {description} was {original} bytes and has been truncated",
                            lines
                        ),
                    });
                }
                lines += 1;
                send!(SourceEvent::Line(line.text));
            }
            Ok(ReadOutcome::Idle) => {}
            Ok(ReadOutcome::EndOfStream) => {
                tracing::info!(source = %description, lines, "Line source reached end of stream");
                send!(SourceEvent::Closed { error: None });
                return;
            }
            Err(e) => {
                tracing::warn!(source = %description, error = %e, "Line source read failed");
                send!(SourceEvent::Closed {
                    error: Some(e.to_string()),
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::ReaderSource;
    use crate::util::error::SourceError;
    use std::io::Cursor;
    use std::time::Instant;

    fn drain_until_final(listener: &mut SourceListener) -> Vec<SourceEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while listener.is_active() && Instant::now() < deadline {
            if let Some(ev) = listener.next_event(Duration::from_millis(50)) {
                events.push(ev);
            }
        }
        events
    }

    #[test]
    fn test_file_like_source_streams_lines_then_closes() {
        let mut listener = SourceListener::new();
        listener.start(Box::new(ReaderSource::new(
            Cursor::new(b"DEBUG - a\nERROR - b\n".to_vec()),
            "memory",
        )));
        let events = drain_until_final(&mut listener);
        assert_eq!(
            events,
            vec![
                SourceEvent::Started {
                    description: "memory".to_string()
                },
                SourceEvent::Line("DEBUG - a".to_string()),
                SourceEvent::Line("ERROR - b".to_string()),
                SourceEvent::Closed { error: None },
            ]
        );
        assert!(!listener.is_active());
    }

    struct Failing;

    impl LineSource for Failing {
        fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
            Err(SourceError::Read {
                source_name: "failing".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn test_read_failure_reported_as_closed() {
        let mut listener = SourceListener::new();
        listener.start(Box::new(Failing));
        let events = drain_until_final(&mut listener);
        match events.last() {
            Some(SourceEvent::Closed { error: Some(msg) }) => assert!(msg.contains("unplugged")),
            other => panic!("expected Closed with error, got {other:?}"),
        }
    }

    /// Emits an endless stream of idle reads, like a quiet serial port.
    struct Quiet;

    impl LineSource for Quiet {
        fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
            std::thread::sleep(Duration::from_millis(5));
            Ok(ReadOutcome::Idle)
        }

        fn describe(&self) -> String {
            "quiet".to_string()
        }
    }

    #[test]
    fn test_stop_detaches_immediately() {
        let mut listener = SourceListener::new();
        listener.start(Box::new(Quiet));
        assert!(listener.is_active());
        listener.stop();
        assert!(!listener.is_active());
        assert!(listener.poll_events(100).is_empty());
        assert!(listener.next_event(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_restart_replaces_previous_worker() {
        let mut listener = SourceListener::new();
        listener.start(Box::new(Quiet));
        listener.start(Box::new(ReaderSource::new(Cursor::new(b"x\n".to_vec()), "second")));
        let events = drain_until_final(&mut listener);
        assert_eq!(
            events.first(),
            Some(&SourceEvent::Started {
                description: "second".to_string()
            })
        );
    }

    fn dropping_queue(capacity: usize) -> (EventQueue, Receiver<SourceEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let queue = EventQueue::new(tx, &rx, capacity, OverflowPolicy::DropOldest);
        (queue, rx)
    }

    fn line(s: &str) -> SourceEvent {
        SourceEvent::Line(s.to_string())
    }

    #[test]
    fn test_full_queue_drops_oldest_and_reports() {
        let (mut queue, rx) = dropping_queue(2);
        for i in 0..3 {
            assert!(queue.send(line(&i.to_string())));
        }
        // Both queued lines made way for line 2 and its report.
        let queued: Vec<SourceEvent> = rx.try_iter().collect();
        assert_eq!(queued, vec![SourceEvent::Dropped { count: 2 }, line("2")]);
        assert_eq!(queue.unreported, 0);
    }

    #[test]
    fn test_evicted_drop_report_carries_its_count_forward() {
        let (mut queue, rx) = dropping_queue(2);
        for i in 0..4 {
            assert!(queue.send(line(&i.to_string())));
        }
        // Line 3 evicted `Dropped { 2 }` and line 2: 2 + 1 lines lost.
        let queued: Vec<SourceEvent> = rx.try_iter().collect();
        assert_eq!(queued, vec![SourceEvent::Dropped { count: 3 }, line("3")]);
    }

    #[test]
    fn test_dropped_counts_add_up_before_close() {
        let (mut queue, rx) = dropping_queue(4);
        assert!(queue.send(SourceEvent::Started {
            description: "burst".to_string()
        }));
        for i in 0..100 {
            assert!(queue.send(line(&i.to_string())));
        }
        assert!(queue.send(SourceEvent::Closed { error: None }));

        let queued: Vec<SourceEvent> = rx.try_iter().collect();
        let kept = queued
            .iter()
            .filter(|e| matches!(e, SourceEvent::Line(_)))
            .count() as u64;
        let dropped: u64 = queued
            .iter()
            .map(|e| match e {
                SourceEvent::Dropped { count } => *count,
                _ => 0,
            })
            .sum();
        assert_eq!(kept + dropped, 100);
        assert_eq!(queued.last(), Some(&SourceEvent::Closed { error: None }));
        assert!(matches!(
            queued[queued.len() - 2],
            SourceEvent::Dropped { .. }
        ));
    }

    #[test]
    fn test_blocking_queue_keeps_every_line() {
        let input: Vec<u8> = (0..5000)
            .flat_map(|i| format!("line {i}\n").into_bytes())
            .collect();
        let mut listener = SourceListener::with_queue_capacity(MIN_LINE_QUEUE_CAPACITY);
        listener.start(Box::new(ReaderSource::new(Cursor::new(input), "big")));

        let events = drain_until_final(&mut listener);
        let lines: Vec<&SourceEvent> = events
            .iter()
            .filter(|e| matches!(e, SourceEvent::Line(_)))
            .collect();
        assert_eq!(lines.len(), 5000);
        assert_eq!(lines[4999], &line("line 4999"));
        assert!(!events
            .iter()
            .any(|e| matches!(e, SourceEvent::Dropped { .. })));
    }

    /// Never runs dry, so a blocking worker fills the queue and waits.
    struct Endless;

    impl LineSource for Endless {
        fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
            Ok(ReadOutcome::Line(crate::core::source::decode_line(b"INFO - tick\n")))
        }

        fn describe(&self) -> String {
            "endless".to_string()
        }
    }

    #[test]
    fn test_stop_releases_a_blocked_worker() {
        let mut listener = SourceListener::with_queue_capacity(MIN_LINE_QUEUE_CAPACITY);
        listener.start(Box::new(Endless));
        std::thread::sleep(Duration::from_millis(50));
        listener.stop();
        assert!(listener.poll_events(100).is_empty());

        // The listener is immediately reusable.
        listener.start(Box::new(ReaderSource::new(Cursor::new(b"x\n".to_vec()), "next")));
        let events = drain_until_final(&mut listener);
        assert_eq!(events.last(), Some(&SourceEvent::Closed { error: None }));
    }

    #[test]
    fn test_poll_events_respects_budget() {
        let mut listener = SourceListener::new();
        let input: Vec<u8> = (0..50).flat_map(|i| format!("line {i}\n").into_bytes()).collect();
        listener.start(Box::new(ReaderSource::new(Cursor::new(input), "many")));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut total = Vec::new();
        while listener.is_active() && Instant::now() < deadline {
            let batch = listener.poll_events(7);
            assert!(batch.len() <= 7);
            total.extend(batch);
        }
        let lines = total
            .iter()
            .filter(|e| matches!(e, SourceEvent::Line(_)))
            .count();
        assert_eq!(lines, 50);
    }
}
