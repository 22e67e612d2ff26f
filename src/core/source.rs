// Colorful Logger - core/source.rs
//
// The line source seam. Anything that yields newline-delimited text (a
// replayed file, stdin, a serial port) implements `LineSource`; the
// listener worker owns the source and only ever calls `read_line`.
//
// Decoding: bytes are decoded as lossy UTF-8 and the trailing "\n" or
// "\r\n" is stripped. Lines longer than MAX_LINE_BYTES are truncated on a
// char boundary and flagged so the worker can warn.

use crate::util::constants::MAX_LINE_BYTES;
use crate::util::error::SourceError;
use std::io::{self, BufRead};

/// Result of one `read_line` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete, decoded line.
    Line(DecodedLine),
    /// Nothing available yet (e.g. a serial read timed out). Try again.
    Idle,
    /// The source is exhausted and will produce no more lines.
    EndOfStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub text: String,
    /// Original byte length when the line was cut to MAX_LINE_BYTES.
    pub truncated_from: Option<usize>,
}

/// What the listener does when its hand-off queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait for the consumer. Finite sources (files, stdin) must not lose
    /// lines just because they can be read faster than they are viewed.
    #[default]
    Block,
    /// Discard the oldest queued lines and report how many. For live
    /// devices that cannot be paused.
    DropOldest,
}

/// A producer of raw text lines.
pub trait LineSource: Send {
    /// Block until a line is available, the read times out, or the stream ends.
    fn read_line(&mut self) -> Result<ReadOutcome, SourceError>;

    /// Human-readable name for status messages and logs.
    fn describe(&self) -> String;

    fn overflow_policy(&self) -> OverflowPolicy {
        OverflowPolicy::Block
    }
}

/// Decode one raw line: strip the line terminator, cap the length, and
/// replace invalid UTF-8 with U+FFFD.
pub fn decode_line(raw: &[u8]) -> DecodedLine {
    let mut bytes = raw;
    if let Some(rest) = bytes.strip_suffix(b"\n") {
        bytes = rest;
        if let Some(rest) = bytes.strip_suffix(b"\r") {
            bytes = rest;
        }
    }

    let original_len = bytes.len();
    let decoded = String::from_utf8_lossy(&bytes[..original_len.min(MAX_LINE_BYTES)]);
    let mut text = decoded.into_owned();

    let truncated_from = if original_len > MAX_LINE_BYTES {
        // A multi-byte sequence cut at the limit decodes to a trailing U+FFFD.
        if text.ends_with(char::REPLACEMENT_CHARACTER) {
            text.pop();
        }
        Some(original_len)
    } else {
        None
    };

    DecodedLine {
        text,
        truncated_from,
    }
}

/// Line source over any buffered reader: files, stdin, in-memory buffers.
pub struct ReaderSource<R> {
    reader: R,
    name: String,
    buf: Vec<u8>,
}

impl<R: BufRead + Send> ReaderSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            buf: Vec::new(),
        }
    }

    fn take_line(&mut self) -> DecodedLine {
        let line = decode_line(&self.buf);
        self.buf.clear();
        line
    }
}

impl<R: BufRead + Send> LineSource for ReaderSource<R> {
    fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
        // `buf` survives a timed-out read so a line split across two reads
        // is reassembled rather than lost.
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(_) if self.buf.is_empty() => Ok(ReadOutcome::EndOfStream),
            Ok(_) => Ok(ReadOutcome::Line(self.take_line())),
            Err(e) if is_transient(&e) => {
                if self.buf.len() >= MAX_LINE_BYTES {
                    // No newline in sight; hand over what we have.
                    return Ok(ReadOutcome::Line(self.take_line()));
                }
                Ok(ReadOutcome::Idle)
            }
            Err(e) => Err(SourceError::Read {
                source_name: self.name.clone(),
                source: e,
            }),
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Read errors that mean "nothing yet" rather than failure.
pub(crate) fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
