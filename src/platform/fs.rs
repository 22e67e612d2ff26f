// Colorful Logger - platform/fs.rs
//
// File-backed line sources: replaying a log file or reading stdin.
// Invalid UTF-8 is decoded lossily by the source, never rejected.

use crate::core::source::ReaderSource;
use crate::util::error::SourceError;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Open `path` for line-by-line replay.
pub fn open_file_source(path: &Path) -> Result<ReaderSource<BufReader<File>>, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "Opened log file for replay");
    Ok(ReaderSource::new(
        BufReader::new(file),
        path.display().to_string(),
    ))
}

/// Line source over standard input (`-` on the command line).
pub fn stdin_source() -> ReaderSource<BufReader<io::Stdin>> {
    ReaderSource::new(BufReader::new(io::stdin()), "stdin")
}
