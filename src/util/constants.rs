// Colorful Logger - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Colorful Logger";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ColorfulLogger";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tag registry
// =============================================================================

/// Name of the rank-0 sentinel tag meaning "show everything".
pub const SENTINEL_TAG_NAME: &str = "ALL";

/// Reference tag table in canonical order. The sentinel must stay first.
pub const DEFAULT_TAG_TABLE: &[(&str, &str)] = &[
    (SENTINEL_TAG_NAME, "black"),
    ("TRACE", "gray"),
    ("DEBUG", "blue"),
    ("INFO", "green"),
    ("WARN", "darkMagenta"),
    ("ERROR", "red"),
    ("FATAL", "darkred"),
];

/// Maximum number of tags a registry may hold (built-in + user-defined).
pub const MAX_TAGS: usize = 64;

/// Maximum length of a single tag name in characters.
///
/// A tag longer than the header window could never match, so names are
/// bounded by the largest window a user may configure.
pub const MAX_TAG_NAME_LENGTH: usize = MAX_HEADER_WINDOW;

// =============================================================================
// Matcher
// =============================================================================

/// Number of leading characters of a line scanned for a tag.
pub const DEFAULT_HEADER_WINDOW: usize = 35;

/// Upper bound on the configurable header window.
pub const MAX_HEADER_WINDOW: usize = 256;

// =============================================================================
// Line store
// =============================================================================

/// Default store capacity. 0 means unbounded.
pub const DEFAULT_MAX_LINES: usize = 0;

/// Minimum non-zero store capacity.
pub const MIN_MAX_LINES: usize = 1_000;

/// Hard upper bound on the store capacity.
pub const ABSOLUTE_MAX_LINES: usize = 10_000_000;

// =============================================================================
// Line sources
// =============================================================================

/// Maximum size of a single decoded line in bytes. Longer lines are truncated
/// so a stream without newlines cannot grow a line buffer without bound.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Default capacity of the worker-to-control-thread line queue.
pub const DEFAULT_LINE_QUEUE_CAPACITY: usize = 10_000;

/// Minimum configurable line queue capacity.
pub const MIN_LINE_QUEUE_CAPACITY: usize = 16;

/// Maximum configurable line queue capacity.
pub const MAX_LINE_QUEUE_CAPACITY: usize = 1_000_000;

/// Maximum number of listener events drained by one `Session::pump` call.
pub const MAX_SOURCE_EVENTS_PER_PUMP: usize = 1_000;

/// How long the CLI sleeps between pumps while waiting on a live source (ms).
pub const SOURCE_PUMP_INTERVAL_MS: u64 = 50;

// =============================================================================
// Serial defaults
// =============================================================================

/// Serial read timeout. The worker checks its cancel flag at least this often.
pub const SERIAL_READ_TIMEOUT_MS: u64 = 100;

/// Default serial port name.
#[cfg(windows)]
pub const DEFAULT_SERIAL_PORT: &str = "COM5";

/// Default serial port name.
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rates offered to users. Any positive rate is accepted.
pub const COMMON_BAUD_RATES: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200];

/// Default number of data bits per character.
pub const DEFAULT_DATA_BITS: u8 = 8;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
