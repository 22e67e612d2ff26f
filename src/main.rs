// Colorful Logger - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Tag registry construction (built-in + user-defined tags)
// 4. Replaying a file / stdin, or streaming a serial port, through a session
// 5. Ctrl-C / SIGTERM, which stop the source and flush what was received

use clap::Parser;
use colorful_logger::app::listener::SourceListener;
use colorful_logger::app::session::{PumpReport, Session, SessionOptions, SourceEnd};
use colorful_logger::core::model::LogLine;
use colorful_logger::core::search::SearchMode;
use colorful_logger::core::source::LineSource;
use colorful_logger::platform::config::{self, AppConfig, PlatformPaths};
use colorful_logger::platform::interrupt::InterruptFlag;
use colorful_logger::platform::{fs, serial};
use colorful_logger::util::error::{ColorLoggerError, Result};
use colorful_logger::util::{self, constants};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Colorful Logger - severity-tagged log viewer.
///
/// Replays a log file (or a serial port, live) and prints its lines with the
/// severity tag coloured, optionally filtered to one tag or searched.
#[derive(Parser, Debug)]
#[command(name = "colorful-logger", version, about)]
struct Cli {
    /// Log file to replay ("-" reads standard input).
    #[arg(conflicts_with_all = ["serial", "list_ports"])]
    file: Option<PathBuf>,

    /// Stream a serial port. Without a value the configured port is used.
    #[arg(long, value_name = "PORT")]
    serial: Option<Option<String>>,

    /// Serial baud rate.
    #[arg(long, value_name = "RATE")]
    baud: Option<String>,

    /// Serial parity: None, Even or Odd.
    #[arg(long)]
    parity: Option<String>,

    /// Serial stop bits: 1 or 2.
    #[arg(long = "stop-bits")]
    stop_bits: Option<String>,

    /// Serial data bits: 5 to 8.
    #[arg(long = "data-bits")]
    data_bits: Option<String>,

    /// List the serial ports present on this machine and exit.
    #[arg(long = "list-ports")]
    list_ports: bool,

    /// Only show lines carrying this tag ("ALL" shows everything).
    #[arg(short = 'f', long = "filter")]
    filter: Option<String>,

    /// Print each line containing this text, in order, instead of the log.
    #[arg(short = 's', long = "search")]
    search: Option<String>,

    /// Search matches whole words only.
    #[arg(long = "whole-word")]
    whole_word: bool,

    /// Search ignores case.
    #[arg(long = "ignore-case")]
    ignore_case: bool,

    /// Number of leading characters scanned for a tag.
    #[arg(long = "header-window")]
    header_window: Option<usize>,

    /// Emit one JSON object per line instead of text.
    #[arg(long)]
    json: bool,

    /// Never colour the tag, even on a terminal.
    #[arg(long = "no-color")]
    no_color: bool,

    /// Path to config.toml (defaults to the platform config directory).
    /// A file named here must exist and parse.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging exists so its level can seed the filter;
    // warnings are replayed once tracing is up.
    let (config_path, loaded) = match cli.config.clone() {
        Some(path) => {
            let loaded = config::load_config_file(&path);
            (path, loaded)
        }
        None => {
            let path = PlatformPaths::resolve().config_file();
            let loaded = Ok(config::load_config(&path));
            (path, loaded)
        }
    };
    let (app_config, config_warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            util::logging::init(cli.debug, None);
            let e = ColorLoggerError::from(e);
            tracing::error!(error = %e, config = %config_path.display(), "Config rejected");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "Colorful Logger starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {warning}");
    }

    if let Err(e) = run(&cli, &app_config) {
        tracing::error!(error = %e, "Colorful Logger failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, app_config: &AppConfig) -> Result<()> {
    if cli.list_ports {
        return list_ports();
    }

    let registry = app_config.tag_registry()?;
    let mut search = app_config.search;
    if cli.whole_word {
        search.mode = SearchMode::WholeWord;
    }
    if cli.ignore_case {
        search.ignore_case = true;
    }
    let options = SessionOptions {
        header_window: cli.header_window.unwrap_or(app_config.header_window),
        max_lines: app_config.max_lines,
        search,
    };
    let mut session = Session::new(&registry, options);
    if let Some(ref name) = cli.filter {
        session.set_filter(name);
    }

    let color = !cli.no_color && !cli.json && io::stdout().is_terminal();
    let printer = Printer {
        json: cli.json,
        color,
    };

    let mut listener = SourceListener::with_queue_capacity(app_config.queue_capacity);
    let live = cli.serial.is_some();
    let source = open_source(cli, app_config)?;
    listener.start(source);

    let interrupt = InterruptFlag::register();
    let end = replay(&mut session, &mut listener, &interrupt, |session, report| {
        if !live {
            return Ok(());
        }
        match cli.search {
            Some(ref query) => print_search_hits(session, query, &printer),
            None => print_appended(session, report, &printer),
        }
    })?;
    match end {
        SourceEnd::Failed(ref message) => {
            eprintln!("Warning: source closed with an error: {message}");
        }
        SourceEnd::Stopped => tracing::info!("Source stopped"),
        SourceEnd::EndOfStream => {}
    }

    // A live stream has already been printed; this picks up the remainder.

    if let Some(ref query) = cli.search {
        print_search_hits(&mut session, query, &printer)?;
    } else if !live {
        let mut out = io::stdout().lock();
        for line in session.visible_lines() {
            printer.write_line(&mut out, line)?;
        }
        out.flush()?;
    }

    let summary = session.summary();
    tracing::info!(
        total = summary.total,
        untagged = summary.untagged,
        evicted = session.store().evicted(),
        visible = session.visible_lines().count(),
        filter = session.selection().label(),
        "Done"
    );
    Ok(())
}

fn list_ports() -> Result<()> {
    let ports = serial::available_ports()?;
    let mut out = io::stdout().lock();
    if ports.is_empty() {
        writeln!(out, "No serial ports found.")?;
    }
    for port in ports {
        writeln!(out, "{port}")?;
    }
    let rates: Vec<String> = constants::COMMON_BAUD_RATES
        .iter()
        .map(u32::to_string)
        .collect();
    writeln!(out, "Common baud rates: {}", rates.join(", "))?;
    Ok(())
}

fn open_source(cli: &Cli, app_config: &AppConfig) -> Result<Box<dyn LineSource>> {
    if let Some(ref port) = cli.serial {
        let mut settings = app_config.serial.clone();
        if let Some(port) = port {
            settings.port = port.clone();
        }
        if let Some(ref v) = cli.baud {
            settings.baud_rate = serial::parse_baud_rate(v)?;
        }
        if let Some(ref v) = cli.parity {
            settings.parity = serial::parse_parity(v)?;
        }
        if let Some(ref v) = cli.stop_bits {
            settings.stop_bits = serial::parse_stop_bits(v)?;
        }
        if let Some(ref v) = cli.data_bits {
            settings.data_bits = serial::parse_data_bits(v)?;
        }
        return Ok(Box::new(serial::SerialSource::open(&settings)?));
    }

    match cli.file.as_deref() {
        None => Ok(Box::new(fs::stdin_source())),
        Some(path) if path == Path::new("-") => Ok(Box::new(fs::stdin_source())),
        Some(path) => Ok(Box::new(fs::open_file_source(path)?)),
    }
}

/// Pump the listener into the session until the source finishes or the
/// interrupt flag is raised. `after_pump` sees every batch as it lands.
fn replay<'r>(
    session: &mut Session<'r>,
    listener: &mut SourceListener,
    interrupt: &InterruptFlag,
    mut after_pump: impl FnMut(&mut Session<'r>, &PumpReport) -> Result<()>,
) -> Result<SourceEnd> {
    let interval = Duration::from_millis(constants::SOURCE_PUMP_INTERVAL_MS);
    loop {
        if interrupt.is_raised() {
            tracing::info!("Interrupted; stopping source");
            listener.stop();
            return Ok(SourceEnd::Stopped);
        }

        let report = session.pump(listener, constants::MAX_SOURCE_EVENTS_PER_PUMP);
        after_pump(session, &report)?;
        report_side_events(&report);

        if let Some(end) = report.finished {
            return Ok(end);
        }
        if !listener.is_active() {
            return Ok(SourceEnd::Stopped);
        }
        if report.appended.is_empty() {
            std::thread::sleep(interval);
        }
    }
}

fn print_appended(session: &Session<'_>, report: &PumpReport, printer: &Printer) -> Result<()> {
    let mut out = io::stdout().lock();
    for seq in &report.appended {
        if let Some(line) = session.store().get(*seq).filter(|l| l.is_visible()) {
            printer.write_line(&mut out, line)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn report_side_events(report: &PumpReport) {
    if let Some(ref description) = report.started {
        tracing::info!(source = %description, "Reading");
    }
    if report.dropped > 0 {
        eprintln!("Warning: {} lines dropped (reader fell behind)", report.dropped);
    }
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
}

fn print_search_hits(session: &mut Session<'_>, query: &str, printer: &Printer) -> Result<()> {
    let mut out = io::stdout().lock();
    while let Some(hit) = session.find_next(query)? {
        if let Some(line) = session.store().get(hit.sequence_number) {
            printer.write_line(&mut out, line)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Renders one stored line as coloured text, plain text or JSON.
struct Printer {
    json: bool,
    color: bool,
}

impl Printer {
    fn write_line(&self, out: &mut impl Write, line: &LogLine) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut *out, line)?;
            return writeln!(out);
        }

        let text = line.raw_text();
        match (self.color, line.tag(), line.tag_span()) {
            (true, Some(tag), Some(span)) => writeln!(
                out,
                "{}{}{}\x1b[0m{}",
                &text[..span.start],
                tag.color().ansi_fg(),
                &text[span.clone()],
                &text[span.end..]
            ),
            _ => writeln!(out, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorful_logger::core::source::{decode_line, ReadOutcome};
    use colorful_logger::core::tags::TagRegistry;
    use colorful_logger::util::error::SourceError;

    fn render(printer: &Printer, raw: &str) -> String {
        let reg = TagRegistry::builtin();
        let mut session = Session::new(&reg, SessionOptions::default());
        let seq = session.append(raw);
        let mut buf = Vec::new();
        let line = session.store().get(seq).unwrap();
        printer.write_line(&mut buf, line).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_color_wraps_only_the_tag() {
        let printer = Printer {
            json: false,
            color: true,
        };
        let out = render(&printer, "12:00 ERROR - boom");
        assert!(out.starts_with("12:00 \x1b[38;2;"));
        assert!(out.ends_with("ERROR\x1b[0m - boom\n"));
    }

    #[test]
    fn test_plain_output_is_raw_text() {
        let printer = Printer {
            json: false,
            color: false,
        };
        assert_eq!(render(&printer, "INFO - x"), "INFO - x\n");
    }

    #[test]
    fn test_json_output_names_the_tag() {
        let printer = Printer {
            json: true,
            color: false,
        };
        let value: serde_json::Value =
            serde_json::from_str(render(&printer, "WARN - low disk").trim_end()).unwrap();
        assert_eq!(value["tag"], "WARN");
        assert_eq!(value["raw_text"], "WARN - low disk");
    }

    /// Never ends on its own, like a serial port.
    struct Ticker;

    impl LineSource for Ticker {
        fn read_line(&mut self) -> std::result::Result<ReadOutcome, SourceError> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(ReadOutcome::Line(decode_line(b"ERROR - tick\n")))
        }

        fn describe(&self) -> String {
            "ticker".to_string()
        }
    }

    #[test]
    fn test_interrupt_stops_an_endless_source() {
        let reg = TagRegistry::builtin();
        let mut session = Session::new(&reg, SessionOptions::default());
        let mut listener = SourceListener::new();
        listener.start(Box::new(Ticker));

        let interrupt = InterruptFlag::detached();
        let mut pumps = 0;
        let end = replay(&mut session, &mut listener, &interrupt, |_, _| {
            pumps += 1;
            if pumps == 3 {
                interrupt.raise();
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(end, SourceEnd::Stopped);
        assert!(!listener.is_active());
    }

    #[test]
    fn test_live_search_reports_hits_after_each_pump() {
        let reg = TagRegistry::builtin();
        let mut session = Session::new(&reg, SessionOptions::default());
        session.append("INFO - boot");
        session.append("ERROR - first");
        let printer = Printer {
            json: false,
            color: false,
        };
        let mut hits = Vec::new();
        while let Some(hit) = session.find_next("ERROR").unwrap() {
            hits.push(hit.sequence_number);
        }
        assert_eq!(hits, vec![1]);

        // Lines that arrive after the search ran dry are still found.
        session.append("ERROR - second");
        print_search_hits(&mut session, "ERROR", &printer).unwrap();
        assert_eq!(session.find_next("ERROR").unwrap(), None);
        session.append("ERROR - third");
        assert_eq!(
            session.find_next("ERROR").unwrap().map(|h| h.sequence_number),
            Some(3)
        );
    }

    #[test]
    fn test_cli_parses_serial_without_port() {
        let cli = Cli::try_parse_from(["colorful-logger", "--serial", "--baud", "9600"]).unwrap();
        assert_eq!(cli.serial, Some(None));
        assert_eq!(cli.baud.as_deref(), Some("9600"));
    }
}
