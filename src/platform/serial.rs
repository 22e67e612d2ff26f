// Colorful Logger - platform/serial.rs
//
// Serial port line source on top of the `serialport` crate.
//
// Reads use a short timeout (SERIAL_READ_TIMEOUT_MS). A timeout surfaces
// as `ReadOutcome::Idle` so the listener worker can notice a stop request
// without waiting for the device to send anything.

use crate::core::source::{LineSource, OverflowPolicy, ReadOutcome, ReaderSource};
use crate::util::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS, DEFAULT_SERIAL_PORT, SERIAL_READ_TIMEOUT_MS,
};
use crate::util::error::SourceError;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::fmt;
use std::io::BufReader;
use std::time::Duration;

/// Connection parameters for a serial line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub data_bits: DataBits,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            stop_bits: StopBits::One,
            data_bits: data_bits_from(DEFAULT_DATA_BITS).unwrap_or(DataBits::Eight),
        }
    }
}

impl fmt::Display for SerialSettings {
    /// e.g. `COM5 @ 115200 8N1`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        let bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        write!(f, "{} @ {} {bits}{parity}{stop}", self.port, self.baud_rate)
    }
}

// =============================================================================
// Setting parsers (accept the labels a settings form would offer)
// =============================================================================

pub fn parse_baud_rate(value: &str) -> Result<u32, SourceError> {
    match value.trim().parse::<u32>() {
        Ok(rate) if rate > 0 => Ok(rate),
        _ => Err(SourceError::InvalidSetting {
            field: "baud rate",
            value: value.to_string(),
            expected: "a positive integer such as 9600 or 115200",
        }),
    }
}

pub fn parse_parity(value: &str) -> Result<Parity, SourceError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "n" => Ok(Parity::None),
        "even" | "e" => Ok(Parity::Even),
        "odd" | "o" => Ok(Parity::Odd),
        _ => Err(SourceError::InvalidSetting {
            field: "parity",
            value: value.to_string(),
            expected: "None, Even or Odd",
        }),
    }
}

/// "1.5" is rejected: the transport supports only one or two stop bits.
pub fn parse_stop_bits(value: &str) -> Result<StopBits, SourceError> {
    match value.trim() {
        "1" => Ok(StopBits::One),
        "2" => Ok(StopBits::Two),
        _ => Err(SourceError::InvalidSetting {
            field: "stop bits",
            value: value.to_string(),
            expected: "1 or 2",
        }),
    }
}

pub fn parse_data_bits(value: &str) -> Result<DataBits, SourceError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(data_bits_from)
        .ok_or_else(|| SourceError::InvalidSetting {
            field: "data bits",
            value: value.to_string(),
            expected: "5, 6, 7 or 8",
        })
}

fn data_bits_from(bits: u8) -> Option<DataBits> {
    match bits {
        5 => Some(DataBits::Five),
        6 => Some(DataBits::Six),
        7 => Some(DataBits::Seven),
        8 => Some(DataBits::Eight),
        _ => None,
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Result<Vec<String>, SourceError> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .map_err(|e| SourceError::SerialEnumerate { source: e })
}

// =============================================================================
// SerialSource
// =============================================================================

/// An open serial port read line by line.
pub struct SerialSource {
    inner: ReaderSource<BufReader<Box<dyn SerialPort>>>,
}

impl SerialSource {
    pub fn open(settings: &SerialSettings) -> Result<Self, SourceError> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .data_bits(settings.data_bits)
            .timeout(Duration::from_millis(SERIAL_READ_TIMEOUT_MS))
            .open()
            .map_err(|e| SourceError::SerialOpen {
                port: settings.port.clone(),
                source: e,
            })?;

        tracing::info!(settings = %settings, "Serial port opened");
        Ok(Self {
            inner: ReaderSource::new(BufReader::new(port), format!("serial {settings}")),
        })
    }
}

impl LineSource for SerialSource {
    fn read_line(&mut self) -> Result<ReadOutcome, SourceError> {
        self.inner.read_line()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }

    /// A device keeps transmitting whether or not anyone is reading.
    fn overflow_policy(&self) -> OverflowPolicy {
        OverflowPolicy::DropOldest
    }
}
