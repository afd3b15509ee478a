//! Serial transport binding.
//!
//! Waits for the virtual serial device to appear, opens it, and turns the
//! raw byte stream into newline-delimited lines without ever blocking the
//! command loop for longer than the configured read timeout.

use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of a non-blocking line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// Nothing complete is available yet.
    NoData,
    /// One decoded line, without its `\n` delimiter.
    Line(String),
}

/// A duplex byte stream the command engine can poll for lines.
pub trait Transport {
    /// Returns the next line if one is available, without waiting for more input.
    fn read_line_non_blocking(&mut self) -> Result<LineRead, SimulatorError>;

    /// Writes the whole buffer as a single write and flushes it.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SimulatorError>;
}

/// Blocks until `path` exists, checking once per `interval`.
///
/// There is no timeout: the simulator is expected to start before the
/// pairing utility creates the device. Returns `false` if `shutdown` was
/// raised before the device appeared.
pub fn await_device(path: &Path, interval: Duration, shutdown: &AtomicBool) -> bool {
    while !path.exists() {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        thread::sleep(interval);
        info!("Waiting for {}...", path.display());
    }
    true
}

/// Accumulates raw bytes and splits them into `\n`-terminated lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // When the oldest unterminated byte in `pending` arrived.
    fragment_started: Option<Instant>,
    last_arrival: Option<Instant>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes that arrived at `now`.
    pub fn extend(&mut self, bytes: &[u8], now: Instant) {
        if bytes.is_empty() {
            return;
        }
        if self.pending.is_empty() {
            self.fragment_started = Some(now);
        }
        self.last_arrival = Some(now);
        self.pending.extend_from_slice(bytes);
    }

    /// Removes and returns the oldest complete line, without its delimiter.
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        self.fragment_started = if self.pending.is_empty() {
            None
        } else {
            self.last_arrival
        };
        Some(line)
    }

    /// Releases an unterminated fragment that has waited at least `timeout`,
    /// the way a timed-out readline returns whatever it has collected.
    pub fn take_stale(&mut self, now: Instant, timeout: Duration) -> Option<Vec<u8>> {
        let started = self.fragment_started?;
        if self.pending.contains(&b'\n') || now.duration_since(started) < timeout {
            return None;
        }
        self.fragment_started = None;
        Some(std::mem::take(&mut self.pending))
    }

    /// Number of buffered bytes not yet returned.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn decode(bytes: Vec<u8>) -> Result<LineRead, SimulatorError> {
    Ok(LineRead::Line(String::from_utf8(bytes)?))
}

/// An open serial device owned by the command engine.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Opens the configured device. Failure is reported as
    /// [`SimulatorError::TransportOpen`] and is not retried.
    pub fn open(config: &SimulatorConfig) -> Result<Self, SimulatorError> {
        let port = serialport::new(config.device_path.to_string_lossy(), config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| SimulatorError::TransportOpen {
                path: config.device_path.clone(),
                source,
            })?;
        Ok(Self::new(port, config.read_timeout))
    }

    /// Wraps an already opened port.
    pub fn new(port: Box<dyn SerialPort>, read_timeout: Duration) -> Self {
        Self {
            port,
            buffer: LineBuffer::new(),
            read_timeout,
        }
    }

    /// Device name reported by the serial driver, if it knows one.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialTransport {
    fn read_line_non_blocking(&mut self) -> Result<LineRead, SimulatorError> {
        // Lines left over from an earlier burst go out before polling the port.
        if let Some(line) = self.buffer.take_line() {
            return decode(line);
        }

        let now = Instant::now();
        let available = self.port.bytes_to_read()? as usize;
        if available > 0 {
            let mut chunk = vec![0u8; available];
            match self.port.read(&mut chunk) {
                Ok(bytes_read) => self.buffer.extend(&chunk[..bytes_read], now),
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => (),
                Err(e) => return Err(e.into()),
            }
            if let Some(line) = self.buffer.take_line() {
                return decode(line);
            }
        }

        match self.buffer.take_stale(now, self.read_timeout) {
            Some(fragment) => decode(fragment),
            None => Ok(LineRead::NoData),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SimulatorError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}
