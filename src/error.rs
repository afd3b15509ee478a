//! Error types for the simulator.

use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors that stop the simulator. None of these are retried.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The device path existed but could not be opened as a serial port.
    #[error("failed to open serial device {path}: {source}")]
    TransportOpen {
        /// Device path that was being opened.
        path: PathBuf,
        /// Underlying serial port error.
        #[source]
        source: serialport::Error,
    },

    /// Bytes on the wire were not valid UTF-8.
    #[error("malformed bytes on the wire: {0}")]
    Decode(#[from] FromUtf8Error),

    /// I/O error on an open transport.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the serial driver on an open transport.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Configuration could not be extracted.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration was extracted but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The shutdown signal handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
