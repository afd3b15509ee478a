//! The command loop.
//!
//! Polls the transport for complete lines, answers the ones found in the
//! command table and stays silent for everything else. Responses go out in
//! the order their commands arrived, one write per response.

use crate::error::SimulatorError;
use crate::transport::{LineRead, Transport};
use crate::{Command, Instrument, Reply};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace};

/// What a single poll of the transport did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No complete line was available.
    Idle,
    /// A line arrived but was empty after trimming.
    Blank,
    /// A line arrived that matches no command; nothing was written.
    Unrecognized(String),
    /// A command was matched and its response written.
    Responded(Command),
}

/// Drives an [`Instrument`] over a [`Transport`].
pub struct Engine<T: Transport> {
    transport: T,
    instrument: Instrument,
    poll_interval: Duration,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T, poll_interval: Duration) -> Self {
        Self {
            transport,
            instrument: Instrument::new(),
            poll_interval,
        }
    }

    /// Reads at most one line and dispatches it.
    pub fn poll_once(&mut self) -> Result<Outcome, SimulatorError> {
        let raw = match self.transport.read_line_non_blocking()? {
            LineRead::NoData => return Ok(Outcome::Idle),
            LineRead::Line(raw) => raw,
        };

        match self.instrument.process_line(&raw) {
            Reply::Blank => {
                trace!("Discarding blank line");
                Ok(Outcome::Blank)
            }
            Reply::Unrecognized(line) => {
                info!("Received: {}", line);
                debug!("No response for unrecognized command {:?}", line);
                Ok(Outcome::Unrecognized(line))
            }
            Reply::Respond(command) => {
                info!("Received: {}", command.as_str());
                let response = command.response();
                info!(encoding = ?command.encoding(), "Sending: {}", response.trim_end());
                self.transport.write_bytes(response.as_bytes())?;
                Ok(Outcome::Responded(command))
            }
        }
    }

    /// Polls until `shutdown` is raised or an error occurs.
    ///
    /// Sleeps for the poll interval only when no line was available, so a
    /// burst of queued commands is drained back to back. Any error ends the
    /// loop and is returned to the caller.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<(), SimulatorError> {
        while !shutdown.load(Ordering::SeqCst) {
            if self.poll_once()? == Outcome::Idle {
                thread::sleep(self.poll_interval);
            }
        }
        info!("Shutdown requested, leaving command loop");
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
