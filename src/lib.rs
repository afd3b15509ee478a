//! # Serial Meter Simulator Library
//!
//! This library contains the core logic for emulating a serial-attached
//! measurement instrument. It recognizes a small set of SCPI-style commands
//! and answers each with a canned response, one per payload encoding the
//! host-side acquisition client must be able to parse.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod transport;

pub use config::SimulatorConfig;
pub use engine::{Engine, Outcome};
pub use error::SimulatorError;
pub use transport::{await_device, LineBuffer, LineRead, SerialTransport, Transport};

/// Payload encoding exercised by a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// A bare number such as `3.305E+00`.
    ScientificNotation,
    /// `KEY:value` with a unit suffix.
    KeyValue,
    /// Comma-separated fields.
    CommaSeparated,
    /// Several newline-separated records delivered in one write.
    MultiLineBurst,
}

// The commands the simulated meter answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MeasureVoltage,
    ReadVoltage,
    MeasureAll,
    MeasureNoisy,
}

/// Recognized command lines, in lookup order.
pub const COMMAND_TABLE: [(&str, Command); 4] = [
    ("MEAS:VOLT?", Command::MeasureVoltage),
    ("READ:VOLT", Command::ReadVoltage),
    ("MEAS:ALL?", Command::MeasureAll),
    ("MEAS:NOISY?", Command::MeasureNoisy),
];

impl Command {
    /// Looks up an exact, case-sensitive command line. First match wins.
    pub fn parse(line: &str) -> Option<Command> {
        COMMAND_TABLE
            .iter()
            .find(|(text, _)| *text == line)
            .map(|(_, command)| *command)
    }

    /// The command line as it appears on the wire, without terminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MeasureVoltage => "MEAS:VOLT?",
            Command::ReadVoltage => "READ:VOLT",
            Command::MeasureAll => "MEAS:ALL?",
            Command::MeasureNoisy => "MEAS:NOISY?",
        }
    }

    /// Response bytes, including every terminator.
    pub fn response(&self) -> &'static str {
        match self {
            Command::MeasureVoltage => "3.305E+00\n",
            Command::ReadVoltage => "VOLTAGE:3.305V\n",
            Command::MeasureAll => "12.5,0.15,PASS\n",
            // Sent as one burst; the peer has to split the records itself.
            Command::MeasureNoisy => "DEBUG:Start\nWARN:LowBat\nVOLTAGE:3.305V\nDEBUG:End\n",
        }
    }

    /// Payload encoding the response exercises on the client side.
    pub fn encoding(&self) -> Encoding {
        match self {
            Command::MeasureVoltage => Encoding::ScientificNotation,
            Command::ReadVoltage => Encoding::KeyValue,
            Command::MeasureAll => Encoding::CommaSeparated,
            Command::MeasureNoisy => Encoding::MultiLineBurst,
        }
    }
}

/// Result of feeding one inbound line to the instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The line was empty after trimming.
    Blank,
    /// The line is not a known command. The meter stays silent.
    Unrecognized(String),
    /// The line matched a command with this response.
    Respond(Command),
}

/// The simulated meter. It holds no state between commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct Instrument;

impl Instrument {
    pub fn new() -> Self {
        Self
    }

    /// Processes one decoded line and decides what, if anything, to send back.
    ///
    /// Leading and trailing whitespace is stripped before matching; the
    /// remaining text must equal a table entry exactly.
    pub fn process_line(&self, raw: &str) -> Reply {
        let line = raw.trim();
        if line.is_empty() {
            return Reply::Blank;
        }
        match Command::parse(line) {
            Some(command) => Reply::Respond(command),
            None => Reply::Unrecognized(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_notation_response() {
        let reply = Instrument::new().process_line("MEAS:VOLT?");
        assert_eq!(reply, Reply::Respond(Command::MeasureVoltage));
        assert_eq!(Command::MeasureVoltage.response(), "3.305E+00\n");
    }

    #[test]
    fn key_value_response() {
        let reply = Instrument::new().process_line("READ:VOLT");
        assert_eq!(reply, Reply::Respond(Command::ReadVoltage));
        assert_eq!(Command::ReadVoltage.response(), "VOLTAGE:3.305V\n");
    }

    #[test]
    fn csv_response() {
        let reply = Instrument::new().process_line("MEAS:ALL?");
        assert_eq!(reply, Reply::Respond(Command::MeasureAll));
        assert_eq!(Command::MeasureAll.response(), "12.5,0.15,PASS\n");
    }

    #[test]
    fn noisy_response_carries_four_records() {
        let response = Command::MeasureNoisy.response();
        assert!(response.ends_with('\n'));
        let records: Vec<&str> = response.lines().collect();
        assert_eq!(
            records,
            vec!["DEBUG:Start", "WARN:LowBat", "VOLTAGE:3.305V", "DEBUG:End"]
        );
    }

    #[test]
    fn single_responses_have_one_terminator() {
        for command in [
            Command::MeasureVoltage,
            Command::ReadVoltage,
            Command::MeasureAll,
        ] {
            let response = command.response();
            assert_eq!(response.matches('\n').count(), 1, "{:?}", command);
            assert!(response.ends_with('\n'));
        }
    }

    #[test]
    fn process_command_with_surrounding_whitespace() {
        let reply = Instrument::new().process_line("  MEAS:VOLT?\r\n");
        assert_eq!(reply, Reply::Respond(Command::MeasureVoltage));
    }

    #[test]
    fn ignore_lowercase_command() {
        let reply = Instrument::new().process_line("meas:volt?");
        assert_eq!(reply, Reply::Unrecognized("meas:volt?".to_string()));
    }

    #[test]
    fn ignore_near_matches() {
        let instrument = Instrument::new();
        for line in ["MEAS:VOLT", "MEAS: VOLT?", "MEAS:VOLT?;READ:VOLT", "READ:VOLT?", "*IDN?"] {
            assert!(
                matches!(instrument.process_line(line), Reply::Unrecognized(_)),
                "{} should not match",
                line
            );
        }
    }

    #[test]
    fn blank_lines_are_discarded() {
        let instrument = Instrument::new();
        assert_eq!(instrument.process_line(""), Reply::Blank);
        assert_eq!(instrument.process_line(" \t\r"), Reply::Blank);
    }

    #[test]
    fn table_round_trips_through_as_str() {
        for (text, command) in COMMAND_TABLE {
            assert_eq!(command.as_str(), text);
            assert_eq!(Command::parse(text), Some(command));
        }
    }

    #[test]
    fn encodings_are_distinct_per_command() {
        assert_eq!(Command::MeasureVoltage.encoding(), Encoding::ScientificNotation);
        assert_eq!(Command::ReadVoltage.encoding(), Encoding::KeyValue);
        assert_eq!(Command::MeasureAll.encoding(), Encoding::CommaSeparated);
        assert_eq!(Command::MeasureNoisy.encoding(), Encoding::MultiLineBurst);
    }
}
