//! Operator commands
//!
//! Everything the control panel can ask for, as one enum. The station
//! dispatches it with a single exhaustive `match`, so a new command cannot
//! be added without deciding what the station does with it.
//!
//! Numeric values travel as the text the operator typed. Parsing happens at
//! dispatch, where a bad value is rejected and the old one kept.
//!
//! ## Text form
//!
//! The binary reads commands from stdin, one per line:
//!
//! ```text
//! slope <ch> <value>          intercept <ch> <value>      tare <ch>
//! geometry <field> <value>    record-interval <seconds>
//! record <path>               stop-record
//! start-control               stop-control
//! mode idle|creep|monotonic|cyclic
//! param <row> <col> <value>   volts <value>               quit
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use triax_core::{Channel, ControlMode, GeometryField, InputError};

/// A control-panel request
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Edit a channel's calibration slope
    SetSlope {
        /// Channel to edit
        channel: Channel,
        /// New slope as typed
        text: String,
    },
    /// Edit a channel's calibration intercept
    SetIntercept {
        /// Channel to edit
        channel: Channel,
        /// New intercept as typed
        text: String,
    },
    /// Zero a channel at its current reading
    Tare {
        /// Channel to zero
        channel: Channel,
    },
    /// Edit a specimen base dimension
    SetGeometry {
        /// Dimension to edit
        field: GeometryField,
        /// New value as typed
        text: String,
    },
    /// Edit the CSV row period (s)
    SetRecordInterval {
        /// New period as typed
        text: String,
    },
    /// Create the log file, write the header and start recording
    StartRecording {
        /// Log file, truncated if it exists
        path: PathBuf,
    },
    /// Stop writing rows
    StopRecording,
    /// Begin control ticks
    StartControl,
    /// Stop control ticks, holding the code
    StopControl,
    /// Choose the control mode
    SelectMode(ControlMode),
    /// Edit one cell of the control parameter table
    SetControlParameter {
        /// Parameter row (0..6)
        row: usize,
        /// Mode column (0..4)
        col: usize,
        /// New value as typed
        text: String,
    },
    /// Drive the actuator to a voltage now
    SetActuatorVoltage {
        /// Voltage as typed
        text: String,
    },
    /// Stop the station
    Shutdown,
}

/// What happened to a dispatched command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied
    Applied,
    /// Input rejected; the previous value is still in effect
    Rejected(InputError),
    /// Station should stop
    Shutdown,
}

/// Line that does not name a known command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    /// Blank line
    #[error("empty command")]
    Empty,
    /// First word is not a command
    #[error("unknown command '{0}'")]
    Unknown(String),
    /// Known command, wrong arguments
    #[error("'{command}' expects: {usage}")]
    Usage {
        /// Command word
        command: String,
        /// Expected form
        usage: &'static str,
    },
}

fn parse_channel(word: &str) -> Option<Channel> {
    word.parse::<usize>().ok().and_then(Channel::from_index)
}

fn parse_mode(word: &str) -> Option<ControlMode> {
    match word {
        "idle" | "0" => Some(ControlMode::Idle),
        "creep" | "1" => Some(ControlMode::Creep),
        "monotonic" | "2" => Some(ControlMode::Monotonic),
        "cyclic" | "3" => Some(ControlMode::Cyclic),
        _ => None,
    }
}

fn parse_geometry_field(word: &str) -> Option<GeometryField> {
    match word {
        "height" => Some(GeometryField::Height),
        "diameter" => Some(GeometryField::Diameter),
        "tank-diameter" | "drain_tank_diameter" => Some(GeometryField::DrainTankDiameter),
        "density" | "grain_density" => Some(GeometryField::GrainDensity),
        _ => None,
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (&name, args) = words.split_first().ok_or(ParseCommandError::Empty)?;

        let usage = |usage: &'static str| ParseCommandError::Usage { command: name.to_string(), usage };

        let command = match (name, args) {
            ("slope", [ch, value]) => Command::SetSlope {
                channel: parse_channel(ch).ok_or_else(|| usage("slope <0-3> <value>"))?,
                text: value.to_string(),
            },
            ("intercept", [ch, value]) => Command::SetIntercept {
                channel: parse_channel(ch).ok_or_else(|| usage("intercept <0-3> <value>"))?,
                text: value.to_string(),
            },
            ("tare", [ch]) => Command::Tare {
                channel: parse_channel(ch).ok_or_else(|| usage("tare <0-3>"))?,
            },
            ("geometry", [field, value]) => Command::SetGeometry {
                field: parse_geometry_field(field)
                    .ok_or_else(|| usage("geometry height|diameter|tank-diameter|density <value>"))?,
                text: value.to_string(),
            },
            ("record-interval", [value]) => Command::SetRecordInterval { text: value.to_string() },
            ("record", [path]) => Command::StartRecording { path: PathBuf::from(*path) },
            ("stop-record", []) => Command::StopRecording,
            ("start-control", []) => Command::StartControl,
            ("stop-control", []) => Command::StopControl,
            ("mode", [mode]) => Command::SelectMode(
                parse_mode(mode).ok_or_else(|| usage("mode idle|creep|monotonic|cyclic"))?,
            ),
            ("param", [row, col, value]) => {
                let row = row.parse().map_err(|_| usage("param <row> <col> <value>"))?;
                let col = col.parse().map_err(|_| usage("param <row> <col> <value>"))?;
                Command::SetControlParameter { row, col, text: value.to_string() }
            }
            ("volts", [value]) => Command::SetActuatorVoltage { text: value.to_string() },
            ("quit" | "exit" | "shutdown", []) => Command::Shutdown,
            (
                "slope" | "intercept" | "tare" | "geometry" | "record-interval" | "record"
                | "stop-record" | "start-control" | "stop-control" | "mode" | "param" | "volts"
                | "quit" | "exit" | "shutdown",
                _,
            ) => return Err(usage("see the command list")),
            _ => return Err(ParseCommandError::Unknown(name.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_panel_lines() {
        assert_eq!(
            "slope 2 1.5".parse(),
            Ok(Command::SetSlope { channel: Channel::TankLoad, text: "1.5".into() })
        );
        assert_eq!("tare 0".parse(), Ok(Command::Tare { channel: Channel::AxialLoad }));
        assert_eq!("mode creep".parse(), Ok(Command::SelectMode(ControlMode::Creep)));
        assert_eq!(
            "param 5 1 10".parse(),
            Ok(Command::SetControlParameter { row: 5, col: 1, text: "10".into() })
        );
        assert_eq!(
            "geometry diameter 100".parse(),
            Ok(Command::SetGeometry { field: GeometryField::Diameter, text: "100".into() })
        );
        assert_eq!("quit".parse(), Ok(Command::Shutdown));
    }

    #[test]
    fn value_text_is_not_checked_here() {
        assert_eq!(
            "volts abc".parse(),
            Ok(Command::SetActuatorVoltage { text: "abc".into() })
        );
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert!(matches!("jump".parse::<Command>(), Err(ParseCommandError::Unknown(_))));
        assert!(matches!("tare 7".parse::<Command>(), Err(ParseCommandError::Usage { .. })));
        assert!(matches!("mode".parse::<Command>(), Err(ParseCommandError::Usage { .. })));
    }
}
