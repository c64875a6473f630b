use crate::Joint;
use thiserror::Error;

/// Inverse kinematics failures. None of these mutate controller state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IkError {
    /// Target lies outside the annulus the two links can reach.
    #[error("Target out of reach: distance {distance:.2} mm outside [{min_reach:.2}, {max_reach:.2}] mm")]
    OutOfReach {
        distance: f64,
        min_reach: f64,
        max_reach: f64,
    },

    /// Target sits on the shoulder origin, so no azimuth or elevation is defined.
    #[error("Degenerate target: ({x:.2}, {y:.2}, {z:.2}) coincides with the shoulder origin")]
    DegenerateTarget { x: f64, y: f64, z: f64 },
}

/// Errors returned by [`crate::ArmController`] operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArmError {
    #[error(transparent)]
    Ik(#[from] IkError),

    #[error("Joint {joint} angle {angle:.1} outside limits [{min:.1}, {max:.1}]")]
    AngleOutOfRange {
        joint: Joint,
        angle: f64,
        min: f64,
        max: f64,
    },
}

/// Serial transport failures. Always non-fatal: the controller keeps its
/// state and the caller decides whether to reconnect.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No connection is open, the command was computed but not sent.
    #[error("Transport unavailable: no serial connection")]
    Unavailable,

    #[error("Failed to open serial port {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// A write failed mid-session; the session is now disconnected.
    #[error("Serial write failed: {0}")]
    WriteFailed(#[from] std::io::Error),
}

/// Errors parsing an operator command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Expected on/off, got '{0}'")]
    InvalidSwitch(String),

    #[error("{0}")]
    InvalidJoint(String),
}
