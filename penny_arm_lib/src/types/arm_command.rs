use crate::{Accessory, CartesianPose, CommandParseError, Joint, JointAngles, NUM_JOINTS};
use std::str::FromStr;

/// Operator requests understood by the arm controller.
///
/// Parsed from one console line each, e.g. `joints 90 90 90 90 90 45`,
/// `joint gripper 30`, `move 150 0 100`, `pump on`, `reset`,
/// `connect /dev/ttyUSB0 115200`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmCommand {
    JointPosition { joint_angles: JointAngles },
    SingleJoint { joint: Joint, angle: f64 },
    CartesianMove { target: CartesianPose },
    SetAccessory { accessory: Accessory, enabled: bool },
    Home,
    Status,
    /// Reopen the link; with a port (and optional baud rate) switch to it.
    Connect {
        port: Option<String>,
        baud_rate: Option<u32>,
    },
    Disconnect,
    Quit,
}

fn parse_number(token: &str) -> Result<f64, CommandParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandParseError::InvalidNumber(token.to_string()))
}

fn parse_baud(token: &str) -> Result<u32, CommandParseError> {
    token
        .parse::<u32>()
        .ok()
        .filter(|&b| b > 0)
        .ok_or_else(|| CommandParseError::InvalidNumber(token.to_string()))
}

fn parse_switch(token: &str) -> Result<bool, CommandParseError> {
    match token {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        other => Err(CommandParseError::InvalidSwitch(other.to_string())),
    }
}

impl FromStr for ArmCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, args)) = tokens.split_first() else {
            return Err(CommandParseError::Empty);
        };

        let command = head.to_ascii_lowercase();
        match (command.as_str(), args) {
            ("joints", args) => {
                if args.len() != NUM_JOINTS {
                    return Err(CommandParseError::WrongArity {
                        command: "joints",
                        expected: "six angles: base shoulder elbow wrist_roll wrist_pitch gripper",
                    });
                }
                let mut angles = [0.0; NUM_JOINTS];
                for (slot, token) in angles.iter_mut().zip(args) {
                    *slot = parse_number(token)?;
                }
                Ok(ArmCommand::JointPosition {
                    joint_angles: JointAngles::new(angles),
                })
            }
            ("joint", [name, angle]) => Ok(ArmCommand::SingleJoint {
                joint: name.parse().map_err(CommandParseError::InvalidJoint)?,
                angle: parse_number(angle)?,
            }),
            ("joint", _) => Err(CommandParseError::WrongArity {
                command: "joint",
                expected: "a joint name and an angle",
            }),
            ("move", [x, y, z]) => Ok(ArmCommand::CartesianMove {
                target: CartesianPose::new(parse_number(x)?, parse_number(y)?, parse_number(z)?),
            }),
            ("move", _) => Err(CommandParseError::WrongArity {
                command: "move",
                expected: "three coordinates: x y z (mm)",
            }),
            ("brush", [state]) => Ok(ArmCommand::SetAccessory {
                accessory: Accessory::Brush,
                enabled: parse_switch(state)?,
            }),
            ("pump", [state]) => Ok(ArmCommand::SetAccessory {
                accessory: Accessory::Pump,
                enabled: parse_switch(state)?,
            }),
            ("brush", _) | ("pump", _) => Err(CommandParseError::WrongArity {
                command: "brush/pump",
                expected: "on or off",
            }),
            ("reset" | "home", []) => Ok(ArmCommand::Home),
            ("status", []) => Ok(ArmCommand::Status),
            ("connect", []) => Ok(ArmCommand::Connect {
                port: None,
                baud_rate: None,
            }),
            ("connect", [port]) => Ok(ArmCommand::Connect {
                port: Some(port.to_string()),
                baud_rate: None,
            }),
            ("connect", [port, baud]) => Ok(ArmCommand::Connect {
                port: Some(port.to_string()),
                baud_rate: Some(parse_baud(baud)?),
            }),
            ("connect", _) => Err(CommandParseError::WrongArity {
                command: "connect",
                expected: "an optional port and baud rate",
            }),
            ("disconnect", []) => Ok(ArmCommand::Disconnect),
            ("quit" | "exit", []) => Ok(ArmCommand::Quit),
            _ => Err(CommandParseError::UnknownCommand(line.trim().to_string())),
        }
    }
}
