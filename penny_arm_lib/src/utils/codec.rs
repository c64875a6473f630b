// Line protocol understood by the arm's microcontroller:
//
//   base,shoulder,elbow,wrist_roll,wrist_pitch,gripper,brush,pump\n
//
// Eight comma-separated integers, servo values already calibrated,
// accessories as 0/1. No checksum, the receiver splits on commas.

use crate::types::{AccessoryState, NUM_JOINTS};
use std::fmt;

/// Exact frame sent to the hardware. Built fresh for every send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineCommand {
    pub servos: [i32; NUM_JOINTS],
    pub accessories: AccessoryState,
}

impl MachineCommand {
    pub fn new(servos: [i32; NUM_JOINTS], accessories: AccessoryState) -> Self {
        Self {
            servos,
            accessories,
        }
    }

    /// Wire bytes, including the trailing newline.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.to_string();
        line.push('\n');
        line.into_bytes()
    }
}

impl fmt::Display for MachineCommand {
    /// The line without its terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for servo in &self.servos {
            write!(f, "{},", servo)?;
        }
        write!(
            f,
            "{},{}",
            u8::from(self.accessories.brush),
            u8::from(self.accessories.pump)
        )
    }
}
