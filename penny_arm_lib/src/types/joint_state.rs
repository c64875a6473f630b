use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of actuated joints on the arm.
pub const NUM_JOINTS: usize = 6;

/// Joints in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Base,
    Shoulder,
    Elbow,
    WristRoll,
    WristPitch,
    Gripper,
}

impl Joint {
    pub const ALL: [Joint; NUM_JOINTS] = [
        Joint::Base,
        Joint::Shoulder,
        Joint::Elbow,
        Joint::WristRoll,
        Joint::WristPitch,
        Joint::Gripper,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Joint::Base => "base",
            Joint::Shoulder => "shoulder",
            Joint::Elbow => "elbow",
            Joint::WristRoll => "wrist_roll",
            Joint::WristPitch => "wrist_pitch",
            Joint::Gripper => "gripper",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .iter()
            .copied()
            .find(|joint| joint.name() == s)
            .ok_or_else(|| format!("unknown joint '{}'", s))
    }
}

/// Joint angles in degrees, indexed by [`Joint`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles(pub [f64; NUM_JOINTS]);

impl JointAngles {
    pub fn new(angles: [f64; NUM_JOINTS]) -> Self {
        Self(angles)
    }

    pub fn uniform(angle_deg: f64) -> Self {
        Self([angle_deg; NUM_JOINTS])
    }

    pub fn get(&self, joint: Joint) -> f64 {
        self.0[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, angle_deg: f64) {
        self.0[joint.index()] = angle_deg;
    }

    pub fn with(mut self, joint: Joint, angle_deg: f64) -> Self {
        self.set(joint, angle_deg);
        self
    }
}

/// End effector position in the arm base frame (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPose {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance to another pose (mm).
    pub fn distance_to(&self, other: &CartesianPose) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }
}

impl fmt::Display for CartesianPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {:.2} mm, Y: {:.2} mm, Z: {:.2} mm", self.x, self.y, self.z)
    }
}

/// Tool accessories switched alongside the joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessory {
    Brush,
    Pump,
}

impl fmt::Display for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessory::Brush => f.write_str("brush"),
            Accessory::Pump => f.write_str("pump"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryState {
    pub brush: bool,
    pub pump: bool,
}

impl AccessoryState {
    pub fn get(&self, accessory: Accessory) -> bool {
        match accessory {
            Accessory::Brush => self.brush,
            Accessory::Pump => self.pump,
        }
    }

    pub fn set(&mut self, accessory: Accessory, enabled: bool) {
        match accessory {
            Accessory::Brush => self.brush = enabled,
            Accessory::Pump => self.pump = enabled,
        }
    }
}

/// Connection state of the transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Snapshot of the controller, suitable for printing or serializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmStatus {
    pub joint_angles: JointAngles,
    pub end_effector: CartesianPose,
    pub accessories: AccessoryState,
    pub link_state: LinkState,
    pub port: String,
    pub last_command: Option<String>,
}
