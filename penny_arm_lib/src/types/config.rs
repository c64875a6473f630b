use crate::{Joint, LinkGeometry, NUM_JOINTS};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmConfig {
    pub name: String,
    /// Angle every joint returns to on reset.
    #[serde(default = "default_neutral_angle")]
    pub neutral_angle_deg: f64,
    #[serde(default)]
    pub limit_policy: LimitPolicy,
    pub serial: SerialConfig,
    pub geometry: LinkGeometry,
    pub joints: Vec<JointConfig>,
}

/// What to do with a joint angle outside its configured range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Clamp into range and log a warning.
    #[default]
    Clamp,
    /// Refuse the whole command, leaving state unchanged.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound on a single blocking write.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause after opening the port while the microcontroller reboots.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointConfig {
    pub name: Joint,
    pub min_angle: f64,
    pub max_angle: f64,
    /// Added to the joint angle to get the servo command.
    #[serde(default)]
    pub offset: f64,
    /// Servo mounted mirrored: command is `180 - angle`.
    #[serde(default)]
    pub inverted: bool,
}

fn default_neutral_angle() -> f64 {
    90.0
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    2000
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl JointConfig {
    pub fn new(name: Joint, min_angle: f64, max_angle: f64) -> Self {
        Self {
            name,
            min_angle,
            max_angle,
            offset: 0.0,
            inverted: false,
        }
    }

    pub fn contains(&self, angle_deg: f64) -> bool {
        angle_deg >= self.min_angle && angle_deg <= self.max_angle
    }

    /// Nearest in-range angle. A reversed range yields `max_angle` rather
    /// than panicking like `f64::clamp`.
    pub fn clamp(&self, angle_deg: f64) -> f64 {
        angle_deg.max(self.min_angle).min(self.max_angle)
    }
}

impl Default for ArmConfig {
    fn default() -> Self {
        let mut shoulder = JointConfig::new(Joint::Shoulder, 0.0, 180.0);
        shoulder.offset = 55.0;
        let mut elbow = JointConfig::new(Joint::Elbow, 0.0, 180.0);
        elbow.inverted = true;

        Self {
            name: "penny".to_string(),
            neutral_angle_deg: default_neutral_angle(),
            limit_policy: LimitPolicy::Clamp,
            serial: SerialConfig::default(),
            geometry: LinkGeometry::default(),
            joints: vec![
                JointConfig::new(Joint::Base, 0.0, 180.0),
                shoulder,
                elbow,
                JointConfig::new(Joint::WristRoll, 0.0, 180.0),
                JointConfig::new(Joint::WristPitch, 0.0, 180.0),
                JointConfig::new(Joint::Gripper, 0.0, 90.0),
            ],
        }
    }
}

impl ArmConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ArmConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn joint(&self, joint: Joint) -> &JointConfig {
        &self.joints[joint.index()]
    }

    pub fn validate(&self) -> Result<()> {
        if self.joints.len() != NUM_JOINTS {
            return Err(eyre::eyre!(
                "Joint count ({}) doesn't match DOF ({})",
                self.joints.len(),
                NUM_JOINTS
            ));
        }

        for (expected, joint) in Joint::ALL.iter().zip(&self.joints) {
            if joint.name != *expected {
                return Err(eyre::eyre!(
                    "Joint entry '{}' found where '{}' was expected",
                    joint.name,
                    expected
                ));
            }

            if joint.min_angle.partial_cmp(&joint.max_angle) != Some(Ordering::Less) {
                return Err(eyre::eyre!(
                    "Joint {} has empty range [{}, {}]",
                    joint.name,
                    joint.min_angle,
                    joint.max_angle
                ));
            }

            if !joint.contains(self.neutral_angle_deg) {
                return Err(eyre::eyre!(
                    "Neutral angle {} outside joint {} range [{}, {}]",
                    self.neutral_angle_deg,
                    joint.name,
                    joint.min_angle,
                    joint.max_angle
                ));
            }
        }

        let positive = |len: f64| len.partial_cmp(&0.0) == Some(Ordering::Greater);
        if !(positive(self.geometry.l1_mm) && positive(self.geometry.l2_mm)) {
            return Err(eyre::eyre!(
                "Link lengths must be positive (L1 = {}, L2 = {})",
                self.geometry.l1_mm,
                self.geometry.l2_mm
            ));
        }

        if self.serial.baud_rate == 0 {
            return Err(eyre::eyre!("Baud rate must be non-zero"));
        }

        Ok(())
    }
}
