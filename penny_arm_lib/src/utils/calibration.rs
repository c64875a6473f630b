//! Mapping between joint angles and servo commands.
//!
//! Each servo is mounted with its own zero and direction. A joint angle is
//! clamped to the joint's range, mirrored about the servo span if the servo
//! is mounted inverted, then shifted by the joint offset. With the default
//! calibration only the shoulder (`+55`) and the elbow (`180 - angle`) differ
//! from identity.

use crate::types::{ArmConfig, Joint, JointAngles, JointConfig, NUM_JOINTS};
use eyre::Result;

/// Full travel of a hobby servo, the pivot for inverted mounts.
pub const SERVO_SPAN_DEG: f64 = 180.0;

/// Calibration for a single servo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoCalibration {
    pub min_angle: f64,
    pub max_angle: f64,
    pub offset: f64,
    pub inverted: bool,
}

impl From<&JointConfig> for ServoCalibration {
    fn from(joint: &JointConfig) -> Self {
        Self {
            min_angle: joint.min_angle,
            max_angle: joint.max_angle,
            offset: joint.offset,
            inverted: joint.inverted,
        }
    }
}

impl ServoCalibration {
    /// Servo command for a joint angle. Never fails: out-of-range angles are
    /// clamped first.
    pub fn calibrate(&self, angle_deg: f64) -> i32 {
        // max/min rather than f64::clamp, which panics on a reversed range
        let angle = angle_deg.max(self.min_angle).min(self.max_angle);
        let servo = if self.inverted {
            SERVO_SPAN_DEG - angle
        } else {
            angle
        };
        (servo + self.offset).round() as i32
    }

    /// Joint angle for a servo command.
    pub fn decalibrate(&self, servo: i32) -> f64 {
        let servo = servo as f64 - self.offset;
        if self.inverted {
            SERVO_SPAN_DEG - servo
        } else {
            servo
        }
    }
}

/// Calibration for the whole arm, in wire order.
#[derive(Debug, Clone)]
pub struct CalibrationMapper {
    servos: [ServoCalibration; NUM_JOINTS],
}

impl CalibrationMapper {
    /// Per-joint calibration from a config, which must validate.
    pub fn from_config(config: &ArmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            servos: Joint::ALL.map(|joint| ServoCalibration::from(config.joint(joint))),
        })
    }

    pub fn servo(&self, joint: Joint) -> &ServoCalibration {
        &self.servos[joint.index()]
    }

    pub fn calibrate(&self, angles: &JointAngles) -> [i32; NUM_JOINTS] {
        Joint::ALL.map(|joint| self.servo(joint).calibrate(angles.get(joint)))
    }

    pub fn decalibrate(&self, servos: &[i32; NUM_JOINTS]) -> JointAngles {
        JointAngles::new(Joint::ALL.map(|joint| self.servo(joint).decalibrate(servos[joint.index()])))
    }
}
