//! Arm controller: the single owner of the arm's joint and accessory state.
//!
//! Every motion request goes through the same pipeline:
//! limits -> store -> forward kinematics -> calibration -> encode -> send.
//! A send that fails never undoes the state change; the report carries the
//! transport outcome so the caller can warn or reconnect.

use crate::types::{
    Accessory, AccessoryState, ArmConfig, ArmError, ArmStatus, CartesianPose, Joint, JointAngles,
    LimitPolicy, LinkState, SerialConfig, TransportError, NUM_JOINTS,
};
use crate::utils::{
    ArmKinematics, CalibrationMapper, MachineCommand, SendResult, SystemSerial, TransportSession,
};
use tracing::{debug, info, warn};

/// Outcome of a motion request.
#[derive(Debug)]
pub struct MotionReport {
    /// Angles now held by the controller, after limits and rounding.
    pub joint_angles: JointAngles,
    /// Forward kinematics of `joint_angles`.
    pub pose: CartesianPose,
    /// Joints whose requested angle was clamped into range.
    pub limited: [bool; NUM_JOINTS],
    pub command: MachineCommand,
    pub send: SendResult,
}

impl MotionReport {
    pub fn any_limited(&self) -> bool {
        self.limited.iter().any(|&l| l)
    }
}

pub struct ArmController {
    config: ArmConfig,
    kinematics: ArmKinematics,
    calibration: CalibrationMapper,
    transport: TransportSession,
    joint_angles: JointAngles,
    accessories: AccessoryState,
    last_command: Option<MachineCommand>,
}

impl ArmController {
    /// Controller at the neutral pose with both accessories off.
    ///
    /// Fails if `config` does not pass [`ArmConfig::validate`]. Nothing is
    /// sent until the first request (or [`ArmController::sync`]).
    pub fn new(config: ArmConfig, transport: TransportSession) -> eyre::Result<Self> {
        let calibration = CalibrationMapper::from_config(&config)?;
        let kinematics = ArmKinematics::new(config.geometry);
        let joint_angles = JointAngles::uniform(config.neutral_angle_deg);

        Ok(Self {
            config,
            kinematics,
            calibration,
            transport,
            joint_angles,
            accessories: AccessoryState::default(),
            last_command: None,
        })
    }

    /// Controller talking to the OS serial port named in the config.
    /// The port is not opened until [`ArmController::connect`].
    pub fn with_system_serial(config: ArmConfig) -> eyre::Result<Self> {
        let transport = TransportSession::new(Box::new(SystemSerial), config.serial.clone());
        Self::new(config, transport)
    }

    pub fn kinematics(&self) -> &ArmKinematics {
        &self.kinematics
    }

    pub fn joint_angles(&self) -> JointAngles {
        self.joint_angles
    }

    pub fn accessories(&self) -> AccessoryState {
        self.accessories
    }

    pub fn pose(&self) -> CartesianPose {
        self.kinematics.forward(&self.joint_angles)
    }

    pub fn link_state(&self) -> LinkState {
        self.transport.state()
    }

    pub fn last_command(&self) -> Option<&MachineCommand> {
        self.last_command.as_ref()
    }

    /// (Re)open the configured serial port.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        self.transport.reconnect()
    }

    /// Open a different port, remembering it for later reconnects.
    pub fn connect_to(&mut self, port: &str, baud_rate: u32) -> Result<(), TransportError> {
        self.transport.open(port, baud_rate)
    }

    /// Port and baud rate used by the next [`ArmController::connect`].
    pub fn link_settings(&self) -> &SerialConfig {
        self.transport.settings()
    }

    pub fn disconnect(&mut self) {
        self.transport.close();
    }

    /// Move all six joints.
    pub fn set_joint_angles(&mut self, angles: JointAngles) -> Result<MotionReport, ArmError> {
        let (angles, limited) = self.apply_limits(&angles)?;
        Ok(self.commit(angles, limited))
    }

    /// Move one joint, the others hold.
    pub fn set_joint(&mut self, joint: Joint, angle_deg: f64) -> Result<MotionReport, ArmError> {
        self.set_joint_angles(self.joint_angles.with(joint, angle_deg))
    }

    /// Move the end effector to `target` through inverse kinematics.
    ///
    /// On an IK or limit failure nothing changes and nothing is sent. The
    /// reported pose is the forward kinematics of the rounded angles actually
    /// sent, so it shows the actuator quantization rather than echoing
    /// `target`.
    pub fn set_target_pose(&mut self, target: CartesianPose) -> Result<MotionReport, ArmError> {
        let solution = self.kinematics.inverse(&target).map_err(|e| {
            warn!("IK failed for ({:.2}, {:.2}, {:.2}): {}", target.x, target.y, target.z, e);
            e
        })?;
        debug!(
            "IK solution: base {:.3}, shoulder {:.3}, elbow {:.3}",
            solution.base_deg, solution.shoulder_deg, solution.elbow_deg
        );

        let report = self.set_joint_angles(solution.apply_to(&self.joint_angles))?;
        info!(
            "Moved to {} ({:.2} mm from target)",
            report.pose,
            report.pose.distance_to(&target)
        );
        Ok(report)
    }

    /// Switch an accessory and resend the full command.
    pub fn set_accessory(&mut self, accessory: Accessory, enabled: bool) -> SendResult {
        self.accessories.set(accessory, enabled);
        info!("{} {}", accessory, if enabled { "on" } else { "off" });
        self.transmit().1
    }

    /// All joints to the neutral angle.
    pub fn reset(&mut self) -> MotionReport {
        info!("Resetting all joints to {:.0}°", self.config.neutral_angle_deg);

        // Neutral is checked against every range by ArmConfig::validate
        let mut limited = [false; NUM_JOINTS];
        let mut angles = JointAngles::uniform(self.config.neutral_angle_deg);
        for joint in Joint::ALL {
            let limits = self.config.joint(joint);
            let requested = angles.get(joint);
            angles.set(joint, limits.clamp(requested));
            limited[joint.index()] = angles.get(joint) != requested;
        }

        self.commit(angles, limited)
    }

    /// Resend the current state unchanged.
    pub fn sync(&mut self) -> SendResult {
        self.transmit().1
    }

    pub fn status(&self) -> ArmStatus {
        ArmStatus {
            joint_angles: self.joint_angles,
            end_effector: self.pose(),
            accessories: self.accessories,
            link_state: self.transport.state(),
            port: self.transport.settings().port.clone(),
            last_command: self.last_command.map(|c| c.to_string()),
        }
    }

    /// Apply the configured limit policy to every joint.
    ///
    /// Non-finite angles are always rejected; there is nothing to clamp them to.
    fn apply_limits(
        &self,
        angles: &JointAngles,
    ) -> Result<(JointAngles, [bool; NUM_JOINTS]), ArmError> {
        let mut limited = [false; NUM_JOINTS];
        let mut out = *angles;

        for joint in Joint::ALL {
            let limits = self.config.joint(joint);
            let angle = angles.get(joint);

            if limits.contains(angle) {
                continue;
            }

            let out_of_range = ArmError::AngleOutOfRange {
                joint,
                angle,
                min: limits.min_angle,
                max: limits.max_angle,
            };

            if !angle.is_finite() || self.config.limit_policy == LimitPolicy::Reject {
                warn!("{}", out_of_range);
                return Err(out_of_range);
            }

            let clamped = limits.clamp(angle);
            warn!("Joint {} angle {:.1} clamped to {:.1}", joint, angle, clamped);
            out.set(joint, clamped);
            limited[joint.index()] = true;
        }

        Ok((out, limited))
    }

    fn commit(&mut self, angles: JointAngles, limited: [bool; NUM_JOINTS]) -> MotionReport {
        self.joint_angles = angles;
        let pose = self.pose();
        debug!("{}", pose);

        let (command, send) = self.transmit();

        MotionReport {
            joint_angles: angles,
            pose,
            limited,
            command,
            send,
        }
    }

    fn transmit(&mut self) -> (MachineCommand, SendResult) {
        let command = MachineCommand::new(
            self.calibration.calibrate(&self.joint_angles),
            self.accessories,
        );
        self.last_command = Some(command);

        let send = self.transport.send(&command.encode());
        match &send {
            Ok(_) => debug!("Sent to arm: {}", command),
            Err(TransportError::Unavailable) => debug!("Not connected, computed: {}", command),
            Err(e) => warn!("Failed to send {}: {}", command, e),
        }

        (command, send)
    }
}
