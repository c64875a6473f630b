//! End-to-end tests of ArmController against an in-memory serial port.

use penny_arm_lib::{
    Accessory, ArmConfig, ArmController, ArmError, CartesianPose, IkError, Joint, JointAngles,
    LimitPolicy, LinkState, SerialConfig, SerialConnector, TransportError, TransportSession,
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockPort {
    written: Mutex<Vec<u8>>,
    absent: AtomicBool,
    stalled: AtomicBool,
}

impl MockPort {
    fn lines(&self) -> Vec<String> {
        let written = self.written.lock().unwrap();
        String::from_utf8(written.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn last_fields(&self) -> Vec<i32> {
        self.lines()
            .last()
            .expect("nothing written")
            .split(',')
            .map(|f| f.parse().unwrap())
            .collect()
    }
}

struct MockLink(Arc<MockPort>);

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.0.stalled.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }
        self.0.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct MockConnector(Arc<MockPort>);

impl SerialConnector for MockConnector {
    fn connect(&self, settings: &SerialConfig) -> Result<Box<dyn Write + Send>, TransportError> {
        if self.0.absent.load(Ordering::SeqCst) {
            return Err(TransportError::OpenFailed {
                port: settings.port.clone(),
                reason: "device not found".to_string(),
            });
        }
        Ok(Box::new(MockLink(self.0.clone())))
    }
}

fn mock_session(port: &Arc<MockPort>, settings: &SerialConfig) -> TransportSession {
    let settings = SerialConfig {
        settle_ms: 0,
        ..settings.clone()
    };
    TransportSession::new(Box::new(MockConnector(port.clone())), settings)
}

fn controller_with(config: ArmConfig) -> (ArmController, Arc<MockPort>) {
    let port = Arc::new(MockPort::default());
    let transport = mock_session(&port, &config.serial);
    let mut controller = ArmController::new(config, transport).unwrap();
    controller.connect().unwrap();
    (controller, port)
}

fn controller() -> (ArmController, Arc<MockPort>) {
    controller_with(ArmConfig::default())
}

#[test]
fn test_set_joint_angles_sends_calibrated_line() {
    let (mut arm, port) = controller();
    let report = arm
        .set_joint_angles(JointAngles::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0]))
        .unwrap();

    assert_eq!(*report.send.as_ref().unwrap(), "10,75,150,40,50,60,0,0\n".len());
    assert_eq!(port.lines(), ["10,75,150,40,50,60,0,0"]);
    assert_eq!(report.pose, arm.kinematics().forward(&report.joint_angles));
    assert!(!report.any_limited());
}

#[test]
fn test_target_pose_end_to_end() {
    let (mut arm, port) = controller();
    let target = CartesianPose::new(150.0, 0.0, 100.0);

    let solution = arm.kinematics().inverse(&target).unwrap();
    assert_eq!(solution.base_deg, 0.0);
    let expected_rel = ((150.0_f64.powi(2) + 100.0_f64.powi(2) - 120.0_f64.powi(2) - 220.0_f64.powi(2))
        / (2.0 * 120.0 * 220.0))
        .acos()
        .to_degrees();
    assert!((solution.elbow_deg - solution.shoulder_deg - expected_rel).abs() < 1e-9);

    let report = arm.set_target_pose(target).unwrap();
    let fields = port.last_fields();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], 0);
    assert_eq!(fields[2], 180 - solution.elbow_deg.round() as i32);
    assert_eq!(fields[2], 113);

    // The shoulder solution is below horizontal and gets clamped to 0
    assert!(report.limited[Joint::Shoulder.index()]);
    assert_eq!(fields[1], 55);

    // Reported pose reflects the angles actually sent
    assert_eq!(report.pose, arm.kinematics().forward(&arm.joint_angles()));
}

#[test]
fn test_target_pose_reports_quantized_pose() {
    let (mut arm, _port) = controller();
    let source = JointAngles::new([40.0, 30.0, 80.0, 90.0, 90.0, 90.0]);
    let target = arm.kinematics().forward(&source);

    let report = arm.set_target_pose(target).unwrap();
    assert!(!report.any_limited());
    assert!(report.pose.distance_to(&target) < 6.0);
    assert_eq!(report.joint_angles.get(Joint::Base), 40.0);
}

#[test]
fn test_unreachable_target_leaves_state_untouched() {
    let (mut arm, port) = controller();
    arm.set_joint_angles(JointAngles::new([30.0, 60.0, 45.0, 90.0, 90.0, 10.0]))
        .unwrap();
    let before = arm.joint_angles();
    let sent_before = port.lines().len();

    let err = arm
        .set_target_pose(CartesianPose::new(1000.0, 0.0, 0.0))
        .unwrap_err();

    assert!(matches!(err, ArmError::Ik(IkError::OutOfReach { .. })));
    assert_eq!(arm.joint_angles(), before);
    assert_eq!(port.lines().len(), sent_before);
}

#[test]
fn test_ik_keeps_wrist_and_gripper() {
    let (mut arm, _port) = controller();
    arm.set_joint_angles(JointAngles::new([90.0, 90.0, 90.0, 12.0, 34.0, 56.0]))
        .unwrap();
    let report = arm.set_target_pose(CartesianPose::new(200.0, 100.0, 50.0)).unwrap();
    assert_eq!(report.joint_angles.get(Joint::WristRoll), 12.0);
    assert_eq!(report.joint_angles.get(Joint::WristPitch), 34.0);
    assert_eq!(report.joint_angles.get(Joint::Gripper), 56.0);
}

#[test]
fn test_clamp_boundaries() {
    let (mut arm, _port) = controller();

    let report = arm
        .set_joint_angles(JointAngles::new([0.0, 180.0, 0.0, 180.0, 0.0, 90.0]))
        .unwrap();
    assert!(!report.any_limited());
    assert_eq!(report.joint_angles.0, [0.0, 180.0, 0.0, 180.0, 0.0, 90.0]);

    let report = arm
        .set_joint_angles(JointAngles::new([181.0, 90.0, 90.0, 90.0, 90.0, 91.0]))
        .unwrap();
    assert_eq!(report.joint_angles.get(Joint::Base), 180.0);
    assert_eq!(report.joint_angles.get(Joint::Gripper), 90.0);
    assert!(report.limited[Joint::Base.index()]);
    assert!(report.limited[Joint::Gripper.index()]);
    assert!(!report.limited[Joint::Shoulder.index()]);
}

#[test]
fn test_reject_policy_refuses_out_of_range() {
    let config = ArmConfig {
        limit_policy: LimitPolicy::Reject,
        ..ArmConfig::default()
    };
    let (mut arm, port) = controller_with(config);
    let before = arm.joint_angles();

    let err = arm.set_joint(Joint::Gripper, 91.0).unwrap_err();
    assert_eq!(
        err,
        ArmError::AngleOutOfRange {
            joint: Joint::Gripper,
            angle: 91.0,
            min: 0.0,
            max: 90.0
        }
    );
    assert_eq!(arm.joint_angles(), before);
    assert!(port.lines().is_empty());

    // Exactly at the limit is fine
    arm.set_joint(Joint::Gripper, 90.0).unwrap();
}

#[test]
fn test_reject_policy_applies_to_ik_results() {
    let config = ArmConfig {
        limit_policy: LimitPolicy::Reject,
        ..ArmConfig::default()
    };
    let (mut arm, port) = controller_with(config);
    let before = arm.joint_angles();

    // Reachable, but the shoulder solution is below horizontal
    let err = arm
        .set_target_pose(CartesianPose::new(150.0, 0.0, 100.0))
        .unwrap_err();

    assert!(matches!(
        err,
        ArmError::AngleOutOfRange {
            joint: Joint::Shoulder,
            ..
        }
    ));
    assert_eq!(arm.joint_angles(), before);
    assert!(port.lines().is_empty());
    assert!(arm.last_command().is_none());
}

#[test]
fn test_invalid_config_is_refused() {
    let port = Arc::new(MockPort::default());

    let mut short = ArmConfig::default();
    short.joints.pop();
    let transport = mock_session(&port, &short.serial);
    assert!(ArmController::new(short, transport).is_err());

    let mut reversed = ArmConfig::default();
    reversed.joints[Joint::Gripper.index()].min_angle = 90.0;
    reversed.joints[Joint::Gripper.index()].max_angle = 0.0;
    let transport = mock_session(&port, &reversed.serial);
    assert!(ArmController::new(reversed, transport).is_err());
}

#[test]
fn test_connect_to_switches_port() {
    let (mut arm, port) = controller();
    arm.connect_to("/dev/ttyUSB1", 115200).unwrap();

    assert_eq!(arm.link_state(), LinkState::Connected);
    assert_eq!(arm.link_settings().port, "/dev/ttyUSB1");
    assert_eq!(arm.link_settings().baud_rate, 115200);
    assert_eq!(arm.status().port, "/dev/ttyUSB1");

    arm.sync().unwrap();
    assert_eq!(port.lines().len(), 1);
}

#[test]
fn test_non_finite_angle_is_rejected() {
    let (mut arm, _port) = controller();
    assert!(matches!(
        arm.set_joint(Joint::Elbow, f64::NAN),
        Err(ArmError::AngleOutOfRange { .. })
    ));
    assert_eq!(arm.joint_angles(), JointAngles::uniform(90.0));
}

#[test]
fn test_accessory_resends_full_command() {
    let (mut arm, port) = controller();
    arm.reset();

    arm.set_accessory(Accessory::Brush, true).unwrap();
    arm.set_accessory(Accessory::Pump, true).unwrap();
    arm.set_accessory(Accessory::Brush, false).unwrap();

    assert_eq!(
        port.lines(),
        [
            "90,145,90,90,90,90,0,0",
            "90,145,90,90,90,90,1,0",
            "90,145,90,90,90,90,1,1",
            "90,145,90,90,90,90,0,1",
        ]
    );
    assert!(arm.accessories().pump);
    assert!(!arm.accessories().brush);
}

#[test]
fn test_reset_returns_to_neutral() {
    let (mut arm, _port) = controller();
    arm.set_joint_angles(JointAngles::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0]))
        .unwrap();

    let report = arm.reset();
    assert_eq!(arm.joint_angles(), JointAngles::uniform(90.0));
    assert_eq!(report.pose, arm.kinematics().forward(&JointAngles::uniform(90.0)));
    assert!(!report.any_limited());
}

#[test]
fn test_identical_state_sends_identical_bytes() {
    let (mut arm, port) = controller();
    let angles = JointAngles::new([33.0, 66.0, 99.0, 120.0, 150.0, 45.0]);
    arm.set_joint_angles(angles).unwrap();
    arm.sync().unwrap();
    arm.set_joint_angles(angles).unwrap();

    let lines = port.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l == &lines[0]));
}

#[test]
fn test_runs_without_hardware() {
    let port = Arc::new(MockPort::default());
    port.absent.store(true, Ordering::SeqCst);
    let transport = mock_session(&port, &SerialConfig::default());
    let mut arm = ArmController::new(ArmConfig::default(), transport).unwrap();

    assert!(arm.connect().is_err());
    assert_eq!(arm.link_state(), LinkState::Disconnected);

    let report = arm.set_target_pose(CartesianPose::new(200.0, 0.0, 150.0)).unwrap();
    assert!(matches!(report.send, Err(TransportError::Unavailable)));
    assert!(arm.last_command().is_some());
    assert!(matches!(
        arm.set_accessory(Accessory::Pump, true),
        Err(TransportError::Unavailable)
    ));
    assert!(arm.accessories().pump);
}

#[test]
fn test_stalled_write_disconnects_then_recovers() {
    let (mut arm, port) = controller();
    port.stalled.store(true, Ordering::SeqCst);

    let report = arm.set_joint(Joint::Base, 45.0).unwrap();
    assert!(matches!(report.send, Err(TransportError::WriteFailed(_))));
    assert_eq!(arm.link_state(), LinkState::Disconnected);
    // State still moved even though the hardware did not hear about it
    assert_eq!(arm.joint_angles().get(Joint::Base), 45.0);

    port.stalled.store(false, Ordering::SeqCst);
    assert!(matches!(arm.sync(), Err(TransportError::Unavailable)));

    arm.connect().unwrap();
    arm.sync().unwrap();
    assert_eq!(port.last_fields()[0], 45);
}

#[test]
fn test_status_snapshot_serializes() {
    let (mut arm, _port) = controller();
    arm.set_accessory(Accessory::Pump, true).unwrap();

    let status = arm.status();
    assert_eq!(status.link_state, LinkState::Connected);
    assert_eq!(status.last_command.as_deref(), Some("90,145,90,90,90,90,0,1"));

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["accessories"]["pump"], true);
    assert_eq!(json["link_state"], "Connected");

    arm.disconnect();
    assert_eq!(arm.status().link_state, LinkState::Disconnected);
}
