// Planar two-link kinematics on a rotating base

use crate::types::{CartesianPose, IkError, Joint, JointAngles};
use serde::{Deserialize, Serialize};

/// Distances below this are treated as zero when deciding degeneracy (mm).
const DEGENERATE_EPSILON_MM: f64 = 1e-9;

/// Slack on the reach limits so targets computed exactly on the boundary
/// are not rejected over floating-point noise (mm).
const REACH_EPSILON_MM: f64 = 1e-6;

/// Link lengths of the two main links (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub l1_mm: f64, // shoulder -> elbow
    pub l2_mm: f64, // elbow -> end effector
}

impl Default for LinkGeometry {
    fn default() -> Self {
        Self {
            l1_mm: 120.0,
            l2_mm: 220.0,
        }
    }
}

impl LinkGeometry {
    pub fn new(l1_mm: f64, l2_mm: f64) -> Self {
        Self { l1_mm, l2_mm }
    }

    /// Fully extended reach.
    pub fn max_reach(&self) -> f64 {
        self.l1_mm + self.l2_mm
    }

    /// Radius of the hole in the workspace when the elbow is fully folded.
    pub fn min_reach(&self) -> f64 {
        (self.l1_mm - self.l2_mm).abs()
    }
}

/// Result of an inverse kinematics solve, in continuous degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSolution {
    pub base_deg: f64,
    pub shoulder_deg: f64,
    /// Absolute elbow angle (shoulder + relative elbow).
    pub elbow_deg: f64,
}

impl IkSolution {
    /// Quantize to whole degrees and merge into `current`.
    ///
    /// Only base, shoulder and elbow are written; the wrist and gripper keep
    /// their current values.
    pub fn apply_to(&self, current: &JointAngles) -> JointAngles {
        current
            .with(Joint::Base, self.base_deg.round())
            .with(Joint::Shoulder, self.shoulder_deg.round())
            .with(Joint::Elbow, self.elbow_deg.round())
    }
}

/// Forward and inverse kinematics for the arm.
///
/// Angles are absolute from the horizontal: the shoulder angle is the first
/// link's elevation, the elbow angle the second link's elevation. The base
/// angle is the azimuth of the vertical plane both links move in.
#[derive(Debug, Clone)]
pub struct ArmKinematics {
    geometry: LinkGeometry,
}

impl ArmKinematics {
    pub fn new(geometry: LinkGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &LinkGeometry {
        &self.geometry
    }

    /// End effector position for the given joint angles.
    ///
    /// Total: any angle triple maps to a point, plausible or not. Wrist and
    /// gripper do not move the end effector.
    pub fn forward(&self, angles: &JointAngles) -> CartesianPose {
        let theta0 = angles.get(Joint::Base).to_radians();
        let theta1 = angles.get(Joint::Shoulder).to_radians();
        let theta2 = angles.get(Joint::Elbow).to_radians();

        let l1 = self.geometry.l1_mm;
        let l2 = self.geometry.l2_mm;

        let reach = l1 * theta1.cos() + l2 * theta2.cos();

        CartesianPose {
            x: reach * theta0.cos(),
            y: reach * theta0.sin(),
            z: l1 * theta1.sin() + l2 * theta2.sin(),
        }
    }

    /// Joint angles placing the end effector at `target`.
    ///
    /// Only the elbow-down branch is computed: the relative elbow angle comes
    /// from `acos` and is always in `[0, π]`. The mirrored configuration is
    /// never returned.
    ///
    /// A target on the base axis (`x = y = 0`) has no azimuth; the base angle
    /// is then 0.
    ///
    /// Targets inside the inner radius `|L1 - L2|` are refused with
    /// [`IkError::OutOfReach`] too. This is stricter than an outer-only
    /// `L1 + L2` check, which would answer them with the fully folded pose
    /// and miss the target.
    pub fn inverse(&self, target: &CartesianPose) -> Result<IkSolution, IkError> {
        let l1 = self.geometry.l1_mm;
        let l2 = self.geometry.l2_mm;

        // Project into the vertical plane through the target
        let r = target.x.hypot(target.y);
        let z = target.z;
        let dist = r.hypot(z);

        if dist < DEGENERATE_EPSILON_MM {
            return Err(IkError::DegenerateTarget {
                x: target.x,
                y: target.y,
                z: target.z,
            });
        }

        if dist > self.geometry.max_reach() + REACH_EPSILON_MM
            || dist < self.geometry.min_reach() - REACH_EPSILON_MM
        {
            return Err(IkError::OutOfReach {
                distance: dist,
                min_reach: self.geometry.min_reach(),
                max_reach: self.geometry.max_reach(),
            });
        }

        let theta0 = if r < DEGENERATE_EPSILON_MM {
            0.0
        } else {
            target.y.atan2(target.x)
        };

        // Law of cosines for the relative elbow angle. Clamped so targets on
        // the reach boundary survive rounding in the squares.
        let cos_theta2_rel = ((r * r + z * z - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
        let theta2_rel = cos_theta2_rel.acos();

        let phi = z.atan2(r);
        let beta = (l2 * theta2_rel.sin()).atan2(l1 + l2 * theta2_rel.cos());
        let theta1 = phi - beta;
        let theta2 = theta1 + theta2_rel;

        Ok(IkSolution {
            base_deg: theta0.to_degrees(),
            shoulder_deg: theta1.to_degrees(),
            elbow_deg: theta2.to_degrees(),
        })
    }
}
