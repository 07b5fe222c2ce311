//! A small humanoid skeleton and the animation that drives it.

use glam::{Quat, Vec3};

use crate::error::HierarchyError;
use crate::hierarchy::{Hierarchy, TransformNode};

/// Storage indices of the humanoid joints.
pub mod joint {
    pub const TORSO: usize = 0;
    pub const SHOULDER_L: usize = 1;
    pub const ELBOW_L: usize = 2;
    pub const WRIST_L: usize = 3;
    pub const SHOULDER_R: usize = 4;
    pub const ELBOW_R: usize = 5;
    pub const WRIST_R: usize = 6;
    pub const HEAD: usize = 7;
}

pub const JOINT_COUNT: usize = 8;

/// Builds the eight-joint humanoid: torso root, two three-joint arms and a head.
pub fn humanoid_rig() -> Result<Hierarchy, HierarchyError> {
    let shoulder_l = Quat::from_xyzw(0.0, 0.75, 0.0, 0.75).normalize();
    let shoulder_r = Quat::from_xyzw(0.0, -0.75, 0.0, 0.75).normalize();

    Hierarchy::new(vec![
        TransformNode::new(),
        TransformNode::new()
            .position(1.5, 0.0, 0.0)
            .rotation(shoulder_l)
            .uniform_scale(0.5)
            .parent(joint::TORSO),
        TransformNode::new()
            .position(0.0, 0.0, 2.0)
            .uniform_scale(0.4)
            .parent(joint::SHOULDER_L),
        TransformNode::new()
            .position(0.0, -5.0, 0.0)
            .parent(joint::ELBOW_L),
        TransformNode::new()
            .position(-1.5, 0.0, 0.0)
            .rotation(shoulder_r)
            .uniform_scale(0.5)
            .parent(joint::TORSO),
        TransformNode::new()
            .position(0.0, 0.0, 2.0)
            .uniform_scale(0.4)
            .parent(joint::SHOULDER_R),
        TransformNode::new()
            .position(0.0, -5.0, 0.0)
            .parent(joint::ELBOW_R),
        TransformNode::new()
            .position(0.0, 1.5, 0.0)
            .uniform_scale(0.7)
            .parent(joint::TORSO),
    ])
}

/// Time-driven joint motion for [`humanoid_rig`].
#[derive(Clone, Copy, Debug)]
pub struct RigAnimator {
    /// Radius of the torso's orbit around the origin.
    pub orbit_radius: f32,
    /// Head height range. The head sweeps from `head_low` to `head_high`
    /// and back once per `2π/3` seconds.
    pub head_low: f32,
    pub head_high: f32,
    /// Shoulder swing rate in radians per second, opposite on each side.
    pub shoulder_swing: f32,
}

impl Default for RigAnimator {
    fn default() -> Self {
        Self {
            orbit_radius: 2.0,
            head_low: 1.6,
            head_high: 2.0,
            shoulder_swing: 1.0,
        }
    }
}

impl RigAnimator {
    /// Advances the pose by `dt` seconds. Writes node fields only; call
    /// [`Hierarchy::solve`] afterwards.
    pub fn animate(&self, rig: &mut Hierarchy, time: f32, dt: f32) -> Result<(), HierarchyError> {
        {
            let mut torso = rig.node_mut(joint::TORSO)?;
            let spun = (*torso.rotation() * Quat::from_axis_angle(Vec3::NEG_Y, dt)).normalize();
            *torso.rotation() = spun;
            *torso.position() = spun * Vec3::new(self.orbit_radius, 0.0, 0.0);
        }

        let angle = dt * self.shoulder_swing;
        let swing_l = Quat::from_axis_angle(Vec3::NEG_Z, angle);
        let swing_r = Quat::from_axis_angle(Vec3::Z, angle);
        for (index, swing) in [(joint::SHOULDER_L, swing_l), (joint::SHOULDER_R, swing_r)] {
            let mut shoulder = rig.node_mut(index)?;
            let rotated = (*shoulder.rotation() * swing).normalize();
            *shoulder.rotation() = rotated;
        }

        let t = 0.5 + 0.5 * (time * 3.0).sin();
        rig.node_mut(joint::HEAD)?.position().y = self.head_low + (self.head_high - self.head_low) * t;
        Ok(())
    }
}
