//! Simple camera implementations

use flint_core::{Transform, Vec3};
use flint_ecs::Camera;

/// A camera that never moves
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedCamera {
    pub transform: Transform,
}

impl FixedCamera {
    pub fn at(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
        }
    }
}

impl Camera for FixedCamera {
    fn view(&self) -> Transform {
        self.transform
    }
}

/// A camera circling a target point. Angles are in degrees; yaw 0 looks
/// down +Z from behind the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    /// Pitch is kept short of straight up or down
    const PITCH_LIMIT: f32 = 89.0;

    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance: distance.max(0.0),
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Rotate around the target
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.yaw = (self.yaw + yaw).rem_euclid(360.0);
        self.pitch = (self.pitch + pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount).max(0.0);
    }

    pub fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let offset = Vec3::new(
            -pitch.cos() * yaw.sin(),
            pitch.sin(),
            -pitch.cos() * yaw.cos(),
        );
        self.target + offset * self.distance
    }
}

impl Camera for OrbitCamera {
    fn view(&self) -> Transform {
        Transform::from_position(self.position()).with_rotation(Vec3::new(
            -self.pitch,
            self.yaw,
            0.0,
        ))
    }
}
