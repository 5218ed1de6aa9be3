//! Orbit kinematics for objects revolving on tilted ellipses.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::curve::Ramp;
use crate::scene::SceneObject;

/// Phase gate on orbital motion: nothing moves below `threshold`, and the
/// speed multiplier ramps to 1 at `rate` above it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitActivation {
    pub threshold: f32,
    pub rate: f32,
}

impl OrbitActivation {
    pub const ALWAYS: Self = Self { threshold: -1.0, rate: 1.0 };

    pub fn factor(&self, phase: f32) -> f32 {
        Ramp::new(self.threshold, self.rate).eval(phase)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitParams {
    pub base_angle: f32,
    pub current_angle: f32,
    /// Radians per second at full orbit factor.
    pub angular_speed: f32,
    pub radius_major: f32,
    pub radius_minor: f32,
    /// Rotation of the orbit plane about the x axis.
    pub tilt: f32,
    pub center: Vec3,
    pub activation: OrbitActivation,
}

impl OrbitParams {
    /// Reset the running angle to the creation angle.
    pub fn at_base(mut self) -> Self {
        self.current_angle = self.base_angle;
        self
    }

    pub fn project(&self) -> Vec3 {
        let (sin, cos) = self.current_angle.sin_cos();
        let flat = Vec3::new(cos * self.radius_major, 0.0, sin * self.radius_minor);
        self.center + Quat::from_rotation_x(self.tilt) * flat
    }
}

/// Advance every visible orbiting object by one frame.
///
/// Hidden objects keep their angle so they reappear where they vanished.
/// Returns how many objects moved.
pub fn advance_orbits(delta: f32, phase: f32, objects: &mut [SceneObject]) -> usize {
    if !delta.is_finite() || delta <= 0.0 {
        return 0;
    }

    let mut moved = 0;
    for object in objects.iter_mut() {
        if !object.visible() {
            continue;
        }
        let Some(orbit) = object.orbit.as_mut() else {
            continue;
        };
        let factor = orbit.activation.factor(phase);
        if factor <= 0.0 {
            continue;
        }
        orbit.current_angle += orbit.angular_speed * delta * factor;
        object.position = orbit.project();
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Category;
    use std::f32::consts::FRAC_PI_2;

    fn orbiter(activation: OrbitActivation) -> SceneObject {
        let orbit = OrbitParams {
            base_angle: 0.0,
            current_angle: 0.0,
            angular_speed: 1.0,
            radius_major: 2.0,
            radius_minor: 1.0,
            tilt: 0.0,
            center: Vec3::ZERO,
            activation,
        };
        let mut object = SceneObject::new("icon[0]", Category::Icon).with_orbit(orbit);
        object.set_opacity(1.0);
        object
    }

    #[test]
    fn projection_traces_the_ellipse() {
        let mut orbit = orbiter(OrbitActivation::ALWAYS).orbit.unwrap();
        assert!((orbit.project() - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        orbit.current_angle = FRAC_PI_2;
        assert!((orbit.project() - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn tilt_lifts_the_minor_axis() {
        let mut orbit = orbiter(OrbitActivation::ALWAYS).orbit.unwrap();
        orbit.tilt = FRAC_PI_2;
        orbit.current_angle = FRAC_PI_2;
        let p = orbit.project();
        assert!(p.y.abs() > 0.99 && p.z.abs() < 1e-6);
    }

    #[test]
    fn no_motion_below_threshold() {
        let mut objects = vec![orbiter(OrbitActivation { threshold: 0.4, rate: 2.0 })];
        for _ in 0..100 {
            advance_orbits(1.0 / 60.0, 0.39, &mut objects);
        }
        assert_eq!(objects[0].orbit.unwrap().current_angle, 0.0);
    }

    #[test]
    fn motion_ramps_in_above_threshold() {
        let activation = OrbitActivation { threshold: 0.4, rate: 2.0 };
        let mut slow = vec![orbiter(activation)];
        let mut fast = vec![orbiter(activation)];
        advance_orbits(0.1, 0.5, &mut slow);
        advance_orbits(0.1, 1.0, &mut fast);
        let slow_angle = slow[0].orbit.unwrap().current_angle;
        let fast_angle = fast[0].orbit.unwrap().current_angle;
        assert!((slow_angle - 0.02).abs() < 1e-6);
        assert!((fast_angle - 0.1).abs() < 1e-6);
    }

    #[test]
    fn hidden_objects_hold_their_angle() {
        let mut objects = vec![orbiter(OrbitActivation::ALWAYS)];
        objects[0].set_opacity(0.0);
        assert_eq!(advance_orbits(0.1, 1.0, &mut objects), 0);
        assert_eq!(objects[0].orbit.unwrap().current_angle, 0.0);
    }

    #[test]
    fn bad_delta_is_ignored() {
        let mut objects = vec![orbiter(OrbitActivation::ALWAYS)];
        assert_eq!(advance_orbits(f32::NAN, 1.0, &mut objects), 0);
        assert_eq!(advance_orbits(-1.0, 1.0, &mut objects), 0);
    }
}
