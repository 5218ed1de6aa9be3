use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraConfig {
    /// Looks down -z from `distance`, showing `frustum_size` units vertically.
    Orthographic { frustum_size: f32, distance: f32 },
    Perspective { fov_y_degrees: f32, eye: [f32; 3], target: [f32; 3] },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the nearest hit on a sphere, if any.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    config: CameraConfig,
    aspect: f32,
}

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

impl Camera {
    pub fn new(config: CameraConfig, aspect: f32) -> Self {
        let mut camera = Self { config, aspect: 1.0 };
        camera.set_aspect(aspect);
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Degenerate viewports keep the previous aspect.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn eye(&self) -> Vec3 {
        match self.config {
            CameraConfig::Orthographic { distance, .. } => Vec3::new(0.0, 0.0, distance),
            CameraConfig::Perspective { eye, .. } => Vec3::from(eye),
        }
    }

    pub fn view(&self) -> Mat4 {
        match self.config {
            CameraConfig::Orthographic { .. } => Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y),
            CameraConfig::Perspective { eye, target, .. } => {
                Mat4::look_at_rh(Vec3::from(eye), Vec3::from(target), Vec3::Y)
            }
        }
    }

    pub fn projection(&self) -> Mat4 {
        match self.config {
            CameraConfig::Orthographic { frustum_size, .. } => {
                let half_h = frustum_size / 2.0;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, NEAR, FAR)
            }
            CameraConfig::Perspective { fov_y_degrees, .. } => {
                Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), self.aspect, NEAR, FAR)
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Ray through a pointer position in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(-1.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray { origin: near, direction: (far - near).normalize_or_zero() }
    }
}

/// Map a pointer position in CSS pixels onto normalized device coordinates.
pub fn pointer_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if !(width > 0.0 && height > 0.0) {
        return Vec2::ZERO;
    }
    Vec2::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_sphere_in_front() {
        let ray = Ray { origin: Vec3::new(0.0, 0.0, 10.0), direction: Vec3::NEG_Z };
        let t = ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(3.0, 0.0, 0.0), 1.0).is_none());
        assert!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 20.0), 1.0).is_none());
    }

    #[test]
    fn degenerate_aspect_is_ignored() {
        let config = CameraConfig::Orthographic { frustum_size: 10.0, distance: 10.0 };
        let mut camera = Camera::new(config, 2.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn pointer_corners_map_to_ndc_corners() {
        assert_eq!(pointer_to_ndc(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(10.0, 10.0, 0.0, 600.0), Vec2::ZERO);
    }
}
