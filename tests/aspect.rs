#![cfg(not(target_arch = "wasm32"))]

use glam::{Vec2, Vec3};
use hero_viz::camera::{pointer_to_ndc, Camera, CameraConfig};

const ORTHO: CameraConfig = CameraConfig::Orthographic { frustum_size: 10.0, distance: 10.0 };

fn approx_eq3(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() < eps
}

/// Point where a pointer ray crosses the z = 0 plane.
fn ground(camera: &Camera, ndc: Vec2) -> Vec3 {
    let ray = camera.ray_from_ndc(ndc);
    let t = -ray.origin.z / ray.direction.z;
    ray.origin + ray.direction * t
}

#[test]
fn center_pointer_hits_origin_at_any_aspect() {
    for aspect in [16.0 / 9.0, 9.0 / 16.0, 1.0] {
        let ortho = Camera::new(ORTHO, aspect);
        assert!(approx_eq3(ground(&ortho, Vec2::ZERO), Vec3::ZERO, 1e-3));

        let config = CameraConfig::Perspective {
            fov_y_degrees: 45.0,
            eye: [0.0, 0.0, 9.0],
            target: [0.0; 3],
        };
        let perspective = Camera::new(config, aspect);
        assert!(approx_eq3(ground(&perspective, Vec2::ZERO), Vec3::ZERO, 1e-3));
    }
}

#[test]
fn orthographic_width_tracks_aspect() {
    // Vertical extent is fixed by the frustum; horizontal grows with aspect.
    let wide = Camera::new(ORTHO, 1920.0 / 1080.0);
    let tall = Camera::new(ORTHO, 1080.0 / 1920.0);

    let wide_edge = ground(&wide, Vec2::new(1.0, 1.0));
    let tall_edge = ground(&tall, Vec2::new(1.0, 1.0));
    assert!((wide_edge.y - 5.0).abs() < 1e-3 && (tall_edge.y - 5.0).abs() < 1e-3);
    assert!((wide_edge.x - 5.0 * 1920.0 / 1080.0).abs() < 1e-3);
    assert!((tall_edge.x - 5.0 * 1080.0 / 1920.0).abs() < 1e-3);
}

#[test]
fn resize_changes_picking_only_through_aspect() {
    let mut camera = Camera::new(ORTHO, 1.0);
    let square = ground(&camera, Vec2::new(0.5, 0.5));
    camera.set_aspect(2.0);
    let wide = ground(&camera, Vec2::new(0.5, 0.5));
    assert!((wide.x - square.x * 2.0).abs() < 1e-4);
    assert!((wide.y - square.y).abs() < 1e-4);
}

#[test]
fn pixel_center_is_ndc_origin() {
    let ndc = pointer_to_ndc(960.0, 540.0, 1920.0, 1080.0);
    assert!(ndc.length() < 1e-6);
}
