// src/camera.rs

//! Pinhole camera looking at the origin.
//!
//! The image plane sits one unit in front of the eye and spans `[-1, 1]`
//! along the shorter screen axis, i.e. a 90° field of view. The same mapping
//! is used to cast surface rays and to project line vertices, so both passes
//! line up.

use serde::{Deserialize, Serialize};

use crate::locator::Ray;
use crate::math::Vec3;

/// Points closer than this along the view axis are not projected.
pub const NEAR_PLANE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal orbit parameter in `[0, 1]` (a pointer's x position).
    pub orbit_u: f32,
    /// Vertical orbit parameter in `[0, 1]`; 0.5 is the equator.
    pub orbit_v: f32,
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_u: 0.5,
            orbit_v: 0.5,
            distance: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub side: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Camera at `position` aimed at `target`, with world +Y as the up hint.
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        let forward = (target - position).normalize();
        let side = forward
            .cross(Vec3::Y)
            .try_normalize(1e-6)
            .unwrap_or(Vec3::X);
        let up = side.cross(forward).normalize();
        Self {
            position,
            forward,
            side,
            up,
        }
    }

    /// Orbit parametrisation: longitude `6u`, latitude `3(v - 0.5)` radians.
    pub fn orbit(u: f32, v: f32, distance: f32) -> Self {
        let lon = 6.0 * u;
        let lat = 3.0 * (v - 0.5);
        let position = Vec3::new(
            lon.cos() * lat.cos(),
            lat.sin(),
            lon.sin() * lat.cos(),
        ) * distance;
        Self::look_at(position, Vec3::ZERO)
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::orbit(config.orbit_u, config.orbit_v, config.distance)
    }

    /// Ray through the centre of pixel `(px, py)`; rows grow downward.
    pub fn ray_for_pixel(&self, px: usize, py: usize, width: usize, height: usize) -> Ray {
        let (w, h) = (width as f32, height as f32);
        let frag_x = px as f32 + 0.5;
        let frag_y = h - (py as f32 + 0.5);
        let scale = w.min(h);
        let qx = (frag_x * 2.0 - w) / scale;
        let qy = (frag_y * 2.0 - h) / scale;
        Ray::new(self.position, self.side * qx + self.up * qy + self.forward)
    }

    /// Continuous pixel coordinates of `point`, or `None` when it lies
    /// behind the near plane. Pixel `(i, j)` covers `[i, i+1) × [j, j+1)`.
    pub fn project(&self, point: Vec3, width: usize, height: usize) -> Option<(f32, f32)> {
        let rel = point - self.position;
        let depth = rel.dot(self.forward);
        if depth < NEAR_PLANE {
            return None;
        }
        let (w, h) = (width as f32, height as f32);
        let scale = w.min(h);
        let qx = rel.dot(self.side) / depth;
        let qy = rel.dot(self.up) / depth;
        let frag_x = (qx * scale + w) / 2.0;
        let frag_y = (qy * scale + h) / 2.0;
        Some((frag_x, h - frag_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_orbit_sits_on_the_equator_looking_inward() {
        let cam = Camera::from_config(&CameraConfig::default());
        assert!((cam.position.length() - 10.0).abs() < 1e-4);
        assert!(cam.position.y.abs() < 1e-6);
        let to_origin = (-cam.position).normalize();
        assert!((cam.forward.dot(to_origin) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn basis_is_orthonormal() {
        let cam = Camera::orbit(0.2, 0.8, 10.0);
        assert!(cam.forward.dot(cam.side).abs() < 1e-5);
        assert!(cam.forward.dot(cam.up).abs() < 1e-5);
        assert!(cam.side.dot(cam.up).abs() < 1e-5);
        assert!(cam.up.y > 0.0);
    }

    #[test]
    fn centre_pixel_looks_at_the_origin() {
        let cam = Camera::orbit(0.3, 0.5, 10.0);
        // Odd size, so a pixel centre lands on the axis.
        let ray = cam.ray_for_pixel(50, 50, 101, 101);
        assert!(ray.closest_approach() < 1e-4);
    }

    #[test]
    fn projection_inverts_ray_generation() {
        let cam = Camera::orbit(0.7, 0.35, 10.0);
        let (w, h) = (64, 48);
        for (px, py) in [(0, 0), (10, 40), (63, 47), (32, 24)] {
            let ray = cam.ray_for_pixel(px, py, w, h);
            let (x, y) = cam.project(ray.at(7.0), w, h).unwrap();
            assert!((x - (px as f32 + 0.5)).abs() < 1e-3, "x {} for px {}", x, px);
            assert!((y - (py as f32 + 0.5)).abs() < 1e-3, "y {} for py {}", y, py);
        }
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let cam = Camera::orbit(0.5, 0.5, 10.0);
        let behind = cam.position - cam.forward * 2.0;
        assert_eq!(cam.project(behind, 32, 32), None);
    }
}
