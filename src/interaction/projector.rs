//! Pointer-to-world projection: NDC pointer → camera ray → reference plane.

use super::ManipulationError;
use crate::render::CameraController;
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// Horizontal (Y-up) plane through `point`.
    pub fn horizontal_through(point: Vec3) -> Self {
        Self {
            point,
            normal: Vec3::Y,
        }
    }

    pub fn ground(height: f32) -> Self {
        Self::horizontal_through(Vec3::new(0.0, height, 0.0))
    }

    pub fn intersect(&self, ray: &Ray, epsilon: f32) -> Result<Vec3, ManipulationError> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < epsilon {
            return Err(ManipulationError::NoIntersection);
        }
        let distance = (self.point - ray.origin).dot(self.normal) / denom;
        if distance < 0.0 || !distance.is_finite() {
            return Err(ManipulationError::NoIntersection);
        }
        Ok(ray.at(distance))
    }
}

/// World point under the pointer on `plane`. Callers keep their last good
/// value on `NoIntersection`.
pub fn project(
    pointer_ndc: Vec2,
    camera: &CameraController,
    plane: &Plane,
    epsilon: f32,
) -> Result<Vec3, ManipulationError> {
    let ray = camera
        .ray_from_ndc(pointer_ndc)
        .ok_or(ManipulationError::NoIntersection)?;
    plane.intersect(&ray, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn center_pointer_hits_ground_at_target() {
        let camera = CameraController::looking_at([0.0, 5.0, 5.0], [0.0, 0.0, 0.0]);
        let hit = project(Vec2::ZERO, &camera, &Plane::ground(0.0), EPS).unwrap();
        assert!(hit.distance(Vec3::ZERO) < 1e-3);
    }

    #[test]
    fn parallel_ray_has_no_intersection() {
        let ray = Ray {
            origin: Vec3::new(0.0, 1.0, 0.0),
            direction: Vec3::X,
        };
        assert_eq!(
            Plane::ground(0.0).intersect(&ray, EPS),
            Err(ManipulationError::NoIntersection)
        );
    }

    #[test]
    fn plane_behind_camera_has_no_intersection() {
        // Camera looking up at the sky never hits the ground.
        let camera = CameraController::looking_at([0.0, 1.0, 0.0], [0.0, 10.0, -1.0]);
        assert_eq!(
            project(Vec2::ZERO, &camera, &Plane::ground(0.0), EPS),
            Err(ManipulationError::NoIntersection)
        );
    }

    #[test]
    fn plane_height_is_respected() {
        let camera = CameraController::looking_at([0.0, 6.0, 6.0], [0.0, 0.0, 0.0]);
        let plane = Plane::horizontal_through(Vec3::new(3.0, 2.0, -1.0));
        let hit = project(Vec2::new(0.2, -0.1), &camera, &plane, EPS).unwrap();
        assert!((hit.y - 2.0).abs() < 1e-4);
    }
}
