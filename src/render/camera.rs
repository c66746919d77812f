use crate::config::CameraConfig;
use crate::interaction::Ray;
use glam::{Mat4, Vec2, Vec3};

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Yaw/pitch perspective camera. Yaw 0 looks down +X, yaw -π/2 down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraController {
    pub fn new(position: [f32; 3], yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov_y_deg: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn looking_at(eye: [f32; 3], target: [f32; 3]) -> Self {
        let forward = Vec3::from_array(target) - Vec3::from_array(eye);
        let (yaw, pitch) = forward_to_yaw_pitch(forward);
        Self::new(eye, yaw, pitch)
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::looking_at(config.eye, config.target);
        camera.fov_y_deg = config.fov_y_deg;
        camera.near = config.near;
        camera.far = config.far;
        camera
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn nudge(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.yaw = wrap_yaw(self.yaw + yaw_delta);
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        if zoom_delta != 0.0 {
            let (forward, _, _) = self.basis();
            self.position = (Vec3::from_array(self.position) + forward * zoom_delta).to_array();
        }
    }

    pub fn orbit_around(&mut self, pivot: [f32; 3], yaw_delta: f32, pitch_delta: f32) {
        let pivot = Vec3::from_array(pivot);
        let distance = Vec3::from_array(self.position).distance(pivot).max(0.05);
        self.yaw = wrap_yaw(self.yaw + yaw_delta);
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let (forward, _, _) = self.basis();
        self.position = (pivot - forward * distance).to_array();
    }

    /// Forward, right and up unit vectors.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let cos_pitch = self.pitch.cos();
        let forward = Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        );
        let right = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        let up = right.cross(forward).normalize_or_zero();
        (forward, right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _, up) = self.basis();
        let eye = Vec3::from_array(self.position);
        Mat4::look_at_rh(eye, eye + forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(1e-3),
            self.near,
            self.far,
        )
    }

    /// Ray from the near plane through the pointer at `ndc`.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        if !ndc.is_finite() {
            return None;
        }
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !near.is_finite() {
            return None;
        }
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

fn forward_to_yaw_pitch(forward: Vec3) -> (f32, f32) {
    let dir = forward.normalize_or_zero();
    if dir == Vec3::ZERO {
        return (-std::f32::consts::FRAC_PI_2, 0.0);
    }
    (dir.z.atan2(dir.x), dir.y.clamp(-1.0, 1.0).asin())
}

fn wrap_yaw(yaw: f32) -> f32 {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if yaw.is_finite() {
        (yaw + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI
    } else {
        yaw
    }
}

#[cfg(test)]
mod tests {
    use super::CameraController;
    use glam::{Vec2, Vec3};

    #[test]
    fn looking_at_faces_target() {
        let camera = CameraController::looking_at([0.0, 5.0, 10.0], [0.0, 0.0, 0.0]);
        let (forward, _, _) = camera.basis();
        let expected = Vec3::new(0.0, -5.0, -10.0).normalize();
        assert!(forward.distance(expected) < 1e-5);
    }

    #[test]
    fn center_ray_follows_forward() {
        let camera = CameraController::looking_at([0.0, 2.0, 6.0], [0.0, 0.0, -5.0]);
        let ray = camera.ray_from_ndc(Vec2::ZERO).unwrap();
        let (forward, _, _) = camera.basis();
        assert!(ray.direction.distance(forward) < 1e-3);
    }

    #[test]
    fn positive_ndc_x_points_right() {
        let camera = CameraController::looking_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        let ray = camera.ray_from_ndc(Vec2::new(0.5, 0.0)).unwrap();
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn orbit_keeps_distance_to_pivot() {
        let mut camera = CameraController::looking_at([0.0, 3.0, 8.0], [0.0, 0.0, 0.0]);
        let before = Vec3::from_array(camera.position).length();
        camera.orbit_around([0.0, 0.0, 0.0], 0.4, -0.2);
        let after = Vec3::from_array(camera.position).length();
        assert!((before - after).abs() < 1e-3);
        assert!(camera.position.iter().all(|value| value.is_finite()));
    }

    #[test]
    fn pitch_is_clamped_below_vertical() {
        let mut camera = CameraController::new([0.0, 0.0, 5.0], 0.0, 0.0);
        camera.nudge(0.0, 10.0, 0.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.ray_from_ndc(Vec2::ZERO).is_some());
    }
}
