//! CPU hit-testing.
//!
//! Each placed object is represented by its catalog hit volume, an
//! object-local box carried into world space by the object's pose. A pick
//! casts the pointer ray against every box and keeps the nearest hit.

use super::{compose_transform, CameraController};
use crate::assets::{object_defaults, HitVolume};
use crate::interaction::Ray;
use crate::scene::{ObjectId, PlacedObject, Pose};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub object_id: ObjectId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    pub point: Vec3,
}

/// Nearest object along `ray`, if any.
pub fn pick(ray: &Ray, objects: &[PlacedObject]) -> Option<PickHit> {
    objects
        .iter()
        .filter_map(|object| {
            let volume = object_defaults(object.kind).hit_volume;
            intersect_volume(ray, &object.pose, &volume).map(|distance| PickHit {
                object_id: object.id.clone(),
                distance,
                point: ray.at(distance),
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

pub fn pick_at(
    camera: &CameraController,
    pointer_ndc: Vec2,
    objects: &[PlacedObject],
) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(pointer_ndc)?;
    pick(&ray, objects)
}

fn intersect_volume(ray: &Ray, pose: &Pose, volume: &HitVolume) -> Option<f32> {
    let world = compose_transform(pose);
    if world.determinant().abs() < 1e-12 {
        return None;
    }
    let inverse = world.inverse();
    // Affine map keeps the ray parameter, so distances stay in world units.
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);

    let center = Vec3::from_array(volume.center);
    let half = Vec3::from_array(volume.half_extents);
    let min = center - half;
    let max = center + half;

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - o) / d;
        let t2 = (max[axis] - o) / d;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }

    if t_exit < t_enter || t_exit < 0.0 {
        return None;
    }
    Some(t_enter.max(0.0))
}
