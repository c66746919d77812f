//! Rendering boundary: everything a renderer needs to draw the scene, with no
//! opinion about how it is drawn.

mod camera;
pub mod pick;

pub use camera::CameraController;
pub use pick::{pick, pick_at, PickHit};

use crate::assets::{object_defaults, AssetKind, PrimitivePart};
use crate::scene::{ObjectId, Pose, SceneState};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Object-to-world transform. Rotation is XYZ Euler in radians.
pub fn compose_transform(pose: &Pose) -> Mat4 {
    let [rx, ry, rz] = pose.rotation;
    Mat4::from_scale_rotation_translation(
        Vec3::from_array(pose.scale),
        Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        Vec3::from_array(pose.position),
    )
}

/// Column-major 4×4 matrix, ready for upload.
pub fn compose_transform_matrix(pose: &Pose) -> [f32; 16] {
    compose_transform(pose).to_cols_array()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub id: ObjectId,
    pub kind: AssetKind,
    pub model: String,
    pub pose: Pose,
    pub transform: [f32; 16],
    pub parts: &'static [PrimitivePart],
    pub selected: bool,
}

/// Draw list in display order. `live` overrides the committed pose of the
/// object under manipulation.
pub fn render_items(scene: &SceneState, live: Option<(&ObjectId, &Pose)>) -> Vec<RenderItem> {
    scene
        .objects()
        .iter()
        .map(|object| {
            let pose = match live {
                Some((id, pose)) if id == &object.id => *pose,
                _ => object.pose,
            };
            RenderItem {
                id: object.id.clone(),
                kind: object.kind,
                model: object.model.clone(),
                pose,
                transform: compose_transform_matrix(&pose),
                parts: object_defaults(object.kind).parts,
                selected: scene.selected() == Some(&object.id),
            }
        })
        .collect()
}
