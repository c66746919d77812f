//! Direct-manipulation drag sessions.
//!
//! A session is armed by a pointer-down on the selected object and becomes a
//! drag once the pointer travels past the threshold. Pointer moves only record
//! the pointer; the working pose is recomputed once per frame in
//! [`DragController::recompute`], so a frame never sees a half-applied move.
//! The working pose reaches the store only on pointer-up.

use super::projector::{project, Plane};
use super::{ManipulationError, TransformMode};
use crate::config::DragConfig;
use crate::render::CameraController;
use crate::scene::{ObjectId, ObjectPatch, Pose, SceneStore};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    /// Pointer is down on the selected object but has not moved yet.
    Armed,
    Dragging,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub target: ObjectId,
    /// Mode captured at pointer-down; later mode switches do not apply.
    pub mode: TransformMode,
    pub start_pose: Pose,
    pub start_pointer: Vec2,
    pub last_pointer: Vec2,
    pub plane: Plane,
    /// Start position minus the first plane hit. `None` until the pointer
    /// ray first meets the plane.
    pub grab_offset: Option<Vec3>,
    pub working: Pose,
    moved: bool,
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Released without moving past the threshold.
    Click(ObjectId),
    Committed { target: ObjectId, pose: Pose },
    NoSession,
}

pub struct DragController {
    config: DragConfig,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config: config.validated(),
            session: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> DragState {
        match &self.session {
            None => DragState::Idle,
            Some(session) if session.moved => DragState::Dragging,
            Some(_) => DragState::Armed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Uncommitted pose of the object under manipulation.
    pub fn working_pose(&self) -> Option<(&ObjectId, &Pose)> {
        self.session
            .as_ref()
            .map(|session| (&session.target, &session.working))
    }

    /// Arms a session. Returns `false` when one is already running.
    pub fn begin(
        &mut self,
        target: ObjectId,
        pose: Pose,
        mode: TransformMode,
        pointer: Vec2,
        camera: &CameraController,
    ) -> bool {
        if let Some(active) = &self.session {
            log::trace!(
                "pointer-down ignored: session on {} still active",
                active.target
            );
            return false;
        }

        let start = Vec3::from_array(pose.position);
        let plane = Plane::horizontal_through(start);
        let grab_offset = project(pointer, camera, &plane, self.config.parallel_epsilon)
            .ok()
            .map(|hit| start - hit);

        log::debug!("drag armed on {} ({})", target, mode.label());
        self.session = Some(DragSession {
            target,
            mode,
            start_pose: pose,
            start_pointer: pointer,
            last_pointer: pointer,
            plane,
            grab_offset,
            working: pose,
            moved: false,
        });
        true
    }

    /// Records the latest pointer position. No pose math happens here.
    pub fn pointer_moved(&mut self, pointer: Vec2) {
        let threshold = self.config.drag_threshold;
        if let Some(session) = &mut self.session {
            session.last_pointer = pointer;
            if !session.moved && pointer.distance(session.start_pointer) > threshold {
                session.moved = true;
                log::debug!("drag started on {}", session.target);
            }
        }
    }

    /// Recomputes the working pose from the last recorded pointer.
    pub fn recompute(&mut self, camera: &CameraController) {
        let config = self.config;
        let Some(session) = &mut self.session else {
            return;
        };
        if !session.moved {
            return;
        }

        match session.mode {
            TransformMode::Translate => {
                match project(
                    session.last_pointer,
                    camera,
                    &session.plane,
                    config.parallel_epsilon,
                ) {
                    Ok(hit) => {
                        let start = Vec3::from_array(session.start_pose.position);
                        let offset = *session.grab_offset.get_or_insert(start - hit);
                        let mut position = hit + offset;
                        position.y = position.y.max(config.floor_y);
                        session.working.position = position.to_array();
                    }
                    Err(err) => log::trace!("holding last position: {err}"),
                }
            }
            TransformMode::Rotate => {
                let delta_x = session.last_pointer.x - session.start_pointer.x;
                session.working.rotation = session.start_pose.rotation;
                session.working.rotation[1] =
                    session.start_pose.yaw() + delta_x * config.rotate_sensitivity;
            }
            TransformMode::Scale => {
                let factor = 1.0 + (session.last_pointer.y - session.start_pointer.y);
                session.working.scale = session.start_pose.scale.map(|axis| {
                    checked_scale(axis * factor, config.min_scale).unwrap_or_else(|err| {
                        log::trace!("clamping scale: {err}");
                        config.min_scale
                    })
                });
            }
        }
    }

    /// Ends the session on pointer-up, committing the working pose if the
    /// pointer actually dragged.
    pub fn finish(&mut self, camera: &CameraController, store: &mut SceneStore) -> DragOutcome {
        self.recompute(camera);
        let Some(session) = self.session.take() else {
            return DragOutcome::NoSession;
        };
        if !session.moved {
            return DragOutcome::Click(session.target);
        }

        store.update(&session.target, &ObjectPatch::from_pose(session.working));
        log::debug!("drag committed on {}", session.target);
        DragOutcome::Committed {
            target: session.target,
            pose: session.working,
        }
    }

    /// Drops the session without touching the store.
    pub fn cancel(&mut self) -> Option<DragSession> {
        let session = self.session.take();
        if let Some(session) = &session {
            log::debug!("drag cancelled on {}", session.target);
        }
        session
    }
}

fn checked_scale(value: f32, min: f32) -> Result<f32, ManipulationError> {
    if value.is_finite() && value >= min {
        Ok(value)
    } else {
        Err(ManipulationError::InvalidScale { value })
    }
}
