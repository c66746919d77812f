pub mod drag;
pub mod projector;
pub mod selection;

pub use drag::{DragController, DragSession, DragState};
pub use projector::{project, Plane, Ray};
pub use selection::toggle_selection;

use crate::scene::ObjectId;

/// Global manipulation mode picked in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl TransformMode {
    pub fn label(self) -> &'static str {
        match self {
            TransformMode::Translate => "Move",
            TransformMode::Rotate => "Rotate",
            TransformMode::Scale => "Scale",
        }
    }
}

/// Manipulation failures. All of them are recovered where they occur.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManipulationError {
    #[error("pointer ray does not intersect the reference plane")]
    NoIntersection,
    #[error("scale {value} is not positive")]
    InvalidScale { value: f32 },
    #[error("object {0} not found")]
    NotFound(ObjectId),
}
