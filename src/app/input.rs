//! Pointer plumbing between the windowing layer and the editor.

use crate::assets::AssetKind;
use crate::interaction::TransformMode;
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Primary-button pointer input in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    /// The capture surface stopped delivering events for this gesture.
    CaptureLost,
}

pub type PointerListener = Rc<dyn Fn(&PointerEvent)>;

#[derive(Default)]
pub struct InputBus {
    listeners: Rc<RefCell<Vec<PointerListener>>>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: PointerListener) -> InputSubscription {
        self.listeners.borrow_mut().push(listener.clone());
        InputSubscription {
            listener,
            listeners: Rc::clone(&self.listeners),
        }
    }

    pub fn dispatch(&self, event: PointerEvent) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            (listener)(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Keeps a listener attached. Dropping it detaches the listener and hands it
/// one last [`PointerEvent::CaptureLost`] so no gesture outlives it.
pub struct InputSubscription {
    listener: PointerListener,
    listeners: Rc<RefCell<Vec<PointerListener>>>,
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        self.listeners
            .borrow_mut()
            .retain(|item| !Rc::ptr_eq(item, &self.listener));
        (self.listener)(&PointerEvent::CaptureLost);
    }
}

/// Window pixel position to NDC, y up. `None` for a zero-sized surface.
pub fn pointer_ndc(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> Option<Vec2> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    let x = (position.x / f64::from(size.width)) * 2.0 - 1.0;
    let y = 1.0 - (position.y / f64::from(size.height)) * 2.0;
    Some(Vec2::new(x as f32, y as f32))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorAction {
    SetMode(TransformMode),
    RemoveSelected,
    Place(AssetKind),
    CycleLighting,
    ToggleAmbient,
    Orbit { yaw: f32, pitch: f32 },
    Save,
    Load,
    Quit,
}

const ORBIT_STEP: f32 = 0.1;

pub fn map_key(key: PhysicalKey, ctrl: bool) -> Option<EditorAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match (code, ctrl) {
        (KeyCode::KeyS, true) => EditorAction::Save,
        (KeyCode::KeyO, true) => EditorAction::Load,
        (_, true) => return None,
        (KeyCode::KeyW, false) => EditorAction::SetMode(TransformMode::Translate),
        (KeyCode::KeyE, false) => EditorAction::SetMode(TransformMode::Rotate),
        (KeyCode::KeyR, false) => EditorAction::SetMode(TransformMode::Scale),
        (KeyCode::Delete | KeyCode::Backspace, false) => EditorAction::RemoveSelected,
        (KeyCode::Digit1, false) => EditorAction::Place(AssetKind::Tree),
        (KeyCode::Digit2, false) => EditorAction::Place(AssetKind::Mountain),
        (KeyCode::Digit3, false) => EditorAction::Place(AssetKind::Water),
        (KeyCode::Digit4, false) => EditorAction::Place(AssetKind::Mat),
        (KeyCode::KeyL, false) => EditorAction::CycleLighting,
        (KeyCode::KeyM, false) => EditorAction::ToggleAmbient,
        (KeyCode::ArrowLeft, false) => EditorAction::Orbit {
            yaw: ORBIT_STEP,
            pitch: 0.0,
        },
        (KeyCode::ArrowRight, false) => EditorAction::Orbit {
            yaw: -ORBIT_STEP,
            pitch: 0.0,
        },
        (KeyCode::ArrowUp, false) => EditorAction::Orbit {
            yaw: 0.0,
            pitch: ORBIT_STEP,
        },
        (KeyCode::ArrowDown, false) => EditorAction::Orbit {
            yaw: 0.0,
            pitch: -ORBIT_STEP,
        },
        (KeyCode::Escape, false) => EditorAction::Quit,
        _ => return None,
    };
    Some(action)
}
