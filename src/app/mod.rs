mod editor;
pub mod input;
mod timing;

pub use editor::Editor;
pub use input::{EditorAction, InputBus, InputSubscription, PointerEvent};

use crate::config::EditorConfig;
use crate::scene::serialization::UserIdentity;
use crate::scene::{SceneEvent, SceneState, SceneSubscription};
use glam::Vec2;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use timing::FrameTiming;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowAttributes, WindowId};

/// Environment variable naming the signed-in user; saving needs one.
pub const USER_ENV_VAR: &str = "STILLPOINT_USER";

const TITLE: &str = "Stillpoint";

struct App {
    window: Option<Arc<Window>>,
    editor: Rc<RefCell<Editor>>,
    input: InputBus,
    _pointer: InputSubscription,
    _scene_log: SceneSubscription,
    modifiers: ModifiersState,
    cursor: Option<Vec2>,
    timing: FrameTiming,
    close_requested: bool,
}

impl App {
    fn new(config: EditorConfig) -> Self {
        let mut editor = Editor::silent(config);
        editor.sign_in(std::env::var(USER_ENV_VAR).ok().map(UserIdentity::new));

        let scene_log = editor.store().subscribe(Rc::new(log_scene_event));
        let editor = Rc::new(RefCell::new(editor));
        let input = InputBus::new();
        let target = Rc::clone(&editor);
        let pointer = input.subscribe(Rc::new(move |event: &PointerEvent| {
            target.borrow_mut().handle_pointer(event);
        }));

        Self {
            window: None,
            editor,
            input,
            _pointer: pointer,
            _scene_log: scene_log,
            modifiers: ModifiersState::empty(),
            cursor: None,
            timing: FrameTiming::new(TITLE.to_string()),
            close_requested: false,
        }
    }

    fn apply(&mut self, action: EditorAction, event_loop: &ActiveEventLoop) {
        let mut editor = self.editor.borrow_mut();
        match action {
            EditorAction::SetMode(mode) => editor.set_mode(mode),
            EditorAction::RemoveSelected => {
                if let Some(removed) = editor.remove_selected() {
                    log::info!("removed {}", removed.name);
                }
            }
            EditorAction::Place(kind) => {
                editor.place(kind);
            }
            EditorAction::CycleLighting => editor.cycle_lighting(),
            EditorAction::ToggleAmbient => {
                if editor.audio().is_playing() {
                    editor.set_ambient_sound(None);
                } else {
                    editor.set_ambient_sound(Some("wind"));
                }
            }
            EditorAction::Orbit { yaw, pitch } => {
                editor.camera_mut().orbit_around([0.0; 3], yaw, pitch);
            }
            EditorAction::Save => {
                let Some(path) = environment_dialog(&editor.config().scene_path).save_file() else {
                    return;
                };
                if let Err(err) = editor.save(&path) {
                    log::error!("save failed: {err}");
                }
            }
            EditorAction::Load => {
                let Some(path) = environment_dialog(&editor.config().scene_path).pick_file() else {
                    return;
                };
                if let Err(err) = editor.load(&path) {
                    log::error!("load failed: {err}");
                }
            }
            EditorAction::Quit => {
                self.close_requested = true;
                event_loop.exit();
            }
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.editor
            .borrow_mut()
            .camera_mut()
            .set_viewport(size.width, size.height);
    }

    fn status(&self) -> String {
        let editor = self.editor.borrow();
        let selected = editor
            .scene()
            .selected_object()
            .map(|object| object.name.as_str())
            .unwrap_or("nothing selected");
        format!(
            "{} | {} | {} objects",
            editor.mode().label(),
            selected,
            editor.scene().objects().len()
        )
    }

    fn redraw(&mut self) {
        let items = {
            let mut editor = self.editor.borrow_mut();
            editor.tick();
            editor.render_items()
        };
        log::trace!("frame: {} render items", items.len());

        let status = self.status();
        self.timing.update(self.window.as_deref(), Instant::now(), &status);
    }
}

/// JSON file dialog starting at `default_path`.
fn environment_dialog(default_path: &Path) -> rfd::FileDialog {
    let mut dialog = rfd::FileDialog::new().add_filter("Environment", &["json"]);
    if let Some(name) = default_path.file_name().and_then(|name| name.to_str()) {
        dialog = dialog.set_file_name(name);
    }
    match default_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dialog.set_directory(dir),
        _ => dialog,
    }
}

fn log_scene_event(event: &SceneEvent, state: &SceneState) {
    match event {
        SceneEvent::SelectionChanged(Some(id)) => {
            let name = state.object(id).map(|object| object.name.as_str());
            log::info!("selected {}", name.unwrap_or("?"));
        }
        SceneEvent::SelectionChanged(None) => log::info!("selection cleared"),
        other => log::debug!("scene: {other:?}"),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.handle_resize(window.inner_size());
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.cursor = None;
                    self.input.dispatch(PointerEvent::CaptureLost);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let ctrl = self.modifiers.control_key() || self.modifiers.super_key();
                if let Some(action) = input::map_key(event.physical_key, ctrl) {
                    self.apply(action, event_loop);
                }
            }
            WindowEvent::Resized(new_size) => self.handle_resize(new_size),
            WindowEvent::CursorMoved { position, .. } => {
                let Some(size) = self.window.as_ref().map(|window| window.inner_size()) else {
                    return;
                };
                if let Some(ndc) = input::pointer_ndc(position, size) {
                    self.cursor = Some(ndc);
                    self.input.dispatch(PointerEvent::Move(ndc));
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.input.dispatch(PointerEvent::CaptureLost);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(ndc) = self.cursor else {
                    return;
                };
                let event = match state {
                    ElementState::Pressed => PointerEvent::Down(ndc),
                    ElementState::Released => PointerEvent::Up(ndc),
                };
                self.input.dispatch(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let zoom = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * 0.5,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.editor.borrow_mut().camera_mut().nudge(0.0, 0.0, zoom);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.close_requested {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

pub fn run(config: EditorConfig) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)
}
