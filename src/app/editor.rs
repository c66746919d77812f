use super::input::PointerEvent;
use crate::assets::{descriptor, AssetKind, AssetPayload, LightingPreset};
use crate::audio::{AmbientAudio, AudioBackend, SilentBackend};
use crate::config::EditorConfig;
use crate::interaction::drag::DragOutcome;
use crate::interaction::{toggle_selection, DragController, DragState, TransformMode};
use crate::render::{self, pick_at, CameraController, RenderItem};
use crate::scene::serialization::{
    load_record_from_file, save_record_to_file, EnvironmentRecord, RecordMeta,
    SerializationError, UserIdentity,
};
use crate::scene::{ObjectId, PlacedObject, Pose, SceneState, SceneStore, SoundId, SoundPatch};
use glam::Vec2;
use std::path::Path;

/// One editing session over one environment.
pub struct Editor<B: AudioBackend = SilentBackend> {
    config: EditorConfig,
    store: SceneStore,
    camera: CameraController,
    drag: DragController,
    mode: TransformMode,
    lighting: LightingPreset,
    audio: AmbientAudio<B>,
    identity: Option<UserIdentity>,
    meta: RecordMeta,
}

impl Editor<SilentBackend> {
    pub fn silent(config: EditorConfig) -> Self {
        Self::new(config, SilentBackend::default())
    }
}

impl<B: AudioBackend> Editor<B> {
    pub fn new(config: EditorConfig, backend: B) -> Self {
        let mut store = SceneStore::new();
        if config.seed_default_mat {
            store.seed_default();
        }
        Self {
            camera: CameraController::from_config(&config.camera),
            drag: DragController::new(config.drag),
            audio: AmbientAudio::new(backend, config.default_volume),
            meta: RecordMeta::new(config.environment_name.clone()),
            mode: TransformMode::default(),
            lighting: LightingPreset::Day,
            identity: None,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SceneStore {
        &mut self.store
    }

    pub fn scene(&self) -> &SceneState {
        self.store.state()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn lighting(&self) -> LightingPreset {
        self.lighting
    }

    pub fn audio(&self) -> &AmbientAudio<B> {
        &self.audio
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn sign_in(&mut self, identity: Option<UserIdentity>) {
        self.identity = identity;
    }

    /// Takes effect from the next pointer-down; a running session keeps the
    /// mode it started with.
    pub fn set_mode(&mut self, mode: TransformMode) {
        if self.mode != mode {
            log::info!("transform mode: {}", mode.label());
            self.mode = mode;
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down(ndc) => self.pointer_down(ndc),
            PointerEvent::Move(ndc) => self.drag.pointer_moved(ndc),
            PointerEvent::Up(ndc) => {
                self.drag.pointer_moved(ndc);
                match self.drag.finish(&self.camera, &mut self.store) {
                    DragOutcome::Click(id) => {
                        let next = toggle_selection(self.store.state().selected(), Some(&id));
                        self.store.select(next.as_ref());
                    }
                    DragOutcome::Committed { .. } | DragOutcome::NoSession => {}
                }
            }
            PointerEvent::CaptureLost => {
                self.drag.cancel();
            }
        }
    }

    fn pointer_down(&mut self, ndc: Vec2) {
        if self.drag.is_active() {
            log::trace!("pointer-down ignored during an active session");
            return;
        }
        let hit = pick_at(&self.camera, ndc, self.store.state().objects())
            .map(|hit| hit.object_id);
        let state = self.store.state();
        match (&hit, state.selected_object()) {
            (Some(hit), Some(selected)) if hit == &selected.id => {
                let pose = selected.pose;
                self.drag.begin(hit.clone(), pose, self.mode, ndc, &self.camera);
            }
            _ => {
                let next = toggle_selection(state.selected(), hit.as_ref());
                self.store.select(next.as_ref());
            }
        }
    }

    /// Per-frame update. Folds the latest pointer into the working pose.
    pub fn tick(&mut self) {
        self.drag.recompute(&self.camera);
    }

    pub fn render_items(&self) -> Vec<RenderItem> {
        render::render_items(self.store.state(), self.drag.working_pose())
    }

    pub fn place(&mut self, kind: AssetKind) -> ObjectId {
        self.store.place(kind, Pose::at(self.config.place_position))
    }

    /// Applies a catalog entry: objects are placed, sounds become the ambient
    /// track, lighting presets replace the lighting. Returns the placed id.
    pub fn place_from_catalog(&mut self, asset_id: &str) -> Option<ObjectId> {
        let Some(asset) = descriptor(asset_id) else {
            log::warn!("unknown catalog entry {asset_id:?}");
            return None;
        };
        match asset.payload {
            AssetPayload::Object { kind, model } => Some(self.store.place_named(
                kind,
                asset.name,
                model,
                Pose::at(self.config.place_position),
            )),
            AssetPayload::Sound { .. } => {
                self.set_ambient_sound(Some(asset_id));
                None
            }
            AssetPayload::Lighting(preset) => {
                self.set_lighting(preset);
                None
            }
        }
    }

    pub fn remove_selected(&mut self) -> Option<PlacedObject> {
        let selected = self.store.state().selected()?.clone();
        if self.drag.session().is_some_and(|session| session.target == selected) {
            self.drag.cancel();
        }
        self.store.remove(&selected)
    }

    pub fn set_lighting(&mut self, preset: LightingPreset) {
        self.lighting = preset;
        self.store.apply_lighting(preset);
    }

    pub fn cycle_lighting(&mut self) {
        let next = match self.lighting {
            LightingPreset::Day => LightingPreset::Sunset,
            LightingPreset::Sunset => LightingPreset::Night,
            LightingPreset::Night => LightingPreset::Day,
        };
        self.set_lighting(next);
    }

    /// Starts the catalog sound `asset_id` looping, or stops ambient audio on
    /// `None`. The track is recorded in the scene so it is saved with it.
    pub fn set_ambient_sound(&mut self, asset_id: Option<&str>) {
        let Some(asset_id) = asset_id else {
            self.audio.stop();
            self.mark_playing(None);
            return;
        };
        let Some(asset) = descriptor(asset_id) else {
            log::warn!("unknown ambient sound {asset_id:?}");
            return;
        };
        let AssetPayload::Sound { src } = asset.payload else {
            log::warn!("catalog entry {asset_id:?} is not a sound");
            return;
        };

        self.audio.start(src);
        let existing = self
            .store
            .state()
            .sounds()
            .iter()
            .find(|sound| sound.src == src)
            .map(|sound| sound.id.clone());
        let sound_id = match existing {
            Some(id) => id,
            None => self
                .store
                .add_sound(asset.name, src, self.audio.volume(), true),
        };
        let playing = self.audio.is_playing().then_some(&sound_id);
        self.mark_playing(playing);
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.audio.set_volume_percent(percent);
        let volume = self.audio.volume();
        let playing: Vec<SoundId> = self
            .store
            .state()
            .sounds()
            .iter()
            .filter(|sound| sound.playing)
            .map(|sound| sound.id.clone())
            .collect();
        for id in playing {
            self.store.update_sound(
                &id,
                &SoundPatch {
                    volume: Some(volume),
                    ..SoundPatch::default()
                },
            );
        }
    }

    fn mark_playing(&mut self, playing: Option<&SoundId>) {
        let flags: Vec<(SoundId, bool)> = self
            .store
            .state()
            .sounds()
            .iter()
            .map(|sound| (sound.id.clone(), Some(&sound.id) == playing))
            .collect();
        for (id, flag) in flags {
            self.store.update_sound(
                &id,
                &SoundPatch {
                    playing: Some(flag),
                    ..SoundPatch::default()
                },
            );
        }
    }

    /// Writes the scene to `path`. Requires a signed-in identity.
    pub fn save(&mut self, path: &Path) -> Result<EnvironmentRecord, SerializationError> {
        let record = EnvironmentRecord::from_scene(
            self.store.state(),
            &self.meta,
            self.identity.as_ref(),
            chrono::Utc::now(),
        )?;
        save_record_to_file(&record, path)?;
        log::info!(
            "saved {:?} ({} objects) to {}",
            record.name,
            record.scene_data.objects.len(),
            path.display()
        );
        self.meta = record.meta();
        Ok(record)
    }

    /// Replaces the scene with the record at `path`. On error the current
    /// scene is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), SerializationError> {
        let record = load_record_from_file(path)?;
        let scene = record.to_scene()?;
        self.drag.cancel();
        self.store.replace(scene);
        self.meta = record.meta();
        log::info!("loaded {:?} from {}", record.name, path.display());

        self.audio.stop();
        let resume = self
            .store
            .state()
            .sounds()
            .iter()
            .find(|sound| sound.playing)
            .map(|sound| (sound.id.clone(), sound.src.clone(), sound.volume));
        if let Some((id, src, volume)) = resume {
            self.audio.set_gain(volume);
            self.audio.start(&src);
            let playing = self.audio.is_playing().then_some(&id);
            self.mark_playing(playing);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::config::CameraConfig;
    use crate::scene::SceneEvent;
    use std::cell::Cell;
    use std::rc::Rc;

    struct BlockedBackend;

    impl AudioBackend for BlockedBackend {
        fn load(&mut self, _src: &str) -> Result<(), AudioError> {
            Ok(())
        }

        fn play(&mut self, _looping: bool, _volume: f32) -> Result<(), AudioError> {
            Err(AudioError::Backend("autoplay blocked".to_string()))
        }

        fn stop(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        fn set_volume(&mut self, _volume: f32) -> Result<(), AudioError> {
            Ok(())
        }
    }

    fn editor_facing_origin() -> Editor {
        Editor::silent(facing_origin_config())
    }

    fn facing_origin_config() -> EditorConfig {
        EditorConfig {
            camera: CameraConfig {
                eye: [0.0, 5.0, 10.0],
                target: [0.0, 0.75, 0.0],
                ..CameraConfig::default()
            },
            seed_default_mat: false,
            place_position: [0.0, 0.0, 0.0],
            ..EditorConfig::default()
        }
    }

    fn click(editor: &mut Editor, ndc: Vec2) {
        editor.handle_pointer(&PointerEvent::Down(ndc));
        editor.handle_pointer(&PointerEvent::Up(ndc));
    }

    fn drag(editor: &mut Editor, from: Vec2, to: Vec2) {
        editor.handle_pointer(&PointerEvent::Down(from));
        editor.handle_pointer(&PointerEvent::Move(to));
        editor.tick();
        editor.handle_pointer(&PointerEvent::Up(to));
    }

    fn pose_of(editor: &Editor, id: &ObjectId) -> Pose {
        editor.scene().object(id).unwrap().pose
    }

    #[test]
    fn new_editor_seeds_default_mat() {
        let editor = Editor::silent(EditorConfig::default());
        assert_eq!(editor.scene().objects().len(), 1);
        assert_eq!(editor.scene().objects()[0].kind, AssetKind::Mat);
    }

    #[test]
    fn place_select_and_translate() {
        let mut editor = editor_facing_origin();
        let tree = editor.place_from_catalog("tree").unwrap();
        assert_eq!(editor.scene().selected(), None);

        click(&mut editor, Vec2::ZERO);
        assert_eq!(editor.scene().selected(), Some(&tree));

        drag(&mut editor, Vec2::ZERO, Vec2::new(0.3, 0.0));
        let pose = pose_of(&editor, &tree);
        assert!(pose.position[0] > 0.5, "moved to {:?}", pose.position);
        assert_eq!(pose.position[1], 0.0);
        assert!(pose.position[2].abs() < 1e-3);
        assert_eq!(editor.scene().selected(), Some(&tree));
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn delete_clears_selection() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        editor.store_mut().select(Some(&tree));

        let removed = editor.remove_selected().unwrap();
        assert_eq!(removed.id, tree);
        assert!(editor.scene().objects().is_empty());
        assert_eq!(editor.scene().selected(), None);
        assert!(editor.remove_selected().is_none());
    }

    #[test]
    fn second_click_deselects() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);

        click(&mut editor, Vec2::ZERO);
        assert_eq!(editor.scene().selected(), Some(&tree));
        click(&mut editor, Vec2::ZERO);
        assert_eq!(editor.scene().selected(), None);
        assert_eq!(pose_of(&editor, &tree), Pose::default());
    }

    #[test]
    fn click_on_empty_space_deselects() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);
        assert_eq!(editor.scene().selected(), Some(&tree));

        click(&mut editor, Vec2::new(0.95, 0.95));
        assert_eq!(editor.scene().selected(), None);
    }

    #[test]
    fn mode_switch_mid_drag_keeps_session_mode() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);
        editor.set_mode(TransformMode::Rotate);

        editor.handle_pointer(&PointerEvent::Down(Vec2::ZERO));
        editor.set_mode(TransformMode::Scale);
        editor.handle_pointer(&PointerEvent::Move(Vec2::new(0.2, 0.1)));
        editor.tick();
        editor.handle_pointer(&PointerEvent::Up(Vec2::new(0.2, 0.1)));

        let pose = pose_of(&editor, &tree);
        assert!((pose.rotation[1] - 1.0).abs() < 1e-5);
        assert_eq!(pose.scale, [1.0, 1.0, 1.0]);
        assert_eq!(editor.mode(), TransformMode::Scale);
    }

    #[test]
    fn working_pose_renders_before_commit() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);

        let updates = Rc::new(Cell::new(0));
        let counter = Rc::clone(&updates);
        let observer = move |event: &SceneEvent, _: &SceneState| {
            if matches!(event, SceneEvent::Updated(_)) {
                counter.set(counter.get() + 1);
            }
        };
        let _subscription = editor.store().subscribe(Rc::new(observer));

        editor.handle_pointer(&PointerEvent::Down(Vec2::ZERO));
        editor.handle_pointer(&PointerEvent::Move(Vec2::new(0.3, 0.0)));
        editor.tick();
        assert_eq!(editor.drag_state(), DragState::Dragging);
        assert_eq!(updates.get(), 0);
        assert_eq!(pose_of(&editor, &tree), Pose::default());
        let live = editor.render_items()[0].pose;
        assert!(live.position[0] > 0.5);

        editor.handle_pointer(&PointerEvent::Up(Vec2::new(0.3, 0.0)));
        assert_eq!(updates.get(), 1);
        assert_eq!(pose_of(&editor, &tree), live);
    }

    #[test]
    fn capture_loss_cancels_without_commit() {
        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);

        editor.handle_pointer(&PointerEvent::Down(Vec2::ZERO));
        editor.handle_pointer(&PointerEvent::Move(Vec2::new(0.4, 0.0)));
        editor.tick();
        editor.handle_pointer(&PointerEvent::CaptureLost);

        assert_eq!(editor.drag_state(), DragState::Idle);
        assert_eq!(pose_of(&editor, &tree), Pose::default());
        assert_eq!(editor.scene().selected(), Some(&tree));

        editor.handle_pointer(&PointerEvent::Up(Vec2::new(0.4, 0.0)));
        assert_eq!(pose_of(&editor, &tree), Pose::default());
    }

    #[test]
    fn nested_pointer_down_is_ignored() {
        let mut editor = editor_facing_origin();
        editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);

        editor.handle_pointer(&PointerEvent::Down(Vec2::ZERO));
        editor.handle_pointer(&PointerEvent::Down(Vec2::new(0.9, 0.9)));
        assert_eq!(editor.drag_state(), DragState::Armed);
        assert!(editor.scene().selected().is_some());
    }

    #[test]
    fn removing_dragged_object_ends_session() {
        let mut editor = editor_facing_origin();
        editor.place(AssetKind::Tree);
        click(&mut editor, Vec2::ZERO);
        editor.handle_pointer(&PointerEvent::Down(Vec2::ZERO));

        editor.remove_selected();
        assert_eq!(editor.drag_state(), DragState::Idle);
        editor.handle_pointer(&PointerEvent::Up(Vec2::ZERO));
        assert!(editor.scene().objects().is_empty());
    }

    #[test]
    fn catalog_sound_and_lighting_entries() {
        let mut editor = editor_facing_origin();
        assert_eq!(editor.place_from_catalog("wind"), None);
        assert!(editor.audio().is_playing());
        assert_eq!(editor.scene().sounds().len(), 1);
        assert!(editor.scene().sounds()[0].playing);

        editor.set_volume(20);
        assert!((editor.scene().sounds()[0].volume - 0.2).abs() < 1e-6);

        editor.set_ambient_sound(None);
        assert!(!editor.audio().is_playing());
        assert!(!editor.scene().sounds()[0].playing);

        editor.place_from_catalog("night");
        assert_eq!(editor.lighting(), LightingPreset::Night);
        assert_eq!(
            editor.scene().settings().ambient_light,
            LightingPreset::Night.settings().ambient_light
        );
        assert!(editor.place_from_catalog("no-such-asset").is_none());
    }

    #[test]
    fn save_requires_identity_and_load_restores() {
        let mut path = std::env::temp_dir();
        path.push(format!("stillpoint_editor_{}.json", std::process::id()));

        let mut editor = editor_facing_origin();
        let tree = editor.place(AssetKind::Tree);
        editor.store_mut().update(
            &tree,
            &crate::scene::ObjectPatch::position([2.0, 0.0, -1.0]),
        );
        assert!(matches!(
            editor.save(&path),
            Err(SerializationError::MissingIdentity)
        ));

        editor.sign_in(Some(UserIdentity::new("user-1")));
        let record = editor.save(&path).unwrap();
        assert_eq!(record.creator_id, "user-1");

        let mut other = editor_facing_origin();
        other.load(&path).unwrap();
        assert_eq!(other.scene().objects(), editor.scene().objects());
        assert_eq!(other.meta().id, editor.meta().id);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_resumes_ambient_track_at_saved_volume() {
        let mut path = std::env::temp_dir();
        path.push(format!("stillpoint_editor_audio_{}.json", std::process::id()));

        let mut editor = editor_facing_origin();
        editor.sign_in(Some(UserIdentity::new("user-1")));
        editor.set_ambient_sound(Some("wind"));
        editor.set_volume(20);
        editor.save(&path).unwrap();

        let mut other = editor_facing_origin();
        other.load(&path).unwrap();
        assert!(other.audio().is_playing());
        assert!((other.audio().volume() - 0.2).abs() < 1e-6);
        assert!(other.scene().sounds()[0].playing);

        let mut blocked = Editor::new(facing_origin_config(), BlockedBackend);
        blocked.load(&path).unwrap();
        assert!(!blocked.audio().is_playing());
        assert!(blocked.scene().sounds().iter().all(|sound| !sound.playing));

        let _ = std::fs::remove_file(path);
    }
}
