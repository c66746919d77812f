pub mod serialization;

use crate::assets::{object_defaults, AssetKind, LightingPreset};
use crate::interaction::ManipulationError;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Smallest value any scale axis may hold.
pub const MIN_SCALE: f32 = 0.01;

/// Id of the mat seeded into an empty scene on first load.
pub const DEFAULT_MAT_ID: &str = "default-mat";

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(ObjectId);
string_id!(SoundId);

/// Position, Euler rotation (radians) and per-axis scale of a placed object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl Pose {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = uniform_scale(scale);
        self
    }

    pub fn yaw(&self) -> f32 {
        self.rotation[1]
    }
}

pub fn uniform_scale(scale: f32) -> [f32; 3] {
    [scale, scale, scale]
}

/// Pins every non-positive (or non-finite) axis to `min`.
pub fn sanitize_scale(scale: [f32; 3], min: f32) -> [f32; 3] {
    scale.map(|axis| if axis.is_finite() && axis >= min { axis } else { min })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub kind: AssetKind,
    pub name: String,
    pub model: String,
    pub pose: Pose,
}

/// Partial update for a placed object; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub position: Option<[f32; 3]>,
    pub rotation: Option<[f32; 3]>,
    pub scale: Option<[f32; 3]>,
}

impl ObjectPatch {
    pub fn from_pose(pose: Pose) -> Self {
        Self {
            name: None,
            position: Some(pose.position),
            rotation: Some(pose.rotation),
            scale: Some(pose.scale),
        }
    }

    pub fn position(position: [f32; 3]) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: [f32; 3]) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn scale(scale: [f32; 3]) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn apply_to(&self, object: &mut PlacedObject) -> bool {
        let before = object.clone();
        if let Some(name) = &self.name {
            object.name.clone_from(name);
        }
        if let Some(position) = self.position {
            object.pose.position = position;
        }
        if let Some(rotation) = self.rotation {
            object.pose.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            object.pose.scale = sanitize_scale(scale, MIN_SCALE);
        }
        *object != before
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundTrack {
    pub id: SoundId,
    pub name: String,
    pub src: String,
    /// Linear gain in `0.0..=1.0`.
    pub volume: f32,
    pub looping: bool,
    pub playing: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundPatch {
    pub name: Option<String>,
    pub volume: Option<f32>,
    pub looping: Option<bool>,
    pub playing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub skybox: String,
    pub ambient_light: f32,
    pub fog_color: Option<String>,
    pub fog_density: Option<f32>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        LightingPreset::Day.settings()
    }
}

/// What changed in a single store transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Placed(ObjectId),
    Updated(ObjectId),
    Removed {
        id: ObjectId,
        selection_cleared: bool,
    },
    SelectionChanged(Option<ObjectId>),
    SoundAdded(SoundId),
    SoundUpdated(SoundId),
    SoundRemoved(SoundId),
    SettingsChanged,
    Replaced,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneState {
    objects: Vec<PlacedObject>,
    selected: Option<ObjectId>,
    sounds: Vec<SoundTrack>,
    settings: SceneSettings,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from loaded parts. Nothing is selected.
    pub fn from_parts(
        objects: Vec<PlacedObject>,
        sounds: Vec<SoundTrack>,
        settings: SceneSettings,
    ) -> Self {
        Self {
            objects,
            selected: None,
            sounds,
            settings,
        }
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn object(&self, id: &ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|object| &object.id == id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn selected(&self) -> Option<&ObjectId> {
        self.selected.as_ref()
    }

    pub fn selected_object(&self) -> Option<&PlacedObject> {
        self.selected.as_ref().and_then(|id| self.object(id))
    }

    pub fn sounds(&self) -> &[SoundTrack] {
        &self.sounds
    }

    pub fn sound(&self, id: &SoundId) -> Option<&SoundTrack> {
        self.sounds.iter().find(|sound| &sound.id == id)
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    fn object_mut(&mut self, id: &ObjectId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|object| &object.id == id)
    }
}

pub type SceneObserver = Rc<dyn Fn(&SceneEvent, &SceneState)>;

/// Keeps an observer registered; dropping it unsubscribes.
pub struct SceneSubscription {
    observer: SceneObserver,
    observers: Rc<RefCell<Vec<SceneObserver>>>,
}

impl Drop for SceneSubscription {
    fn drop(&mut self) {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|item| !Rc::ptr_eq(item, &self.observer));
    }
}

/// Owner of the authoritative scene. Every mutation goes through here and is
/// reported to observers once the state is consistent again.
pub struct SceneStore {
    state: SceneState,
    observers: Rc<RefCell<Vec<SceneObserver>>>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    pub fn new() -> Self {
        Self::with_state(SceneState::new())
    }

    pub fn with_state(state: SceneState) -> Self {
        let mut store = Self {
            state: SceneState::new(),
            observers: Rc::new(RefCell::new(Vec::new())),
        };
        store.state = normalize_state(state);
        store
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn subscribe(&self, observer: SceneObserver) -> SceneSubscription {
        self.observers.borrow_mut().push(observer.clone());
        SceneSubscription {
            observer,
            observers: Rc::clone(&self.observers),
        }
    }

    fn notify(&self, event: SceneEvent) {
        let observers = self.observers.borrow().clone();
        for observer in observers {
            (observer)(&event, &self.state);
        }
    }

    /// Places an object with the catalog's default name and model for `kind`.
    pub fn place(&mut self, kind: AssetKind, pose: Pose) -> ObjectId {
        let defaults = object_defaults(kind);
        self.place_named(kind, defaults.name, defaults.model, pose)
    }

    pub fn place_named(
        &mut self,
        kind: AssetKind,
        name: &str,
        model: &str,
        pose: Pose,
    ) -> ObjectId {
        self.insert(PlacedObject {
            id: ObjectId::generate(),
            kind,
            name: name.to_string(),
            model: model.to_string(),
            pose,
        })
    }

    /// Seeds the default mat at the origin when the scene is empty.
    pub fn seed_default(&mut self) -> Option<ObjectId> {
        if !self.state.objects.is_empty() {
            return None;
        }
        let defaults = object_defaults(AssetKind::Mat);
        Some(self.insert(PlacedObject {
            id: ObjectId::new(DEFAULT_MAT_ID),
            kind: AssetKind::Mat,
            name: defaults.name.to_string(),
            model: defaults.model.to_string(),
            pose: Pose::default(),
        }))
    }

    fn insert(&mut self, mut object: PlacedObject) -> ObjectId {
        object.pose.scale = sanitize_scale(object.pose.scale, MIN_SCALE);
        let id = object.id.clone();
        log::debug!("placed {} ({:?}) as {}", object.name, object.kind, id);
        self.state.objects.push(object);
        self.notify(SceneEvent::Placed(id.clone()));
        id
    }

    /// Applies `patch` to `id`. Missing ids are ignored.
    pub fn update(&mut self, id: &ObjectId, patch: &ObjectPatch) {
        if let Err(err) = self.try_update(id, patch) {
            log::trace!("update ignored: {err}");
        }
    }

    /// Like [`SceneStore::update`] but reports a missing id. Returns whether
    /// anything changed.
    pub fn try_update(
        &mut self,
        id: &ObjectId,
        patch: &ObjectPatch,
    ) -> Result<bool, ManipulationError> {
        let object = self
            .state
            .object_mut(id)
            .ok_or_else(|| ManipulationError::NotFound(id.clone()))?;
        let changed = patch.apply_to(object);
        if changed {
            self.notify(SceneEvent::Updated(id.clone()));
        }
        Ok(changed)
    }

    /// Removes `id`, clearing the selection in the same transition if it
    /// pointed at the removed object.
    pub fn remove(&mut self, id: &ObjectId) -> Option<PlacedObject> {
        let Some(index) = self.state.objects.iter().position(|object| &object.id == id) else {
            log::trace!("remove ignored: object {id} not found");
            return None;
        };
        let removed = self.state.objects.remove(index);
        let selection_cleared = self.state.selected.as_ref() == Some(id);
        if selection_cleared {
            self.state.selected = None;
        }
        self.notify(SceneEvent::Removed {
            id: id.clone(),
            selection_cleared,
        });
        Some(removed)
    }

    /// Sets the selection. Ids not present in the scene are ignored.
    pub fn select(&mut self, id: Option<&ObjectId>) {
        if let Some(id) = id {
            if !self.state.contains(id) {
                log::trace!("select ignored: object {id} not found");
                return;
            }
        }
        if self.state.selected.as_ref() == id {
            return;
        }
        self.state.selected = id.cloned();
        self.notify(SceneEvent::SelectionChanged(self.state.selected.clone()));
    }

    pub fn add_sound(&mut self, name: &str, src: &str, volume: f32, looping: bool) -> SoundId {
        let id = SoundId::generate();
        self.state.sounds.push(SoundTrack {
            id: id.clone(),
            name: name.to_string(),
            src: src.to_string(),
            volume: volume.clamp(0.0, 1.0),
            looping,
            playing: false,
        });
        self.notify(SceneEvent::SoundAdded(id.clone()));
        id
    }

    pub fn update_sound(&mut self, id: &SoundId, patch: &SoundPatch) {
        let Some(sound) = self.state.sounds.iter_mut().find(|sound| &sound.id == id) else {
            log::trace!("sound update ignored: {id} not found");
            return;
        };
        let before = sound.clone();
        if let Some(name) = &patch.name {
            sound.name.clone_from(name);
        }
        if let Some(volume) = patch.volume {
            sound.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(looping) = patch.looping {
            sound.looping = looping;
        }
        if let Some(playing) = patch.playing {
            sound.playing = playing;
        }
        if *sound != before {
            self.notify(SceneEvent::SoundUpdated(id.clone()));
        }
    }

    pub fn remove_sound(&mut self, id: &SoundId) -> Option<SoundTrack> {
        let index = self.state.sounds.iter().position(|sound| &sound.id == id)?;
        let removed = self.state.sounds.remove(index);
        self.notify(SceneEvent::SoundRemoved(id.clone()));
        Some(removed)
    }

    pub fn set_settings(&mut self, settings: SceneSettings) {
        if self.state.settings == settings {
            return;
        }
        self.state.settings = settings;
        self.notify(SceneEvent::SettingsChanged);
    }

    pub fn apply_lighting(&mut self, preset: LightingPreset) {
        let mut settings = preset.settings();
        settings.fog_color = self.state.settings.fog_color.clone();
        settings.fog_density = self.state.settings.fog_density;
        self.set_settings(settings);
    }

    /// Swaps in a whole scene, e.g. after loading a record.
    pub fn replace(&mut self, state: SceneState) {
        self.state = normalize_state(state);
        self.notify(SceneEvent::Replaced);
    }
}

/// Drops later entries that reuse an id, clears a dangling selection and
/// clamps scales.
fn normalize_state(mut state: SceneState) -> SceneState {
    let mut seen = HashSet::new();
    state.objects.retain(|object| {
        let fresh = seen.insert(object.id.clone());
        if !fresh {
            log::warn!("dropping duplicate object {}", object.id);
        }
        fresh
    });
    let mut seen = HashSet::new();
    state.sounds.retain(|sound| {
        let fresh = seen.insert(sound.id.clone());
        if !fresh {
            log::warn!("dropping duplicate sound {}", sound.id);
        }
        fresh
    });
    if let Some(id) = &state.selected {
        if !state.contains(id) {
            state.selected = None;
        }
    }
    for object in &mut state.objects {
        object.pose.scale = sanitize_scale(object.pose.scale, MIN_SCALE);
    }
    state
}
