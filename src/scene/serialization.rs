//! Persisted environment record, as stored by the document database.

use crate::assets::AssetKind;
use crate::scene::{
    ObjectId, PlacedObject, Pose, SceneSettings, SceneState, SoundId, SoundTrack,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot save an environment without a signed-in user")]
    MissingIdentity,
    #[error("unknown object type {0:?}")]
    UnknownAssetKind(String),
    #[error("id {0:?} is used by more than one entry")]
    DuplicateId(String),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Opaque user identity handed over by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Record fields that live outside the scene itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            is_public: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRecord {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_public: bool,
    pub scene_data: SceneData,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneData {
    pub objects: Vec<ObjectRecord>,
    pub sounds: Vec<SoundRecord>,
    pub settings: SettingsRecord,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: ScaleRecord,
    pub model: String,
    pub name: String,
}

/// Older records store a single uniform factor; new ones always write axes.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ScaleRecord {
    Uniform(f32),
    Axes([f32; 3]),
}

impl ScaleRecord {
    pub fn to_axes(self) -> [f32; 3] {
        match self {
            ScaleRecord::Uniform(scale) => [scale, scale, scale],
            ScaleRecord::Axes(axes) => axes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SoundRecord {
    pub id: SoundId,
    pub name: String,
    pub src: String,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub skybox: String,
    pub ambient_light: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog_density: Option<f32>,
}

impl EnvironmentRecord {
    pub fn from_scene(
        scene: &SceneState,
        meta: &RecordMeta,
        identity: Option<&UserIdentity>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let identity = identity.ok_or(SerializationError::MissingIdentity)?;
        let settings = scene.settings();
        Ok(Self {
            id: meta.id.clone(),
            name: meta.name.clone(),
            creator_id: identity.as_str().to_string(),
            created_at: meta.created_at,
            updated_at: now,
            is_public: meta.is_public,
            scene_data: SceneData {
                objects: scene.objects().iter().map(object_to_record).collect(),
                sounds: scene.sounds().iter().map(sound_to_record).collect(),
                settings: SettingsRecord {
                    skybox: settings.skybox.clone(),
                    ambient_light: settings.ambient_light,
                    fog_color: settings.fog_color.clone(),
                    fog_density: settings.fog_density,
                },
            },
        })
    }

    pub fn meta(&self) -> RecordMeta {
        RecordMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            is_public: self.is_public,
            created_at: self.created_at,
        }
    }

    pub fn to_scene(&self) -> Result<SceneState> {
        let objects = self
            .scene_data
            .objects
            .iter()
            .map(record_to_object)
            .collect::<Result<Vec<_>>>()?;
        ensure_unique(objects.iter().map(|object| object.id.as_str()))?;
        ensure_unique(self.scene_data.sounds.iter().map(|sound| sound.id.as_str()))?;
        let sounds = self
            .scene_data
            .sounds
            .iter()
            .map(|sound| SoundTrack {
                id: sound.id.clone(),
                name: sound.name.clone(),
                src: sound.src.clone(),
                volume: sound.volume,
                looping: sound.looping,
                playing: sound.playing,
            })
            .collect();
        let settings = &self.scene_data.settings;
        Ok(SceneState::from_parts(
            objects,
            sounds,
            SceneSettings {
                skybox: settings.skybox.clone(),
                ambient_light: settings.ambient_light,
                fog_color: settings.fog_color.clone(),
                fog_density: settings.fog_density,
            },
        ))
    }
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SerializationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

fn object_to_record(object: &PlacedObject) -> ObjectRecord {
    ObjectRecord {
        id: object.id.clone(),
        kind: object.kind.as_str().to_string(),
        position: object.pose.position,
        rotation: object.pose.rotation,
        scale: ScaleRecord::Axes(object.pose.scale),
        model: object.model.clone(),
        name: object.name.clone(),
    }
}

fn record_to_object(record: &ObjectRecord) -> Result<PlacedObject> {
    let kind = AssetKind::parse(&record.kind)
        .ok_or_else(|| SerializationError::UnknownAssetKind(record.kind.clone()))?;
    Ok(PlacedObject {
        id: record.id.clone(),
        kind,
        name: record.name.clone(),
        model: record.model.clone(),
        pose: Pose {
            position: record.position,
            rotation: record.rotation,
            scale: record.scale.to_axes(),
        },
    })
}

fn sound_to_record(sound: &SoundTrack) -> SoundRecord {
    SoundRecord {
        id: sound.id.clone(),
        name: sound.name.clone(),
        src: sound.src.clone(),
        volume: sound.volume,
        looping: sound.looping,
        playing: sound.playing,
    }
}

pub fn save_record_to_file(record: &EnvironmentRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_record_from_file(path: &Path) -> Result<EnvironmentRecord> {
    let json = std::fs::read_to_string(path)?;
    let record: EnvironmentRecord = serde_json::from_str(&json)?;
    Ok(record)
}
