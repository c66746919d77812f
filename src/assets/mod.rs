//! Static catalog of everything the editor can place or pick: nature objects,
//! generic models, ambient sounds and lighting presets.

use crate::scene::SceneSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Tree,
    Mountain,
    Water,
    Mat,
    Model,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Tree,
        AssetKind::Mountain,
        AssetKind::Water,
        AssetKind::Mat,
        AssetKind::Model,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Tree => "tree",
            AssetKind::Mountain => "mountain",
            AssetKind::Water => "water",
            AssetKind::Mat => "mat",
            AssetKind::Model => "model",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Nature,
    Model,
    Sound,
    Lighting,
}

/// Renderable primitive in object-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    Cone {
        radius: f32,
        height: f32,
        segments: u32,
    },
    Plane {
        width: f32,
        depth: f32,
    },
    Box {
        size: [f32; 3],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitivePart {
    pub primitive: Primitive,
    pub offset: [f32; 3],
    pub color: &'static str,
    pub opacity: f32,
}

/// Object-local axis-aligned box used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitVolume {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDefaults {
    pub kind: AssetKind,
    pub name: &'static str,
    pub model: &'static str,
    pub parts: &'static [PrimitivePart],
    pub hit_volume: HitVolume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingPreset {
    Day,
    Sunset,
    Night,
}

impl LightingPreset {
    pub fn settings(self) -> SceneSettings {
        let (skybox, ambient_light) = match self {
            LightingPreset::Day => ("day", 1.0),
            LightingPreset::Sunset => ("sunset", 0.6),
            LightingPreset::Night => ("night", 0.2),
        };
        SceneSettings {
            skybox: skybox.to_string(),
            ambient_light,
            fog_color: None,
            fog_density: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssetPayload {
    Object { kind: AssetKind, model: &'static str },
    Sound { src: &'static str },
    Lighting(LightingPreset),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub category: AssetCategory,
    pub payload: AssetPayload,
}

const TREE_PARTS: &[PrimitivePart] = &[
    PrimitivePart {
        primitive: Primitive::Cylinder {
            radius_top: 0.2,
            radius_bottom: 0.3,
            height: 2.0,
            segments: 8,
        },
        offset: [0.0, 0.0, 0.0],
        color: "#8B4513",
        opacity: 1.0,
    },
    PrimitivePart {
        primitive: Primitive::Cone {
            radius: 1.0,
            height: 2.0,
            segments: 8,
        },
        offset: [0.0, 1.5, 0.0],
        color: "#2E8B57",
        opacity: 1.0,
    },
];

const MOUNTAIN_PARTS: &[PrimitivePart] = &[PrimitivePart {
    primitive: Primitive::Cone {
        radius: 2.0,
        height: 4.0,
        segments: 4,
    },
    offset: [0.0, 0.0, 0.0],
    color: "#808080",
    opacity: 1.0,
}];

const WATER_PARTS: &[PrimitivePart] = &[PrimitivePart {
    primitive: Primitive::Plane {
        width: 4.0,
        depth: 4.0,
    },
    offset: [0.0, -0.4, 0.0],
    color: "#4169E1",
    opacity: 0.8,
}];

const MAT_PARTS: &[PrimitivePart] = &[PrimitivePart {
    primitive: Primitive::Cylinder {
        radius_top: 1.0,
        radius_bottom: 1.0,
        height: 0.05,
        segments: 32,
    },
    offset: [0.0, 0.0, 0.0],
    color: "#8b5a2b",
    opacity: 1.0,
}];

const MODEL_PARTS: &[PrimitivePart] = &[PrimitivePart {
    primitive: Primitive::Box {
        size: [1.0, 1.0, 1.0],
    },
    offset: [0.0, 0.0, 0.0],
    color: "#888888",
    opacity: 1.0,
}];

static OBJECT_DEFAULTS: [ObjectDefaults; 5] = [
    ObjectDefaults {
        kind: AssetKind::Tree,
        name: "Tree",
        model: "",
        parts: TREE_PARTS,
        hit_volume: HitVolume {
            center: [0.0, 0.75, 0.0],
            half_extents: [1.0, 1.75, 1.0],
        },
    },
    ObjectDefaults {
        kind: AssetKind::Mountain,
        name: "Mountain",
        model: "",
        parts: MOUNTAIN_PARTS,
        hit_volume: HitVolume {
            center: [0.0, 0.0, 0.0],
            half_extents: [2.0, 2.0, 2.0],
        },
    },
    ObjectDefaults {
        kind: AssetKind::Water,
        name: "Water",
        model: "",
        parts: WATER_PARTS,
        hit_volume: HitVolume {
            center: [0.0, -0.4, 0.0],
            half_extents: [2.0, 0.05, 2.0],
        },
    },
    ObjectDefaults {
        kind: AssetKind::Mat,
        name: "Meditation Mat",
        model: "",
        parts: MAT_PARTS,
        hit_volume: HitVolume {
            center: [0.0, 0.1, 0.0],
            half_extents: [1.1, 0.1, 1.1],
        },
    },
    ObjectDefaults {
        kind: AssetKind::Model,
        name: "Model",
        model: "",
        parts: MODEL_PARTS,
        hit_volume: HitVolume {
            center: [0.0, 0.0, 0.0],
            half_extents: [0.5, 0.5, 0.5],
        },
    },
];

const CATALOG: &[AssetDescriptor] = &[
    AssetDescriptor {
        id: "tree",
        name: "Tree",
        category: AssetCategory::Nature,
        payload: AssetPayload::Object {
            kind: AssetKind::Tree,
            model: "",
        },
    },
    AssetDescriptor {
        id: "mountain",
        name: "Mountain",
        category: AssetCategory::Nature,
        payload: AssetPayload::Object {
            kind: AssetKind::Mountain,
            model: "",
        },
    },
    AssetDescriptor {
        id: "water",
        name: "Water",
        category: AssetCategory::Nature,
        payload: AssetPayload::Object {
            kind: AssetKind::Water,
            model: "",
        },
    },
    AssetDescriptor {
        id: "mat",
        name: "Meditation Mat",
        category: AssetCategory::Nature,
        payload: AssetPayload::Object {
            kind: AssetKind::Mat,
            model: "",
        },
    },
    AssetDescriptor {
        id: "buddha-statue",
        name: "Buddha Statue",
        category: AssetCategory::Model,
        payload: AssetPayload::Object {
            kind: AssetKind::Model,
            model: "https://res.cloudinary.com/diozithos/image/upload/v1742907475/budha_statue_iijsgt.glb",
        },
    },
    AssetDescriptor {
        id: "maple-tree",
        name: "Maple Tree",
        category: AssetCategory::Model,
        payload: AssetPayload::Object {
            kind: AssetKind::Model,
            model: "https://res.cloudinary.com/diozithos/image/upload/v1742906984/maple_tree_zdi3mo.glb",
        },
    },
    AssetDescriptor {
        id: "water-animation",
        name: "Water Animation",
        category: AssetCategory::Model,
        payload: AssetPayload::Object {
            kind: AssetKind::Model,
            model: "https://res.cloudinary.com/diozithos/image/upload/v1742912974/water_animation_m47iom.glb",
        },
    },
    AssetDescriptor {
        id: "wind",
        name: "Wind Sound",
        category: AssetCategory::Sound,
        payload: AssetPayload::Sound {
            src: "https://assets.mixkit.co/active_storage/sfx/212/212-preview.mp3",
        },
    },
    AssetDescriptor {
        id: "music",
        name: "Ambient Music",
        category: AssetCategory::Sound,
        payload: AssetPayload::Sound {
            src: "https://assets.mixkit.co/active_storage/sfx/2452/2452-preview.mp3",
        },
    },
    AssetDescriptor {
        id: "daytime",
        name: "Daytime",
        category: AssetCategory::Lighting,
        payload: AssetPayload::Lighting(LightingPreset::Day),
    },
    AssetDescriptor {
        id: "sunset",
        name: "Sunset",
        category: AssetCategory::Lighting,
        payload: AssetPayload::Lighting(LightingPreset::Sunset),
    },
    AssetDescriptor {
        id: "night",
        name: "Night",
        category: AssetCategory::Lighting,
        payload: AssetPayload::Lighting(LightingPreset::Night),
    },
];

/// Geometry, hit volume and default labels for a placeable kind.
pub fn object_defaults(kind: AssetKind) -> &'static ObjectDefaults {
    let index = match kind {
        AssetKind::Tree => 0,
        AssetKind::Mountain => 1,
        AssetKind::Water => 2,
        AssetKind::Mat => 3,
        AssetKind::Model => 4,
    };
    &OBJECT_DEFAULTS[index]
}

pub fn descriptors() -> &'static [AssetDescriptor] {
    CATALOG
}

pub fn descriptor(id: &str) -> Option<&'static AssetDescriptor> {
    CATALOG.iter().find(|entry| entry.id == id)
}

pub fn by_category(category: AssetCategory) -> impl Iterator<Item = &'static AssetDescriptor> {
    CATALOG
        .iter()
        .filter(move |entry| entry.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_defaults() {
        for kind in AssetKind::ALL {
            let defaults = object_defaults(kind);
            assert_eq!(defaults.kind, kind);
            assert!(!defaults.parts.is_empty());
            assert!(defaults.hit_volume.half_extents.iter().all(|v| *v > 0.0));
        }
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AssetKind::parse("rock"), None);
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = descriptors().iter().map(|entry| entry.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), descriptors().len());
    }

    #[test]
    fn sounds_and_lighting_are_categorised() {
        assert_eq!(by_category(AssetCategory::Sound).count(), 2);
        assert!(by_category(AssetCategory::Lighting)
            .all(|entry| matches!(entry.payload, AssetPayload::Lighting(_))));
        assert_eq!(
            descriptor("sunset").map(|entry| entry.payload),
            Some(AssetPayload::Lighting(LightingPreset::Sunset))
        );
    }
}
