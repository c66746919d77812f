use std::path::{Path, PathBuf};

/// Environment variable holding the path of a JSON config file.
pub const CONFIG_ENV_VAR: &str = "STILLPOINT_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tuning for direct manipulation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Radians of yaw per NDC unit of horizontal pointer travel.
    pub rotate_sensitivity: f32,
    pub min_scale: f32,
    /// Pointer travel (NDC) before an armed session counts as a drag.
    pub drag_threshold: f32,
    pub parallel_epsilon: f32,
    pub floor_y: f32,
}

impl DragConfig {
    /// Raises `min_scale` to the scene floor so drags never produce a scale
    /// the store would reject.
    pub fn validated(mut self) -> Self {
        let floor = crate::scene::MIN_SCALE;
        if !(self.min_scale.is_finite() && self.min_scale >= floor) {
            log::warn!("drag min_scale {} is below {floor}, using {floor}", self.min_scale);
            self.min_scale = floor;
        }
        self
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 5.0,
            min_scale: crate::scene::MIN_SCALE,
            drag_threshold: 0.002,
            parallel_epsilon: 1e-6,
            floor_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 5.0, 10.0],
            target: [0.0, 0.0, -2.0],
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub drag: DragConfig,
    pub camera: CameraConfig,
    /// Where catalog picks land.
    pub place_position: [f32; 3],
    /// Ambient volume in percent.
    pub default_volume: u8,
    pub seed_default_mat: bool,
    pub scene_path: PathBuf,
    pub environment_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag: DragConfig::default(),
            camera: CameraConfig::default(),
            place_position: [0.0, 0.0, -5.0],
            default_volume: 50,
            seed_default_mat: true,
            scene_path: PathBuf::from("environment.json"),
            environment_name: "Untitled Environment".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&json)?;
        config.drag = config.drag.validated();
        Ok(config)
    }

    /// Loads the file named by `STILLPOINT_CONFIG`, or defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            log::info!("{CONFIG_ENV_VAR} not set, using default config");
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("loaded config from {}", Path::new(&path).display());
                config
            }
            Err(err) => {
                log::warn!("{err}; falling back to default config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{ "drag": { "rotate_sensitivity": 2.5 }, "default_volume": 80 }"#)
                .unwrap();
        assert_eq!(config.drag.rotate_sensitivity, 2.5);
        assert_eq!(config.drag.min_scale, DragConfig::default().min_scale);
        assert_eq!(config.default_volume, 80);
        assert_eq!(config.camera, CameraConfig::default());
        assert!(config.seed_default_mat);
    }

    #[test]
    fn non_positive_min_scale_is_raised_to_floor() {
        for min_scale in [0.0, -1.0, f32::NAN, 0.001] {
            let config = DragConfig {
                min_scale,
                ..DragConfig::default()
            };
            assert_eq!(config.validated().min_scale, crate::scene::MIN_SCALE);
        }
        let coarse = DragConfig {
            min_scale: 0.25,
            ..DragConfig::default()
        };
        assert_eq!(coarse.validated().min_scale, 0.25);
    }

    #[test]
    fn load_validates_drag_section() {
        let mut path = std::env::temp_dir();
        path.push(format!("stillpoint_min_scale_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "drag": { "min_scale": -2.0 } }"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.drag.min_scale, crate::scene::MIN_SCALE);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_reports_missing_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("stillpoint_missing_config_{}.json", std::process::id()));
        assert!(matches!(
            EditorConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("stillpoint_config_{}_{}.json", std::process::id(), nonce));
        std::fs::write(&path, r#"{ "place_position": [1.0, 0.0, -3.0] }"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.place_position, [1.0, 0.0, -3.0]);

        let _ = std::fs::remove_file(path);
    }
}
