use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub title: String,
    pub resolution: Resolution,
    pub sample_count: u32,
    pub vsync: bool,
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub exposure: f32,
    pub wireframe: bool,
    pub clear_color: [f32; 4],
    pub fps_history_capacity: usize,
    pub shader_root: PathBuf,
    /// Fail the frame when the skybox shader cannot be built instead of
    /// drawing without a background.
    pub require_skybox: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            title: "gl-cube".to_owned(),
            resolution: Resolution::default(),
            sample_count: Self::default_sample_count(),
            vsync: true,
            fov_degrees: Self::default_fov_degrees(),
            near_plane: Self::default_near_plane(),
            far_plane: Self::default_far_plane(),
            exposure: Self::default_exposure(),
            wireframe: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fps_history_capacity: Self::default_fps_history_capacity(),
            shader_root: PathBuf::from("shaders"),
            require_skybox: true,
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if self.sample_count == 0 {
            warn!("Sample count must be greater than zero. Using default value.");
            self.sample_count = Self::default_sample_count();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            warn!(
                "Field of view {} is outside (0, 180). Using default value.",
                self.fov_degrees
            );
            self.fov_degrees = Self::default_fov_degrees();
        }

        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            warn!(
                "Clip planes near={} far={} are invalid. Using default planes.",
                self.near_plane, self.far_plane
            );
            self.near_plane = Self::default_near_plane();
            self.far_plane = Self::default_far_plane();
        }

        if !(self.exposure > 0.0) {
            warn!("Exposure must be greater than zero. Using default value.");
            self.exposure = Self::default_exposure();
        }

        if self.fps_history_capacity == 0 {
            warn!("FPS history capacity must be greater than zero. Using default value.");
            self.fps_history_capacity = Self::default_fps_history_capacity();
        }

        self
    }

    const fn default_sample_count() -> u32 {
        4
    }

    const fn default_fov_degrees() -> f32 {
        45.0
    }

    const fn default_near_plane() -> f32 {
        0.1
    }

    const fn default_far_plane() -> f32 {
        1000.0
    }

    const fn default_exposure() -> f32 {
        1.0
    }

    const fn default_fps_history_capacity() -> usize {
        120
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
