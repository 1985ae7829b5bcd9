//! Scene configuration: the fixed look of the viewer

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

/// Default model shipped with the viewer, relative to the asset root
pub const DEFAULT_ASSET_PATH: &str = "assets/jenny_idle.glb";

/// Bevy's default camera exposure maps roughly this many lux to unit radiance
const LUX_PER_UNIT_INTENSITY: f32 = 3000.0;
/// Ambient brightness (cd/m²) per unit of renderer-neutral intensity
const NITS_PER_UNIT_AMBIENT: f32 = 1000.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse scene config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid scene config: {0}")]
    Invalid(String),
}

/// Everything that makes up the scene's appearance and input feel
#[derive(Debug, Clone, Resource, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Background as 0xRRGGBB
    pub background: u32,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    pub controls: ControlsConfig,
    /// Upper bound for the device pixel ratio used by the surface
    pub max_pixel_ratio: f32,
    /// glTF binary to load, relative to the asset root
    pub asset_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    /// Shadow map resolution (square)
    pub shadow_map_size: usize,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0x8e8e8e,
            camera: CameraConfig::default(),
            lights: LightConfig::default(),
            controls: ControlsConfig::default(),
            max_pixel_ratio: 2.0,
            asset_path: DEFAULT_ASSET_PATH.to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.5, 3.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.6,
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [5.0, 10.0, 5.0],
            shadow_map_size: 2048,
            shadow_near: 0.5,
            shadow_far: 50.0,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl SceneConfig {
    /// Parse a TOML document; missing keys fall back to the defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(ConfigError::Invalid(format!(
                "clipping planes must satisfy 0 < near < far, got {}/{}",
                camera.near, camera.far
            )));
        }
        let lights = &self.lights;
        if lights.shadow_near <= 0.0 || lights.shadow_far <= lights.shadow_near {
            return Err(ConfigError::Invalid(format!(
                "shadow planes must satisfy 0 < near < far, got {}/{}",
                lights.shadow_near, lights.shadow_far
            )));
        }
        if !(0.0..=1.0).contains(&self.controls.damping_factor) {
            return Err(ConfigError::Invalid(format!(
                "damping_factor must be in [0, 1], got {}",
                self.controls.damping_factor
            )));
        }
        if self.max_pixel_ratio <= 0.0 {
            return Err(ConfigError::Invalid("max_pixel_ratio must be positive".to_string()));
        }
        Ok(())
    }

    pub fn background_color(&self) -> Color {
        hex_color(self.background)
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from_array(self.camera.position)
    }

    pub fn camera_target(&self) -> Vec3 {
        Vec3::from_array(self.camera.target)
    }

    /// Ambient intensity in Bevy's cd/m² units
    pub fn ambient_brightness(&self) -> f32 {
        self.lights.ambient_intensity * NITS_PER_UNIT_AMBIENT
    }

    /// Directional intensity in lux
    pub fn directional_illuminance(&self) -> f32 {
        self.lights.directional_intensity * LUX_PER_UNIT_INTENSITY
    }

    /// Clamp a device pixel ratio to the configured maximum
    pub fn pixel_ratio(&self, device_ratio: f32) -> f32 {
        device_ratio.min(self.max_pixel_ratio)
    }
}

/// Convert 0xRRGGBB into an sRGB color
pub fn hex_color(rgb: u32) -> Color {
    Color::srgb_u8(
        ((rgb >> 16) & 0xff) as u8,
        ((rgb >> 8) & 0xff) as u8,
        (rgb & 0xff) as u8,
    )
}
