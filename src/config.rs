//! Scene configuration.
//!
//! Every field has a default that reproduces the stock scene: a 5x5 floor,
//! two red spheres dropped from y = 2 and a keyboard-pushable first sphere.
//! A TOML file only needs to list the values it overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub viewport: ViewportConfig,
    pub lights: LightsConfig,
    pub floor: FloorConfig,
    pub axes: AxesConfig,
    pub spheres: SpheresConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self { friction: 0.1, restitution: 0.9 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    /// Fixed sub-step length in seconds.
    pub fixed_interval: f32,
    pub max_substeps: u32,
    pub contact: ContactConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
            fixed_interval: 1.0 / 60.0,
            max_substeps: 3,
            contact: ContactConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            z_near: 0.1,
            z_far: 100.0,
            position: [-3.0, 3.0, 3.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio_cap: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 1280, height: 720, pixel_ratio_cap: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_color: [f32; 3],
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
            directional_color: [1.0, 1.0, 1.0],
            directional_intensity: 0.8,
            directional_position: [-3.0, 3.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: [f32; 2],
    pub color: [f32; 3],
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self { size: [5.0, 5.0], color: [1.0, 1.0, 1.0] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub enabled: bool,
    pub size: f32,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self { enabled: true, size: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub radius: f32,
    pub position: [f32; 3],
    pub mass: f32,
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    /// Receives keyboard forces. At most one sphere should set this.
    pub controlled: bool,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            position: [0.0, 2.0, 0.0],
            mass: 1.0,
            color: [1.0, 0.0, 0.0],
            metalness: 0.1,
            roughness: 0.3,
            controlled: false,
        }
    }
}

/// Newtype so an absent `spheres` key still yields the two stock spheres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpheresConfig(pub Vec<SphereConfig>);

impl Default for SpheresConfig {
    fn default() -> Self {
        Self(vec![
            SphereConfig { position: [1.0, 2.0, 0.0], controlled: true, ..SphereConfig::default() },
            SphereConfig { position: [-1.0, 2.0, 0.0], ..SphereConfig::default() },
        ])
    }
}

/// What happens to a keyboard force once its key is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceRelease {
    /// The force keeps acting until another key overwrites it.
    #[default]
    Sustain,
    /// Key-up zeroes the axes the key had set.
    OnKeyUp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindingConfig {
    /// Physical key code, e.g. `"KeyW"`.
    pub code: String,
    /// Unit-ish direction, scaled by `InputConfig::force_magnitude`.
    pub direction: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub force_magnitude: f32,
    pub release: ForceRelease,
    pub bindings: Vec<KeyBindingConfig>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            force_magnitude: 150.0,
            release: ForceRelease::Sustain,
            bindings: vec![
                KeyBindingConfig { code: "KeyW".into(), direction: [1.0, 0.0, 0.0] },
                KeyBindingConfig { code: "KeyS".into(), direction: [-1.0, 0.0, 0.0] },
            ],
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        if !(p.fixed_interval.is_finite() && p.fixed_interval > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.fixed_interval must be positive, got {}",
                p.fixed_interval
            )));
        }
        if p.max_substeps == 0 {
            return Err(ConfigError::Invalid("physics.max_substeps must be at least 1".into()));
        }
        for (i, s) in self.spheres.0.iter().enumerate() {
            if !(s.radius > 0.0) {
                return Err(ConfigError::Invalid(format!("spheres[{i}].radius must be positive")));
            }
            if !(s.mass >= 0.0) {
                return Err(ConfigError::Invalid(format!("spheres[{i}].mass must not be negative")));
            }
            if s.controlled && s.mass == 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "spheres[{i}] is controlled but has mass 0, which makes it static"
                )));
            }
        }
        if self.spheres.0.iter().filter(|s| s.controlled).count() > 1 {
            return Err(ConfigError::Invalid("at most one sphere may be controlled".into()));
        }
        if !(self.viewport.pixel_ratio_cap > 0.0) {
            return Err(ConfigError::Invalid("viewport.pixel_ratio_cap must be positive".into()));
        }
        Ok(())
    }
}
