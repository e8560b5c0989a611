//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Planet shell geometry and rotation.
    pub planet: PlanetConfig,
    /// Camera framing and orbit limits.
    pub camera: CameraConfig,
    /// Texture asset locations.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Longitude and latitude segment count of every shell sphere.
    pub sphere_segments: u32,
    /// Draw the equirectangular star background when it is available.
    pub show_background: bool,
    /// Clear color used when no background is drawn (linear RGB).
    pub clear_color: [f64; 3],
}

/// Planet shell configuration.
///
/// Radii must satisfy `surface_radius < cloud_radius < atmosphere_radius`;
/// the layer composer rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Radius of the opaque surface shell.
    pub surface_radius: f32,
    /// Radius of the alpha-masked cloud shell.
    pub cloud_radius: f32,
    /// Radius of the back-face atmosphere shell.
    pub atmosphere_radius: f32,
    /// Axial tilt of the layer group in degrees.
    pub axial_tilt_deg: f32,
    /// Starting yaw of the surface and cloud shells in radians.
    pub initial_yaw: f32,
    /// Surface rotation rate in radians per second at speed factor 1.
    pub base_surface_rate: f32,
    /// Build the atmosphere shell.
    pub atmosphere: bool,
    /// World-space position of the primary (sun) light.
    pub sun_position: [f32; 3],
}

/// Camera framing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Camera distance when the startup approach begins.
    pub start_distance: f32,
    /// Camera distance when the startup approach settles.
    pub final_distance: f32,
    /// Duration of the startup approach in seconds.
    pub approach_seconds: f32,
    /// Closest zoom allowed by the orbit controls.
    pub min_distance: f32,
    /// Farthest zoom allowed by the orbit controls.
    pub max_distance: f32,
    /// Orbit damping factor in `(0, 1]`; 1 disables inertia.
    pub damping: f32,
    /// Radians of orbit per pixel of mouse drag.
    pub rotate_speed: f32,
}

/// Texture asset configuration.
///
/// File names are resolved relative to `dir`. Optional layers may be `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding the texture files.
    pub dir: PathBuf,
    /// Equirectangular star background.
    pub background: Option<String>,
    /// Surface albedo map (required).
    pub albedo: String,
    /// Surface height map used for bump shading (required).
    pub bump: String,
    /// Cloud alpha map (required).
    pub clouds: String,
    /// Ocean mask driving roughness and metalness.
    pub ocean: Option<String>,
    /// Night-side city lights.
    pub night_lights: Option<String>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the frames-per-second counter in the window title.
    pub show_fps: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Globe".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sphere_segments: 64,
            show_background: true,
            clear_color: [0.0, 0.0, 0.01],
        }
    }
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            surface_radius: 10.0,
            cloud_radius: 10.05,
            atmosphere_radius: 12.5,
            axial_tilt_deg: 23.5,
            initial_yaw: -0.3,
            base_surface_rate: 0.005,
            atmosphere: true,
            sun_position: [-50.0, 0.0, 30.0],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 0.1,
            far: 1000.0,
            start_distance: 60.0,
            final_distance: 30.0,
            approach_seconds: 2.0,
            min_distance: 12.0,
            max_distance: 100.0,
            damping: 0.1,
            rotate_speed: 0.005,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            background: Some("Gaia_EDR3_darkened.png".to_string()),
            albedo: "Albedo.jpg".to_string(),
            bump: "Bump.jpg".to_string(),
            clouds: "Clouds.png".to_string(),
            ocean: Some("Ocean.png".to_string()),
            night_lights: Some("night_lights_modified.png".to_string()),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            log_level: "info".to_string(),
        }
    }
}

impl AssetConfig {
    /// Full path of an asset file name.
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
