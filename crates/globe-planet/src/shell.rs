//! Concentric shells and the tilted group that carries them.

use glam::{Mat3, Mat4, Vec3};

use crate::material::{AtmosphereMaterial, CloudMaterial, SurfaceMaterial};

/// Which layer a shell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Surface,
    Clouds,
    Atmosphere,
}

/// Ties a material type to the shell it shades.
pub trait ShellMaterial {
    const KIND: ShellKind;
}

/// A sphere of a given radius, spun about the group's local Y axis, with its material.
#[derive(Debug)]
pub struct Shell<M> {
    pub radius: f32,
    /// Rotation about the tilted axis in radians.
    pub yaw: f32,
    pub material: M,
}

impl<M: ShellMaterial> Shell<M> {
    pub fn new(radius: f32, yaw: f32, material: M) -> Self {
        Self {
            radius,
            yaw,
            material,
        }
    }

    pub fn kind(&self) -> ShellKind {
        M::KIND
    }
}

/// Radii of the three shells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellLayout {
    pub surface: f32,
    pub clouds: f32,
    pub atmosphere: f32,
}

impl ShellLayout {
    /// Radii must be positive and strictly increasing outward.
    pub fn is_valid(&self) -> bool {
        self.surface > 0.0 && self.surface < self.clouds && self.clouds < self.atmosphere
    }
}

impl From<&globe_config::PlanetConfig> for ShellLayout {
    fn from(config: &globe_config::PlanetConfig) -> Self {
        Self {
            surface: config.surface_radius,
            clouds: config.cloud_radius,
            atmosphere: config.atmosphere_radius,
        }
    }
}

/// Rotation container for the planet's shells.
///
/// The axial tilt is fixed at construction; only the per-shell yaw moves.
#[derive(Debug)]
pub struct LayerGroup {
    tilt: f32,
    pub surface: Shell<SurfaceMaterial>,
    pub clouds: Shell<CloudMaterial>,
    pub atmosphere: Option<Shell<AtmosphereMaterial>>,
}

impl LayerGroup {
    pub(crate) fn new(
        tilt: f32,
        surface: Shell<SurfaceMaterial>,
        clouds: Shell<CloudMaterial>,
        atmosphere: Option<Shell<AtmosphereMaterial>>,
    ) -> Self {
        Self {
            tilt,
            surface,
            clouds,
            atmosphere,
        }
    }

    /// Axial tilt about +Z in radians.
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn layout(&self) -> ShellLayout {
        ShellLayout {
            surface: self.surface.radius,
            clouds: self.clouds.radius,
            atmosphere: self
                .atmosphere
                .as_ref()
                .map_or(f32::INFINITY, |a| a.radius),
        }
    }

    /// World transform of a unit sphere scaled to `radius` and spun by `yaw`.
    pub fn shell_transform(&self, radius: f32, yaw: f32) -> ShellTransform {
        let rotation = Mat4::from_rotation_z(self.tilt) * Mat4::from_rotation_y(yaw);
        ShellTransform {
            model: rotation * Mat4::from_scale(Vec3::splat(radius)),
            normal: Mat3::from_mat4(rotation),
        }
    }
}

/// Model matrix plus the rotation used for normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellTransform {
    pub model: Mat4,
    pub normal: Mat3,
}
