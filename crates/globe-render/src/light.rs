//! The primary light: a sun placed far from the planet.
//!
//! [`DirectionalLight`] is the CPU-side description mutated by the parameter
//! bridge. [`DirectionalLightUniform`] is written to the GPU each frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Sun-like light identified by its world position.
///
/// Shading treats it as directional: every point is lit from
/// `normalize(position - target)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    /// Point the light aims at.
    pub target: Vec3,
    /// Linear RGB color, not premultiplied by intensity.
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(-50.0, 0.0, 30.0),
            target: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.3,
        }
    }
}

impl DirectionalLight {
    pub fn at(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
            ..Self::default()
        }
    }

    /// Unit vector pointing from the target toward the light.
    ///
    /// Falls back to +Z when the light sits on its target.
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Z)
    }

    pub fn to_uniform(&self) -> DirectionalLightUniform {
        DirectionalLightUniform {
            direction_intensity: self.direction().extend(self.intensity).to_array(),
            color_padding: self.color.extend(0.0).to_array(),
        }
    }
}

/// GPU-side representation, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    /// xyz = direction toward the light, w = intensity.
    pub direction_intensity: [f32; 4],
    /// xyz = color (linear RGB), w = padding.
    pub color_padding: [f32; 4],
}
