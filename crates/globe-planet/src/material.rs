//! Materials carried by each shell.

use std::sync::Arc;

use glam::Vec3;
use globe_render::{ShaderError, ShaderGraph, TextureData};

use crate::params::SceneParameters;
use crate::patch::{PatchedShaderHandle, ShaderPatcher};
use crate::shell::{ShellKind, ShellMaterial};

/// Base lighting program of the surface shell, before any extension.
pub const SURFACE_SHADER_SOURCE: &str = include_str!("surface.wgsl");

/// Warm tint applied to the night-lights map.
pub const NIGHT_LIGHTS_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.53);

/// Opaque surface: albedo, bump, ocean mask and night lights.
#[derive(Debug)]
pub struct SurfaceMaterial {
    pub albedo: TextureData,
    pub bump: TextureData,
    pub bump_scale: f32,
    /// Base roughness before the ocean mask is applied.
    pub roughness: f32,
    /// Metalness scalar, masked to the oceans when a mask exists.
    pub metalness: f32,
    /// Ocean mask, white over water. Drives roughness and metalness.
    pub ocean: Option<TextureData>,
    /// Emissive map shown on the night side.
    pub night_lights: Option<TextureData>,
    pub emissive: Vec3,
    patcher: Option<ShaderPatcher>,
    compiled: Option<String>,
    program: Option<PatchedShaderHandle>,
}

impl SurfaceMaterial {
    pub fn new(
        albedo: TextureData,
        bump: TextureData,
        ocean: Option<TextureData>,
        night_lights: Option<TextureData>,
        params: &SceneParameters,
    ) -> Self {
        Self {
            albedo,
            bump,
            bump_scale: params.bump_scale,
            roughness: 1.0,
            metalness: params.ocean_metalness,
            ocean,
            night_lights,
            emissive: NIGHT_LIGHTS_COLOR,
            patcher: None,
            compiled: None,
            program: None,
        }
    }

    /// Install the extension run when the program is first compiled.
    ///
    /// Returns `false` and leaves the material untouched if a patcher is
    /// already installed or the program has been compiled.
    pub fn on_before_compile(&mut self, patcher: ShaderPatcher) -> bool {
        if self.patcher.is_some() || self.compiled.is_some() {
            return false;
        }
        self.patcher = Some(patcher);
        true
    }

    /// Compose the lighting program on first use and return its source.
    ///
    /// The patcher runs exactly once per material; later calls return the
    /// cached source. Fresnel intensity is seeded from `params`.
    pub fn compile(&mut self, params: &SceneParameters) -> Result<&str, ShaderError> {
        if self.compiled.is_none() {
            let mut graph = ShaderGraph::new("surface", SURFACE_SHADER_SOURCE);
            let program = self
                .patcher
                .as_ref()
                .map(|patcher| patcher.on_compile(&mut graph, params))
                .transpose()?;
            let source = graph.compose()?;
            self.program = program;
            self.compiled = Some(source);
        }
        Ok(self.compiled.as_deref().unwrap_or_default())
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Uniform slots of the patched program, once compiled.
    pub fn program(&self) -> Option<&PatchedShaderHandle> {
        self.program.as_ref()
    }

    pub fn program_mut(&mut self) -> Option<&mut PatchedShaderHandle> {
        self.program.as_mut()
    }
}

impl ShellMaterial for SurfaceMaterial {
    const KIND: ShellKind = ShellKind::Surface;
}

/// Alpha-masked cloud layer, blended additively over the surface.
#[derive(Debug)]
pub struct CloudMaterial {
    /// Shared with the surface program, which samples it for shadows.
    pub alpha: Arc<TextureData>,
    pub color: Vec3,
    pub opacity: f32,
}

impl CloudMaterial {
    pub fn new(alpha: Arc<TextureData>) -> Self {
        Self {
            alpha,
            color: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

impl ShellMaterial for CloudMaterial {
    const KIND: ShellKind = ShellKind::Clouds;
}

/// Rim-glow uniforms of the atmosphere shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereMaterial {
    pub opacity: f32,
    pub power: f32,
    pub multiplier: f32,
}

impl AtmosphereMaterial {
    pub fn from_params(params: &SceneParameters) -> Self {
        Self {
            opacity: params.atmosphere_opacity,
            power: params.atmosphere_power,
            multiplier: params.atmosphere_multiplier,
        }
    }
}

impl ShellMaterial for AtmosphereMaterial {
    const KIND: ShellKind = ShellKind::Atmosphere;
}

#[cfg(test)]
mod tests {
    use super::*;
    use globe_render::InsertionPoint;

    fn surface() -> SurfaceMaterial {
        SurfaceMaterial::new(
            TextureData::solid([128, 128, 128, 255]),
            TextureData::solid([0, 0, 0, 255]),
            Some(TextureData::solid([255, 255, 255, 255])),
            None,
            &SceneParameters::default(),
        )
    }

    fn patcher() -> ShaderPatcher {
        ShaderPatcher::new(Arc::new(TextureData::solid([0; 4])), true)
    }

    #[test]
    fn test_base_program_has_every_insertion_point() {
        for point in InsertionPoint::ALL {
            assert_eq!(
                SURFACE_SHADER_SOURCE.matches(point.marker()).count(),
                1,
                "{point:?}"
            );
        }
    }

    #[test]
    fn test_new_takes_parameter_values() {
        let params = SceneParameters {
            bump_scale: 0.5,
            ocean_metalness: 0.9,
            ..SceneParameters::default()
        };
        let m = SurfaceMaterial::new(
            TextureData::solid([0; 4]),
            TextureData::solid([0; 4]),
            None,
            None,
            &params,
        );
        assert_eq!(m.bump_scale, 0.5);
        assert_eq!(m.metalness, 0.9);
        assert_eq!(m.roughness, 1.0);
        assert!(m.program().is_none());
    }

    #[test]
    fn test_program_absent_until_compiled() {
        let mut m = surface();
        assert!(m.on_before_compile(patcher()));
        assert!(m.program().is_none());
        assert!(!m.is_compiled());

        let source = m.compile(&SceneParameters::default()).unwrap().to_string();
        assert!(source.contains("patch_uniforms"));
        assert!(m.program().is_some());
        assert!(m.is_compiled());
    }

    #[test]
    fn test_compile_runs_patcher_once() {
        let mut m = surface();
        m.on_before_compile(patcher());
        let params = SceneParameters::default();
        let first = m.compile(&params).unwrap().to_string();

        m.program_mut().unwrap().set_cloud_offset(0.5);
        let changed = SceneParameters {
            fresnel_intensity: 0.1,
            ..params
        };
        let second = m.compile(&changed).unwrap().to_string();

        assert_eq!(first, second);
        let program = m.program().unwrap();
        assert_eq!(program.cloud_offset(), 0.5);
        assert_eq!(program.fresnel_intensity(), params.fresnel_intensity);
    }

    #[test]
    fn test_second_patcher_rejected() {
        let mut m = surface();
        assert!(m.on_before_compile(patcher()));
        assert!(!m.on_before_compile(patcher()));
    }

    #[test]
    fn test_patcher_after_compile_rejected() {
        let mut m = surface();
        m.compile(&SceneParameters::default()).unwrap();
        assert!(!m.on_before_compile(patcher()));
        assert!(m.program().is_none());
    }

    #[test]
    fn test_unpatched_compile_keeps_markers() {
        let mut m = surface();
        let source = m.compile(&SceneParameters::default()).unwrap();
        assert_eq!(source, SURFACE_SHADER_SOURCE);
    }

    #[test]
    fn test_atmosphere_from_params() {
        let atm = AtmosphereMaterial::from_params(&SceneParameters::default());
        assert_eq!(atm.opacity, 0.7);
        assert_eq!(atm.power, 4.1);
        assert_eq!(atm.multiplier, 9.5);
    }
}
