//! Extensions spliced into the surface lighting program.
//!
//! The [`ShaderPatcher`] registers four fragments against the surface
//! program's insertion points: the uniform declarations, the ocean roughness
//! inversion, and at the emissive point the night-light gate, cloud shadow,
//! and Fresnel rim. Compiling produces a [`PatchedShaderHandle`], the only
//! place the frame updater and parameter bridge write the injected uniforms.
//!
//! Each fragment has a CPU mirror below so the shading math can be checked
//! without a GPU.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use globe_render::{InsertionPoint, ShaderError, ShaderFragment, ShaderGraph, TextureData};
use tracing::debug;

use crate::params::SceneParameters;

/// Cloud shadow never darkens terrain below this factor.
pub const CLOUD_SHADOW_FLOOR: f32 = 0.2;

/// Lowest multiplier the ocean mask applies to roughness.
pub const OCEAN_ROUGHNESS_FLOOR: f32 = 0.5;

/// Half-width of the smooth night-light threshold around `n·l = 0`.
pub const TERMINATOR_HALF_WIDTH: f32 = 0.02;

/// Base color of the Fresnel rim.
pub const FRESNEL_COLOR: Vec3 = Vec3::new(0.3, 0.6, 1.0);

pub const FRESNEL_EXPONENT: f32 = 5.0;

/// Bind group index the patch declares its uniforms in.
pub const PATCH_BIND_GROUP: u32 = 2;

/// Diffuse multiplier for a cloud sample taken at `(u - offset, v)`.
pub fn cloud_shadow_factor(cloud_sample: f32) -> f32 {
    (1.0 - cloud_sample).max(CLOUD_SHADOW_FLOOR)
}

/// Roughness multiplier for an ocean mask sample. The mask is white over
/// water, so it is inverted before clamping.
pub fn ocean_roughness_factor(mask: f32) -> f32 {
    (1.0 - mask).max(OCEAN_ROUGHNESS_FLOOR).min(1.0)
}

/// Night-light visibility for `n_dot_l` between the geometric normal and
/// the direction toward the sun. 1 on the night side, 0 on the day side.
pub fn night_lights_factor(n_dot_l: f32) -> f32 {
    1.0 - smoothstep(-TERMINATOR_HALF_WIDTH, TERMINATOR_HALF_WIDTH, n_dot_l)
}

/// Rim tint added to diffuse for a view-space normal with z component `normal_view_z`.
pub fn fresnel_tint(fresnel_intensity: f32, normal_view_z: f32) -> Vec3 {
    FRESNEL_COLOR * (fresnel_intensity - normal_view_z).max(0.0).powf(FRESNEL_EXPONENT)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn uniforms_fragment() -> ShaderFragment {
    let group = PATCH_BIND_GROUP;
    ShaderFragment::new(
        "patch-uniforms",
        format!(
            "struct PatchUniforms {{
    cloud_offset: f32,
    fresnel_intensity: f32,
    padding: vec2<f32>,
}};
@group({group}) @binding(0) var<uniform> patch_uniforms: PatchUniforms;
@group({group}) @binding(1) var cloud_map: texture_2d<f32>;
@group({group}) @binding(2) var cloud_sampler: sampler;"
        ),
    )
}

fn ocean_roughness_fragment() -> ShaderFragment {
    ShaderFragment::new(
        "ocean-roughness",
        format!(
            "let ocean_mask = textureSample(ocean_map, ocean_sampler, in.uv).g;
roughness *= min(max(1.0 - ocean_mask, {OCEAN_ROUGHNESS_FLOOR:?}), 1.0);"
        ),
    )
}

fn night_lights_fragment() -> ShaderFragment {
    let w = TERMINATOR_HALF_WIDTH;
    ShaderFragment::new(
        "night-lights",
        format!("emissive *= 1.0 - smoothstep({:?}, {w:?}, dot(geometry_normal, light_dir));", -w),
    )
}

fn cloud_shadow_fragment() -> ShaderFragment {
    ShaderFragment::new(
        "cloud-shadow",
        format!(
            "let cloud_sample = textureSample(cloud_map, cloud_sampler, vec2<f32>(in.uv.x - patch_uniforms.cloud_offset, in.uv.y)).r;
diffuse *= max(1.0 - cloud_sample, {CLOUD_SHADOW_FLOOR:?});"
        ),
    )
}

fn fresnel_fragment() -> ShaderFragment {
    let [r, g, b] = FRESNEL_COLOR.to_array();
    ShaderFragment::new(
        "fresnel-rim",
        format!(
            "let fresnel_base = max(patch_uniforms.fresnel_intensity - dot(view_normal, vec3<f32>(0.0, 0.0, 1.0)), 0.0);
diffuse += vec3<f32>({r:?}, {g:?}, {b:?}) * pow(fresnel_base, {FRESNEL_EXPONENT:?});"
        ),
    )
}

/// Compile-time extension of the surface material's lighting program.
#[derive(Debug, Clone)]
pub struct ShaderPatcher {
    cloud_map: Arc<TextureData>,
    ocean_mask: bool,
}

impl ShaderPatcher {
    /// `ocean_mask` enables the roughness inversion; without a mask the
    /// roughness point is left untouched.
    pub fn new(cloud_map: Arc<TextureData>, ocean_mask: bool) -> Self {
        Self {
            cloud_map,
            ocean_mask,
        }
    }

    /// Register the fragments on `graph`, in order.
    pub fn apply(&self, graph: &mut ShaderGraph) -> Result<(), ShaderError> {
        graph.extend(InsertionPoint::Common, uniforms_fragment())?;
        graph
            .extend(InsertionPoint::Emissive, night_lights_fragment())?
            .extend(InsertionPoint::Emissive, cloud_shadow_fragment())?
            .extend(InsertionPoint::Emissive, fresnel_fragment())?;
        if self.ocean_mask {
            graph.extend(InsertionPoint::Roughness, ocean_roughness_fragment())?;
        }
        Ok(())
    }

    /// Patch `graph` and build the handle, seeding the Fresnel uniform from `params`.
    pub fn on_compile(
        &self,
        graph: &mut ShaderGraph,
        params: &SceneParameters,
    ) -> Result<PatchedShaderHandle, ShaderError> {
        self.apply(graph)?;
        debug!(
            shader = graph.name(),
            ocean_mask = self.ocean_mask,
            "surface program patched"
        );
        Ok(PatchedShaderHandle {
            cloud_map: Arc::clone(&self.cloud_map),
            cloud_offset: 0.0,
            fresnel_intensity: params.fresnel_intensity,
            ocean_roughness: self.ocean_mask,
        })
    }
}

/// Live uniform slots of the compiled surface program.
///
/// Writes take effect on the next uploaded frame; nothing recompiles.
#[derive(Debug, Clone)]
pub struct PatchedShaderHandle {
    cloud_map: Arc<TextureData>,
    cloud_offset: f32,
    fresnel_intensity: f32,
    ocean_roughness: bool,
}

impl PatchedShaderHandle {
    /// Horizontally wrapping cloud texture sampled for shadows.
    pub fn cloud_map(&self) -> &Arc<TextureData> {
        &self.cloud_map
    }

    pub fn cloud_offset(&self) -> f32 {
        self.cloud_offset
    }

    pub fn set_cloud_offset(&mut self, offset: f32) {
        self.cloud_offset = offset;
    }

    pub fn fresnel_intensity(&self) -> f32 {
        self.fresnel_intensity
    }

    pub fn set_fresnel_intensity(&mut self, intensity: f32) {
        self.fresnel_intensity = intensity;
    }

    /// Whether the ocean roughness inversion was compiled in.
    pub fn has_ocean_roughness(&self) -> bool {
        self.ocean_roughness
    }

    pub fn uniform(&self) -> PatchUniform {
        PatchUniform {
            cloud_offset: self.cloud_offset,
            fresnel_intensity: self.fresnel_intensity,
            padding: [0.0; 2],
        }
    }
}

/// GPU layout of `PatchUniforms`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PatchUniform {
    pub cloud_offset: f32,
    pub fresnel_intensity: f32,
    pub padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::SURFACE_SHADER_SOURCE;

    fn patcher(ocean: bool) -> ShaderPatcher {
        ShaderPatcher::new(Arc::new(TextureData::solid([255; 4])), ocean)
    }

    fn samples() -> impl Iterator<Item = f32> {
        (0..=100).map(|i| i as f32 / 100.0)
    }

    #[test]
    fn test_cloud_shadow_factor_bounds() {
        for s in samples() {
            let f = cloud_shadow_factor(s);
            assert!((CLOUD_SHADOW_FLOOR..=1.0).contains(&f), "sample {s} -> {f}");
        }
        assert_eq!(cloud_shadow_factor(0.0), 1.0);
        assert_eq!(cloud_shadow_factor(1.0), 0.2);
        assert!((cloud_shadow_factor(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ocean_roughness_factor_bounds() {
        for mask in samples()
            .map(|m| m * 4.0 - 2.0)
            .chain([f32::NAN, f32::INFINITY, f32::NEG_INFINITY])
        {
            let f = ocean_roughness_factor(mask);
            assert!((0.5..=1.0).contains(&f), "mask {mask} -> {f}");
        }
        // Land (black) keeps full roughness, water (white) halves it.
        assert_eq!(ocean_roughness_factor(0.0), 1.0);
        assert_eq!(ocean_roughness_factor(1.0), 0.5);
    }

    #[test]
    fn test_night_lights_fade_toward_light() {
        assert_eq!(night_lights_factor(-1.0), 1.0);
        assert_eq!(night_lights_factor(1.0), 0.0);
        assert!((night_lights_factor(0.0) - 0.5).abs() < 1e-6);
        let mut prev = night_lights_factor(-0.05);
        for i in -49..=50 {
            let f = night_lights_factor(i as f32 / 1000.0);
            assert!(f <= prev, "not monotonic at {i}");
            prev = f;
        }
    }

    #[test]
    fn test_fresnel_tint_brightens_rim() {
        let center = fresnel_tint(1.4, 1.0);
        let rim = fresnel_tint(1.4, 0.0);
        assert!(rim.z > center.z);
        assert!((rim.z - 1.4f32.powi(5)).abs() < 1e-4);
        assert!((center.x - 0.3 * 0.4f32.powi(5)).abs() < 1e-6);
        assert_eq!(fresnel_tint(0.0, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_fragments_embed_constants() {
        assert!(cloud_shadow_fragment().code.contains("max(1.0 - cloud_sample, 0.2)"));
        assert!(cloud_shadow_fragment().code.contains("in.uv.x - patch_uniforms.cloud_offset"));
        assert!(ocean_roughness_fragment().code.contains("1.0 - ocean_mask, 0.5"));
        assert!(night_lights_fragment().code.contains("smoothstep(-0.02, 0.02"));
        assert!(fresnel_fragment().code.contains("vec3<f32>(0.3, 0.6, 1.0)"));
        assert!(fresnel_fragment().code.contains("pow(fresnel_base, 5.0)"));
        assert!(uniforms_fragment().code.contains("@group(2) @binding(1) var cloud_map"));
    }

    #[test]
    fn test_patch_composes_against_surface_program() {
        let mut graph = ShaderGraph::new("surface", SURFACE_SHADER_SOURCE);
        let handle = patcher(true)
            .on_compile(&mut graph, &SceneParameters::default())
            .unwrap();
        let source = graph.compose().unwrap();

        for point in InsertionPoint::ALL {
            assert!(!source.contains(point.marker()), "{point:?} left unpatched");
        }
        let night = source.find("// night-lights").unwrap();
        let shadow = source.find("// cloud-shadow").unwrap();
        let rim = source.find("// fresnel-rim").unwrap();
        assert!(night < shadow && shadow < rim);
        assert!(handle.has_ocean_roughness());
    }

    #[test]
    fn test_no_ocean_mask_leaves_roughness_point() {
        let mut graph = ShaderGraph::new("surface", SURFACE_SHADER_SOURCE);
        patcher(false).apply(&mut graph).unwrap();
        assert!(graph.fragments(InsertionPoint::Roughness).is_empty());
        let source = graph.compose().unwrap();
        assert!(source.contains(InsertionPoint::Roughness.marker()));
        assert!(!source.contains("ocean_mask"));
    }

    #[test]
    fn test_applying_twice_is_rejected() {
        let mut graph = ShaderGraph::new("surface", SURFACE_SHADER_SOURCE);
        let p = patcher(true);
        p.apply(&mut graph).unwrap();
        assert!(matches!(
            p.apply(&mut graph),
            Err(ShaderError::DuplicatePatch { .. })
        ));
    }

    #[test]
    fn test_handle_seeded_from_params() {
        let params = SceneParameters {
            fresnel_intensity: 0.8,
            ..SceneParameters::default()
        };
        let mut graph = ShaderGraph::new("surface", SURFACE_SHADER_SOURCE);
        let mut handle = patcher(false).on_compile(&mut graph, &params).unwrap();
        assert_eq!(handle.fresnel_intensity(), 0.8);
        assert_eq!(handle.cloud_offset(), 0.0);

        handle.set_cloud_offset(0.25);
        handle.set_fresnel_intensity(1.1);
        let uniform = handle.uniform();
        assert_eq!(uniform.cloud_offset, 0.25);
        assert_eq!(uniform.fresnel_intensity, 1.1);
        assert_eq!(std::mem::size_of::<PatchUniform>(), 16);
    }
}
