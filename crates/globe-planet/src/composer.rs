//! Builds the planet's shells from loaded textures and attaches them to the scene.

use std::sync::Arc;

use globe_config::{AssetConfig, PlanetConfig};
use tracing::info;

use crate::loader::{
    COMPLETE_DELAY, ProgressReporter, ResourceError, SceneAssets, TextureLoader,
    load_scene_assets,
};
use crate::material::{AtmosphereMaterial, CloudMaterial, SurfaceMaterial};
use crate::params::SceneParameters;
use crate::patch::ShaderPatcher;
use crate::scene::SceneRoot;
use crate::shell::{LayerGroup, Shell, ShellLayout};

/// Failure to build the planet.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(
        "shell radii must increase outward: surface {surface}, clouds {clouds}, atmosphere {atmosphere}"
    )]
    InvalidLayout {
        surface: f32,
        clouds: f32,
        atmosphere: f32,
    },

    #[error("the scene already holds a planet")]
    AlreadyComposed,
}

/// Assembles surface, clouds, and atmosphere into a tilted [`LayerGroup`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerComposer {
    pub layout: ShellLayout,
    /// Axial tilt in radians.
    pub tilt: f32,
    /// Yaw both rotating shells start at.
    pub initial_yaw: f32,
    pub atmosphere: bool,
}

impl LayerComposer {
    pub fn from_config(config: &PlanetConfig) -> Self {
        Self {
            layout: ShellLayout::from(config),
            tilt: config.axial_tilt_deg.to_radians(),
            initial_yaw: config.initial_yaw,
            atmosphere: config.atmosphere,
        }
    }

    /// Build the shells and attach them to `root`.
    ///
    /// The surface material gets its [`ShaderPatcher`] installed here; the
    /// patched program itself appears when the renderer first compiles it.
    pub fn compose(
        &self,
        assets: SceneAssets,
        params: &SceneParameters,
        root: &mut SceneRoot,
    ) -> Result<(), ComposeError> {
        if root.is_composed() {
            return Err(ComposeError::AlreadyComposed);
        }
        let ShellLayout {
            surface,
            clouds,
            atmosphere,
        } = self.layout;
        if !self.layout.is_valid() {
            return Err(ComposeError::InvalidLayout {
                surface,
                clouds,
                atmosphere,
            });
        }

        let SceneAssets {
            background,
            albedo,
            bump,
            clouds: cloud_map,
            ocean,
            night_lights,
        } = assets;
        let cloud_map = Arc::new(cloud_map);

        let mut surface_material = SurfaceMaterial::new(albedo, bump, ocean, night_lights, params);
        let patcher = ShaderPatcher::new(Arc::clone(&cloud_map), surface_material.ocean.is_some());
        surface_material.on_before_compile(patcher);

        let group = LayerGroup::new(
            self.tilt,
            Shell::new(surface, self.initial_yaw, surface_material),
            Shell::new(clouds, self.initial_yaw, CloudMaterial::new(cloud_map)),
            self.atmosphere
                .then(|| Shell::new(atmosphere, 0.0, AtmosphereMaterial::from_params(params))),
        );

        info!(
            surface,
            clouds,
            atmosphere = self.atmosphere.then_some(atmosphere),
            tilt_deg = self.tilt.to_degrees(),
            "planet layers composed"
        );

        if background.is_some() {
            root.background = background;
        }
        root.attach(group).map_err(|_| ComposeError::AlreadyComposed)
    }
}

/// Load every texture, compose the planet, and report completion.
///
/// Nothing is attached to `root` unless all required textures loaded.
pub async fn init_scene<L, P>(
    loader: &L,
    assets: &AssetConfig,
    composer: &LayerComposer,
    params: &SceneParameters,
    root: &mut SceneRoot,
    progress: &mut P,
) -> Result<(), ComposeError>
where
    L: TextureLoader,
    P: ProgressReporter + ?Sized,
{
    let loaded = load_scene_assets(loader, assets, &mut *progress).await?;
    composer.compose(loaded, params, root)?;
    progress.report(1.0, Some(COMPLETE_DELAY));
    Ok(())
}
