//! Startup texture acquisition.
//!
//! Textures are loaded one after another in a fixed order, each completed
//! load reporting another tenth of progress. A required texture that fails
//! aborts the sequence; optional layers that fail are skipped with a warning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use globe_config::AssetConfig;
use globe_render::{TextureData, TextureError};
use tracing::{info, warn};

/// Progress added by each completed load.
pub const PROGRESS_PER_ASSET: f32 = 0.1;

/// Delay hint sent with the final progress report.
pub const COMPLETE_DELAY: Duration = Duration::from_millis(100);

/// Failure to acquire a texture.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: TextureError,
    },

    #[error("required {layer} texture is not configured")]
    NotConfigured { layer: &'static str },
}

/// Asynchronous texture source.
#[allow(async_fn_in_trait)]
pub trait TextureLoader {
    async fn load(&self, path: &Path) -> Result<TextureData, ResourceError>;
}

/// Receives fractional startup progress in `[0, 1]`.
pub trait ProgressReporter {
    fn report(&mut self, fraction: f32, delay: Option<Duration>);
}

impl<F: FnMut(f32, Option<Duration>)> ProgressReporter for F {
    fn report(&mut self, fraction: f32, delay: Option<Duration>) {
        self(fraction, delay)
    }
}

/// Reads files from disk and decodes them.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTextureLoader;

impl TextureLoader for FsTextureLoader {
    async fn load(&self, path: &Path) -> Result<TextureData, ResourceError> {
        let bytes = std::fs::read(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        TextureData::decode(&bytes).map_err(|source| ResourceError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the layer composer consumes.
#[derive(Debug)]
pub struct SceneAssets {
    pub background: Option<TextureData>,
    pub albedo: TextureData,
    pub bump: TextureData,
    pub clouds: TextureData,
    pub ocean: Option<TextureData>,
    pub night_lights: Option<TextureData>,
}

/// Load order: background, albedo, bump, clouds, ocean, night lights.
pub async fn load_scene_assets<L, P>(
    loader: &L,
    assets: &AssetConfig,
    progress: &mut P,
) -> Result<SceneAssets, ResourceError>
where
    L: TextureLoader,
    P: ProgressReporter + ?Sized,
{
    let mut sequence = LoadSequence {
        loader,
        assets,
        progress,
        completed: 0,
    };

    let background = sequence.optional("background", assets.background.as_deref()).await;
    let albedo = sequence.required("albedo", Some(assets.albedo.as_str())).await?;
    let bump = sequence.required("bump", Some(assets.bump.as_str())).await?;
    let clouds = sequence.required("clouds", Some(assets.clouds.as_str())).await?;
    let ocean = sequence.optional("ocean", assets.ocean.as_deref()).await;
    let night_lights = sequence
        .optional("night lights", assets.night_lights.as_deref())
        .await;

    info!(loaded = sequence.completed, "scene textures ready");
    Ok(SceneAssets {
        background,
        albedo,
        bump,
        clouds,
        ocean,
        night_lights,
    })
}

struct LoadSequence<'a, L, P: ?Sized> {
    loader: &'a L,
    assets: &'a AssetConfig,
    progress: &'a mut P,
    completed: u32,
}

impl<L: TextureLoader, P: ProgressReporter + ?Sized> LoadSequence<'_, L, P> {
    async fn required(
        &mut self,
        layer: &'static str,
        file: Option<&str>,
    ) -> Result<TextureData, ResourceError> {
        let file = file
            .filter(|f| !f.is_empty())
            .ok_or(ResourceError::NotConfigured { layer })?;
        self.load(layer, file).await
    }

    async fn optional(&mut self, layer: &'static str, file: Option<&str>) -> Option<TextureData> {
        let file = file.filter(|f| !f.is_empty())?;
        match self.load(layer, file).await {
            Ok(texture) => Some(texture),
            Err(e) => {
                warn!(layer, error = %e, "optional texture skipped");
                None
            }
        }
    }

    async fn load(
        &mut self,
        layer: &'static str,
        file: &str,
    ) -> Result<TextureData, ResourceError> {
        let path = self.assets.path_of(file);
        let texture = self.loader.load(&path).await?;
        self.completed += 1;
        info!(
            layer,
            path = %path.display(),
            width = texture.width(),
            height = texture.height(),
            "texture loaded"
        );
        self.progress
            .report(self.completed as f32 * PROGRESS_PER_ASSET, None);
        Ok(texture)
    }
}
