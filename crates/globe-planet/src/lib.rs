//! Layered planet: surface, clouds and atmosphere shells around a tilted
//! axis, a patched surface lighting program, live parameters, and the
//! per-frame animation that drives them.

pub mod bridge;
pub mod composer;
pub mod loader;
pub mod material;
pub mod params;
pub mod patch;
pub mod renderer;
pub mod scene;
pub mod shell;
pub mod updater;

pub use bridge::{BridgeEffect, OnChange, ParameterBridge, ParameterPanel};
pub use composer::{ComposeError, LayerComposer, init_scene};
pub use loader::{
    COMPLETE_DELAY, FsTextureLoader, PROGRESS_PER_ASSET, ProgressReporter, ResourceError,
    SceneAssets, TextureLoader, load_scene_assets,
};
pub use material::{AtmosphereMaterial, CloudMaterial, SurfaceMaterial};
pub use params::{PARAM_SPECS, ParamId, ParamSpec, SceneParameters};
pub use patch::{PatchedShaderHandle, ShaderPatcher};
pub use renderer::{PlanetRenderer, RenderError};
pub use scene::SceneRoot;
pub use shell::{LayerGroup, Shell, ShellKind, ShellLayout, ShellMaterial, ShellTransform};
pub use updater::{
    ApproachPhase, CLOUD_RATE_RATIO, CameraApproach, CloudShadowOffset, FrameUpdater, OrbitInput,
};
