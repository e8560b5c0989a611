//! Wires each tunable parameter to the scene state it drives.

use tracing::trace;

use crate::params::{PARAM_SPECS, ParamId, ParamSpec, SceneParameters};
use crate::scene::SceneRoot;

/// What an effect did with the new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEffect {
    /// Written to its target.
    Applied,
    /// The target does not exist yet (program not compiled, planet not
    /// composed) or was never built (atmosphere disabled). Nothing written.
    Skipped,
}

/// Effect invoked after a control changed a parameter.
pub type OnChange = fn(&SceneParameters, &mut SceneRoot) -> BridgeEffect;

/// A control surface exposing one numeric control per parameter.
///
/// Implementations clamp to the parameter's declared bounds before storing a value and
/// then call the registered effect, if any.
pub trait ParameterPanel {
    fn register(&mut self, spec: &'static ParamSpec, on_change: Option<OnChange>);
}

fn sun_intensity(params: &SceneParameters, scene: &mut SceneRoot) -> BridgeEffect {
    scene.light.intensity = params.sun_intensity;
    BridgeEffect::Applied
}

fn bump_scale(params: &SceneParameters, scene: &mut SceneRoot) -> BridgeEffect {
    match scene.layers_mut() {
        Some(layers) => {
            layers.surface.material.bump_scale = params.bump_scale;
            BridgeEffect::Applied
        }
        None => BridgeEffect::Skipped,
    }
}

fn ocean_metalness(params: &SceneParameters, scene: &mut SceneRoot) -> BridgeEffect {
    match scene.layers_mut() {
        Some(layers) => {
            layers.surface.material.metalness = params.ocean_metalness;
            BridgeEffect::Applied
        }
        None => BridgeEffect::Skipped,
    }
}

fn fresnel_intensity(params: &SceneParameters, scene: &mut SceneRoot) -> BridgeEffect {
    let program = scene
        .layers_mut()
        .and_then(|layers| layers.surface.material.program_mut());
    match program {
        Some(program) => {
            program.set_fresnel_intensity(params.fresnel_intensity);
            BridgeEffect::Applied
        }
        None => BridgeEffect::Skipped,
    }
}

fn atmosphere(params: &SceneParameters, scene: &mut SceneRoot) -> BridgeEffect {
    let shell = scene
        .layers_mut()
        .and_then(|layers| layers.atmosphere.as_mut());
    match shell {
        Some(shell) => {
            let material = &mut shell.material;
            material.opacity = params.atmosphere_opacity;
            material.power = params.atmosphere_power;
            material.multiplier = params.atmosphere_multiplier;
            BridgeEffect::Applied
        }
        None => BridgeEffect::Skipped,
    }
}

/// Maps parameters to their effects.
pub struct ParameterBridge;

impl ParameterBridge {
    /// The effect for `id`. The speed factor has none: the frame updater
    /// reads it every frame.
    pub fn effect(id: ParamId) -> Option<OnChange> {
        match id {
            ParamId::SunIntensity => Some(sun_intensity),
            ParamId::BumpScale => Some(bump_scale),
            ParamId::OceanMetalness => Some(ocean_metalness),
            ParamId::FresnelIntensity => Some(fresnel_intensity),
            ParamId::AtmosphereOpacity
            | ParamId::AtmospherePower
            | ParamId::AtmosphereMultiplier => Some(atmosphere),
            ParamId::SpeedFactor => None,
        }
    }

    /// Run the effect for `id`, if it has one.
    pub fn apply(
        id: ParamId,
        params: &SceneParameters,
        scene: &mut SceneRoot,
    ) -> Option<BridgeEffect> {
        let effect = Self::effect(id)?(params, scene);
        trace!(?id, value = params.get(id), ?effect, "parameter bridged");
        Some(effect)
    }

    /// Register every parameter with `panel`, in table order.
    pub fn wire<P: ParameterPanel + ?Sized>(panel: &mut P) {
        for spec in &PARAM_SPECS {
            panel.register(spec, Self::effect(spec.id));
        }
    }
}
