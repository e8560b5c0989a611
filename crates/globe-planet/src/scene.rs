//! The externally owned scene the planet is attached to.

use globe_render::{DirectionalLight, TextureData};

use crate::shell::LayerGroup;

/// Scene root: the sun, an optional star background, and at most one planet.
#[derive(Debug)]
pub struct SceneRoot {
    pub light: DirectionalLight,
    pub background: Option<TextureData>,
    layers: Option<LayerGroup>,
}

impl SceneRoot {
    pub fn new(light: DirectionalLight) -> Self {
        Self {
            light,
            background: None,
            layers: None,
        }
    }

    pub fn layers(&self) -> Option<&LayerGroup> {
        self.layers.as_ref()
    }

    pub fn layers_mut(&mut self) -> Option<&mut LayerGroup> {
        self.layers.as_mut()
    }

    /// True once the layer composer has attached the planet.
    pub fn is_composed(&self) -> bool {
        self.layers.is_some()
    }

    /// Attach the planet. Returns the group back if one is already attached.
    pub(crate) fn attach(&mut self, layers: LayerGroup) -> Result<(), LayerGroup> {
        if self.layers.is_some() {
            return Err(layers);
        }
        self.layers = Some(layers);
        Ok(())
    }
}
