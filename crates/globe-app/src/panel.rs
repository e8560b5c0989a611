//! Keyboard parameter panel.
//!
//! Tab and Shift+Tab cycle through the parameters, Up and Down step the
//! selected one within its declared bounds. Every change is logged and then
//! handed to the effect the bridge registered for it.

use globe_planet::{
    OnChange, ParamId, ParamSpec, ParameterBridge, ParameterPanel, SceneParameters, SceneRoot,
};
use tracing::info;
use winit::keyboard::{Key, NamedKey};

/// What a key press asks the panel to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Next,
    Previous,
    Increase,
    Decrease,
}

impl PanelCommand {
    pub fn from_key(key: &Key, shift: bool) -> Option<Self> {
        match key {
            Key::Named(NamedKey::Tab) if shift => Some(Self::Previous),
            Key::Named(NamedKey::Tab) => Some(Self::Next),
            Key::Named(NamedKey::ArrowUp) => Some(Self::Increase),
            Key::Named(NamedKey::ArrowDown) => Some(Self::Decrease),
            _ => None,
        }
    }
}

struct Control {
    spec: &'static ParamSpec,
    on_change: Option<OnChange>,
}

/// One numeric control per registered parameter.
#[derive(Default)]
pub struct KeyboardPanel {
    controls: Vec<Control>,
    selected: usize,
}

impl ParameterPanel for KeyboardPanel {
    fn register(&mut self, spec: &'static ParamSpec, on_change: Option<OnChange>) {
        self.controls.push(Control { spec, on_change });
    }
}

impl KeyboardPanel {
    /// A panel with every parameter wired to its effect.
    pub fn wired() -> Self {
        let mut panel = Self::default();
        ParameterBridge::wire(&mut panel);
        panel
    }

    pub fn selected(&self) -> Option<&'static ParamSpec> {
        self.controls.get(self.selected).map(|c| c.spec)
    }

    /// Apply `command`. Returns the parameter and its new value when one changed.
    pub fn handle(
        &mut self,
        command: PanelCommand,
        params: &mut SceneParameters,
        scene: &mut SceneRoot,
    ) -> Option<(ParamId, f32)> {
        let count = self.controls.len();
        if count == 0 {
            return None;
        }
        match command {
            PanelCommand::Next => {
                self.selected = (self.selected + 1) % count;
                self.log_selection(params);
                None
            }
            PanelCommand::Previous => {
                self.selected = (self.selected + count - 1) % count;
                self.log_selection(params);
                None
            }
            PanelCommand::Increase => self.step(1.0, params, scene),
            PanelCommand::Decrease => self.step(-1.0, params, scene),
        }
    }

    fn step(
        &self,
        direction: f32,
        params: &mut SceneParameters,
        scene: &mut SceneRoot,
    ) -> Option<(ParamId, f32)> {
        let spec = self.controls.get(self.selected)?.spec;
        let current = params.get(spec.id);
        // Snap to the step grid so repeated presses do not drift.
        let target = ((current / spec.step).round() + direction) * spec.step;
        self.set(spec.id, target, params, scene)
    }

    /// Clamp `value` to the parameter's bounds, store it, and run its effect.
    ///
    /// Returns `None` when the clamped value equals the current one.
    pub fn set(
        &self,
        id: ParamId,
        value: f32,
        params: &mut SceneParameters,
        scene: &mut SceneRoot,
    ) -> Option<(ParamId, f32)> {
        let control = self.controls.iter().find(|c| c.spec.id == id)?;
        let value = control.spec.clamp(value);
        if value == params.get(id) {
            return None;
        }
        params.set(id, value);
        info!(parameter = control.spec.label, value, "parameter changed");
        if let Some(on_change) = control.on_change {
            on_change(params, scene);
        }
        Some((id, value))
    }

    fn log_selection(&self, params: &SceneParameters) {
        if let Some(spec) = self.selected() {
            info!(
                parameter = spec.label,
                value = params.get(spec.id),
                min = spec.min,
                max = spec.max,
                "parameter selected"
            );
        }
    }
}
