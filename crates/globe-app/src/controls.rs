//! Mouse orbit controls: drag to orbit, wheel to zoom, with damping.

use glam::Vec2;
use globe_config::CameraConfig;
use globe_planet::OrbitInput;
use globe_render::OrbitCamera;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Zoom factor per wheel line.
const ZOOM_PER_LINE: f32 = 0.95;

/// Pixels of trackpad scroll treated as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

/// Rotational velocity below this is treated as stopped.
const REST_VELOCITY: f32 = 1e-5;

/// Orbit controller driven by winit mouse events.
///
/// Events accumulate between frames; [`OrbitInput::update`] applies them to
/// the rig and bleeds off velocity by the damping factor.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    enabled: bool,
    dragging: bool,
    cursor: Option<Vec2>,
    pending_drag: Vec2,
    pending_zoom: f32,
    /// Azimuth and polar velocity in radians per frame.
    velocity: Vec2,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    pub rotate_speed: f32,
}

impl OrbitControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            enabled: true,
            dragging: false,
            cursor: None,
            pending_drag: Vec2::ZERO,
            pending_zoom: 0.0,
            velocity: Vec2::ZERO,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
        }
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state.is_pressed() && self.enabled;
        }
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if let Some(previous) = self.cursor
            && self.dragging
        {
            self.pending_drag += position - previous;
        }
        self.cursor = Some(position);
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        if !self.enabled {
            return;
        }
        self.pending_zoom += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

impl OrbitInput for OrbitControls {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.dragging = false;
            self.pending_drag = Vec2::ZERO;
            self.pending_zoom = 0.0;
            self.velocity = Vec2::ZERO;
        }
    }

    fn update(&mut self, rig: &mut OrbitCamera) {
        if !self.enabled {
            return;
        }

        // Dragging right turns the planet right, so the eye moves left.
        self.velocity -= std::mem::take(&mut self.pending_drag) * self.rotate_speed * self.damping;
        if self.velocity.length_squared() > REST_VELOCITY * REST_VELOCITY {
            rig.rotate(self.velocity.x, self.velocity.y);
            self.velocity *= 1.0 - self.damping;
        } else {
            self.velocity = Vec2::ZERO;
        }

        let zoom = std::mem::take(&mut self.pending_zoom);
        if zoom != 0.0 {
            rig.distance *= ZOOM_PER_LINE.powf(zoom);
        }
        rig.distance = rig.distance.clamp(self.min_distance, self.max_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    fn controls() -> OrbitControls {
        OrbitControls::from_config(&CameraConfig::default())
    }

    fn drag(controls: &mut OrbitControls, dx: f64, dy: f64) {
        controls.on_cursor_moved(100.0, 100.0);
        controls.on_button(MouseButton::Left, ElementState::Pressed);
        controls.on_cursor_moved(100.0 + dx, 100.0 + dy);
        controls.on_button(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn test_drag_orbits() {
        let mut controls = controls();
        let mut rig = OrbitCamera::new(30.0);
        drag(&mut controls, 50.0, 0.0);
        controls.update(&mut rig);
        assert!(rig.azimuth < 0.0);
        assert!((rig.distance - 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_motion_without_button_is_ignored() {
        let mut controls = controls();
        let mut rig = OrbitCamera::new(30.0);
        controls.on_cursor_moved(0.0, 0.0);
        controls.on_cursor_moved(300.0, 300.0);
        controls.update(&mut rig);
        assert_eq!(rig, OrbitCamera::new(30.0));
    }

    #[test]
    fn test_damping_bleeds_velocity() {
        let mut controls = controls();
        let mut rig = OrbitCamera::new(30.0);
        drag(&mut controls, 80.0, 0.0);
        controls.update(&mut rig);
        let first = rig.azimuth;
        controls.update(&mut rig);
        let second = rig.azimuth - first;
        assert!(second.abs() < first.abs());
        assert!(second.abs() > 0.0);

        for _ in 0..500 {
            controls.update(&mut rig);
        }
        let settled = rig.azimuth;
        controls.update(&mut rig);
        assert_eq!(rig.azimuth, settled);
    }

    #[test]
    fn test_zoom_clamped_to_limits() {
        let mut controls = controls();
        let mut rig = OrbitCamera::new(30.0);
        controls.on_scroll(MouseScrollDelta::LineDelta(0.0, 200.0));
        controls.update(&mut rig);
        assert_eq!(rig.distance, 12.0);

        controls.on_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0 * 200.0)));
        controls.update(&mut rig);
        assert_eq!(rig.distance, 100.0);
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let mut controls = controls();
        let mut rig = OrbitCamera::new(60.0);
        controls.set_enabled(false);
        drag(&mut controls, 50.0, 50.0);
        controls.on_scroll(MouseScrollDelta::LineDelta(0.0, 5.0));
        controls.update(&mut rig);
        assert_eq!(rig, OrbitCamera::new(60.0));
        assert!(!controls.is_dragging());

        controls.set_enabled(true);
        controls.update(&mut rig);
        assert_eq!(rig, OrbitCamera::new(60.0));
    }
}
