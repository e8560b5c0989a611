//! Per-frame animation: shell spin, cloud-shadow drift and the startup camera approach.

use std::f64::consts::TAU;

use globe_config::{CameraConfig, PlanetConfig};
use globe_render::OrbitCamera;
use tracing::{debug, info};

use crate::params::SceneParameters;
use crate::scene::SceneRoot;

/// Clouds spin this many times faster than the surface.
pub const CLOUD_RATE_RATIO: f32 = 2.0;

/// Mouse-driven orbit controller the approach suspends while it runs.
pub trait OrbitInput {
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    /// Apply pending input and damping to the rig. Called once per frame.
    fn update(&mut self, rig: &mut OrbitCamera);
}

/// Wrap a phase in turns to `[0, 1)`.
fn wrap_turns(turns: f64) -> f64 {
    let wrapped = turns.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Narrow a wrapped phase for upload, keeping it below 1.
fn narrow_turns(turns: f64) -> f32 {
    let narrowed = turns as f32;
    if narrowed >= 1.0 { 0.0 } else { narrowed }
}

/// Horizontal UV offset of the cloud-shadow lookup, kept in `[0, 1)`.
///
/// Stored in f64 so frame-sized steps are not lost to rounding over long runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CloudShadowOffset(f64);

impl CloudShadowOffset {
    pub fn from_turns(turns: f64) -> Self {
        Self(wrap_turns(turns))
    }

    pub fn value(self) -> f32 {
        narrow_turns(self.0)
    }

    /// Add `delta` and wrap modulo 1.
    pub fn advance(&mut self, delta: f64) -> f32 {
        self.0 = wrap_turns(self.0 + delta);
        self.value()
    }
}

/// Offset advance matching a surface yaw step of `yaw_step` radians.
pub fn cloud_offset_step(yaw_step: f64) -> f64 {
    yaw_step / TAU
}

/// Rotation of the surface and cloud shells since the first update, in turns.
///
/// Shell yaws are rebuilt from this every frame, so they stay in `[0, 2π)` and
/// never accumulate f32 rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShellSpin {
    surface_base: f64,
    clouds_base: f64,
    surface_turns: f64,
    clouds_turns: f64,
}

impl ShellSpin {
    fn new(surface_yaw: f32, clouds_yaw: f32) -> Self {
        Self {
            surface_base: f64::from(surface_yaw),
            clouds_base: f64::from(clouds_yaw),
            surface_turns: 0.0,
            clouds_turns: 0.0,
        }
    }

    fn advance(&mut self, surface_turns: f64) {
        self.surface_turns = wrap_turns(self.surface_turns + surface_turns);
        self.clouds_turns =
            wrap_turns(self.clouds_turns + surface_turns * f64::from(CLOUD_RATE_RATIO));
    }

    fn surface_yaw(&self) -> f32 {
        yaw_at(self.surface_base, self.surface_turns)
    }

    fn clouds_yaw(&self) -> f32 {
        yaw_at(self.clouds_base, self.clouds_turns)
    }
}

fn yaw_at(base: f64, turns: f64) -> f32 {
    (base + turns * TAU).rem_euclid(TAU) as f32
}

fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Where the startup approach is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachPhase {
    /// Tweening; `elapsed` seconds in.
    Approaching { elapsed: f32 },
    Settled,
}

/// One-shot dolly from the far framing to the final framing.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraApproach {
    pub from: f32,
    pub to: f32,
    /// Seconds.
    pub duration: f32,
    phase: Option<ApproachPhase>,
}

impl CameraApproach {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            phase: None,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            config.start_distance,
            config.final_distance,
            config.approach_seconds,
        )
    }

    /// `None` until started.
    pub fn phase(&self) -> Option<ApproachPhase> {
        self.phase
    }

    pub fn is_approaching(&self) -> bool {
        matches!(self.phase, Some(ApproachPhase::Approaching { .. }))
    }

    /// Begin the approach, disabling orbit input until it settles.
    ///
    /// Returns `false` without touching anything if an approach was already
    /// started, whether or not it has finished.
    pub fn start(&mut self, rig: &mut OrbitCamera, input: &mut dyn OrbitInput) -> bool {
        if self.phase.is_some() {
            return false;
        }
        input.set_enabled(false);
        rig.distance = self.from;
        self.phase = Some(ApproachPhase::Approaching { elapsed: 0.0 });
        debug!(from = self.from, to = self.to, "camera approach started");
        true
    }

    /// Step the tween by `dt` seconds. Returns `true` on the frame it settles.
    pub fn advance(&mut self, dt: f32, rig: &mut OrbitCamera, input: &mut dyn OrbitInput) -> bool {
        let Some(ApproachPhase::Approaching { elapsed }) = self.phase else {
            return false;
        };
        let elapsed = elapsed + dt.max(0.0);
        let t = if self.duration > 0.0 {
            elapsed / self.duration
        } else {
            1.0
        };
        if t >= 1.0 {
            rig.distance = self.to;
            self.phase = Some(ApproachPhase::Settled);
            input.set_enabled(true);
            return true;
        }
        rig.distance = self.from + (self.to - self.from) * ease_in_out_quad(t);
        self.phase = Some(ApproachPhase::Approaching { elapsed });
        false
    }
}

/// Advances the planet and camera once per rendered frame.
#[derive(Debug, Clone)]
pub struct FrameUpdater {
    /// Surface spin in radians per second at speed factor 1.
    pub base_surface_rate: f32,
    spin: Option<ShellSpin>,
    /// Surface phase at the frame the patched program first existed.
    offset_origin: Option<f64>,
    cloud_offset: CloudShadowOffset,
    approach: CameraApproach,
}

impl FrameUpdater {
    pub fn new(base_surface_rate: f32, approach: CameraApproach) -> Self {
        Self {
            base_surface_rate,
            spin: None,
            offset_origin: None,
            cloud_offset: CloudShadowOffset::default(),
            approach,
        }
    }

    pub fn from_config(planet: &PlanetConfig, camera: &CameraConfig) -> Self {
        Self::new(
            planet.base_surface_rate,
            CameraApproach::from_config(camera),
        )
    }

    pub fn cloud_offset(&self) -> f32 {
        self.cloud_offset.value()
    }

    pub fn approach(&self) -> &CameraApproach {
        &self.approach
    }

    /// Start the one-time camera approach. See [`CameraApproach::start`].
    pub fn start_approach(&mut self, rig: &mut OrbitCamera, input: &mut dyn OrbitInput) -> bool {
        self.approach.start(rig, input)
    }

    /// Advance one frame of `interval` seconds; `elapsed` is total run time.
    pub fn update(
        &mut self,
        interval: f32,
        elapsed: f32,
        params: &SceneParameters,
        scene: &mut SceneRoot,
        rig: &mut OrbitCamera,
        input: &mut dyn OrbitInput,
    ) {
        let step = f64::from(interval)
            * f64::from(self.base_surface_rate)
            * f64::from(params.speed_factor);
        if let Some(layers) = scene.layers_mut() {
            let spin = self
                .spin
                .get_or_insert_with(|| ShellSpin::new(layers.surface.yaw, layers.clouds.yaw));
            let before = spin.surface_turns;
            spin.advance(cloud_offset_step(step));
            layers.surface.yaw = spin.surface_yaw();
            layers.clouds.yaw = spin.clouds_yaw();

            // The offset is the surface phase travelled since compile, so the
            // shadow cannot drift away from the terrain.
            if let Some(program) = layers.surface.material.program_mut() {
                let origin = *self.offset_origin.get_or_insert(before);
                self.cloud_offset = CloudShadowOffset::from_turns(spin.surface_turns - origin);
                program.set_cloud_offset(self.cloud_offset.value());
            }
        }

        if self.approach.advance(interval, rig, input) {
            info!(elapsed, distance = rig.distance, "camera approach settled");
        }
        input.update(rig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::LayerComposer;
    use crate::loader::SceneAssets;
    use globe_render::{DirectionalLight, TextureData};

    #[derive(Default)]
    struct MockInput {
        enabled: bool,
        enable_calls: u32,
        disable_calls: u32,
        updates: u32,
    }

    impl OrbitInput for MockInput {
        fn enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            if enabled {
                self.enable_calls += 1;
            } else {
                self.disable_calls += 1;
            }
            self.enabled = enabled;
        }

        fn update(&mut self, _rig: &mut OrbitCamera) {
            self.updates += 1;
        }
    }

    fn scene(compiled: bool) -> SceneRoot {
        let params = SceneParameters::default();
        let mut root = SceneRoot::new(DirectionalLight::default());
        let assets = SceneAssets {
            background: None,
            albedo: TextureData::solid([0; 4]),
            bump: TextureData::solid([0; 4]),
            clouds: TextureData::solid([0; 4]),
            ocean: None,
            night_lights: None,
        };
        LayerComposer::from_config(&PlanetConfig::default())
            .compose(assets, &params, &mut root)
            .unwrap();
        if compiled {
            root.layers_mut()
                .unwrap()
                .surface
                .material
                .compile(&params)
                .unwrap();
        }
        root
    }

    fn updater() -> FrameUpdater {
        FrameUpdater::from_config(&PlanetConfig::default(), &CameraConfig::default())
    }

    fn circular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).abs();
        d.min(1.0 - d)
    }

    /// Signed yaw change from `before` to `after`, folded into (-π, π].
    fn yaw_delta(after: f32, before: f32) -> f32 {
        use std::f32::consts::{PI, TAU};
        let d = (after - before).rem_euclid(TAU);
        if d > PI { d - TAU } else { d }
    }

    #[test]
    fn test_unit_interval_scenario() {
        let mut root = scene(true);
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        let params = SceneParameters::default();
        assert_eq!(params.speed_factor, 2.0);
        assert_eq!(updater.base_surface_rate, 0.005);

        let before = (
            root.layers().unwrap().surface.yaw,
            root.layers().unwrap().clouds.yaw,
        );
        updater.update(1.0, 1.0, &params, &mut root, &mut rig, &mut input);
        let layers = root.layers().unwrap();

        assert!((yaw_delta(layers.surface.yaw, before.0) - 0.01).abs() < 2e-6);
        assert!((yaw_delta(layers.clouds.yaw, before.1) - 0.02).abs() < 2e-6);
        assert!((updater.cloud_offset() - 0.0015915).abs() < 1e-6);
        let program = layers.surface.material.program().unwrap();
        assert_eq!(program.cloud_offset(), updater.cloud_offset());
    }

    #[test]
    fn test_clouds_spin_twice_as_fast() {
        let mut root = scene(false);
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        for (interval, speed) in [(0.016, 0.1), (0.25, 7.5), (3.0, 20.0)] {
            let params = SceneParameters {
                speed_factor: speed,
                ..SceneParameters::default()
            };
            let layers = root.layers().unwrap();
            let (surface, clouds) = (layers.surface.yaw, layers.clouds.yaw);
            updater.update(interval, 0.0, &params, &mut root, &mut rig, &mut input);
            let layers = root.layers().unwrap();
            let ds = yaw_delta(layers.surface.yaw, surface);
            let dc = yaw_delta(layers.clouds.yaw, clouds);
            assert!((dc - 2.0 * ds).abs() < 5e-6, "{dc} vs {ds}");
        }
    }

    #[test]
    fn test_offset_waits_for_compiled_program() {
        let mut root = scene(false);
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        updater.update(1.0, 1.0, &SceneParameters::default(), &mut root, &mut rig, &mut input);
        assert_eq!(updater.cloud_offset(), 0.0);
    }

    #[test]
    fn test_offset_wraps_to_true_sum() {
        let mut offset = CloudShadowOffset::default();
        let mut exact = 0.0f64;
        for i in 0..5000 {
            let delta = 0.013 + (i % 7) as f64 * 0.031;
            exact += delta;
            let value = offset.advance(delta);
            assert!((0.0..1.0).contains(&value), "step {i}: {value}");
            let expected = exact.rem_euclid(1.0) as f32;
            assert!(circular_distance(value, expected) < 1e-6, "step {i}");
        }
    }

    #[test]
    fn test_offset_tracks_frame_sized_steps_for_a_day() {
        // One 60 fps frame at speed 2.
        let delta = 0.000_026_525_822_f64;
        let frames = 24 * 60 * 60 * 60;
        let mut offset = CloudShadowOffset::default();
        for _ in 0..frames {
            offset.advance(delta);
        }
        let expected = (frames as f64 * delta).rem_euclid(1.0) as f32;
        assert!(
            circular_distance(offset.value(), expected) < 1e-5,
            "{} vs {expected}",
            offset.value()
        );
    }

    #[test]
    fn test_offset_wraps_negative_and_large() {
        let mut offset = CloudShadowOffset::default();
        assert!((offset.advance(2.25) - 0.25).abs() < 1e-6);
        assert!((offset.advance(-0.5) - 0.75).abs() < 1e-6);
        let tiny = offset.advance(-0.75 - f64::EPSILON / 4.0);
        assert!((0.0..1.0).contains(&tiny));
        assert!(CloudShadowOffset::from_turns(1.0 - 1e-12).value() < 1.0);
    }

    #[test]
    fn test_large_starting_yaw_is_wrapped() {
        let mut root = scene(true);
        {
            let layers = root.layers_mut().unwrap();
            layers.surface.yaw = 1000.0;
            layers.clouds.yaw = 2000.0;
        }
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        updater.update(1.0, 1.0, &SceneParameters::default(), &mut root, &mut rig, &mut input);

        let layers = root.layers().unwrap();
        let full_turn = std::f32::consts::TAU + 1e-5;
        assert!((0.0..full_turn).contains(&layers.surface.yaw));
        assert!((0.0..full_turn).contains(&layers.clouds.yaw));
        let wrapped = |yaw: f64| yaw.rem_euclid(std::f64::consts::TAU) as f32;
        assert!(yaw_delta(layers.surface.yaw, wrapped(1000.01)).abs() < 1e-5);
        assert!(yaw_delta(layers.clouds.yaw, wrapped(2000.02)).abs() < 1e-5);
    }

    #[test]
    fn test_day_long_run_keeps_rate_and_shadow_in_step() {
        let mut root = scene(true);
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        let params = SceneParameters::default();
        let interval = 1.0f32 / 60.0;
        let frames = 24 * 60 * 60 * 60u32;
        let start_yaw = root.layers().unwrap().surface.yaw;

        for _ in 0..frames {
            updater.update(interval, 0.0, &params, &mut root, &mut rig, &mut input);
        }

        let step = f64::from(interval)
            * f64::from(updater.base_surface_rate)
            * f64::from(params.speed_factor);
        let travelled = f64::from(frames) * step;
        let expected_yaw =
            (f64::from(start_yaw) + travelled).rem_euclid(std::f64::consts::TAU) as f32;
        let layers = root.layers().unwrap();
        assert!(
            yaw_delta(layers.surface.yaw, expected_yaw).abs() < 1e-3,
            "surface yaw {} vs {expected_yaw}",
            layers.surface.yaw
        );

        // The shadow offset is the surface phase since compile.
        let implied = (yaw_delta(layers.surface.yaw, start_yaw) / std::f32::consts::TAU)
            .rem_euclid(1.0);
        let expected_offset = (travelled / std::f64::consts::TAU).rem_euclid(1.0) as f32;
        assert!(circular_distance(updater.cloud_offset(), expected_offset) < 1e-4);
        assert!(circular_distance(updater.cloud_offset(), implied) < 1e-4);
    }

    #[test]
    fn test_approach_eases_and_reenables_once() {
        let mut root = scene(false);
        let mut updater = updater();
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput {
            enabled: true,
            ..MockInput::default()
        };
        let params = SceneParameters::default();

        assert!(updater.start_approach(&mut rig, &mut input));
        assert!(!input.enabled());
        assert_eq!(rig.distance, 60.0);

        updater.update(0.5, 0.5, &params, &mut root, &mut rig, &mut input);
        // t = 0.25 -> eased 0.125
        assert!((rig.distance - (60.0 - 30.0 * 0.125)).abs() < 1e-4);
        updater.update(0.5, 1.0, &params, &mut root, &mut rig, &mut input);
        assert!((rig.distance - 45.0).abs() < 1e-4);
        assert!(updater.approach().is_approaching());

        for _ in 0..10 {
            updater.update(0.5, 0.0, &params, &mut root, &mut rig, &mut input);
        }
        assert_eq!(rig.distance, 30.0);
        assert_eq!(updater.approach().phase(), Some(ApproachPhase::Settled));
        assert_eq!(input.enable_calls, 1);
        assert_eq!(input.disable_calls, 1);
        assert!(input.enabled());
        assert_eq!(input.updates, 12);
    }

    #[test]
    fn test_second_start_is_noop() {
        let mut approach = CameraApproach::new(60.0, 30.0, 2.0);
        let mut rig = OrbitCamera::new(30.0);
        let mut input = MockInput::default();
        assert!(approach.start(&mut rig, &mut input));
        approach.advance(1.0, &mut rig, &mut input);
        let midway = rig.distance;

        assert!(!approach.start(&mut rig, &mut input));
        assert_eq!(rig.distance, midway);
        assert_eq!(input.disable_calls, 1);
        assert_eq!(
            approach.phase(),
            Some(ApproachPhase::Approaching { elapsed: 1.0 })
        );

        approach.advance(5.0, &mut rig, &mut input);
        assert!(!approach.start(&mut rig, &mut input));
        assert_eq!(input.enable_calls, 1);
    }

    #[test]
    fn test_zero_duration_settles_immediately() {
        let mut approach = CameraApproach::new(60.0, 30.0, 0.0);
        let mut rig = OrbitCamera::new(60.0);
        let mut input = MockInput::default();
        approach.start(&mut rig, &mut input);
        assert!(approach.advance(0.0, &mut rig, &mut input));
        assert_eq!(rig.distance, 30.0);
    }

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(ease_in_out_quad(2.0), 1.0);
    }
}
