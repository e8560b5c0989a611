//! Window creation and event handling via winit.
//!
//! Provides [`GlobeApp`] which implements winit's [`ApplicationHandler`] trait,
//! and a [`run`] function to start the event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use globe_config::{CameraConfig, Config};
use globe_planet::{
    ComposeError, FrameUpdater, FsTextureLoader, LayerComposer, PlanetRenderer, RenderError,
    SceneParameters, SceneRoot, init_scene,
};
use globe_render::{
    Camera, DirectionalLight, OrbitCamera, RenderContext, RenderContextError, SurfaceError,
    init_render_context_blocking,
};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::controls::OrbitControls;
use crate::frame_clock::{FpsCounter, FrameClock};
use crate::panel::{KeyboardPanel, PanelCommand};

/// Errors that stop the viewer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] OsError),

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] RenderContextError),

    #[error("scene initialization failed: {0}")]
    Scene(#[from] ComposeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Perspective camera placed at the approach's start distance.
pub fn camera_from_config(config: &CameraConfig, width: u32, height: u32) -> Camera {
    let mut camera = Camera {
        position: glam::Vec3::new(0.0, 0.0, config.start_distance),
        target: glam::Vec3::ZERO,
        up: glam::Vec3::Y,
        fov_y: config.fov_deg.to_radians(),
        aspect_ratio: 16.0 / 9.0,
        near: config.near,
        far: config.far,
    };
    camera.set_aspect_ratio(width as f32, height as f32);
    camera
}

fn loading_title(title: &str, fraction: f32) -> String {
    format!("{title} (loading {:.0}%)", fraction.clamp(0.0, 1.0) * 100.0)
}

fn fps_title(title: &str, fps: f32) -> String {
    format!("{title} | {fps:.0} FPS")
}

/// Progress reporter that mirrors loading into the window title.
///
/// A delay hint keeps the completed title up for that long before the plain
/// title is restored.
fn title_progress<'a>(
    title: &'a str,
    mut set_title: impl FnMut(&str) + 'a,
) -> impl FnMut(f32, Option<Duration>) + 'a {
    move |fraction, delay| {
        info!(percent = (fraction * 100.0).round(), "loading scene");
        set_title(&loading_title(title, fraction));
        if let Some(delay) = delay {
            std::thread::sleep(delay);
            set_title(title);
        }
    }
}

/// Viewer state driven by the winit event loop.
pub struct GlobeApp {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<PlanetRenderer>,
    scene: SceneRoot,
    params: SceneParameters,
    camera: Camera,
    rig: OrbitCamera,
    controls: OrbitControls,
    updater: FrameUpdater,
    panel: KeyboardPanel,
    clock: FrameClock,
    fps: FpsCounter,
    modifiers: ModifiersState,
}

impl GlobeApp {
    pub fn with_config(config: Config) -> Self {
        let params = SceneParameters::default();
        let light = DirectionalLight::at(
            glam::Vec3::from_array(config.planet.sun_position),
            params.sun_intensity,
        );
        Self {
            window: None,
            gpu: None,
            renderer: None,
            scene: SceneRoot::new(light),
            params,
            camera: camera_from_config(&config.camera, config.window.width, config.window.height),
            rig: OrbitCamera::new(config.camera.start_distance),
            controls: OrbitControls::from_config(&config.camera),
            updater: FrameUpdater::from_config(&config.planet, &config.camera),
            panel: KeyboardPanel::wired(),
            clock: FrameClock::new(),
            fps: FpsCounter::new(Instant::now()),
            modifiers: ModifiersState::empty(),
            config,
        }
    }

    /// Create the window and GPU, load the textures, and compose the planet.
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attrs = window_attributes_from_config(&self.config);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = init_render_context_blocking(window.clone(), self.config.window.vsync)?;
        let (width, height) = gpu.size();
        self.camera.set_aspect_ratio(width as f32, height as f32);

        let title = self.config.window.title.clone();
        let composer = LayerComposer::from_config(&self.config.planet);
        {
            let mut progress = title_progress(&title, |text| window.set_title(text));
            pollster::block_on(init_scene(
                &FsTextureLoader,
                &self.config.assets,
                &composer,
                &self.params,
                &mut self.scene,
                &mut progress,
            ))?;
        }

        let renderer = PlanetRenderer::new(&gpu, &self.scene, &self.config.render)?;
        self.updater.start_approach(&mut self.rig, &mut self.controls);
        self.rig.apply_to(&mut self.camera);

        info!(width, height, "viewer ready");
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
        self.window = Some(window);
        self.clock = FrameClock::new();
        self.fps = FpsCounter::new(Instant::now());
        Ok(())
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        if event.logical_key == Key::Named(NamedKey::Escape) {
            info!("Escape pressed, shutting down");
            event_loop.exit();
            return;
        }
        if !self.scene.is_composed() {
            return;
        }
        let shift = self.modifiers.shift_key();
        if let Some(command) = PanelCommand::from_key(&event.logical_key, shift) {
            self.panel.handle(command, &mut self.params, &mut self.scene);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let frame = self.clock.tick();
        self.updater.update(
            frame.interval,
            frame.elapsed,
            &self.params,
            &mut self.scene,
            &mut self.rig,
            &mut self.controls,
        );
        self.rig.apply_to(&mut self.camera);

        let (Some(gpu), Some(renderer)) = (&mut self.gpu, &mut self.renderer) else {
            return;
        };
        match gpu.get_current_texture() {
            Ok(output) => {
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                match renderer.render(gpu, &view, &self.camera, &mut self.scene, &self.params) {
                    Ok(()) => output.present(),
                    Err(e) => {
                        error!("Render failed: {e}");
                        event_loop.exit();
                        return;
                    }
                }
            }
            Err(SurfaceError::Lost) => {
                let (width, height) = gpu.size();
                gpu.resize(width, height);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }

        if let Some(fps) = self.fps.record(Instant::now()) {
            debug!(fps, frames = self.clock.frame_count(), "frame rate");
            if self.config.debug.show_fps
                && let Some(window) = &self.window
            {
                window.set_title(&fps_title(&self.config.window.title, fps));
            }
        }
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.initialize(event_loop) {
            error!("{e}");
            event_loop.exit();
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let (w, h) = (size.width, size.height);
                if w == 0 || h == 0 {
                    return;
                }
                self.camera.set_aspect_ratio(w as f32, h as f32);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(w, h);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(&gpu.device, w, h);
                    }
                }
                info!("Window resized to {}x{}", w, h);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event_loop, &event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controls.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.controls.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.controls.on_scroll(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Creates an event loop and runs the viewer with the given config.
///
/// This function blocks until the window is closed.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = GlobeApp::with_config(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
