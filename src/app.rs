// app.rs
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowId,
};

use crate::error::RenderError;
use crate::renderer::{GpuContext, Renderer};
use crate::scene::{Camera, Scene};
use crate::settings::RenderSettings;
use crate::window::NativeWindow;

const ORBIT_STEP: f32 = 5.0 * std::f32::consts::PI / 180.0;
const EXPOSURE_STEP: f32 = 1.1;

/// Core trait for applications driven by [`run_application`].
pub trait Application: 'static {
    /// Name of your application
    fn name(&self) -> &str {
        "gl-cube"
    }

    fn initial_camera(&self) -> Camera {
        Camera::default()
    }

    /// Called once the GL context exists to build the scene.
    fn setup(&mut self, ctx: &GpuContext, settings: &RenderSettings)
        -> Result<Scene, RenderError>;

    /// Called every frame before rendering.
    fn update(&mut self, scene: &mut Scene, camera: &mut Camera, dt: f64) {
        let _ = (scene, camera, dt);
    }

    /// Called before the context goes away so GPU resources can be released.
    fn shutdown(&mut self, ctx: &GpuContext, scene: Scene) {
        let _ = (ctx, scene);
    }
}

/// What a key press does to the running application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Quit,
    ToggleWireframe,
    Orbit { yaw: f32, pitch: f32 },
    ScaleExposure(f32),
}

pub fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Named(NamedKey::ArrowLeft) => Some(KeyAction::Orbit {
            yaw: -ORBIT_STEP,
            pitch: 0.0,
        }),
        Key::Named(NamedKey::ArrowRight) => Some(KeyAction::Orbit {
            yaw: ORBIT_STEP,
            pitch: 0.0,
        }),
        Key::Named(NamedKey::ArrowUp) => Some(KeyAction::Orbit {
            yaw: 0.0,
            pitch: ORBIT_STEP,
        }),
        Key::Named(NamedKey::ArrowDown) => Some(KeyAction::Orbit {
            yaw: 0.0,
            pitch: -ORBIT_STEP,
        }),
        Key::Character(text) => match text.as_str() {
            "w" | "W" => Some(KeyAction::ToggleWireframe),
            "+" | "=" => Some(KeyAction::ScaleExposure(EXPOSURE_STEP)),
            "-" | "_" => Some(KeyAction::ScaleExposure(1.0 / EXPOSURE_STEP)),
            _ => None,
        },
        _ => None,
    }
}

// Field order is drop order: the renderer and scene release their GPU
// objects while the context is still current, and the window goes last.
struct Running {
    renderer: Renderer,
    scene: Scene,
    ctx: GpuContext,
    window: NativeWindow,
}

pub struct App<T: Application> {
    application: T,
    settings: RenderSettings,
    camera: Camera,
    running: Option<Running>,
    last_frame: Option<Instant>,
    error: Option<RenderError>,
}

impl<T: Application> App<T> {
    pub fn new(application: T, settings: RenderSettings) -> Self {
        let camera = application.initial_camera();
        Self {
            application,
            settings,
            camera,
            running: None,
            last_frame: None,
            error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<RenderError> {
        self.error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running, RenderError> {
        let (window, gpu) = NativeWindow::create(event_loop, &self.settings)?;
        let ctx = GpuContext::new(gpu);
        let renderer = Renderer::new(&window, &self.settings)?;
        let scene = self.application.setup(&ctx, &self.settings)?;

        log::info!(
            "Started `{}` with {} entities",
            self.application.name(),
            scene.entities().len()
        );

        Ok(Running {
            renderer,
            scene,
            ctx,
            window,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RenderError) {
        log::error!("Application error: {err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, action: KeyAction) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match action {
            KeyAction::Quit => event_loop.exit(),
            KeyAction::ToggleWireframe => {
                let enabled = !running.renderer.wireframe();
                running.renderer.set_wireframe(&running.ctx, enabled);
                log::info!("Wireframe {}", if enabled { "on" } else { "off" });
            }
            KeyAction::Orbit { yaw, pitch } => self.camera.orbit(yaw, pitch),
            KeyAction::ScaleExposure(factor) => {
                let exposure = running.renderer.exposure() * factor;
                running.renderer.set_exposure(exposure);
                log::info!("Exposure {:.2}", running.renderer.exposure());
            }
        }
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.application
            .update(&mut running.scene, &mut self.camera, dt);
        running.renderer.render(
            &running.ctx,
            &running.window,
            &self.camera,
            &running.scene,
        )?;
        running.window.request_redraw();
        Ok(())
    }
}

impl<T: Application> ApplicationHandler for App<T> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if id != running.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.window.resize(size.width, size.height);
                running
                    .renderer
                    .resize(&running.ctx, size.width, size.height);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(action) = key_action(&logical_key) {
                    self.handle_key(event_loop, action);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.take() {
            let Running {
                renderer,
                scene,
                ctx,
                window,
            } = running;
            log::info!(
                "Renderer {:?} ran for {:.1} s",
                renderer.id(),
                renderer.uptime(&window)
            );
            drop(renderer);
            self.application.shutdown(&ctx, scene);
            drop(ctx);
            drop(window);
        }
    }
}

/// Runs `application` in a native window until it is closed.
pub fn run_application<T: Application>(application: T) -> Result<(), RenderError> {
    let settings = RenderSettings::load();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(application, settings);

    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_quits_and_arrows_orbit() {
        assert_eq!(
            key_action(&Key::Named(NamedKey::Escape)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            key_action(&Key::Named(NamedKey::ArrowRight)),
            Some(KeyAction::Orbit {
                yaw: ORBIT_STEP,
                pitch: 0.0
            })
        );
    }

    #[test]
    fn character_keys_toggle_wireframe_and_exposure() {
        assert_eq!(
            key_action(&Key::Character("W".into())),
            Some(KeyAction::ToggleWireframe)
        );
        assert_eq!(
            key_action(&Key::Character("+".into())),
            Some(KeyAction::ScaleExposure(EXPOSURE_STEP))
        );
        assert_eq!(key_action(&Key::Character("q".into())), None);
    }
}
