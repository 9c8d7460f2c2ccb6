// window.rs
use std::ffi::CString;
use std::num::NonZeroU32;
use std::time::Instant;

use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::{Window as WinitWindow, WindowId};

use crate::error::RenderError;
use crate::renderer::GlowGpu;
use crate::settings::RenderSettings;

/// What the renderer needs from the surface it draws into.
pub trait Window {
    /// Drawable size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Seconds since the window was created.
    fn elapsed(&self) -> f64;

    /// Presents the back buffer.
    fn swap_buffers(&self) -> Result<(), RenderError>;

    fn set_title(&self, _title: &str) {}
}

/// A winit window with a current OpenGL 3.3 core context.
pub struct NativeWindow {
    // Declared before `window` so the GL objects are dropped first.
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: WinitWindow,
    created: Instant,
}

fn window_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Window(err.to_string())
}

/// The candidate with the most samples; the first one wins ties.
fn most_samples<C>(candidates: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Option<C> {
    candidates.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}

#[cfg(target_os = "windows")]
fn api_preference(window: &WinitWindow) -> Result<DisplayApiPreference, RenderError> {
    let handle = window.window_handle().map_err(window_error)?.as_raw();
    Ok(DisplayApiPreference::Wgl(Some(handle)))
}

#[cfg(target_os = "macos")]
fn api_preference(_window: &WinitWindow) -> Result<DisplayApiPreference, RenderError> {
    Ok(DisplayApiPreference::Cgl)
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn api_preference(_window: &WinitWindow) -> Result<DisplayApiPreference, RenderError> {
    Ok(DisplayApiPreference::Egl)
}

impl NativeWindow {
    /// Opens the window and makes its context current on this thread.
    /// Returns the GPU backend bound to that context.
    pub fn create(
        event_loop: &ActiveEventLoop,
        settings: &RenderSettings,
    ) -> Result<(Self, GlowGpu), RenderError> {
        let attributes = WinitWindow::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(
                settings.resolution.width,
                settings.resolution.height,
            ));

        let window = event_loop
            .create_window(attributes)
            .map_err(window_error)?;
        let raw_display = event_loop.display_handle().map_err(window_error)?.as_raw();
        let display = unsafe { Display::new(raw_display, api_preference(&window)?) }
            .map_err(window_error)?;
        let raw_handle = window.window_handle().map_err(window_error)?.as_raw();

        let samples = settings.sample_count.min(u8::MAX as u32) as u8;
        let template = ConfigTemplateBuilder::new()
            .with_depth_size(24)
            .with_multisampling(samples)
            .compatible_with_native_window(raw_handle)
            .build();

        let configs = unsafe { display.find_configs(template) }.map_err(window_error)?;
        let config = most_samples(configs, |config| config.num_samples())
            .ok_or_else(|| window_error("no GL config matches the window"))?;

        log::info!(
            "Picked GL config with {} samples (requested {})",
            config.num_samples(),
            samples
        );

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_handle));

        let not_current = unsafe { display.create_context(&config, &context_attributes) }
            .map_err(window_error)?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(window_error)?;
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .map_err(window_error)?;
        let context = not_current.make_current(&surface).map_err(window_error)?;

        let interval = if settings.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            log::warn!("Unable to set swap interval {:?}: {}", interval, err);
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|symbol| {
                CString::new(symbol)
                    .map(|symbol| display.get_proc_address(&symbol))
                    .unwrap_or(std::ptr::null())
            })
        };

        Ok((
            Self {
                surface,
                context,
                window,
                created: Instant::now(),
            },
            GlowGpu::new(gl),
        ))
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Resizes the GL surface. Zero sizes (minimised windows) are ignored.
    pub fn resize(&self, width: u32, height: u32) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, width, height);
        }
    }
}

impl Window for NativeWindow {
    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn elapsed(&self) -> f64 {
        self.created.elapsed().as_secs_f64()
    }

    fn swap_buffers(&self) -> Result<(), RenderError> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|err| RenderError::Present(err.to_string()))
    }

    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}
