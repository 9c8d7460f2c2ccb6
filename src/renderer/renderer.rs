// renderer/renderer.rs
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::scene::{Camera, Entity, Scene};
use crate::settings::RenderSettings;
use crate::window::Window;

use super::context::GpuContext;
use super::fps::{FpsHistory, FpsTracker};
use super::gpu::{Capability, ClearFlags, DepthFunc, Gpu, PolygonMode};
use super::mesh::Mesh;
use super::overlay::{Overlay, OverlayInit, StatsOverlay};
use super::uniforms::{upload_f32, upload_mat4};

/// Identifies a renderer. Unique for the whole process, so a renderer from
/// one [`GpuContext`] never passes for the current one of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(u64);

static NEXT_RENDERER_ID: AtomicU64 = AtomicU64::new(1);

impl RendererId {
    fn next() -> Self {
        Self(NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Draws scenes into one window.
///
/// Holds the fixed-function state it programs on activation (viewport,
/// clear color, wireframe), the projection parameters, exposure and the
/// frame rate history. Only one renderer per context is active at a time;
/// see [`GpuContext::activate`].
pub struct Renderer {
    id: RendererId,
    viewport_width: u32,
    viewport_height: u32,
    fov_degrees: f32,
    near_plane: f32,
    far_plane: f32,
    start_time: f64,
    exposure: f32,
    wireframe: bool,
    clear_color: [f32; 4],
    require_skybox: bool,
    fps: FpsTracker,
    overlay: Box<dyn Overlay>,
}

impl Renderer {
    /// A renderer reporting frame statistics through [`StatsOverlay`].
    pub fn new(window: &dyn Window, settings: &RenderSettings) -> Result<Self, RenderError> {
        Self::with_overlay(window, settings, StatsOverlay::create)
    }

    /// Builds the renderer around the overlay returned by `create_overlay`.
    /// A failing factory fails construction.
    pub fn with_overlay<F>(
        window: &dyn Window,
        settings: &RenderSettings,
        create_overlay: F,
    ) -> Result<Self, RenderError>
    where
        F: FnOnce(&OverlayInit<'_>) -> Result<Box<dyn Overlay>, RenderError>,
    {
        let (width, height) = window.framebuffer_size();

        let overlay = create_overlay(&OverlayInit {
            title: &settings.title,
            framebuffer_size: (width, height),
            fps_history_capacity: settings.fps_history_capacity,
        })
        .map_err(|err| {
            log::error!("Unable to create renderer overlay: {err}");
            err
        })?;

        let id = RendererId::next();
        log::info!("Created renderer {:?} for a {}x{} framebuffer", id, width, height);

        Ok(Self {
            id,
            viewport_width: width,
            viewport_height: height,
            fov_degrees: settings.fov_degrees,
            near_plane: settings.near_plane,
            far_plane: settings.far_plane,
            start_time: window.elapsed(),
            exposure: settings.exposure,
            wireframe: settings.wireframe,
            clear_color: settings.clear_color,
            require_skybox: settings.require_skybox,
            fps: FpsTracker::new(settings.fps_history_capacity),
            overlay,
        })
    }

    pub fn id(&self) -> RendererId {
        self.id
    }

    /// Programs the state this renderer draws with. Called by
    /// [`GpuContext::activate`] when the active renderer changes.
    pub(crate) fn apply_gpu_state(&self, gpu: &dyn Gpu) {
        gpu.viewport(
            0,
            0,
            self.viewport_width as i32,
            self.viewport_height as i32,
        );
        gpu.bind_default_framebuffer();
        gpu.clear_color(self.clear_color);

        gpu.enable(Capability::DepthTest);
        gpu.depth_func(DepthFunc::LessEqual);

        gpu.enable(Capability::Multisample);

        gpu.polygon_mode(if self.wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        });

        // Hides the seams between cubemap faces.
        gpu.enable(Capability::SeamlessCubemap);
    }

    pub fn activate(&self, ctx: &GpuContext) {
        ctx.activate(Some(self));
    }

    fn reactivate(&self, ctx: &GpuContext) {
        ctx.activate(None);
        ctx.activate(Some(self));
    }

    /// Switches polygon rasterization and reprograms the GPU state right
    /// away, even when this renderer is already active.
    pub fn set_wireframe(&mut self, ctx: &GpuContext, enabled: bool) {
        self.wireframe = enabled;
        self.reactivate(ctx);
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(0.0);
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Adopts a new framebuffer size. The viewport is updated immediately
    /// when this renderer is active, otherwise on its next activation.
    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport_width = width;
        self.viewport_height = height;

        if ctx.current_renderer() == Some(self.id) {
            self.reactivate(ctx);
        }
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport_width as f32 / self.viewport_height.max(1) as f32
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            self.aspect_ratio(),
            self.near_plane,
            self.far_plane,
        )
    }

    /// Projection times a view looking from the camera at the world origin.
    /// The camera rotation does not take part.
    pub fn view_projection(&self, camera: &Camera) -> Mat4 {
        self.projection() * Mat4::look_at_rh(camera.translation, Vec3::ZERO, Vec3::Y)
    }

    pub fn fps_history(&self) -> &FpsHistory {
        self.fps.history()
    }

    /// Seconds since this renderer was created.
    pub fn uptime(&self, window: &dyn Window) -> f64 {
        window.elapsed() - self.start_time
    }

    /// Renders and presents one frame: entities in scene order, the skybox
    /// behind them, frame statistics, then the overlay on top.
    pub fn render(
        &mut self,
        ctx: &GpuContext,
        window: &dyn Window,
        camera: &Camera,
        scene: &Scene,
    ) -> Result<(), RenderError> {
        self.activate(ctx);
        scene.environment().activate(ctx);

        ctx.gpu().clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        let view_projection = self.view_projection(camera);
        for entity in scene.entities() {
            for mesh in entity.model.meshes() {
                self.draw_mesh(ctx, camera, scene, entity, mesh, &view_projection);
            }
        }

        self.draw_skybox(ctx, camera, scene)?;

        self.fps.tick(window.elapsed());

        self.overlay.render(ctx, window, self.fps.history());

        window.swap_buffers()
    }

    fn draw_mesh(
        &self,
        ctx: &GpuContext,
        camera: &Camera,
        scene: &Scene,
        entity: &Entity,
        mesh: &Mesh,
        view_projection: &Mat4,
    ) {
        let gpu = ctx.gpu();
        let shader = mesh.shader();

        mesh.activate(ctx);

        shader.bind_environment(ctx, scene.environment());
        shader.bind_material(ctx, mesh.material());
        shader.bind_camera(ctx, camera);
        shader.bind_lights(ctx, scene.lights());

        let model = entity.model_matrix();
        let slots = &shader.slots(ctx).transform;
        upload_mat4(gpu, slots.view_projection, view_projection);
        upload_mat4(gpu, slots.model, &model);
        // Uniform scale only, so the model matrix doubles as the normal matrix.
        upload_mat4(gpu, slots.normal, &model);
        upload_f32(gpu, slots.exposure, self.exposure);

        gpu.draw_triangles_u16(mesh.index_count());
    }

    fn draw_skybox(
        &self,
        ctx: &GpuContext,
        camera: &Camera,
        scene: &Scene,
    ) -> Result<(), RenderError> {
        match ctx.skybox() {
            Ok(pass) => {
                pass.draw(ctx, scene.environment(), &self.projection(), camera);
                Ok(())
            }
            Err(err) if self.require_skybox => Err(err),
            Err(_) => Ok(()),
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("viewport", &(self.viewport_width, self.viewport_height))
            .field("wireframe", &self.wireframe)
            .field("exposure", &self.exposure)
            .finish()
    }
}
