// renderer/skybox.rs
use glam::{Mat4, Vec3};

use crate::environment::Environment;
use crate::error::RenderError;
use crate::scene::Camera;

use super::context::GpuContext;
use super::gpu::{DepthFunc, Geometry, Gpu, UniformLocation};
use super::shader::ShaderProgram;
use super::uniforms::{upload_i32, upload_mat4};

const VERTEX_SOURCE: &[u8] = include_bytes!("../../shaders/skybox/vertex.glsl");
const FRAGMENT_SOURCE: &[u8] = include_bytes!("../../shaders/skybox/fragment.glsl");

pub const ENVIRONMENT_MAP: &str = "environmentMap";
pub const PROJECTION: &str = "projection";
pub const VIEW: &str = "view";

/// View used for the background: looks from the camera along -Z, then turns
/// by the camera yaw. Pitch and roll are ignored so the horizon stays level.
pub fn skybox_view_matrix(camera: &Camera) -> Mat4 {
    Mat4::look_at_rh(camera.translation, Vec3::NEG_Z, Vec3::Y)
        * Mat4::from_rotation_y(camera.rotation.y)
}

/// The background pass. Built once per GPU context from shaders baked into
/// the binary, together with the shared unit cube it draws.
pub(crate) struct SkyboxPass {
    shader: ShaderProgram,
    cube: Geometry,
    environment_map: Option<UniformLocation>,
    projection: Option<UniformLocation>,
    view: Option<UniformLocation>,
}

impl SkyboxPass {
    pub(crate) fn load(ctx: &GpuContext) -> Result<Self, RenderError> {
        let shader = ShaderProgram::from_memory(ctx, "skybox", VERTEX_SOURCE, FRAGMENT_SOURCE)?;
        let cube = match ctx.unit_cube() {
            Ok(cube) => cube,
            Err(err) => {
                shader.release(ctx.gpu());
                return Err(err);
            }
        };

        Ok(Self {
            cube,
            environment_map: shader.location(ctx, ENVIRONMENT_MAP),
            projection: shader.location(ctx, PROJECTION),
            view: shader.location(ctx, VIEW),
            shader,
        })
    }

    /// Draws the shared unit cube at maximum depth so only pixels no entity
    /// covered are shaded.
    pub(crate) fn draw(
        &self,
        ctx: &GpuContext,
        environment: &Environment,
        projection: &Mat4,
        camera: &Camera,
    ) {
        let cube = self.cube;
        let gpu = ctx.gpu();

        self.shader.activate(ctx);
        environment.activate(ctx);
        upload_i32(gpu, self.environment_map, environment.cubemap().unit() as i32);
        upload_mat4(gpu, self.projection, projection);
        upload_mat4(gpu, self.view, &skybox_view_matrix(camera));

        gpu.depth_func(DepthFunc::LessEqual);
        gpu.bind_vertex_array(Some(cube.vertex_array));
        gpu.draw_triangles_u16(cube.index_count);

        gpu.bind_vertex_array(None);
        gpu.use_program(None);
    }

    pub(crate) fn release(&self, gpu: &dyn Gpu) {
        self.shader.release(gpu);
    }
}
