// renderer/uniforms.rs
//
// Uniform names understood by the standard shaders and the per-shader slot
// tables resolved from them.

use glam::{Mat4, Vec3, Vec4};

use super::context::GpuContext;
use super::gpu::{Gpu, UniformLocation};
use super::lights::MAX_LIGHTS;
use super::shader::ShaderProgram;

pub const VIEW_PROJECTION_MATRIX: &str = "u_ViewProjectionMatrix";
pub const MODEL_MATRIX: &str = "u_ModelMatrix";
pub const NORMAL_MATRIX: &str = "u_NormalMatrix";
pub const EXPOSURE: &str = "u_Exposure";

pub const CAMERA_POSITION: &str = "u_Camera.position";

pub const ENVIRONMENT_MAP: &str = "u_Environment.map";
pub const ENVIRONMENT_AMBIENT: &str = "u_Environment.ambient";

pub const MATERIAL_BASE_COLOR_FACTOR: &str = "u_Material.baseColorFactor";
pub const MATERIAL_BASE_COLOR_SAMPLER: &str = "u_Material.baseColorSampler";
pub const MATERIAL_HAS_BASE_COLOR_TEXTURE: &str = "u_Material.hasBaseColorTexture";
pub const MATERIAL_METALLIC_FACTOR: &str = "u_Material.metallicFactor";
pub const MATERIAL_ROUGHNESS_FACTOR: &str = "u_Material.roughnessFactor";
pub const MATERIAL_NORMAL_SCALE: &str = "u_Material.normalScale";
pub const MATERIAL_OCCLUSION_STRENGTH: &str = "u_Material.occlusionStrength";
pub const MATERIAL_EMISSIVE_FACTOR: &str = "u_Material.emissiveFactor";

pub const LIGHTS_COUNT: &str = "u_LightsCount";

fn light_field(index: usize, field: &str) -> String {
    format!("u_Lights[{index}].{field}")
}

/// Per-draw transform uniforms.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransformSlots {
    pub view_projection: Option<UniformLocation>,
    pub model: Option<UniformLocation>,
    pub normal: Option<UniformLocation>,
    pub exposure: Option<UniformLocation>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EnvironmentSlots {
    pub map: Option<UniformLocation>,
    pub ambient: Option<UniformLocation>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MaterialSlots {
    pub base_color_factor: Option<UniformLocation>,
    pub base_color_sampler: Option<UniformLocation>,
    pub has_base_color_texture: Option<UniformLocation>,
    pub metallic_factor: Option<UniformLocation>,
    pub roughness_factor: Option<UniformLocation>,
    pub normal_scale: Option<UniformLocation>,
    pub occlusion_strength: Option<UniformLocation>,
    pub emissive_factor: Option<UniformLocation>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LightSlots {
    pub kind: Option<UniformLocation>,
    pub position: Option<UniformLocation>,
    pub direction: Option<UniformLocation>,
    pub color: Option<UniformLocation>,
    pub intensity: Option<UniformLocation>,
}

/// Every uniform the render pass touches on a mesh shader, looked up once.
#[derive(Debug, Clone)]
pub(crate) struct ShaderSlots {
    pub transform: TransformSlots,
    pub camera_position: Option<UniformLocation>,
    pub environment: EnvironmentSlots,
    pub material: MaterialSlots,
    pub lights_count: Option<UniformLocation>,
    pub lights: [LightSlots; MAX_LIGHTS],
}

impl ShaderSlots {
    pub(crate) fn resolve(shader: &ShaderProgram, ctx: &GpuContext) -> Self {
        let slot = |name: &str| shader.location(ctx, name);

        Self {
            transform: TransformSlots {
                view_projection: slot(VIEW_PROJECTION_MATRIX),
                model: slot(MODEL_MATRIX),
                normal: slot(NORMAL_MATRIX),
                exposure: slot(EXPOSURE),
            },
            camera_position: slot(CAMERA_POSITION),
            environment: EnvironmentSlots {
                map: slot(ENVIRONMENT_MAP),
                ambient: slot(ENVIRONMENT_AMBIENT),
            },
            material: MaterialSlots {
                base_color_factor: slot(MATERIAL_BASE_COLOR_FACTOR),
                base_color_sampler: slot(MATERIAL_BASE_COLOR_SAMPLER),
                has_base_color_texture: slot(MATERIAL_HAS_BASE_COLOR_TEXTURE),
                metallic_factor: slot(MATERIAL_METALLIC_FACTOR),
                roughness_factor: slot(MATERIAL_ROUGHNESS_FACTOR),
                normal_scale: slot(MATERIAL_NORMAL_SCALE),
                occlusion_strength: slot(MATERIAL_OCCLUSION_STRENGTH),
                emissive_factor: slot(MATERIAL_EMISSIVE_FACTOR),
            },
            lights_count: slot(LIGHTS_COUNT),
            lights: std::array::from_fn(|index| LightSlots {
                kind: slot(&light_field(index, "type")),
                position: slot(&light_field(index, "position")),
                direction: slot(&light_field(index, "direction")),
                color: slot(&light_field(index, "color")),
                intensity: slot(&light_field(index, "intensity")),
            }),
        }
    }
}

// Uploads that quietly skip uniforms the shader does not declare.

pub(crate) fn upload_i32(gpu: &dyn Gpu, slot: Option<UniformLocation>, value: i32) {
    if let Some(location) = slot {
        gpu.uniform_i32(location, value);
    }
}

pub(crate) fn upload_f32(gpu: &dyn Gpu, slot: Option<UniformLocation>, value: f32) {
    if let Some(location) = slot {
        gpu.uniform_f32(location, value);
    }
}

pub(crate) fn upload_vec3(gpu: &dyn Gpu, slot: Option<UniformLocation>, value: Vec3) {
    if let Some(location) = slot {
        gpu.uniform_vec3(location, value.to_array());
    }
}

pub(crate) fn upload_vec4(gpu: &dyn Gpu, slot: Option<UniformLocation>, value: Vec4) {
    if let Some(location) = slot {
        gpu.uniform_vec4(location, value.to_array());
    }
}

pub(crate) fn upload_mat4(gpu: &dyn Gpu, slot: Option<UniformLocation>, value: &Mat4) {
    if let Some(location) = slot {
        gpu.uniform_mat4(location, &value.to_cols_array());
    }
}
