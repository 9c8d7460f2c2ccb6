use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3, Vec4};

use crate::environment::Environment;
use crate::error::RenderError;
use crate::scene::Camera;

use super::context::GpuContext;
use super::gpu::{Gpu, ProgramId, ShaderId, ShaderStage, TextureTarget, UniformLocation};
use super::lights::{Light, MAX_LIGHTS};
use super::material::{Material, BASE_COLOR_TEXTURE_UNIT};
use super::uniforms::{
    upload_f32, upload_i32, upload_mat4, upload_vec3, upload_vec4, ShaderSlots,
};
use super::vertex::Vertex;

/// Vertex and fragment GLSL for one program.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// `<root>/<name>/vertex.glsl` and `<root>/<name>/fragment.glsl`.
pub fn shader_paths(root: &Path, name: &str) -> (PathBuf, PathBuf) {
    let dir = root.join(name);
    (dir.join("vertex.glsl"), dir.join("fragment.glsl"))
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn from_files(root: &Path, name: &str) -> Result<Self, RenderError> {
        let (vertex_path, fragment_path) = shader_paths(root, name);
        let read = |path: PathBuf| {
            fs::read_to_string(&path).map_err(|source| RenderError::ShaderSourceIo { path, source })
        };
        Ok(Self {
            vertex: read(vertex_path)?,
            fragment: read(fragment_path)?,
        })
    }

    /// Sources baked into the binary.
    pub fn from_bytes(name: &str, vertex: &[u8], fragment: &[u8]) -> Result<Self, RenderError> {
        let decode = |bytes: &[u8], stage| {
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| RenderError::ShaderSourceEncoding {
                    name: name.to_owned(),
                    stage,
                })
        };
        Ok(Self {
            vertex: decode(vertex, ShaderStage::Vertex)?,
            fragment: decode(fragment, ShaderStage::Fragment)?,
        })
    }
}

/// A linked vertex + fragment program.
///
/// Uniform locations are looked up in the driver the first time a name is
/// used and cached for the lifetime of the program, absent ones included.
pub struct ShaderProgram {
    name: String,
    program: ProgramId,
    stages: [ShaderId; 2],
    locations: RefCell<HashMap<String, Option<UniformLocation>>>,
    slots: OnceCell<ShaderSlots>,
}

fn compile_stage(
    gpu: &dyn Gpu,
    name: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderId, RenderError> {
    gpu.compile_shader(stage, source).map_err(|log| {
        log::error!("Unable to compile {stage} stage of shader `{name}`:\n{log}");
        RenderError::ShaderCompile {
            name: name.to_owned(),
            stage,
            log,
        }
    })
}

impl ShaderProgram {
    pub fn from_sources(
        ctx: &GpuContext,
        name: &str,
        sources: &ShaderSources,
    ) -> Result<Self, RenderError> {
        let gpu = ctx.gpu();

        let vertex = compile_stage(gpu, name, ShaderStage::Vertex, &sources.vertex)?;
        let fragment = match compile_stage(gpu, name, ShaderStage::Fragment, &sources.fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                gpu.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = match gpu.link_program(&[vertex, fragment], &Vertex::ATTRS) {
            Ok(program) => program,
            Err(log) => {
                log::error!("Unable to link shader program `{name}`:\n{log}");
                gpu.delete_shader(vertex);
                gpu.delete_shader(fragment);
                return Err(RenderError::ShaderLink {
                    name: name.to_owned(),
                    log,
                });
            }
        };

        log::debug!("Linked shader program `{name}` ({program:?})");

        Ok(Self {
            name: name.to_owned(),
            program,
            stages: [vertex, fragment],
            locations: RefCell::new(HashMap::new()),
            slots: OnceCell::new(),
        })
    }

    /// Loads `<root>/<name>/{vertex,fragment}.glsl`.
    pub fn load_by_name(ctx: &GpuContext, root: &Path, name: &str) -> Result<Self, RenderError> {
        let sources = ShaderSources::from_files(root, name)?;
        Self::from_sources(ctx, name, &sources)
    }

    pub fn from_memory(
        ctx: &GpuContext,
        name: &str,
        vertex: &[u8],
        fragment: &[u8],
    ) -> Result<Self, RenderError> {
        let sources = ShaderSources::from_bytes(name, vertex, fragment)?;
        Self::from_sources(ctx, name, &sources)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ProgramId {
        self.program
    }

    /// Asks the driver whether the program can execute with the state bound
    /// right now. Failures are logged and returned.
    pub fn validate(&self, ctx: &GpuContext) -> Result<(), RenderError> {
        ctx.gpu().validate_program(self.program).map_err(|log| {
            log::error!("Unable to validate shader program `{}`:\n{log}", self.name);
            RenderError::ShaderValidate {
                name: self.name.clone(),
                log,
            }
        })
    }

    pub fn activate(&self, ctx: &GpuContext) {
        ctx.gpu().use_program(Some(self.program));
    }

    pub fn location(&self, ctx: &GpuContext, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.borrow().get(name) {
            return *cached;
        }

        let location = ctx.gpu().uniform_location(self.program, name);
        if location.is_none() {
            log::trace!("Shader `{}` has no uniform `{name}`", self.name);
        }
        self.locations
            .borrow_mut()
            .insert(name.to_owned(), location);
        location
    }

    pub(crate) fn slots(&self, ctx: &GpuContext) -> &ShaderSlots {
        self.slots.get_or_init(|| ShaderSlots::resolve(self, ctx))
    }

    // Setters by name. The program must be active; unknown names are skipped.

    pub fn set_i32(&self, ctx: &GpuContext, name: &str, value: i32) {
        upload_i32(ctx.gpu(), self.location(ctx, name), value);
    }

    pub fn set_f32(&self, ctx: &GpuContext, name: &str, value: f32) {
        upload_f32(ctx.gpu(), self.location(ctx, name), value);
    }

    pub fn set_bool(&self, ctx: &GpuContext, name: &str, value: bool) {
        self.set_i32(ctx, name, value as i32);
    }

    pub fn set_vec3(&self, ctx: &GpuContext, name: &str, value: Vec3) {
        upload_vec3(ctx.gpu(), self.location(ctx, name), value);
    }

    pub fn set_vec4(&self, ctx: &GpuContext, name: &str, value: Vec4) {
        upload_vec4(ctx.gpu(), self.location(ctx, name), value);
    }

    pub fn set_mat4(&self, ctx: &GpuContext, name: &str, value: &Mat4) {
        upload_mat4(ctx.gpu(), self.location(ctx, name), value);
    }

    pub fn bind_environment(&self, ctx: &GpuContext, environment: &Environment) {
        let gpu = ctx.gpu();
        let slots = &self.slots(ctx).environment;
        upload_i32(gpu, slots.map, environment.cubemap().unit() as i32);
        upload_vec3(gpu, slots.ambient, environment.ambient());
    }

    pub fn bind_material(&self, ctx: &GpuContext, material: &Material) {
        let gpu = ctx.gpu();
        let slots = &self.slots(ctx).material;

        upload_vec4(gpu, slots.base_color_factor, Vec4::from(material.base_color));
        upload_f32(gpu, slots.metallic_factor, material.metallic_factor);
        upload_f32(gpu, slots.roughness_factor, material.roughness_factor);
        upload_f32(gpu, slots.normal_scale, material.normal_scale);
        upload_f32(gpu, slots.occlusion_strength, material.occlusion_strength);
        upload_vec3(gpu, slots.emissive_factor, Vec3::from(material.emissive_factor));

        match material.base_color_texture {
            Some(texture) => {
                gpu.bind_texture(BASE_COLOR_TEXTURE_UNIT, TextureTarget::Texture2D, Some(texture));
                upload_i32(gpu, slots.base_color_sampler, BASE_COLOR_TEXTURE_UNIT as i32);
                upload_i32(gpu, slots.has_base_color_texture, 1);
            }
            None => upload_i32(gpu, slots.has_base_color_texture, 0),
        }
    }

    pub fn bind_camera(&self, ctx: &GpuContext, camera: &Camera) {
        upload_vec3(ctx.gpu(), self.slots(ctx).camera_position, camera.translation);
    }

    /// Uploads at most [`MAX_LIGHTS`] lights and the number uploaded.
    pub fn bind_lights(&self, ctx: &GpuContext, lights: &[Light]) {
        let gpu = ctx.gpu();
        let slots = self.slots(ctx);
        let count = lights.len().min(MAX_LIGHTS);

        upload_i32(gpu, slots.lights_count, count as i32);
        for (light, slot) in lights.iter().zip(slots.lights.iter()) {
            upload_i32(gpu, slot.kind, light.kind.shader_index());
            upload_vec3(gpu, slot.position, light.position);
            upload_vec3(gpu, slot.direction, light.direction);
            upload_vec3(gpu, slot.color, light.color);
            upload_f32(gpu, slot.intensity, light.intensity);
        }
    }

    /// Deletes the program and its stages.
    pub fn destroy(self, ctx: &GpuContext) {
        self.release(ctx.gpu());
    }

    pub(crate) fn release(&self, gpu: &dyn Gpu) {
        for stage in self.stages {
            gpu.detach_shader(self.program, stage);
            gpu.delete_shader(stage);
        }
        gpu.delete_program(self.program);
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("program", &self.program)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCall, RecordingGpu};

    const VERTEX: &str = "void main() { gl_Position = vec4(0.0); }";
    const FRAGMENT: &str = "void main() {}";

    #[test]
    fn paths_follow_the_named_directory_layout() {
        let (vertex, fragment) = shader_paths(Path::new("shaders"), "standard");
        assert_eq!(vertex, Path::new("shaders/standard/vertex.glsl"));
        assert_eq!(fragment, Path::new("shaders/standard/fragment.glsl"));
    }

    #[test]
    fn uniform_lookup_hits_the_driver_once() {
        let gpu = RecordingGpu::new();
        let ctx = GpuContext::new(gpu.clone());
        let shader =
            ShaderProgram::from_sources(&ctx, "test", &ShaderSources::new(VERTEX, FRAGMENT))
                .unwrap();

        let first = shader.location(&ctx, "u_Exposure");
        let second = shader.location(&ctx, "u_Exposure");

        assert_eq!(first, second);
        assert_eq!(gpu.uniform_lookups("u_Exposure"), 1);
    }

    #[test]
    fn missing_uniforms_are_cached_and_skipped() {
        let gpu = RecordingGpu::new();
        gpu.hide_uniform("u_Missing");
        let ctx = GpuContext::new(gpu.clone());
        let shader =
            ShaderProgram::from_sources(&ctx, "test", &ShaderSources::new(VERTEX, FRAGMENT))
                .unwrap();

        shader.set_f32(&ctx, "u_Missing", 1.0);
        shader.set_f32(&ctx, "u_Missing", 2.0);

        assert_eq!(gpu.uniform_lookups("u_Missing"), 1);
        assert!(!gpu
            .calls()
            .iter()
            .any(|call| matches!(call, GpuCall::Uniform { .. })));
    }

    #[test]
    fn compile_failure_names_the_stage() {
        let gpu = RecordingGpu::new();
        gpu.fail_compile_containing("#error");
        let ctx = GpuContext::new(gpu.clone());

        let err = ShaderProgram::from_sources(
            &ctx,
            "broken",
            &ShaderSources::new(VERTEX, "#error nope"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RenderError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        // The vertex stage that did compile is released.
        assert!(gpu
            .calls()
            .iter()
            .any(|call| matches!(call, GpuCall::DeleteShader(_))));
    }

    #[test]
    fn link_failure_releases_both_stages() {
        let gpu = RecordingGpu::new();
        gpu.fail_links();
        let ctx = GpuContext::new(gpu.clone());

        let err = ShaderProgram::from_sources(&ctx, "unlinked", &ShaderSources::new(VERTEX, FRAGMENT))
            .unwrap_err();

        match err {
            RenderError::ShaderLink { name, log } => {
                assert_eq!(name, "unlinked");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DeleteShader(_))), 2);
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::LinkProgram(_))), 0);
    }

    #[test]
    fn validation_reports_the_driver_log() {
        let gpu = RecordingGpu::new();
        let ctx = GpuContext::new(gpu.clone());
        let shader =
            ShaderProgram::from_sources(&ctx, "lit", &ShaderSources::new(VERTEX, FRAGMENT))
                .unwrap();

        assert!(shader.validate(&ctx).is_ok());

        gpu.fail_validation();
        match shader.validate(&ctx).unwrap_err() {
            RenderError::ShaderValidate { name, log } => {
                assert_eq!(name, "lit");
                assert!(log.contains("sampler"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            gpu.count(|call| *call == GpuCall::ValidateProgram(shader.id())),
            2
        );
    }

    #[test]
    fn invalid_utf8_source_is_rejected() {
        let err = ShaderSources::from_bytes("sky", b"ok", &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderSourceEncoding {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn missing_source_file_reports_the_path() {
        let err = ShaderSources::from_files(Path::new("does-not-exist"), "standard").unwrap_err();
        match err {
            RenderError::ShaderSourceIo { path, .. } => {
                assert!(path.ends_with("standard/vertex.glsl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
