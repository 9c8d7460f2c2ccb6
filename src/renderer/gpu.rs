//! The GPU state layer.
//!
//! Everything the renderer does to the driver goes through [`Gpu`]. The
//! production implementation is [`GlowGpu`](super::glow_backend::GlowGpu);
//! tests drive the same code through
//! [`RecordingGpu`](crate::headless::RecordingGpu).

use std::fmt;

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Multisample,
    SeamlessCubemap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    LessEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// A float vertex attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub name: &'static str,
    pub components: i32,
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: i32,
    pub attributes: &'static [VertexAttribute],
}

/// GPU objects backing an indexed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, Copy)]
pub struct Pixels<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

/// Cubemap faces in +X, -X, +Y, -Y, +Z, -Z order.
pub type CubemapFaces<'a> = [Pixels<'a>; 6];

/// Immediate-mode driver operations used by the renderer.
///
/// Methods take `&self`; implementations are bound to the thread owning the
/// GL context. Creation failures report the driver message as `Err(String)`.
pub trait Gpu {
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn bind_default_framebuffer(&self);
    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, flags: ClearFlags);
    fn enable(&self, capability: Capability);
    fn depth_func(&self, func: DepthFunc);
    fn polygon_mode(&self, mode: PolygonMode);

    /// Compiles one stage. `Err` carries the driver info log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;
    /// Binds the attribute names to their locations, then links. `Err`
    /// carries the driver info log.
    fn link_program(
        &self,
        shaders: &[ShaderId],
        attributes: &[VertexAttribute],
    ) -> Result<ProgramId, String>;
    /// Checks the program can run in the current state. `Err` carries the
    /// driver info log.
    fn validate_program(&self, program: ProgramId) -> Result<(), String>;
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);
    fn delete_shader(&self, shader: ShaderId);
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);

    /// Named lookup in the driver. `None` when the program has no such uniform.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn uniform_i32(&self, location: UniformLocation, value: i32);
    fn uniform_f32(&self, location: UniformLocation, value: f32);
    fn uniform_vec3(&self, location: UniformLocation, value: [f32; 3]);
    fn uniform_vec4(&self, location: UniformLocation, value: [f32; 4]);
    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]);

    fn create_geometry(
        &self,
        vertices: &[u8],
        layout: &VertexLayout,
        indices: &[u16],
    ) -> Result<Geometry, String>;
    fn delete_geometry(&self, geometry: &Geometry);
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);
    /// Indexed triangle list with `u16` indices from the bound vertex array.
    fn draw_triangles_u16(&self, index_count: u32);

    fn create_texture_2d(&self, pixels: Pixels<'_>) -> Result<TextureId, String>;
    fn create_cubemap(&self, faces: &CubemapFaces<'_>) -> Result<TextureId, String>;
    fn delete_texture(&self, texture: TextureId);
    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<TextureId>);
}
