//! GPU-less collaborators: a [`Gpu`] that records every call and a
//! [`Window`] with a scripted clock. They drive the render pass in tests and
//! in tools that only need the call stream.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::gpu::{
    BufferId, Capability, ClearFlags, CubemapFaces, DepthFunc, Geometry, Gpu, Pixels,
    PolygonMode, ProgramId, ShaderId, ShaderStage, TextureId, TextureTarget, UniformLocation,
    VertexArrayId, VertexAttribute, VertexLayout,
};
use crate::window::Window;

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    I32(i32),
    F32(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    BindDefaultFramebuffer,
    ClearColor([f32; 4]),
    Clear(ClearFlags),
    Enable(Capability),
    DepthFunc(DepthFunc),
    PolygonMode(PolygonMode),
    CompileShader(ShaderStage, ShaderId),
    LinkProgram(ProgramId),
    ValidateProgram(ProgramId),
    DetachShader(ProgramId, ShaderId),
    DeleteShader(ShaderId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    UniformLocation {
        program: ProgramId,
        name: String,
    },
    Uniform {
        location: UniformLocation,
        value: UniformValue,
    },
    CreateGeometry(VertexArrayId),
    DeleteGeometry(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    Draw(DrawCall),
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    BindTexture {
        unit: u32,
        target: TextureTarget,
        texture: Option<TextureId>,
    },
}

/// A draw with the vertex array and program bound when it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex_array: Option<VertexArrayId>,
    pub program: Option<ProgramId>,
    pub index_count: u32,
}

#[derive(Default)]
struct Recording {
    calls: Vec<GpuCall>,
    next_id: u32,
    bound_vertex_array: Option<VertexArrayId>,
    bound_program: Option<ProgramId>,
    locations: HashMap<(ProgramId, String), UniformLocation>,
    hidden_uniforms: HashSet<String>,
    compile_failure_marker: Option<String>,
    fail_links: bool,
    fail_validation: bool,
    fail_geometry: bool,
}

impl Recording {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Records calls instead of talking to a driver. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingGpu {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the driver report `name` as absent from every program.
    pub fn hide_uniform(&self, name: &str) {
        self.inner.borrow_mut().hidden_uniforms.insert(name.to_owned());
    }

    /// Fails compilation of any source containing `marker`.
    pub fn fail_compile_containing(&self, marker: &str) {
        self.inner.borrow_mut().compile_failure_marker = Some(marker.to_owned());
    }

    pub fn fail_links(&self) {
        self.inner.borrow_mut().fail_links = true;
    }

    pub fn fail_validation(&self) {
        self.inner.borrow_mut().fail_validation = true;
    }

    /// Makes every vertex array upload fail.
    pub fn fail_geometry(&self) {
        self.inner.borrow_mut().fail_geometry = true;
    }

    pub fn calls(&self) -> Vec<GpuCall> {
        self.inner.borrow().calls.clone()
    }

    /// Drains the log, keeping bound state and uniform locations.
    pub fn take_calls(&self) -> Vec<GpuCall> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    pub fn count(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.inner.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::Draw(draw) => Some(*draw),
                _ => None,
            })
            .collect()
    }

    /// Driver lookups issued for `name`, across programs.
    pub fn uniform_lookups(&self, name: &str) -> usize {
        self.count(|call| matches!(call, GpuCall::UniformLocation { name: n, .. } if n == name))
    }

    /// The last polygon mode that was set.
    pub fn polygon_mode(&self) -> Option<PolygonMode> {
        self.inner.borrow().calls.iter().rev().find_map(|call| match call {
            GpuCall::PolygonMode(mode) => Some(*mode),
            _ => None,
        })
    }

    /// The last value uploaded to `name` on `program`.
    pub fn last_uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let inner = self.inner.borrow();
        let location = *inner.locations.get(&(program, name.to_owned()))?;
        inner.calls.iter().rev().find_map(|call| match call {
            GpuCall::Uniform { location: l, value } if *l == location => Some(value.clone()),
            _ => None,
        })
    }

    fn record(&self, call: GpuCall) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn upload(&self, location: UniformLocation, value: UniformValue) {
        self.record(GpuCall::Uniform { location, value });
    }
}

impl Gpu for RecordingGpu {
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GpuCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn bind_default_framebuffer(&self) {
        self.record(GpuCall::BindDefaultFramebuffer);
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(GpuCall::ClearColor(color));
    }

    fn clear(&self, flags: ClearFlags) {
        self.record(GpuCall::Clear(flags));
    }

    fn enable(&self, capability: Capability) {
        self.record(GpuCall::Enable(capability));
    }

    fn depth_func(&self, func: DepthFunc) {
        self.record(GpuCall::DepthFunc(func));
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        self.record(GpuCall::PolygonMode(mode));
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let mut inner = self.inner.borrow_mut();
        if let Some(marker) = &inner.compile_failure_marker {
            if source.contains(marker.as_str()) {
                return Err(format!("0:1: error: found `{marker}`"));
            }
        }
        let id = ShaderId(inner.next_id());
        inner.calls.push(GpuCall::CompileShader(stage, id));
        Ok(id)
    }

    fn link_program(
        &self,
        _shaders: &[ShaderId],
        _attributes: &[VertexAttribute],
    ) -> Result<ProgramId, String> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_links {
            return Err("link error: unresolved varyings".to_owned());
        }
        let id = ProgramId(inner.next_id());
        inner.calls.push(GpuCall::LinkProgram(id));
        Ok(id)
    }

    fn validate_program(&self, program: ProgramId) -> Result<(), String> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(GpuCall::ValidateProgram(program));
        if inner.fail_validation {
            return Err("validation error: sampler units conflict".to_owned());
        }
        Ok(())
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.record(GpuCall::DetachShader(program, shader));
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.record(GpuCall::DeleteShader(shader));
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(GpuCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut inner = self.inner.borrow_mut();
        inner.bound_program = program;
        inner.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(GpuCall::UniformLocation {
            program,
            name: name.to_owned(),
        });
        if inner.hidden_uniforms.contains(name) {
            return None;
        }
        let key = (program, name.to_owned());
        if let Some(location) = inner.locations.get(&key) {
            return Some(*location);
        }
        let location = UniformLocation(inner.next_id());
        inner.locations.insert(key, location);
        Some(location)
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        self.upload(location, UniformValue::I32(value));
    }

    fn uniform_f32(&self, location: UniformLocation, value: f32) {
        self.upload(location, UniformValue::F32(value));
    }

    fn uniform_vec3(&self, location: UniformLocation, value: [f32; 3]) {
        self.upload(location, UniformValue::Vec3(value));
    }

    fn uniform_vec4(&self, location: UniformLocation, value: [f32; 4]) {
        self.upload(location, UniformValue::Vec4(value));
    }

    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        self.upload(location, UniformValue::Mat4(*value));
    }

    fn create_geometry(
        &self,
        _vertices: &[u8],
        _layout: &VertexLayout,
        indices: &[u16],
    ) -> Result<Geometry, String> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_geometry {
            return Err("out of memory".to_owned());
        }
        let geometry = Geometry {
            vertex_array: VertexArrayId(inner.next_id()),
            vertex_buffer: BufferId(inner.next_id()),
            index_buffer: BufferId(inner.next_id()),
            index_count: indices.len() as u32,
        };
        inner
            .calls
            .push(GpuCall::CreateGeometry(geometry.vertex_array));
        Ok(geometry)
    }

    fn delete_geometry(&self, geometry: &Geometry) {
        self.record(GpuCall::DeleteGeometry(geometry.vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        let mut inner = self.inner.borrow_mut();
        inner.bound_vertex_array = vertex_array;
        inner.calls.push(GpuCall::BindVertexArray(vertex_array));
    }

    fn draw_triangles_u16(&self, index_count: u32) {
        let mut inner = self.inner.borrow_mut();
        let draw = DrawCall {
            vertex_array: inner.bound_vertex_array,
            program: inner.bound_program,
            index_count,
        };
        inner.calls.push(GpuCall::Draw(draw));
    }

    fn create_texture_2d(&self, pixels: Pixels<'_>) -> Result<TextureId, String> {
        if pixels.rgba.len() != pixels.width as usize * pixels.height as usize * 4 {
            return Err("pixel data does not match dimensions".to_owned());
        }
        let mut inner = self.inner.borrow_mut();
        let id = TextureId(inner.next_id());
        inner.calls.push(GpuCall::CreateTexture(id));
        Ok(id)
    }

    fn create_cubemap(&self, faces: &CubemapFaces<'_>) -> Result<TextureId, String> {
        if faces
            .iter()
            .any(|face| face.rgba.len() != face.width as usize * face.height as usize * 4)
        {
            return Err("pixel data does not match dimensions".to_owned());
        }
        let mut inner = self.inner.borrow_mut();
        let id = TextureId(inner.next_id());
        inner.calls.push(GpuCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(GpuCall::DeleteTexture(texture));
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        self.record(GpuCall::BindTexture {
            unit,
            target,
            texture,
        });
    }
}

/// A [`Window`] whose clock only moves when told to.
#[derive(Debug)]
pub struct HeadlessWindow {
    size: Cell<(u32, u32)>,
    elapsed: Cell<f64>,
    swaps: Cell<u32>,
    title: RefCell<String>,
    fail_present: Cell<bool>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            elapsed: Cell::new(0.0),
            swaps: Cell::new(0),
            title: RefCell::new(String::new()),
            fail_present: Cell::new(false),
        }
    }

    pub fn set_elapsed(&self, seconds: f64) {
        self.elapsed.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.elapsed.set(self.elapsed.get() + seconds);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn swap_count(&self) -> u32 {
        self.swaps.get()
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn fail_present(&self, fail: bool) {
        self.fail_present.set(fail);
    }
}

impl Window for HeadlessWindow {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn elapsed(&self) -> f64 {
        self.elapsed.get()
    }

    fn swap_buffers(&self) -> Result<(), RenderError> {
        if self.fail_present.get() {
            return Err(RenderError::Present("surface lost".to_owned()));
        }
        self.swaps.set(self.swaps.get() + 1);
        Ok(())
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_owned();
    }
}
