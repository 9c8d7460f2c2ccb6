use std::num::NonZeroU32;

use glow::HasContext;

use super::gpu::{
    BufferId, Capability, ClearFlags, CubemapFaces, DepthFunc, Geometry, Gpu, Pixels,
    PolygonMode, ProgramId, ShaderId, ShaderStage, TextureId, TextureTarget, UniformLocation,
    VertexArrayId, VertexAttribute, VertexLayout,
};

const CUBEMAP_FACE_TARGETS: [u32; 6] = [
    glow::TEXTURE_CUBE_MAP_POSITIVE_X,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

/// [`Gpu`] on top of a desktop OpenGL 3.3 context loaded through `glow`.
pub struct GlowGpu {
    gl: glow::Context,
}

impl GlowGpu {
    pub fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        log::info!(
            "OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        Self { gl }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn non_zero(id: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(id)
}

fn native_shader(id: ShaderId) -> Option<glow::NativeShader> {
    non_zero(id.0).map(glow::NativeShader)
}

fn native_program(id: ProgramId) -> Option<glow::NativeProgram> {
    non_zero(id.0).map(glow::NativeProgram)
}

fn native_vertex_array(id: VertexArrayId) -> Option<glow::NativeVertexArray> {
    non_zero(id.0).map(glow::NativeVertexArray)
}

fn native_buffer(id: BufferId) -> Option<glow::NativeBuffer> {
    non_zero(id.0).map(glow::NativeBuffer)
}

fn native_texture(id: TextureId) -> Option<glow::NativeTexture> {
    non_zero(id.0).map(glow::NativeTexture)
}

fn native_location(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Multisample => glow::MULTISAMPLE,
        Capability::SeamlessCubemap => glow::TEXTURE_CUBE_MAP_SEAMLESS,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

impl GlowGpu {
    unsafe fn upload_rgba(&self, target: u32, pixels: &Pixels<'_>) -> Result<(), String> {
        let expected = pixels.width as usize * pixels.height as usize * 4;
        if pixels.rgba.len() != expected {
            return Err(format!(
                "expected {expected} bytes for a {}x{} RGBA image, got {}",
                pixels.width,
                pixels.height,
                pixels.rgba.len()
            ));
        }
        self.gl.tex_image_2d(
            target,
            0,
            glow::RGBA8 as i32,
            pixels.width as i32,
            pixels.height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(pixels.rgba)),
        );
        Ok(())
    }
}

impl Gpu for GlowGpu {
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn bind_default_framebuffer(&self) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) }
    }

    fn clear_color(&self, color: [f32; 4]) {
        unsafe { self.gl.clear_color(color[0], color[1], color[2], color[3]) }
    }

    fn clear(&self, flags: ClearFlags) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) }
    }

    fn enable(&self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) }
    }

    fn depth_func(&self, func: DepthFunc) {
        let func = match func {
            DepthFunc::LessEqual => glow::LEQUAL,
        };
        unsafe { self.gl.depth_func(func) }
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(ShaderId(shader.0.get()))
        }
    }

    fn link_program(
        &self,
        shaders: &[ShaderId],
        attributes: &[VertexAttribute],
    ) -> Result<ProgramId, String> {
        unsafe {
            let program = self.gl.create_program()?;
            for shader in shaders.iter().copied().filter_map(native_shader) {
                self.gl.attach_shader(program, shader);
            }
            for attribute in attributes {
                self.gl
                    .bind_attrib_location(program, attribute.location, attribute.name);
            }
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(ProgramId(program.0.get()))
        }
    }

    fn validate_program(&self, program: ProgramId) -> Result<(), String> {
        let Some(program) = native_program(program) else {
            return Err("program 0 is not a linked program".to_owned());
        };
        unsafe {
            self.gl.validate_program(program);
            if self.gl.get_program_validate_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        if let (Some(program), Some(shader)) = (native_program(program), native_shader(shader)) {
            unsafe { self.gl.detach_shader(program, shader) }
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        if let Some(shader) = native_shader(shader) {
            unsafe { self.gl.delete_shader(shader) }
        }
    }

    fn delete_program(&self, program: ProgramId) {
        if let Some(program) = native_program(program) {
            unsafe { self.gl.delete_program(program) }
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.and_then(native_program)) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = native_program(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }
            .map(|location| UniformLocation(location.0))
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&native_location(location)), value) }
    }

    fn uniform_f32(&self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&native_location(location)), value) }
    }

    fn uniform_vec3(&self, location: UniformLocation, value: [f32; 3]) {
        unsafe {
            self.gl
                .uniform_3_f32(Some(&native_location(location)), value[0], value[1], value[2])
        }
    }

    fn uniform_vec4(&self, location: UniformLocation, value: [f32; 4]) {
        unsafe {
            self.gl.uniform_4_f32(
                Some(&native_location(location)),
                value[0],
                value[1],
                value[2],
                value[3],
            )
        }
    }

    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&native_location(location)), false, value)
        }
    }

    fn create_geometry(
        &self,
        vertices: &[u8],
        layout: &VertexLayout,
        indices: &[u16],
    ) -> Result<Geometry, String> {
        unsafe {
            let vertex_array = self.gl.create_vertex_array()?;
            self.gl.bind_vertex_array(Some(vertex_array));

            let vertex_buffer = self.gl.create_buffer()?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STATIC_DRAW);

            let index_buffer = self.gl.create_buffer()?;
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );

            for attribute in layout.attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }

            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(Geometry {
                vertex_array: VertexArrayId(vertex_array.0.get()),
                vertex_buffer: BufferId(vertex_buffer.0.get()),
                index_buffer: BufferId(index_buffer.0.get()),
                index_count: indices.len() as u32,
            })
        }
    }

    fn delete_geometry(&self, geometry: &Geometry) {
        unsafe {
            if let Some(vertex_array) = native_vertex_array(geometry.vertex_array) {
                self.gl.delete_vertex_array(vertex_array);
            }
            for buffer in [geometry.vertex_buffer, geometry.index_buffer] {
                if let Some(buffer) = native_buffer(buffer) {
                    self.gl.delete_buffer(buffer);
                }
            }
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.and_then(native_vertex_array))
        }
    }

    fn draw_triangles_u16(&self, index_count: u32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_SHORT, 0)
        }
    }

    fn create_texture_2d(&self, pixels: Pixels<'_>) -> Result<TextureId, String> {
        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            if let Err(err) = self.upload_rgba(glow::TEXTURE_2D, &pixels) {
                self.gl.delete_texture(texture);
                return Err(err);
            }
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureId(texture.0.get()))
        }
    }

    fn create_cubemap(&self, faces: &CubemapFaces<'_>) -> Result<TextureId, String> {
        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            for (target, face) in CUBEMAP_FACE_TARGETS.iter().zip(faces.iter()) {
                if let Err(err) = self.upload_rgba(*target, face) {
                    self.gl.delete_texture(texture);
                    return Err(err);
                }
            }
            let target = glow::TEXTURE_CUBE_MAP;
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            for wrap in [glow::TEXTURE_WRAP_S, glow::TEXTURE_WRAP_T, glow::TEXTURE_WRAP_R] {
                self.gl
                    .tex_parameter_i32(target, wrap, glow::CLAMP_TO_EDGE as i32);
            }
            self.gl.bind_texture(target, None);
            Ok(TextureId(texture.0.get()))
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        if let Some(texture) = native_texture(texture) {
            unsafe { self.gl.delete_texture(texture) }
        }
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(texture_target(target), texture.and_then(native_texture));
        }
    }
}
