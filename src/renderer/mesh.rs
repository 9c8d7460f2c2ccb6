// renderer/mesh.rs
use std::rc::Rc;

use crate::error::RenderError;

use super::context::GpuContext;
use super::gpu::Geometry;
use super::material::Material;
use super::shader::ShaderProgram;
use super::vertex::Vertex;

/// Largest vertex count addressable by the 16-bit index buffers meshes use.
pub const MAX_MESH_VERTICES: usize = u16::MAX as usize + 1;

/// Uploaded geometry drawn with a shared shader and material.
///
/// The mesh owns its buffers but only references its shader and material;
/// the same program is usually shared by many meshes.
#[derive(Debug)]
pub struct Mesh {
    geometry: Geometry,
    shader: Rc<ShaderProgram>,
    material: Rc<Material>,
}

impl Mesh {
    pub fn new(
        ctx: &GpuContext,
        vertices: &[Vertex],
        indices: &[u16],
        shader: Rc<ShaderProgram>,
        material: Rc<Material>,
    ) -> Result<Self, RenderError> {
        if vertices.len() > MAX_MESH_VERTICES {
            return Err(RenderError::resource(
                "mesh",
                format!(
                    "{} vertices exceed the {MAX_MESH_VERTICES} reachable with 16-bit indices",
                    vertices.len()
                ),
            ));
        }

        let geometry = ctx
            .gpu()
            .create_geometry(bytemuck::cast_slice(vertices), &Vertex::LAYOUT, indices)
            .map_err(|reason| RenderError::resource("mesh", reason))?;

        log::debug!(
            "Uploaded mesh: {} vertices, {} indices, shader `{}`",
            vertices.len(),
            indices.len(),
            shader.name()
        );

        Ok(Self {
            geometry,
            shader,
            material,
        })
    }

    /// Binds the vertex state and the shader for the following draw calls.
    pub fn activate(&self, ctx: &GpuContext) {
        ctx.gpu()
            .bind_vertex_array(Some(self.geometry.vertex_array));
        self.shader.activate(ctx);
    }

    pub fn deactivate(ctx: &GpuContext) {
        ctx.gpu().bind_vertex_array(None);
    }

    pub fn index_count(&self) -> u32 {
        self.geometry.index_count
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn destroy(self, ctx: &GpuContext) {
        ctx.gpu().delete_geometry(&self.geometry);
    }
}

/// Meshes drawn together, in order, for every entity referencing the model.
#[derive(Debug, Default)]
pub struct Model {
    meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self { meshes }
    }

    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn destroy(self, ctx: &GpuContext) {
        for mesh in self.meshes {
            mesh.destroy(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCall, RecordingGpu};
    use crate::renderer::primitives::cube_mesh;
    use crate::renderer::shader::ShaderSources;

    fn shader(ctx: &GpuContext) -> Rc<ShaderProgram> {
        let sources = ShaderSources::new("void main() {}", "void main() {}");
        Rc::new(ShaderProgram::from_sources(ctx, "flat", &sources).unwrap())
    }

    #[test]
    fn activation_binds_vertex_array_then_program() {
        let gpu = RecordingGpu::new();
        let ctx = GpuContext::new(gpu.clone());
        let (vertices, indices) = cube_mesh();
        let shader = shader(&ctx);
        let mesh = Mesh::new(&ctx, &vertices, &indices, Rc::clone(&shader), Rc::new(Material::red()))
            .unwrap();
        gpu.take_calls();

        mesh.activate(&ctx);

        assert_eq!(
            gpu.calls(),
            vec![
                GpuCall::BindVertexArray(Some(mesh.geometry().vertex_array)),
                GpuCall::UseProgram(Some(shader.id())),
            ]
        );
        assert_eq!(mesh.index_count(), indices.len() as u32);
    }

    #[test]
    fn oversized_meshes_are_rejected() {
        let ctx = GpuContext::new(RecordingGpu::new());
        let vertices = vec![<Vertex as bytemuck::Zeroable>::zeroed(); MAX_MESH_VERTICES + 1];

        let err = Mesh::new(&ctx, &vertices, &[0, 1, 2], shader(&ctx), Rc::new(Material::white()))
            .unwrap_err();

        assert!(matches!(err, RenderError::ResourceCreation { resource: "mesh", .. }));
    }
}
