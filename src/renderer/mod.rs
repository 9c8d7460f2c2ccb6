pub mod context;
pub mod fps;
pub mod glow_backend;
pub mod gpu;
pub mod lights;
pub mod material;
pub mod mesh;
pub mod overlay;
pub mod primitives;
pub mod renderer;
pub mod shader;
pub mod skybox;
pub mod texture;
mod uniforms;
pub mod vertex;

pub use context::GpuContext;
pub use fps::{FpsHistory, FpsTracker, RingBuffer};
pub use glow_backend::GlowGpu;
pub use gpu::Gpu;
pub use lights::{Light, LightKind, MAX_LIGHTS};
pub use material::Material;
pub use mesh::{Mesh, Model};
pub use overlay::{Overlay, OverlayInit, StatsOverlay};
pub use primitives::{cube_mesh, sphere_mesh};
pub use renderer::{Renderer, RendererId};
pub use shader::{ShaderProgram, ShaderSources};
pub use skybox::skybox_view_matrix;
pub use texture::{Cubemap, Texture};
pub use vertex::Vertex;
