use glam::Vec3;

use crate::renderer::{Cubemap, GpuContext};

/// Global lighting surroundings of a scene: the cubemap drawn as the skybox
/// and sampled for reflections, plus a flat ambient term.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    cubemap: Cubemap,
    ambient_color: Vec3,
    ambient_intensity: f32,
}

impl Environment {
    pub fn new(cubemap: Cubemap) -> Self {
        Self {
            cubemap,
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.03,
        }
    }

    pub fn with_ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity.max(0.0);
        self
    }

    pub fn cubemap(&self) -> &Cubemap {
        &self.cubemap
    }

    /// Ambient color premultiplied by its intensity.
    pub fn ambient(&self) -> Vec3 {
        self.ambient_color * self.ambient_intensity
    }

    /// Binds the cubemap to its texture unit for the rest of the frame.
    pub fn activate(&self, ctx: &GpuContext) {
        self.cubemap.bind(ctx);
    }

    pub fn destroy(self, ctx: &GpuContext) {
        self.cubemap.destroy(ctx);
    }
}
