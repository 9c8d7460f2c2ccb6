// renderer/material.rs (PBR factors, uploaded as uniforms)

use super::gpu::TextureId;

/// Texture unit reserved for the base color map.
pub const BASE_COLOR_TEXTURE_UNIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: [f32; 4],
    pub base_color_texture: Option<TextureId>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub emissive_factor: [f32; 3],
}

impl Material {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            base_color: color,
            base_color_texture: None,
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            emissive_factor: [0.0; 3],
        }
    }

    pub fn pbr() -> Self {
        Self::white().with_metallic(0.0).with_roughness(0.5)
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic_factor = metallic.clamp(0.0, 1.0);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness_factor = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_emissive(mut self, emissive: [f32; 3]) -> Self {
        self.emissive_factor = emissive.map(|c| c.max(0.0));
        self
    }

    pub fn with_base_color_texture(mut self, texture: TextureId) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new([r, g, b, 255].map(|c| c as f32 / 255.0))
    }

    pub fn red() -> Self {
        Self::rgb(255, 0, 0)
    }

    pub fn green() -> Self {
        Self::rgb(0, 255, 0)
    }

    pub fn blue() -> Self {
        Self::rgb(0, 0, 255)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn has_base_color_texture(&self) -> bool {
        self.base_color_texture.is_some()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}
