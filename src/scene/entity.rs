use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use crate::renderer::Model;

/// A placed instance of a model.
#[derive(Clone, Debug)]
pub struct Entity {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub model: Rc<Model>,
}

impl Entity {
    pub fn new(model: Rc<Model>) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            model,
        }
    }

    pub fn from_trs(model: Rc<Model>, translation: Vec3, rotation: Quat, scale: f32) -> Self {
        Self {
            translation,
            rotation,
            scale,
            model,
        }
    }

    /// Translate, then rotate, then scale, starting from identity.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}
