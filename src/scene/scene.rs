// scene/scene.rs
use crate::environment::Environment;
use crate::error::RenderError;
use crate::renderer::{GpuContext, Light, MAX_LIGHTS};
use std::rc::Rc;

use super::entity::Entity;

/// Entities in draw order, the lights shining on them and their
/// environment.
pub struct Scene {
    entities: Vec<Entity>,
    lights: Vec<Light>,
    environment: Environment,
}

impl Scene {
    pub fn new(environment: Environment) -> Self {
        Self {
            entities: Vec::new(),
            lights: Vec::new(),
            environment,
        }
    }

    /// Appends an entity; it is drawn after every entity added before it.
    /// Returns its index.
    pub fn add_entity(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn add_light(&mut self, light: Light) -> Result<(), RenderError> {
        if self.lights.len() >= MAX_LIGHTS {
            return Err(RenderError::TooManyLights { max: MAX_LIGHTS });
        }
        self.lights.push(light);
        Ok(())
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    /// Releases the environment and every model no longer referenced
    /// outside the scene.
    pub fn destroy(self, ctx: &GpuContext) {
        for entity in self.entities {
            if let Ok(model) = Rc::try_unwrap(entity.model) {
                model.destroy(ctx);
            }
        }
        self.environment.destroy(ctx);
    }
}
