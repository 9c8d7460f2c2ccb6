// scene/mod.rs

pub mod camera;
pub mod entity;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use entity::Entity;
pub use scene::Scene;
