use std::path::PathBuf;

use crate::renderer::gpu::ShaderStage;

/// Failures surfaced by the renderer and its collaborators.
///
/// Variants name the cause so callers can decide between aborting, retrying
/// with other settings, or carrying on with a degraded frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    #[error("overlay creation failed: {0}")]
    Overlay(String),

    #[error("failed to read shader source {path:?}")]
    ShaderSourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} source of shader `{name}` is not valid UTF-8")]
    ShaderSourceEncoding { name: String, stage: ShaderStage },

    #[error("unable to compile {stage} stage of shader `{name}`:\n{log}")]
    ShaderCompile {
        name: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("unable to link shader program `{name}`:\n{log}")]
    ShaderLink { name: String, log: String },

    #[error("shader program `{name}` failed validation:\n{log}")]
    ShaderValidate { name: String, log: String },

    #[error("scene already holds the maximum of {max} lights")]
    TooManyLights { max: usize },

    #[error("skybox unavailable: {reason}")]
    SkyboxUnavailable { reason: String },

    #[error("window or context creation failed: {0}")]
    Window(String),

    #[error("failed to present frame: {0}")]
    Present(String),

    #[error("failed to load image {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl RenderError {
    pub(crate) fn resource(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            resource,
            reason: reason.into(),
        }
    }
}
