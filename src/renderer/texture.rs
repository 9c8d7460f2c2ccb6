// renderer/texture.rs (2D textures and environment cubemaps)

use std::path::{Path, PathBuf};

use crate::error::RenderError;

use super::context::GpuContext;
use super::gpu::{CubemapFaces, Pixels, TextureId, TextureTarget};

/// Texture unit the environment cubemap is bound to.
pub const ENVIRONMENT_TEXTURE_UNIT: u32 = 0;

/// Face order expected by [`Cubemap::from_faces`]: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBEMAP_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

fn load_rgba(path: &Path) -> Result<image::RgbaImage, RenderError> {
    log::info!("Loading texture: {:?}", path);
    let img = image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn from_path(ctx: &GpuContext, path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let rgba = load_rgba(path.as_ref())?;
        let (width, height) = rgba.dimensions();
        Self::from_bytes(ctx, &rgba, width, height)
    }

    /// Create texture from rgba8 data.
    pub fn from_bytes(
        ctx: &GpuContext,
        bytes: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let id = ctx
            .gpu()
            .create_texture_2d(Pixels {
                width,
                height,
                rgba: bytes,
            })
            .map_err(|reason| RenderError::resource("texture", reason))?;
        Ok(Self { id, width, height })
    }

    pub fn from_color(ctx: &GpuContext, color: [u8; 4]) -> Result<Self, RenderError> {
        Self::from_bytes(ctx, &color, 1, 1)
    }

    /// Create a procedural checkerboard texture
    pub fn checkerboard(
        ctx: &GpuContext,
        size: u32,
        checker_size: u32,
        color1: [u8; 4],
        color2: [u8; 4],
    ) -> Result<Self, RenderError> {
        let pixels = checkerboard_pixels(size, checker_size, color1, color2);
        Self::from_bytes(ctx, &pixels, size, size)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn destroy(self, ctx: &GpuContext) {
        ctx.gpu().delete_texture(self.id);
    }
}

fn checkerboard_pixels(size: u32, checker_size: u32, color1: [u8; 4], color2: [u8; 4]) -> Vec<u8> {
    let checker_size = checker_size.max(1);
    let mut pixels = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let checker_x = (x / checker_size) % 2;
            let checker_y = (y / checker_size) % 2;
            let color = if (checker_x + checker_y) % 2 == 0 {
                color1
            } else {
                color2
            };
            let idx = ((y * size + x) * 4) as usize;
            pixels[idx..idx + 4].copy_from_slice(&color);
        }
    }

    pixels
}

/// Six-faced environment texture sampled by the skybox and the lit shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cubemap {
    id: TextureId,
    unit: u32,
}

impl Cubemap {
    pub fn from_pixels(ctx: &GpuContext, faces: &CubemapFaces<'_>) -> Result<Self, RenderError> {
        let id = ctx
            .gpu()
            .create_cubemap(faces)
            .map_err(|reason| RenderError::resource("cubemap", reason))?;
        Ok(Self {
            id,
            unit: ENVIRONMENT_TEXTURE_UNIT,
        })
    }

    /// Loads `<dir>/<face>.<extension>` for every name in
    /// [`CUBEMAP_FACE_NAMES`]. All faces must share one square size.
    pub fn from_directory(
        ctx: &GpuContext,
        dir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        let paths = CUBEMAP_FACE_NAMES.map(|face| dir.join(format!("{face}.{extension}")));
        Self::from_faces(ctx, &paths)
    }

    pub fn from_faces(ctx: &GpuContext, paths: &[PathBuf; 6]) -> Result<Self, RenderError> {
        let mut images = Vec::with_capacity(6);
        for path in paths {
            images.push(load_rgba(path)?);
        }

        let (width, height) = images[0].dimensions();
        if width != height || images.iter().any(|img| img.dimensions() != (width, height)) {
            return Err(RenderError::resource(
                "cubemap",
                format!("faces in {:?} must be square and equally sized", paths[0].parent()),
            ));
        }

        let faces: CubemapFaces<'_> = std::array::from_fn(|i| Pixels {
            width,
            height,
            rgba: images[i].as_raw(),
        });
        Self::from_pixels(ctx, &faces)
    }

    /// A 1x1 cubemap of one color, for scenes without an environment map.
    pub fn solid(ctx: &GpuContext, color: [u8; 4]) -> Result<Self, RenderError> {
        let face = Pixels {
            width: 1,
            height: 1,
            rgba: &color,
        };
        Self::from_pixels(ctx, &[face; 6])
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn bind(&self, ctx: &GpuContext) {
        ctx.gpu()
            .bind_texture(self.unit, TextureTarget::CubeMap, Some(self.id));
    }

    pub fn destroy(self, ctx: &GpuContext) {
        ctx.gpu().delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCall, RecordingGpu};

    #[test]
    fn checkerboard_alternates_cells() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        let pixels = checkerboard_pixels(4, 2, black, white);

        let at = |x: usize, y: usize| &pixels[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(at(0, 0), black);
        assert_eq!(at(1, 1), black);
        assert_eq!(at(2, 0), white);
        assert_eq!(at(0, 2), white);
        assert_eq!(at(3, 3), black);
    }

    #[test]
    fn solid_cubemap_binds_to_the_environment_unit() {
        let gpu = RecordingGpu::new();
        let ctx = GpuContext::new(gpu.clone());

        let cubemap = Cubemap::solid(&ctx, [10, 20, 30, 255]).unwrap();
        cubemap.bind(&ctx);

        assert!(gpu.calls().contains(&GpuCall::BindTexture {
            unit: ENVIRONMENT_TEXTURE_UNIT,
            target: TextureTarget::CubeMap,
            texture: Some(cubemap.id()),
        }));
    }

    #[test]
    fn mismatched_pixel_data_is_a_resource_error() {
        let ctx = GpuContext::new(RecordingGpu::new());
        let err = Texture::from_bytes(&ctx, &[0, 0, 0], 1, 1).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceCreation {
                resource: "texture",
                ..
            }
        ));
    }

    #[test]
    fn missing_face_reports_its_path() {
        let ctx = GpuContext::new(RecordingGpu::new());
        let err = Cubemap::from_directory(&ctx, "no-such-skybox", "png").unwrap_err();
        match err {
            RenderError::Image { path, .. } => assert!(path.ends_with("right.png")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
