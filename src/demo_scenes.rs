use std::rc::Rc;

use glam::{Quat, Vec3};
use log::{info, warn};
use gl_cube::renderer::{
    cube_mesh, sphere_mesh, Cubemap, GpuContext, Light, Material, Mesh, Model, ShaderProgram,
    Texture,
};
use gl_cube::scene::{Camera, Entity, Scene};
use gl_cube::{Application, Environment, RenderError, RenderSettings};

const SKYBOX_DIR: &str = "assets/skybox";
const SKYBOX_EXTENSION: &str = "jpg";
const STANDARD_SHADER: &str = "standard";

#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    /// A checkered cube surrounded by spinning colored cubes.
    Simple,
    /// 5x5 spheres sweeping metallic along X and roughness along Y.
    PbrTest,
}

pub struct Demo {
    scene: DemoScene,
    time: f64,
    spinning: Vec<usize>,
    textures: Vec<Texture>,
    shader: Option<Rc<ShaderProgram>>,
}

impl Demo {
    pub fn new(scene: DemoScene) -> Self {
        Self {
            scene,
            time: 0.0,
            spinning: Vec::new(),
            textures: Vec::new(),
            shader: None,
        }
    }
}

fn load_environment(ctx: &GpuContext) -> Result<Environment, RenderError> {
    let cubemap = match Cubemap::from_directory(ctx, SKYBOX_DIR, SKYBOX_EXTENSION) {
        Ok(cubemap) => cubemap,
        Err(err) => {
            warn!("{err}. Using a flat sky instead.");
            Cubemap::solid(ctx, [40, 60, 90, 255])?
        }
    };
    Ok(Environment::new(cubemap).with_ambient(Vec3::new(0.6, 0.7, 1.0), 0.05))
}

fn add_default_lights(scene: &mut Scene) -> Result<(), RenderError> {
    scene.add_light(Light::directional(
        Vec3::new(-0.4, -1.0, -0.3),
        Vec3::new(1.0, 0.96, 0.9),
        3.0,
    ))?;
    scene.add_light(Light::point(
        Vec3::new(3.0, 3.0, 3.0),
        Vec3::new(1.0, 0.6, 0.3),
        25.0,
    ))?;
    scene.add_light(Light::spot(
        Vec3::new(-4.0, 5.0, 2.0),
        Vec3::new(0.8, -1.0, -0.4),
        Vec3::new(0.3, 0.5, 1.0),
        40.0,
    ))
}

impl Demo {
    fn setup_simple_scene(
        &mut self,
        ctx: &GpuContext,
        shader: &Rc<ShaderProgram>,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        info!("Creating simple scene...");

        let (verts, idx) = cube_mesh();
        let checker = Texture::checkerboard(ctx, 256, 32, [255, 255, 255, 255], [0, 0, 0, 255])?;
        self.textures.push(checker);

        let center = Mesh::new(
            ctx,
            &verts,
            &idx,
            Rc::clone(shader),
            Rc::new(Material::white().with_base_color_texture(checker.id())),
        )?;
        scene.add_entity(Entity::new(Rc::new(Model::new(vec![center]))));

        let colors = [Material::red(), Material::green(), Material::blue()];
        for (i, material) in colors.into_iter().enumerate() {
            let mesh = Mesh::new(ctx, &verts, &idx, Rc::clone(shader), Rc::new(material))?;
            let angle = i as f32 * std::f32::consts::TAU / 3.0;
            let index = scene.add_entity(Entity::from_trs(
                Rc::new(Model::new(vec![mesh])),
                Vec3::new(angle.cos() * 3.0, 0.0, angle.sin() * 3.0),
                Quat::IDENTITY,
                0.5,
            ));
            self.spinning.push(index);
        }

        Ok(())
    }

    fn setup_pbr_test_scene(
        &mut self,
        ctx: &GpuContext,
        shader: &Rc<ShaderProgram>,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        info!("Creating PBR test scene...");

        let (verts, idx) = sphere_mesh(32, 16);
        let grid = 5;
        let spacing = 1.2;
        let offset = (grid - 1) as f32 * spacing * 0.5;

        for row in 0..grid {
            for col in 0..grid {
                let metallic = col as f32 / (grid - 1) as f32;
                let roughness = (row as f32 / (grid - 1) as f32).max(0.05);
                let material = Material::rgb(200, 60, 40)
                    .with_metallic(metallic)
                    .with_roughness(roughness);
                let mesh = Mesh::new(ctx, &verts, &idx, Rc::clone(shader), Rc::new(material))?;

                scene.add_entity(Entity::from_trs(
                    Rc::new(Model::new(vec![mesh])),
                    Vec3::new(col as f32 * spacing - offset, row as f32 * spacing - offset, 0.0),
                    Quat::IDENTITY,
                    0.5,
                ));
            }
        }

        Ok(())
    }
}

impl Application for Demo {
    fn name(&self) -> &str {
        match self.scene {
            DemoScene::Simple => "gl-cube: simple",
            DemoScene::PbrTest => "gl-cube: pbr",
        }
    }

    fn initial_camera(&self) -> Camera {
        match self.scene {
            DemoScene::Simple => Camera::new(Vec3::new(0.0, 3.0, 8.0)),
            DemoScene::PbrTest => Camera::new(Vec3::new(0.0, 0.0, 9.0)),
        }
    }

    fn setup(&mut self, ctx: &GpuContext, settings: &RenderSettings) -> Result<Scene, RenderError> {
        let shader = Rc::new(ShaderProgram::load_by_name(
            ctx,
            &settings.shader_root,
            STANDARD_SHADER,
        )?);
        if shader.validate(ctx).is_err() {
            warn!("Continuing with unvalidated shader `{}`", shader.name());
        }

        let mut scene = Scene::new(load_environment(ctx)?);
        add_default_lights(&mut scene)?;

        match self.scene {
            DemoScene::Simple => self.setup_simple_scene(ctx, &shader, &mut scene)?,
            DemoScene::PbrTest => self.setup_pbr_test_scene(ctx, &shader, &mut scene)?,
        }

        self.shader = Some(shader);
        Ok(scene)
    }

    fn update(&mut self, scene: &mut Scene, _camera: &mut Camera, dt: f64) {
        self.time += dt;
        let t = self.time as f32;

        for &index in &self.spinning {
            if let Some(entity) = scene.entity_mut(index) {
                entity.rotation = Quat::from_rotation_y(t) * Quat::from_rotation_x(t * 0.5);
            }
        }
    }

    fn shutdown(&mut self, ctx: &GpuContext, scene: Scene) {
        scene.destroy(ctx);

        for texture in self.textures.drain(..) {
            texture.destroy(ctx);
        }
        if let Some(shader) = self.shader.take().and_then(|shader| Rc::try_unwrap(shader).ok()) {
            shader.destroy(ctx);
        }
    }
}
