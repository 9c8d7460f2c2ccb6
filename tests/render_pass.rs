//! Frame-level behaviour of the renderer, observed through the recording GPU.

use std::cell::RefCell;
use std::rc::Rc;

use gl_cube::headless::{GpuCall, HeadlessWindow, RecordingGpu, UniformValue};
use gl_cube::renderer::gpu::{PolygonMode, ShaderStage, TextureTarget};
use gl_cube::renderer::{
    cube_mesh, Cubemap, FpsHistory, GpuContext, Light, Material, Mesh, Model, Overlay,
    OverlayInit, Renderer, ShaderProgram, ShaderSources,
};
use gl_cube::scene::{Camera, Entity, Scene};
use gl_cube::window::Window;
use gl_cube::{Environment, RenderError, RenderSettings};
use glam::{Quat, Vec3};

const VERTEX: &str = "void main() { gl_Position = vec4(0.0); }";
const FRAGMENT: &str = "void main() {}";
const SKYBOX_INDEX_COUNT: u32 = 36;

struct Fixture {
    gpu: RecordingGpu,
    ctx: GpuContext,
    window: Rc<HeadlessWindow>,
    shader: Rc<ShaderProgram>,
}

fn fixture() -> Fixture {
    let gpu = RecordingGpu::new();
    let ctx = GpuContext::new(gpu.clone());
    let shader = Rc::new(
        ShaderProgram::from_sources(&ctx, "standard", &ShaderSources::new(VERTEX, FRAGMENT))
            .unwrap(),
    );
    Fixture {
        gpu,
        ctx,
        window: Rc::new(HeadlessWindow::new(800, 600)),
        shader,
    }
}

impl Fixture {
    fn renderer(&self, settings: &RenderSettings) -> Renderer {
        Renderer::new(&*self.window, settings).unwrap()
    }

    fn mesh(&self) -> Mesh {
        let (vertices, indices) = cube_mesh();
        Mesh::new(
            &self.ctx,
            &vertices,
            &indices,
            Rc::clone(&self.shader),
            Rc::new(Material::red()),
        )
        .unwrap()
    }

    fn scene(&self) -> Scene {
        let cubemap = Cubemap::solid(&self.ctx, [0, 0, 0, 255]).unwrap();
        Scene::new(Environment::new(cubemap))
    }
}

fn camera() -> Camera {
    Camera::new(Vec3::new(0.0, 2.0, 6.0))
}

fn viewport_calls(gpu: &RecordingGpu) -> usize {
    gpu.count(|call| matches!(call, GpuCall::Viewport { .. }))
}

/// Remembers how many draws had been issued, and how many frames presented,
/// each time the overlay ran.
struct SpyOverlay {
    gpu: RecordingGpu,
    window: Rc<HeadlessWindow>,
    seen: Rc<RefCell<Vec<(usize, u32)>>>,
}

impl Overlay for SpyOverlay {
    fn render(&mut self, _ctx: &GpuContext, _window: &dyn Window, _fps: &FpsHistory) {
        self.seen
            .borrow_mut()
            .push((self.gpu.draws().len(), self.window.swap_count()));
    }
}

fn observed_renderer(f: &Fixture) -> (Renderer, Rc<RefCell<Vec<(usize, u32)>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let spy = SpyOverlay {
        gpu: f.gpu.clone(),
        window: Rc::clone(&f.window),
        seen: Rc::clone(&seen),
    };
    let renderer = Renderer::with_overlay(
        &*f.window,
        &RenderSettings::default(),
        move |_: &OverlayInit<'_>| Ok(Box::new(spy) as Box<dyn Overlay>),
    )
    .unwrap();
    (renderer, seen)
}

#[test]
fn activating_the_current_renderer_again_is_a_no_op() {
    let f = fixture();
    let renderer = f.renderer(&RenderSettings::default());

    renderer.activate(&f.ctx);
    renderer.activate(&f.ctx);

    assert_eq!(viewport_calls(&f.gpu), 1);
    assert_eq!(f.ctx.current_renderer(), Some(renderer.id()));
}

#[test]
fn deactivation_touches_no_state_and_forces_the_next_activation() {
    let f = fixture();
    let renderer = f.renderer(&RenderSettings::default());
    renderer.activate(&f.ctx);
    f.gpu.take_calls();

    f.ctx.activate(None);
    assert!(f.gpu.calls().is_empty());
    assert_eq!(f.ctx.current_renderer(), None);

    renderer.activate(&f.ctx);
    assert_eq!(viewport_calls(&f.gpu), 1);
}

#[test]
fn switching_between_renderers_reprograms_each_time() {
    let f = fixture();
    let first = f.renderer(&RenderSettings::default());
    let second = f.renderer(&RenderSettings::default());
    assert_ne!(first.id(), second.id());

    first.activate(&f.ctx);
    second.activate(&f.ctx);
    first.activate(&f.ctx);

    assert_eq!(viewport_calls(&f.gpu), 3);
}

#[test]
fn wireframe_toggle_reprograms_even_when_current() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    renderer.activate(&f.ctx);
    assert_eq!(f.gpu.polygon_mode(), Some(PolygonMode::Fill));

    renderer.set_wireframe(&f.ctx, true);
    assert_eq!(viewport_calls(&f.gpu), 2);
    assert_eq!(f.gpu.polygon_mode(), Some(PolygonMode::Line));
    assert!(renderer.wireframe());

    renderer.set_wireframe(&f.ctx, false);
    assert_eq!(viewport_calls(&f.gpu), 3);
    assert_eq!(f.gpu.polygon_mode(), Some(PolygonMode::Fill));
}

#[test]
fn meshes_are_drawn_in_scene_then_model_order() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    let mut scene = f.scene();

    let (a1, a2, b1) = (f.mesh(), f.mesh(), f.mesh());
    let expected = vec![
        a1.geometry().vertex_array,
        a2.geometry().vertex_array,
        b1.geometry().vertex_array,
    ];
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![a1, a2]))));
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![b1]))));

    renderer
        .render(&f.ctx, &*f.window, &camera(), &scene)
        .unwrap();

    let draws = f.gpu.draws();
    assert_eq!(draws.len(), 4);
    let mesh_arrays: Vec<_> = draws[..3].iter().map(|d| d.vertex_array.unwrap()).collect();
    assert_eq!(mesh_arrays, expected);
    assert!(draws[..3]
        .iter()
        .all(|d| d.program == Some(f.shader.id())));

    let skybox = draws[3];
    assert_eq!(skybox.index_count, SKYBOX_INDEX_COUNT);
    assert_ne!(skybox.program, Some(f.shader.id()));
}

#[test]
fn skybox_follows_entities_and_precedes_the_overlay() {
    for entity_count in [0, 3] {
        let f = fixture();
        let (mut renderer, seen) = observed_renderer(&f);
        let mut scene = f.scene();
        for _ in 0..entity_count {
            scene.add_entity(Entity::new(Rc::new(Model::new(vec![f.mesh()]))));
        }

        renderer
            .render(&f.ctx, &*f.window, &camera(), &scene)
            .unwrap();

        let draws = f.gpu.draws();
        assert_eq!(draws.len(), entity_count + 1);
        assert_eq!(draws.last().unwrap().index_count, SKYBOX_INDEX_COUNT);
        // The overlay saw every draw, skybox included, before the swap.
        assert_eq!(*seen.borrow(), vec![(entity_count + 1, 0)]);
        assert_eq!(f.window.swap_count(), 1);
    }
}

#[test]
fn frame_binds_environment_and_clears_before_drawing() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    let mut scene = f.scene();
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![f.mesh()]))));
    f.gpu.take_calls();

    renderer
        .render(&f.ctx, &*f.window, &camera(), &scene)
        .unwrap();

    let calls = f.gpu.calls();
    let position = |pred: &dyn Fn(&GpuCall) -> bool| calls.iter().position(pred).unwrap();
    let viewport = position(&|c| matches!(c, GpuCall::Viewport { .. }));
    let cubemap = position(&|c| {
        matches!(
            c,
            GpuCall::BindTexture {
                target: TextureTarget::CubeMap,
                ..
            }
        )
    });
    let clear = position(&|c| matches!(c, GpuCall::Clear(_)));
    let draw = position(&|c| matches!(c, GpuCall::Draw(_)));

    assert!(viewport < cubemap && cubemap < clear && clear < draw);
}

#[test]
fn mesh_uniforms_carry_transforms_and_exposure() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    renderer.set_exposure(2.5);
    let mut scene = f.scene();
    let entity = Entity::from_trs(
        Rc::new(Model::new(vec![f.mesh()])),
        Vec3::new(1.0, 2.0, 3.0),
        Quat::from_rotation_z(0.5),
        2.0,
    );
    let model_matrix = entity.model_matrix().to_cols_array();
    scene.add_entity(entity);
    scene
        .add_light(Light::point(Vec3::ONE, Vec3::ONE, 4.0))
        .unwrap();

    let camera = camera();
    renderer
        .render(&f.ctx, &*f.window, &camera, &scene)
        .unwrap();

    let program = f.shader.id();
    assert_eq!(
        f.gpu.last_uniform(program, "u_ViewProjectionMatrix"),
        Some(UniformValue::Mat4(
            renderer.view_projection(&camera).to_cols_array()
        ))
    );
    assert_eq!(
        f.gpu.last_uniform(program, "u_ModelMatrix"),
        Some(UniformValue::Mat4(model_matrix))
    );
    assert_eq!(
        f.gpu.last_uniform(program, "u_NormalMatrix"),
        Some(UniformValue::Mat4(model_matrix))
    );
    assert_eq!(
        f.gpu.last_uniform(program, "u_Exposure"),
        Some(UniformValue::F32(2.5))
    );
    assert_eq!(
        f.gpu.last_uniform(program, "u_LightsCount"),
        Some(UniformValue::I32(1))
    );
    assert_eq!(
        f.gpu.last_uniform(program, "u_Camera.position"),
        Some(UniformValue::Vec3(camera.translation.to_array()))
    );
}

#[test]
fn uniform_locations_are_resolved_once_per_shader() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    let other = Rc::new(
        ShaderProgram::from_sources(&f.ctx, "other", &ShaderSources::new(VERTEX, FRAGMENT))
            .unwrap(),
    );
    let (vertices, indices) = cube_mesh();
    let other_mesh = Mesh::new(
        &f.ctx,
        &vertices,
        &indices,
        other,
        Rc::new(Material::blue()),
    )
    .unwrap();

    let mut scene = f.scene();
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![f.mesh(), f.mesh()]))));
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![other_mesh]))));

    for frame in 0..3 {
        f.window.set_elapsed(frame as f64 * 0.25);
        renderer
            .render(&f.ctx, &*f.window, &camera(), &scene)
            .unwrap();
    }

    // One lookup per shader, however many meshes and frames use it.
    assert_eq!(f.gpu.uniform_lookups("u_ModelMatrix"), 2);
    assert_eq!(f.gpu.uniform_lookups("u_Exposure"), 2);
    assert_eq!(f.gpu.uniform_lookups("projection"), 1);
}

#[test]
fn required_skybox_failure_fails_every_frame_without_retrying() {
    let f = fixture();
    f.gpu.fail_compile_containing("samplerCube");
    let mut renderer = f.renderer(&RenderSettings::default());
    let scene = f.scene();

    let compiles = |gpu: &RecordingGpu| {
        gpu.count(|c| matches!(c, GpuCall::CompileShader(ShaderStage::Vertex, _)))
    };
    let before = compiles(&f.gpu);

    let first = renderer.render(&f.ctx, &*f.window, &camera(), &scene);
    assert!(matches!(first, Err(RenderError::SkyboxUnavailable { .. })));
    let after_first = compiles(&f.gpu);
    assert_eq!(after_first, before + 1);

    let second = renderer.render(&f.ctx, &*f.window, &camera(), &scene);
    assert!(matches!(second, Err(RenderError::SkyboxUnavailable { .. })));
    assert_eq!(compiles(&f.gpu), after_first);

    assert_eq!(f.window.swap_count(), 0);
}

#[test]
fn optional_skybox_failure_still_presents_frames() {
    let f = fixture();
    f.gpu.fail_compile_containing("samplerCube");
    let settings = RenderSettings {
        require_skybox: false,
        ..RenderSettings::default()
    };
    let mut renderer = f.renderer(&settings);
    let mut scene = f.scene();
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![f.mesh()]))));

    renderer
        .render(&f.ctx, &*f.window, &camera(), &scene)
        .unwrap();
    renderer
        .render(&f.ctx, &*f.window, &camera(), &scene)
        .unwrap();

    assert_eq!(f.gpu.draws().len(), 2);
    assert!(f
        .gpu
        .draws()
        .iter()
        .all(|d| d.program == Some(f.shader.id())));
    assert_eq!(f.window.swap_count(), 2);
}

#[test]
fn failed_cube_upload_disables_an_optional_skybox_once() {
    let f = fixture();
    let settings = RenderSettings {
        require_skybox: false,
        ..RenderSettings::default()
    };
    let mut renderer = f.renderer(&settings);
    let mut scene = f.scene();
    scene.add_entity(Entity::new(Rc::new(Model::new(vec![f.mesh()]))));
    f.gpu.fail_geometry();

    let vertex_compiles = |gpu: &RecordingGpu| {
        gpu.count(|c| matches!(c, GpuCall::CompileShader(ShaderStage::Vertex, _)))
    };
    let before = vertex_compiles(&f.gpu);

    for _ in 0..3 {
        renderer
            .render(&f.ctx, &*f.window, &camera(), &scene)
            .unwrap();
    }

    // The skybox shader is built once and released when the cube is missing.
    assert_eq!(vertex_compiles(&f.gpu), before + 1);
    assert_eq!(
        f.gpu.count(|c| matches!(c, GpuCall::DeleteProgram(_))),
        1
    );
    assert!(f
        .gpu
        .draws()
        .iter()
        .all(|d| d.program == Some(f.shader.id())));
    assert_eq!(f.gpu.draws().len(), 3);
    assert_eq!(f.window.swap_count(), 3);
}

#[test]
fn failed_cube_upload_fails_frames_when_the_skybox_is_required() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    let scene = f.scene();
    f.gpu.fail_geometry();

    let result = renderer.render(&f.ctx, &*f.window, &camera(), &scene);

    match result {
        Err(RenderError::SkyboxUnavailable { reason }) => assert!(reason.contains("unit cube")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(f.window.swap_count(), 0);
}

#[test]
fn overlay_failure_aborts_construction() {
    let f = fixture();

    let result = Renderer::with_overlay(
        &*f.window,
        &RenderSettings::default(),
        |_: &OverlayInit<'_>| Err(RenderError::Overlay("no font atlas".to_owned())),
    );

    assert!(matches!(result, Err(RenderError::Overlay(_))));
    assert!(f.gpu.calls().iter().all(|c| !matches!(c, GpuCall::Viewport { .. })));
}

#[test]
fn presentation_errors_are_returned() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    f.window.fail_present(true);

    let result = renderer.render(&f.ctx, &*f.window, &camera(), &f.scene());

    assert!(matches!(result, Err(RenderError::Present(_))));
}

#[test]
fn frame_rate_is_sampled_from_window_time() {
    let f = fixture();
    let mut renderer = f.renderer(&RenderSettings::default());
    let scene = f.scene();

    // Four frames a quarter second apart, then one past the boundary.
    for t in [0.0, 0.25, 0.5, 0.75, 1.25] {
        f.window.set_elapsed(t);
        renderer
            .render(&f.ctx, &*f.window, &camera(), &scene)
            .unwrap();
    }

    let history = renderer.fps_history();
    assert_eq!(history.total_count(), 1);
    assert_eq!(history.latest(), Some(5));
    assert_eq!(f.window.title(), "gl-cube | 5 fps (peak 5)");
}
