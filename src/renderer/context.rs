use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use crate::error::RenderError;

use super::gpu::{Geometry, Gpu};
use super::primitives::skybox_cube;
use super::renderer::{Renderer, RendererId};
use super::skybox::SkyboxPass;
use super::vertex::POSITION_LAYOUT;

enum SkyboxState {
    Pending,
    Ready(Rc<SkyboxPass>),
    Unavailable(String),
}

/// Per-GL-context state shared by every renderer drawing into it.
///
/// Holds the GPU backend, which renderer currently owns the fixed-function
/// state, the skybox pass (loaded on first use, never reloaded) and the
/// shared unit cube. Not `Sync`: it lives on the thread owning the context.
pub struct GpuContext {
    gpu: Box<dyn Gpu>,
    current: Cell<Option<RendererId>>,
    skybox: RefCell<SkyboxState>,
    unit_cube: OnceCell<Geometry>,
}

impl GpuContext {
    pub fn new(gpu: impl Gpu + 'static) -> Self {
        Self {
            gpu: Box::new(gpu),
            current: Cell::new(None),
            skybox: RefCell::new(SkyboxState::Pending),
            unit_cube: OnceCell::new(),
        }
    }

    pub fn gpu(&self) -> &dyn Gpu {
        self.gpu.as_ref()
    }

    pub fn current_renderer(&self) -> Option<RendererId> {
        self.current.get()
    }

    /// Makes `renderer` the active one and programs its GPU state.
    ///
    /// Does nothing when `renderer` is already active. `None` forgets the
    /// active renderer without touching GPU state, so the next activation
    /// reprograms everything.
    pub fn activate(&self, renderer: Option<&Renderer>) {
        let requested = renderer.map(Renderer::id);
        if self.current.get() == requested {
            return;
        }

        self.current.set(requested);

        if let Some(renderer) = renderer {
            renderer.apply_gpu_state(self.gpu());
        }
    }

    /// The skybox pass, loading it on the first call.
    ///
    /// A failed load is remembered; later calls report the same reason
    /// without retrying.
    pub(crate) fn skybox(&self) -> Result<Rc<SkyboxPass>, RenderError> {
        let mut state = self.skybox.borrow_mut();
        match &*state {
            SkyboxState::Ready(pass) => return Ok(Rc::clone(pass)),
            SkyboxState::Unavailable(reason) => {
                return Err(RenderError::SkyboxUnavailable {
                    reason: reason.clone(),
                })
            }
            SkyboxState::Pending => {}
        }

        match SkyboxPass::load(self) {
            Ok(pass) => {
                log::info!("Skybox pass loaded");
                let pass = Rc::new(pass);
                *state = SkyboxState::Ready(Rc::clone(&pass));
                Ok(pass)
            }
            Err(err) => {
                let reason = err.to_string();
                log::error!("Unable to load skybox pass: {reason}");
                *state = SkyboxState::Unavailable(reason.clone());
                Err(RenderError::SkyboxUnavailable { reason })
            }
        }
    }

    /// Position-only [-1, 1] cube shared by passes that draw a background.
    pub fn unit_cube(&self) -> Result<Geometry, RenderError> {
        if let Some(cube) = self.unit_cube.get() {
            return Ok(*cube);
        }

        let (positions, indices) = skybox_cube();
        let cube = self
            .gpu
            .create_geometry(bytemuck::cast_slice(&positions), &POSITION_LAYOUT, &indices)
            .map_err(|reason| RenderError::resource("unit cube", reason))?;
        Ok(*self.unit_cube.get_or_init(|| cube))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        if let SkyboxState::Ready(pass) = &*self.skybox.borrow() {
            pass.release(self.gpu());
        }
        if let Some(cube) = self.unit_cube.get() {
            self.gpu.delete_geometry(cube);
        }
    }
}
