/// stlview web - WASM WebGL2 renderer
///
/// The page owns the animation loop and the network fetch; this module
/// decodes, uploads, and draws:
///
/// ```js
/// const renderer = new WebRenderer("canvas");
/// renderer.load_stl(new Uint8Array(await (await fetch("box.stl")).arrayBuffer()));
/// const loop = (now) => { renderer.frame(now); requestAnimationFrame(loop); };
/// requestAnimationFrame(loop);
/// ```

use nalgebra::Vector3;
use stlview_core::shapes::{self, ShapeError};
use stlview_core::{stl, AngularVelocity, Animator, DecodedModel, StlError, ViewerConfig};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext as Gl};

pub mod gl;
pub mod logging;

use gl::{MeshBuffers, MeshProgram};

#[derive(Debug, Error)]
pub enum WebError {
    #[error("no canvas element with id {0:?}")]
    CanvasNotFound(String),

    #[error("WebGL2 is not available on this canvas")]
    ContextUnavailable,

    #[error("failed to create WebGL {0}")]
    ResourceCreation(&'static str),

    #[error("shader failed to compile: {0}")]
    ShaderCompile(String),

    #[error("shader program failed to link: {0}")]
    ProgramLink(String),

    #[error("shader location {0} not found")]
    MissingLocation(&'static str),

    #[error("mesh has too many vertices for one draw call: {0}")]
    TooManyVertices(usize),

    #[error(transparent)]
    Stl(#[from] StlError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Convert a `requestAnimationFrame` timestamp to seconds
fn timestamp_seconds(timestamp_ms: f64) -> f64 {
    timestamp_ms / 1000.0
}

#[wasm_bindgen]
pub struct WebRenderer {
    gl: Gl,
    program: MeshProgram,
    mesh: Option<MeshBuffers>,
    animator: Animator,
    config: ViewerConfig,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the canvas with id `canvas_id` and build the shader program
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsError> {
        let canvas = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(canvas_id))
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| WebError::CanvasNotFound(canvas_id.to_string()))?;

        let gl = canvas
            .get_context("webgl2")
            .ok()
            .flatten()
            .and_then(|context| context.dyn_into::<Gl>().ok())
            .ok_or(WebError::ContextUnavailable)?;

        let program = MeshProgram::new(&gl)?;
        let config = ViewerConfig::default();
        let (width, height) = (canvas.width(), canvas.height());

        gl.enable(Gl::DEPTH_TEST);
        gl.depth_func(Gl::LEQUAL);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        gl.viewport(0, 0, width as i32, height as i32);

        tracing::info!(canvas_id, width, height, "WebGL2 renderer ready");

        Ok(WebRenderer {
            gl,
            program,
            mesh: None,
            animator: Animator::new(&config, width, height),
            config,
        })
    }

    /// Decode a binary STL buffer and make it the displayed mesh.
    ///
    /// On failure the previous mesh stays on screen.
    pub fn load_stl(&mut self, bytes: &[u8]) -> Result<(), JsError> {
        let mut model = stl::parse_stl(bytes).map_err(WebError::from)?;
        model.fit_to(self.config.fit_extent);
        self.show(&model)?;
        Ok(())
    }

    pub fn load_cube(&mut self, size: f32) -> Result<(), JsError> {
        self.show(&shapes::cube(size))?;
        Ok(())
    }

    pub fn load_ellipsoid(&mut self, a: f32, b: f32, c: f32) -> Result<(), JsError> {
        let model = shapes::ellipsoid(
            Vector3::new(a, b, c),
            shapes::DEFAULT_STACKS,
            shapes::DEFAULT_SLICES,
        )
        .map_err(WebError::from)?;
        self.show(&model)?;
        Ok(())
    }

    /// Render one frame; call from `requestAnimationFrame` with its timestamp
    pub fn frame(&mut self, timestamp_ms: f64) {
        let frame = self.animator.tick(timestamp_seconds(timestamp_ms));

        let [r, g, b, a] = self.config.clear_color;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        if let Some(mesh) = &self.mesh {
            self.program.draw(&self.gl, mesh, &frame);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.animator.resize(width, height);
    }

    /// Spin speed around each axis in radians per second
    pub fn set_rotation_speed(&mut self, x: f32, y: f32, z: f32) {
        self.animator.set_angular_velocity(AngularVelocity::new(x, y, z));
    }

    pub fn toggle_pause(&mut self) {
        self.animator.toggle_pause();
    }

    /// Vertices in the displayed mesh, 0 before anything is loaded
    pub fn vertex_count(&self) -> u32 {
        self.mesh
            .as_ref()
            .map_or(0, |mesh| mesh.vertex_count() as u32)
    }
}

impl WebRenderer {
    fn show(&mut self, model: &DecodedModel) -> Result<(), WebError> {
        let buffers = MeshBuffers::upload(&self.gl, model, self.config.base_color)?;
        if let Some(previous) = self.mesh.replace(buffers) {
            previous.delete(&self.gl);
        }
        tracing::info!(
            facets = model.facet_count(),
            colored = model.has_colors(),
            "uploaded mesh"
        );
        Ok(())
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init();
}
