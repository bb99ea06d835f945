/// WebGL2 shader program and vertex buffers for a decoded mesh
use stlview_core::{DecodedModel, FrameMatrices};
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
};

use crate::WebError;

const VERTEX_SHADER: &str = include_str!("shaders/mesh.vert");
const FRAGMENT_SHADER: &str = include_str!("shaders/mesh.frag");

/// Where the per-vertex color attribute comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSource {
    /// The model's own color buffer
    Buffer,
    /// One color for every vertex
    Constant([f32; 3]),
}

/// Color source and alpha for `model`, using `base_color` when it has no colors
pub fn color_source(model: &DecodedModel, base_color: [f32; 3]) -> (ColorSource, f32) {
    match model.alpha() {
        Some(alpha) => (ColorSource::Buffer, alpha),
        None => (ColorSource::Constant(base_color), 1.0),
    }
}

/// Linked mesh shader with its attribute and uniform locations
pub struct MeshProgram {
    program: WebGlProgram,
    a_position: u32,
    a_normal: u32,
    a_color: u32,
    u_projection: WebGlUniformLocation,
    u_model_view: WebGlUniformLocation,
    u_normal_matrix: WebGlUniformLocation,
    u_alpha: WebGlUniformLocation,
}

impl MeshProgram {
    pub fn new(gl: &Gl) -> Result<Self, WebError> {
        let vertex = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(gl, &vertex, &fragment)?;

        // Linked programs keep their own copy
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        Ok(Self {
            a_position: attribute(gl, &program, "a_position")?,
            a_normal: attribute(gl, &program, "a_normal")?,
            a_color: attribute(gl, &program, "a_color")?,
            u_projection: uniform(gl, &program, "u_projection")?,
            u_model_view: uniform(gl, &program, "u_model_view")?,
            u_normal_matrix: uniform(gl, &program, "u_normal_matrix")?,
            u_alpha: uniform(gl, &program, "u_alpha")?,
            program,
        })
    }

    /// Issue one draw call for `mesh` with this frame's matrices
    pub fn draw(&self, gl: &Gl, mesh: &MeshBuffers, frame: &FrameMatrices) {
        gl.use_program(Some(&self.program));

        bind_attribute(gl, &mesh.position, self.a_position);
        bind_attribute(gl, &mesh.normals, self.a_normal);
        match (&mesh.colors, mesh.color_source) {
            (Some(colors), _) => bind_attribute(gl, colors, self.a_color),
            (None, ColorSource::Constant([r, g, b])) => {
                gl.disable_vertex_attrib_array(self.a_color);
                gl.vertex_attrib3f(self.a_color, r, g, b);
            }
            (None, ColorSource::Buffer) => gl.disable_vertex_attrib_array(self.a_color),
        }

        gl.uniform_matrix4fv_with_f32_array(
            Some(&self.u_projection),
            false,
            frame.projection.as_slice(),
        );
        gl.uniform_matrix4fv_with_f32_array(
            Some(&self.u_model_view),
            false,
            frame.model_view.as_slice(),
        );
        gl.uniform_matrix3fv_with_f32_array(
            Some(&self.u_normal_matrix),
            false,
            frame.normal.as_slice(),
        );
        gl.uniform1f(Some(&self.u_alpha), mesh.alpha);

        gl.draw_arrays(Gl::TRIANGLES, 0, mesh.vertex_count);
    }
}

/// GPU copies of a model's flat arrays
pub struct MeshBuffers {
    position: WebGlBuffer,
    normals: WebGlBuffer,
    colors: Option<WebGlBuffer>,
    color_source: ColorSource,
    alpha: f32,
    vertex_count: i32,
}

impl MeshBuffers {
    pub fn upload(gl: &Gl, model: &DecodedModel, base_color: [f32; 3]) -> Result<Self, WebError> {
        let (color_source, alpha) = color_source(model, base_color);
        let colors = model
            .colors()
            .map(|colors| upload_floats(gl, colors))
            .transpose()?;

        Ok(Self {
            position: upload_floats(gl, model.position())?,
            normals: upload_floats(gl, model.normals())?,
            colors,
            color_source,
            alpha,
            vertex_count: i32::try_from(model.vertex_count())
                .map_err(|_| WebError::TooManyVertices(model.vertex_count()))?,
        })
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn delete(self, gl: &Gl) {
        gl.delete_buffer(Some(&self.position));
        gl.delete_buffer(Some(&self.normals));
        if let Some(colors) = &self.colors {
            gl.delete_buffer(Some(colors));
        }
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, WebError> {
    let shader = gl
        .create_shader(kind)
        .ok_or(WebError::ResourceCreation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(WebError::ShaderCompile(log))
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, WebError> {
    let program = gl
        .create_program()
        .ok_or(WebError::ResourceCreation("program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if linked {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(WebError::ProgramLink(log))
    }
}

fn attribute(gl: &Gl, program: &WebGlProgram, name: &'static str) -> Result<u32, WebError> {
    u32::try_from(gl.get_attrib_location(program, name)).map_err(|_| WebError::MissingLocation(name))
}

fn uniform(gl: &Gl, program: &WebGlProgram, name: &'static str) -> Result<WebGlUniformLocation, WebError> {
    gl.get_uniform_location(program, name)
        .ok_or(WebError::MissingLocation(name))
}

fn upload_floats(gl: &Gl, data: &[f32]) -> Result<WebGlBuffer, WebError> {
    let buffer = gl
        .create_buffer()
        .ok_or(WebError::ResourceCreation("buffer"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    gl.buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(data), Gl::STATIC_DRAW);
    Ok(buffer)
}

fn bind_attribute(gl: &Gl, buffer: &WebGlBuffer, location: u32) {
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
    gl.vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, 0, 0);
    gl.enable_vertex_attrib_array(location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use stlview_core::shapes;

    #[test]
    fn test_uncolored_model_uses_base_color() {
        let model = DecodedModel::empty();
        assert_eq!(
            color_source(&model, [0.1, 0.2, 0.3]),
            (ColorSource::Constant([0.1, 0.2, 0.3]), 1.0)
        );
    }

    #[test]
    fn test_colored_model_uses_its_buffer_and_alpha() {
        let model = DecodedModel::Colored {
            position: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            alpha: 0.25,
        };
        assert_eq!(color_source(&model, [0.1, 0.2, 0.3]), (ColorSource::Buffer, 0.25));
        assert_eq!(color_source(&shapes::cube(1.0), [0.0; 3]).1, 1.0);
    }

    #[test]
    fn test_shaders_declare_locations() {
        for name in ["a_position", "a_normal", "a_color", "u_projection", "u_model_view", "u_normal_matrix"] {
            assert!(VERTEX_SHADER.contains(name), "{name} missing from vertex shader");
        }
        assert!(FRAGMENT_SHADER.contains("u_alpha"));
        assert!(VERTEX_SHADER.starts_with("#version 300 es"));
        assert!(FRAGMENT_SHADER.starts_with("#version 300 es"));
    }
}
