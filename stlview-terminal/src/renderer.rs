/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Vector3;
use std::io::Write;
use stlview_core::projection::project_point;
use stlview_core::{DecodedModel, Facet, FrameMatrices};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Floor so faces turned away from the light stay visible
const AMBIENT: f32 = 0.15;

/// Barycentric slack so pixels on a shared edge are not lost to rounding
const EDGE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Option<Color>,
}

const BLANK: Cell = Cell {
    character: ' ',
    color: None,
};

/// ASCII renderer that converts decoded meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
            light_dir: Vector3::new(0.3, 0.5, 1.0).normalize(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    pub fn render_model(&mut self, model: &DecodedModel, frame: &FrameMatrices) {
        let mvp = frame.mvp();
        for facet in model.facets() {
            self.render_facet(&facet, &mvp, frame);
        }
    }

    fn render_facet(&mut self, facet: &Facet, mvp: &nalgebra::Matrix4<f32>, frame: &FrameMatrices) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coords, vertex) in screen_coords.iter_mut().zip(&facet.vertices) {
            match project_point(mvp, vertex, self.width as u32, self.height as u32) {
                Some(projected) => *coords = projected,
                None => return, // Vertex behind the camera
            }
        }

        // Some exporters write zero normals; fall back to the winding
        let normal = if facet.normal.norm() > 1e-6 {
            facet.normal
        } else {
            facet.winding_normal()
        };
        let eye_normal = (frame.normal * normal).normalize();
        let brightness = eye_normal.dot(&self.light_dir).max(0.0) * (1.0 - AMBIENT) + AMBIENT;

        self.rasterize_triangle(&screen_coords, shade(brightness, facet.color));
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= -EDGE_EPSILON && w1 >= -EDGE_EPSILON && w2 >= -EDGE_EPSILON {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.cells[idx] = cell;
                        }
                    }
                }
            }
        }
    }

    /// Number of cells covered by geometry in the current frame
    pub fn covered_cells(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                writer.queue(SetForegroundColor(
                    cell.color.unwrap_or_else(|| ramp_color(cell.character)),
                ))?;
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Pick the ramp character for `brightness`, tinting colored facets
fn shade(brightness: f32, color: Option<[f32; 3]>) -> Cell {
    let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
    let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
    Cell {
        character: LUMINOSITY_RAMP[char_index],
        color: color.map(|[r, g, b]| {
            let channel = |c: f32| (c * brightness * 255.0).clamp(0.0, 255.0) as u8;
            Color::Rgb {
                r: channel(r),
                g: channel(g),
                b: channel(b),
            }
        }),
    }
}

/// Color based on character intensity
fn ramp_color(character: char) -> Color {
    match character {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stlview_core::{shapes, Animator, ViewerConfig};

    fn frame(width: u32, height: u32) -> FrameMatrices {
        Animator::new(&ViewerConfig::default(), width, height).matrices()
    }

    #[test]
    fn test_cube_covers_center() {
        let mut renderer = AsciiRenderer::new(80, 40);
        renderer.render_model(&shapes::cube(2.0), &frame(80, 40));

        assert!(renderer.covered_cells() > 0);
        assert_ne!(renderer.char_at(40, 20), Some(' '));
        assert_eq!(renderer.char_at(0, 0), Some(' '));
    }

    #[test]
    fn test_fitted_mesh_has_no_holes_while_rotating() {
        let config = ViewerConfig::default();
        let mut model = shapes::cube(1.0);
        model.fit_to(config.fit_extent);

        let mut animator = Animator::new(&config, 80, 48);
        let mut renderer = AsciiRenderer::new(80, 24);
        for step in 0..200 {
            animator.nudge(0.13, 0.29, 0.07);
            renderer.clear();
            renderer.render_model(&model, &animator.matrices());
            assert_ne!(renderer.char_at(40, 12), Some(' '), "blank center at step {step}");
        }
    }

    #[test]
    fn test_triangle_crossing_screen_edge_keeps_visible_part() {
        let config = ViewerConfig::default();
        let mut model = shapes::cube(1.0);
        model.fit_to(config.fit_extent * 3.0);

        let mut renderer = AsciiRenderer::new(80, 24);
        renderer.render_model(&model, &Animator::new(&config, 80, 48).matrices());
        assert_eq!(renderer.covered_cells(), 80 * 24);
    }

    #[test]
    fn test_clear_resets_buffers() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_model(&shapes::cube(2.0), &frame(40, 20));
        renderer.clear();
        assert_eq!(renderer.covered_cells(), 0);
    }

    #[test]
    fn test_empty_model_draws_nothing() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_model(&DecodedModel::empty(), &frame(40, 20));
        assert_eq!(renderer.covered_cells(), 0);
    }

    #[test]
    fn test_resize() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.resize(10, 5);
        assert_eq!(renderer.size(), (10, 5));
        assert_eq!(renderer.char_at(10, 0), None);
    }

    #[test]
    fn test_shade_tints_colored_facets() {
        let cell = shade(1.0, Some([1.0, 0.0, 0.0]));
        assert_eq!(cell.character, '@');
        assert_eq!(cell.color, Some(Color::Rgb { r: 255, g: 0, b: 0 }));
        assert_eq!(shade(0.0, None).character, '.');
    }

    #[test]
    fn test_draw_writes_every_row() {
        let renderer = AsciiRenderer::new(4, 3);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }
}
