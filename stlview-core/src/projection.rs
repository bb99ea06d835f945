/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::ViewerConfig;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_config(&ViewerConfig::default(), width, height)
    }

    /// Camera on the +Z axis looking at the origin
    pub fn from_config(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, config.camera_distance),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: config.fov,
            aspect: aspect_ratio(width, height),
            near: config.near,
            far: config.far,
            mode: config.projection,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm() * (self.fov / 2.0).tan() * 2.0;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Project `point` through a full model-view-projection matrix to
/// `(x, y, depth)` in a `width` x `height` viewport.
///
/// Points off the sides of the viewport still project, so a triangle that
/// straddles the edge keeps its on-screen part. Returns `None` only for
/// points at or behind the camera plane.
pub fn project_point(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();

    if clip.w <= 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_height_does_not_divide_by_zero() {
        let mut camera = Camera::new(800, 600);
        camera.set_aspect(640, 0);
        assert!(camera.aspect.is_finite());
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        let origin = view.transform_point(&Point3::origin());
        assert!((origin.z + camera.position.z).abs() < 1e-5);
    }

    fn project(camera: &Camera, point: Point3<f32>) -> Option<(f32, f32, f32)> {
        let mvp = camera.projection_matrix() * camera.view_matrix();
        project_point(&mvp, &point, 800, 600)
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(800, 600);
        let (x, y, depth) = project(&camera, Point3::origin()).unwrap();
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 300.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_clipped() {
        let camera = Camera::new(800, 600);
        let behind = Point3::new(0.0, 0.0, camera.position.z + 1.0);
        assert!(project(&camera, behind).is_none());
    }

    #[test]
    fn test_point_beside_viewport_still_projects() {
        let camera = Camera::new(800, 600);
        let (x, y, _) = project(&camera, Point3::new(-20.0, 0.0, 0.0)).unwrap();
        assert!(x < 0.0);
        assert!((y - 300.0).abs() < 1e-3);

        let (_, y, _) = project(&camera, Point3::new(0.0, 20.0, 0.0)).unwrap();
        assert!(y < 0.0);
    }

    #[test]
    fn test_orthographic_keeps_size_with_depth() {
        let camera = Camera {
            mode: ProjectionMode::Orthographic,
            ..Camera::new(800, 600)
        };
        let near = project(&camera, Point3::new(1.0, 0.0, 1.0)).unwrap();
        let far = project(&camera, Point3::new(1.0, 0.0, -1.0)).unwrap();
        assert!((near.0 - far.0).abs() < 1e-3);
    }
}
