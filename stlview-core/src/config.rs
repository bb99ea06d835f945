/// Viewer settings shared by the terminal and web hosts
use crate::projection::ProjectionMode;
use crate::transform::AngularVelocity;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub projection: ProjectionMode,
    /// Distance from the camera to the model origin along +Z
    pub camera_distance: f32,
    pub angular_velocity: AngularVelocity,
    /// Upper bound on a single frame's time step, in seconds
    pub max_frame_delta: f32,
    /// Vertex color for models without their own colors
    pub base_color: [f32; 3],
    pub clear_color: [f32; 4],
    /// Half-size loaded meshes are scaled to
    pub fit_extent: f32,
}

impl ViewerConfig {
    /// Scale the default spin by `factor`
    pub fn with_speed(mut self, factor: f32) -> Self {
        self.angular_velocity = self.angular_velocity.scaled(factor);
        self
    }

    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            near: 0.1,
            far: 100.0,
            projection: ProjectionMode::Perspective,
            camera_distance: 6.0,
            angular_velocity: AngularVelocity::new(0.3, 0.7, 1.0),
            max_frame_delta: 0.1,
            base_color: [0.8, 0.8, 0.8],
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fit_extent: 1.5,
        }
    }
}
