/// 3D transformation matrices and rotation state
use nalgebra::{Matrix3, Matrix4, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Advance by `velocity` over `dt` seconds
    pub fn advance(&mut self, velocity: &AngularVelocity, dt: f32) {
        self.rotate(velocity.x * dt, velocity.y * dt, velocity.z * dt);
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Rotation speed around each axis (radians per second)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularVelocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AngularVelocity {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Model-view matrix for a model rotated in place and seen through `view`
    pub fn model_view(view: &Matrix4<f32>, rotation: &RotationState) -> Matrix4<f32> {
        view * Self::rotation_matrix(rotation)
    }

    /// Inverse-transpose of the upper 3x3 of `model_view`.
    ///
    /// Falls back to identity for a singular matrix.
    pub fn normal_matrix(model_view: &Matrix4<f32>) -> Matrix3<f32> {
        let upper: Matrix3<f32> = model_view.fixed_view::<3, 3>(0, 0).into_owned();
        upper
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity)
    }

    /// Model-view-projection matrix for clip-space vertex transforms
    pub fn mvp_matrix(projection: &Matrix4<f32>, model_view: &Matrix4<f32>) -> Matrix4<f32> {
        projection * model_view
    }
}
