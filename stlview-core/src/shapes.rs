/// Procedural demo meshes
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;
use thiserror::Error;

use crate::geometry::{DecodedModel, FLOATS_PER_FACET};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("ellipsoid needs at least 2 stacks and 3 slices, got {stacks} stacks and {slices} slices")]
    TooFewSegments { stacks: u32, slices: u32 },

    #[error("ellipsoid radii must be positive and finite, got {0:?}")]
    InvalidRadii([f32; 3]),
}

/// Tessellation used by the demo ellipsoid
pub const DEFAULT_STACKS: u32 = 24;
pub const DEFAULT_SLICES: u32 = 32;

/// Cube face: outward normal, face color, corner signs in counter-clockwise order
type Face = ([f32; 3], [f32; 3], [[f32; 3]; 4]);

const CUBE_FACES: [Face; 6] = [
    // Front (white)
    (
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
    ),
    // Back (red)
    (
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
        [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0]],
    ),
    // Top (green)
    (
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]],
    ),
    // Bottom (blue)
    (
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
    ),
    // Right (yellow)
    (
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]],
    ),
    // Left (purple)
    (
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 1.0],
        [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
    ),
];

/// Cube centered at the origin with one solid color per face
pub fn cube(size: f32) -> DecodedModel {
    let half = size / 2.0;
    let floats = CUBE_FACES.len() * 2 * FLOATS_PER_FACET;
    let mut position = Vec::with_capacity(floats);
    let mut normals = Vec::with_capacity(floats);
    let mut colors = Vec::with_capacity(floats);

    for (normal, color, corners) in &CUBE_FACES {
        for index in [0, 1, 2, 0, 2, 3] {
            position.extend(corners[index].iter().map(|sign| sign * half));
            normals.extend_from_slice(normal);
            colors.extend_from_slice(color);
        }
    }

    DecodedModel::Colored {
        position,
        normals,
        colors,
        alpha: 1.0,
    }
}

/// UV-sphere tessellation of an ellipsoid with semi-axes `radii`.
///
/// Normals are smooth per vertex. Pole rows emit one triangle per slice.
pub fn ellipsoid(radii: Vector3<f32>, stacks: u32, slices: u32) -> Result<DecodedModel, ShapeError> {
    if stacks < 2 || slices < 3 {
        return Err(ShapeError::TooFewSegments { stacks, slices });
    }
    if radii.iter().any(|r| !r.is_finite() || *r <= 0.0) {
        return Err(ShapeError::InvalidRadii([radii.x, radii.y, radii.z]));
    }

    let inverse_sq = radii.map(|r| 1.0 / (r * r));
    let vertex = |stack: u32, slice: u32| {
        let theta = PI * stack as f32 / stacks as f32;
        let phi = 2.0 * PI * slice as f32 / slices as f32;
        let point = Point3::new(
            radii.x * theta.sin() * phi.cos(),
            radii.y * theta.cos(),
            radii.z * theta.sin() * phi.sin(),
        );
        let normal = point.coords.component_mul(&inverse_sq).normalize();
        (point, normal)
    };

    let facets = slices as usize * (2 * stacks as usize - 2);
    let mut position = Vec::with_capacity(facets * FLOATS_PER_FACET);
    let mut normals = Vec::with_capacity(facets * FLOATS_PER_FACET);
    let mut push = |corners: [(Point3<f32>, Vector3<f32>); 3]| {
        for (point, normal) in corners {
            position.extend_from_slice(point.coords.as_slice());
            normals.extend_from_slice(normal.as_slice());
        }
    };

    for stack in 0..stacks {
        for slice in 0..slices {
            let top_left = vertex(stack, slice);
            let bottom_left = vertex(stack + 1, slice);
            let bottom_right = vertex(stack + 1, slice + 1);
            let top_right = vertex(stack, slice + 1);

            // The last row's lower edge collapses into the south pole
            if stack + 1 < stacks {
                push([top_left, bottom_right, bottom_left]);
            }
            // The first row's upper edge collapses into the north pole
            if stack > 0 {
                push([top_left, top_right, bottom_right]);
            }
        }
    }

    Ok(DecodedModel::Uncolored { position, normals })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_layout() {
        let cube = cube(2.0);
        assert_eq!(cube.facet_count(), 12);
        assert_eq!(cube.normals().len(), cube.position().len());
        assert_eq!(cube.colors().map(<[f32]>::len), Some(cube.position().len()));
        assert_eq!(cube.alpha(), Some(1.0));

        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        for facet in cube(1.0).facets() {
            assert!((facet.winding_normal() - facet.normal).norm() < 1e-6);
        }
    }

    #[test]
    fn test_ellipsoid_counts() {
        let model = ellipsoid(Vector3::new(1.0, 2.0, 3.0), 8, 12).unwrap();
        assert_eq!(model.facet_count(), 12 * (2 * 8 - 2));
        assert_eq!(model.normals().len(), model.position().len());
        assert!(!model.has_colors());
    }

    #[test]
    fn test_ellipsoid_points_lie_on_surface() {
        let radii = Vector3::new(1.0, 2.0, 0.5);
        let model = ellipsoid(radii, 6, 9).unwrap();
        for p in model.position().chunks_exact(3) {
            let value = (p[0] / radii.x).powi(2) + (p[1] / radii.y).powi(2) + (p[2] / radii.z).powi(2);
            assert!((value - 1.0).abs() < 1e-4);
        }
        for n in model.normals().chunks_exact(3) {
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ellipsoid_faces_outward() {
        let model = ellipsoid(Vector3::new(1.0, 1.0, 1.0), 10, 16).unwrap();
        for facet in model.facets() {
            let centroid = (facet.vertices[0].coords + facet.vertices[1].coords + facet.vertices[2].coords) / 3.0;
            assert!(facet.winding_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_ellipsoid_rejects_bad_input() {
        assert_eq!(
            ellipsoid(Vector3::new(1.0, 1.0, 1.0), 1, 8),
            Err(ShapeError::TooFewSegments { stacks: 1, slices: 8 })
        );
        assert!(matches!(
            ellipsoid(Vector3::new(1.0, 0.0, 1.0), 4, 8),
            Err(ShapeError::InvalidRadii(_))
        ));
    }
}
