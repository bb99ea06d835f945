/// Flat-array mesh representation ready for vertex-buffer upload
use nalgebra::{Point3, Vector3};

use crate::transform::Transform;

/// Floats per triangle in each flat array (3 vertices x 3 components)
pub const FLOATS_PER_FACET: usize = 9;

/// A decoded triangle mesh.
///
/// Color data is either fully present or fully absent: the variant carries
/// the per-vertex RGB array together with the model-wide alpha, so no
/// half-colored model can be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedModel {
    Uncolored {
        position: Vec<f32>,
        normals: Vec<f32>,
    },
    Colored {
        position: Vec<f32>,
        normals: Vec<f32>,
        colors: Vec<f32>,
        alpha: f32,
    },
}

impl DecodedModel {
    /// An empty, uncolored model
    pub fn empty() -> Self {
        Self::Uncolored {
            position: Vec::new(),
            normals: Vec::new(),
        }
    }

    pub fn position(&self) -> &[f32] {
        match self {
            Self::Uncolored { position, .. } | Self::Colored { position, .. } => position,
        }
    }

    pub fn normals(&self) -> &[f32] {
        match self {
            Self::Uncolored { normals, .. } | Self::Colored { normals, .. } => normals,
        }
    }

    /// Per-vertex RGB triples, if the model carries colors
    pub fn colors(&self) -> Option<&[f32]> {
        match self {
            Self::Uncolored { .. } => None,
            Self::Colored { colors, .. } => Some(colors),
        }
    }

    /// Model-wide alpha, if the model carries colors
    pub fn alpha(&self) -> Option<f32> {
        match self {
            Self::Uncolored { .. } => None,
            Self::Colored { alpha, .. } => Some(*alpha),
        }
    }

    pub fn has_colors(&self) -> bool {
        matches!(self, Self::Colored { .. })
    }

    pub fn vertex_count(&self) -> usize {
        self.position().len() / 3
    }

    pub fn facet_count(&self) -> usize {
        self.position().len() / FLOATS_PER_FACET
    }

    /// Iterate over the triangles as structured views
    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        let colors = self.colors();
        self.position()
            .chunks_exact(FLOATS_PER_FACET)
            .zip(self.normals().chunks_exact(FLOATS_PER_FACET))
            .enumerate()
            .map(move |(index, (position, normals))| Facet {
                vertices: [
                    Point3::new(position[0], position[1], position[2]),
                    Point3::new(position[3], position[4], position[5]),
                    Point3::new(position[6], position[7], position[8]),
                ],
                normal: Vector3::new(normals[0], normals[1], normals[2]),
                color: colors.map(|colors| {
                    let base = index * FLOATS_PER_FACET;
                    [colors[base], colors[base + 1], colors[base + 2]]
                }),
            })
    }

    /// Axis-aligned bounds of all vertex positions, `None` for an empty model
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .position()
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        Some(points.fold(Bounds { min: first, max: first }, |mut bounds, p| {
            bounds.min = bounds.min.inf(&p);
            bounds.max = bounds.max.sup(&p);
            bounds
        }))
    }

    /// Center the model at the origin and scale it so its largest dimension
    /// spans `2 * extent`. Normals are left as-is since the scale is uniform.
    pub fn fit_to(&mut self, extent: f32) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let center = bounds.center();
        let max_dim = bounds.max_extent();
        let scale = if max_dim > 1e-9 { 2.0 * extent / max_dim } else { 1.0 };

        let matrix = Transform::scale_matrix(scale, scale, scale)
            * Transform::translation_matrix(-center.x, -center.y, -center.z);

        let position = match self {
            Self::Uncolored { position, .. } | Self::Colored { position, .. } => position,
        };
        for p in position.chunks_exact_mut(3) {
            let moved = matrix.transform_point(&Point3::new(p[0], p[1], p[2]));
            p.copy_from_slice(&[moved.x, moved.y, moved.z]);
        }
    }
}

impl Default for DecodedModel {
    fn default() -> Self {
        Self::empty()
    }
}

/// One triangle of a [`DecodedModel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub vertices: [Point3<f32>; 3],
    /// Normal of the first vertex; equal for all three in decoded STL data
    pub normal: Vector3<f32>,
    /// Color of the first vertex
    pub color: Option<[f32; 3]>,
}

impl Facet {
    /// Normal computed from the winding of the vertices
    pub fn winding_normal(&self) -> Vector3<f32> {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];
        edge1.cross(&edge2).normalize()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the longest side
    pub fn max_extent(&self) -> f32 {
        (self.max - self.min).max()
    }
}
