/// stlview core library - mesh decoding and per-frame math
///
/// This library provides the stateless core shared by the render hosts:
/// binary STL decoding, procedural demo meshes, transformation matrices,
/// projection, and the frame animator.

pub mod animation;
pub mod config;
pub mod geometry;
pub mod projection;
pub mod shapes;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animation::{Animator, FrameMatrices};
pub use config::ViewerConfig;
pub use geometry::{Bounds, DecodedModel, Facet};
pub use projection::{Camera, ProjectionMode};
pub use stl::StlError;
pub use transform::{AngularVelocity, RotationState, Transform};
