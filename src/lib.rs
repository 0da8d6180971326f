//! basalt - fixed-point software 3D rasterizer
//!
//! A deterministic rendering pipeline that takes triangles from model
//! space to shaded pixels using Q15 fixed-point arithmetic throughout:
//! no GPU, no FPU on the per-frame path.
//!
//! # Module Organization
//!
//! - `fixed` - Q15 scalar math: multiply/divide with rounding, LUT
//!   trigonometry, sqrt, pow
//! - `vector`, `matrix` - fixed-point vectors and 4x4 matrices
//! - `transform` - model/normal/view matrix composition
//! - `frustum` - projection matrices, screenporting
//! - `color` - packed 0xAARRGGBB channel math
//! - `texture` - pixel storage, render targets, shadow maps
//! - `scene` - meshes, materials, models, cameras, lights
//! - `rasterizer` - the scanline triangle fill engine
//! - `ray` - picking rays and ray/triangle intersection
//! - `shading` - shader buffer, forward pass, shadow passes
//! - `pipeline` - frame orchestration across the worker pool
//! - `primitives` - canned cube/plane meshes for tests and demos
//!
//! ```
//! use basalt::{
//!     Camera, Face, Frustum, Material, Mesh, Model, Pipeline, RenderTarget, Scene, Transform,
//!     Vec4, Vertex,
//! };
//!
//! let vertices = vec![
//!     Vertex::new(Vec4::from_f32(-1.0, -1.0, -4.0), Vec4::BACK, 0),
//!     Vertex::new(Vec4::from_f32(1.0, -1.0, -4.0), Vec4::BACK, 0),
//!     Vertex::new(Vec4::from_f32(0.0, 1.0, -4.0), Vec4::BACK, 0),
//! ];
//! let faces = vec![Face::new([0, 1, 2], [Vec4::ZERO; 3], 0)];
//! let mesh = Mesh::new(vertices, faces, vec![Material::default()]);
//!
//! let mut scene = Scene::new();
//! scene.models.push(Model::new(mesh, Transform::identity()));
//! scene.cameras.push(Camera::new(Transform::identity(), Frustum::default()));
//!
//! let target = RenderTarget::new(320, 240);
//! let mut pipeline = Pipeline::new();
//! pipeline.render_frame(&mut scene, &target);
//! ```

pub mod color;
pub mod fixed;
pub mod frustum;
pub mod matrix;
pub mod pipeline;
pub mod primitives;
pub mod rasterizer;
pub mod ray;
pub mod scene;
pub mod shading;
pub mod texture;
pub mod transform;
pub mod vector;

// =============================================================================
// Convenience re-exports for commonly used items
// =============================================================================

pub use color::{BlendMode, Color};
pub use fixed::Fixed;
pub use frustum::{Frustum, FrustumKind};
pub use matrix::Mat4;
pub use pipeline::{FrameTimings, Pipeline};
pub use rasterizer::{CullFace, Fragment, Interpolation, TriangleRasterizer};
pub use ray::{ray_triangle_intersection, screen_to_ray, Ray};
pub use scene::{
    Animation, AnimationFrame, Armature, Camera, Face, Light, LightType, Material, Mesh, Model,
    Scene, ShadingModel, Vertex, VertexGroup,
};
pub use shading::ShaderBuffer;
pub use texture::{RenderTarget, Texture, TextureError};
pub use transform::Transform;
pub use vector::{Axis, Vec4};
