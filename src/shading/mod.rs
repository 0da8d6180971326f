//! Shading pipeline stages
//!
//! The per-frame shader state lives in [`ShaderBuffer`], an immutable
//! snapshot built single-threaded during setup and shared read-only with
//! the parallel stages. `forward` holds the lit color pass (flat, Gouraud
//! and Phong), `shadow` the depth-only passes that feed it, and `lighting`
//! the light-accumulation math both share.

mod buffer;
mod forward;
mod lighting;
mod shadow;

pub use buffer::ShaderBuffer;

pub(crate) use forward::{vertex as forward_vertex, ForwardWorker};
pub(crate) use shadow::{vertex as shadow_vertex, ShadowWorker};
