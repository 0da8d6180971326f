//! Depth-only shadow passes
//!
//! Each shadow-casting light gets the scene rasterized again from its
//! point of view into a depth map. Face culling is off (a back face of an
//! occluder still casts shadow) and whole-triangle frustum culling is off
//! as well; instead the geometry stage skips faces far outside the main
//! camera's view, since their shadows could never be sampled this frame.
//!
//! The light's shadow bias is added at write time, which is the same as
//! subtracting it when the forward pass compares depths.

use crate::fixed::FP_ONE;
use crate::frustum::Frustum;
use crate::matrix::Mat4;
use crate::rasterizer::{CullFace, Interpolation, TriangleRasterizer};
use crate::scene::{Face, Mesh, Vertex};
use crate::texture::Texture;
use crate::vector::Vec4;

use super::buffer::ShaderBuffer;

/// Pixel slack around the camera port when deciding whether a face can
/// still influence the visible frame.
const CAMERA_VIEW_TOLERANCE: i32 = 1024;

/// Vertex stage of a shadow pass: world location into the light's clip
/// space and onto its map.
pub(crate) fn vertex(vertex: &mut Vertex, light_matrix: &Mat4, light_frustum: &Frustum) {
    let clip = vertex.world_location.transformed(light_matrix);
    vertex.location = light_frustum.screenport_vector(clip);
}

/// Per-worker state for a depth-only pass.
pub(crate) struct ShadowWorker {
    rasterizer: TriangleRasterizer<0>,
}

impl ShadowWorker {
    pub fn new(light_frustum: &Frustum) -> Self {
        let mut rasterizer = TriangleRasterizer::new();
        rasterizer.set_viewport(light_frustum);
        rasterizer.set_frustum_cull(false);
        rasterizer.set_cull_face(CullFace::Disabled);
        ShadowWorker { rasterizer }
    }

    pub fn geometry(
        &mut self,
        buffer: &ShaderBuffer,
        mesh: &Mesh,
        face: &Face,
        map: &Texture,
        shadow_bias: i32,
    ) {
        if !in_camera_view(buffer, mesh, face) {
            return;
        }
        let locations = [
            mesh.vertices[face.vertices[0]].location,
            mesh.vertices[face.vertices[1]].location,
            mesh.vertices[face.vertices[2]].location,
        ];
        self.rasterizer
            .draw(&locations, &[], Interpolation::Affine, &mut |fragment| {
                if map.contains(fragment.x, fragment.y) {
                    map.depth_min(fragment.x as usize, fragment.y as usize, fragment.z + shadow_bias);
                }
            });
    }
}

/// Reproject the face into the main camera and reject it only when all
/// three corners sit outside the tolerance-expanded port on one axis.
fn in_camera_view(buffer: &ShaderBuffer, mesh: &Mesh, face: &Face) -> bool {
    let frustum = buffer.camera_frustum();
    let left = frustum.port_left() - CAMERA_VIEW_TOLERANCE;
    let right = frustum.port_right() + CAMERA_VIEW_TOLERANCE;
    let top = frustum.port_top() - CAMERA_VIEW_TOLERANCE;
    let bottom = frustum.port_bottom() + CAMERA_VIEW_TOLERANCE;
    let mut ported = [Vec4::ZERO; 3];
    for (corner, location) in ported.iter_mut().enumerate() {
        let world = mesh.vertices[face.vertices[corner]].world_location;
        *location = frustum.screenport_vector(world.transformed(buffer.view_projection()));
    }
    let inside_x = |v: &Vec4| v.x.raw() > left && v.x.raw() < right;
    let inside_y = |v: &Vec4| v.y.raw() > top && v.y.raw() < bottom;
    let inside_z = |v: &Vec4| v.z.raw() > 0 && v.z.raw() < FP_ONE;
    !((!inside_x(&ported[0]) && !inside_x(&ported[1]) && !inside_x(&ported[2]))
        || (!inside_y(&ported[0]) && !inside_y(&ported[1]) && !inside_y(&ported[2]))
        || (!inside_z(&ported[0]) && !inside_z(&ported[1]) && !inside_z(&ported[2])))
}
